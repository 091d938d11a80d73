//! # Configuration Module
//!
//! 셸의 설정 관리를 담당하는 모듈입니다.
//! 환경 변수 기반 런타임 설정과 디스크에 저장되는 사용자 설정을 분리해서 관리합니다.
//!
//! ## 모듈 구성
//!
//! - [`shell_config`] - 실행 환경, 서비스 해석, 로깅, 경로 설정 (환경 변수)
//! - [`settings`] - `config.json` / `global.json` 설정 파일
//!
//! ## 환경 분리 (Environment Separation)
//!
//! `PROFILE`에 따라 `.env` 파일을 고릅니다 (`dev` → `.env.dev`, `prod` → `.env.prod`,
//! 그 외 → `.env`). 로거가 준비되기 전에 출력된 로그는 버퍼에 쌓였다가 순서대로 기록됩니다.
//!
//! ## 환경 변수 설정 가이드
//!
//! ```bash
//! export ENVIRONMENT="development"        # development, test, staging, production
//! export RUST_LOG="info"                  # env_logger 필터
//! export SHELL_LOG_FILE="log.txt"         # logs/ 아래 파일에도 기록
//! export SHELL_RESOLVE_TIMEOUT_MS="30000" # 싱글톤 생성 대기 제한
//! export SHELL_EAGER_INIT="false"         # 시작 시 싱글톤 일괄 생성
//! export SHELL_CONFIG_DIR="/etc/thank_you_letter"
//! ```
//!
//! ## Spring과의 비교
//!
//! | Spring | Rust (이 프로젝트) |
//! |--------|-------------------|
//! | `@Value("${property}")` | `env::var("PROPERTY")` |
//! | `@Profile("dev")` | `PROFILE=dev` + `Environment::Development` |
//! | `application.yml` | `.env` 파일 + `config.json` |

pub mod shell_config;
pub mod settings;

pub use shell_config::*;
pub use settings::{AppConfig, GlobalConfig, SettingsFile};
