//! 공통 유틸리티 함수 모듈
//!
//! 애플리케이션 전체에서 사용되는 공통 유틸리티 함수들을 제공합니다.
//!
//! # Modules
//!
//! - [`display_terminal`] - 터미널 출력 포맷팅 함수들
//! - [`log_buffer`] - 로거 초기화 전 로그 버퍼링
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::utils::display_terminal::print_boxed_title;
//! use crate::utils::log_buffer::{build_env_logger, BufferedLogger};
//!
//! let logger = BufferedLogger::install()?;
//! let env_logger = build_env_logger()?;
//! let level = env_logger.filter();
//! logger.init(Box::new(env_logger), level)?;
//!
//! print_boxed_title("System Initialized");
//! ```

pub mod display_terminal;
pub mod log_buffer;
