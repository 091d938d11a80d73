use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 개발 환경 - 디버그 로그, 상세 폴트 정보
    Development,
    /// 테스트 환경 - 자동화된 테스트용 설정
    Test,
    /// 스테이징 환경 - 배포 전 검증
    Staging,
    /// 프로덕션 환경 - 최종 사용자 배포본
    Production,
}

impl Environment {
    /// 현재 실행 환경을 감지합니다.
    ///
    /// `ENVIRONMENT` 환경 변수를 확인하며, 설정되지 않은 경우 `Production`을 기본값으로 사용합니다.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let env = Environment::current();
    /// match env {
    ///     Environment::Development => println!("개발 환경"),
    ///     Environment::Production => println!("프로덕션 환경"),
    ///     _ => {}
    /// }
    /// ```
    pub fn current() -> Self {
        Self::from_str(&env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string()))
    }

    /// 문자열에서 Environment를 생성합니다.
    ///
    /// 알 수 없는 값인 경우 `Production`을 반환합니다.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }

    /// 기본 로그 필터
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "debug",
            Environment::Test => "warn",
            Environment::Staging | Environment::Production => "info",
        }
    }
}

/// 서비스 해석 설정
pub struct ResolverConfig;

impl ResolverConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

    /// 다른 스레드가 생성 중인 싱글톤을 기다리는 최대 시간
    ///
    /// # Environment Variables
    ///
    /// - `SHELL_RESOLVE_TIMEOUT_MS`: 밀리초 단위, 기본값 30000
    pub fn contention_timeout() -> Duration {
        let millis = env::var("SHELL_RESOLVE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(Self::DEFAULT_TIMEOUT_MS);
        Duration::from_millis(millis)
    }

    /// 시작 시 모든 싱글톤을 미리 생성할지 여부
    ///
    /// # Environment Variables
    ///
    /// - `SHELL_EAGER_INIT`: `true`/`1`이면 활성화 (기본값: 비활성)
    pub fn eager_init() -> bool {
        env::var("SHELL_EAGER_INIT")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }
}

/// 로깅 설정
pub struct LogConfig;

impl LogConfig {
    /// `env_logger` 필터 문자열
    ///
    /// # Environment Variables
    ///
    /// - `RUST_LOG`: 설정되지 않으면 실행 환경의 기본 필터 (프로덕션: `info`)
    pub fn filter() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| Environment::current().default_log_filter().to_string())
    }

    /// 로그를 추가로 기록할 파일 경로
    ///
    /// # Environment Variables
    ///
    /// - `SHELL_LOG_FILE`: 상대 경로는 `PathConfig::logs_dir()` 기준
    pub fn log_file() -> Option<PathBuf> {
        env::var("SHELL_LOG_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .map(|path| {
                if path.is_absolute() {
                    path
                } else {
                    PathConfig::logs_dir().join(path)
                }
            })
    }
}

/// 경로 설정
pub struct PathConfig;

impl PathConfig {
    /// 실행 파일이 있는 디렉터리 (알 수 없으면 현재 디렉터리)
    pub fn root_dir() -> PathBuf {
        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn logs_dir() -> PathBuf {
        Self::root_dir().join("logs")
    }

    /// 설정 파일 디렉터리
    ///
    /// # Environment Variables
    ///
    /// - `SHELL_CONFIG_DIR`: 기본값은 `root_dir()`
    pub fn config_dir() -> PathBuf {
        env::var("SHELL_CONFIG_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::root_dir)
    }
}
