//! 메인 창 뷰모델

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{debug, info};
use crate::config::AppConfig;
use crate::core::errors::{AppError, AppResult};
use crate::core::provider::ServiceProvider;
use crate::core::registry::{Construct, Lifetime};
use crate::view_models::{Disposable, DisposeFlag, ViewModel};

pub const DEFAULT_GREETING: &str = "Welcome to Thank You Letter!";

/// `config.json`의 이 키로 인사말을 바꿀 수 있습니다.
pub const GREETING_KEY: &str = "greeting";

pub struct RootViewModel {
    greeting: String,
    loaded: AtomicBool,
    disposed: DisposeFlag,
}

impl RootViewModel {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            loaded: AtomicBool::new(false),
            disposed: DisposeFlag::new(),
        }
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }

    /// 폴트 경로 확인용 명령. 항상 실패합니다.
    pub fn show_error(&self) -> AppResult<()> {
        Err(AppError::Fault("Test".to_string()))
    }

    fn greeting_from(config: &AppConfig) -> AppResult<String> {
        Ok(config
            .get::<String>(GREETING_KEY)?
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()))
    }
}

impl ViewModel for RootViewModel {
    fn on_loaded(&self) {
        self.loaded.store(true, Ordering::Release);
        info!("🏠 Root view loaded");
    }

    fn on_unloaded(&self) {
        self.loaded.store(false, Ordering::Release);
        debug!("Root view unloaded");
    }
}

impl Disposable for RootViewModel {
    fn dispose(&self) {
        if self.disposed.begin() {
            debug!("RootViewModel disposed");
        }
    }
}

impl Construct for RootViewModel {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(provider: &ServiceProvider) -> AppResult<Self> {
        let config: Arc<AppConfig> = provider.resolve()?;
        Ok(Self::new(Self::greeting_from(&config)?))
    }

    fn shutdown(&self) {
        self.dispose();
    }
}
