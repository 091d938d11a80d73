//! 에러 대화상자 뷰모델
//!
//! 요청마다 새로 만들어지는 Transient 뷰모델입니다. `ExceptionService`가 폴트 내용을
//! 채운 뒤 `ErrorView`에 바인딩합니다. 치명적 폴트였다면 대화상자가 닫힐 때
//! 애플리케이션 종료를 요청합니다.

use std::sync::Arc;
use log::{debug, error, info};
use parking_lot::RwLock;
use crate::core::errors::AppResult;
use crate::core::faults::FaultReport;
use crate::core::provider::{LazyService, ServiceProvider};
use crate::core::registry::{Construct, Lifetime};
use crate::services::clipboard::Clipboard;
use crate::services::lifetime::ApplicationLifetime;
use crate::view_models::{Disposable, DisposeFlag, ViewModel};

#[derive(Debug, Clone, Default)]
struct ErrorState {
    message: String,
    details: String,
    should_exit: bool,
}

pub struct ErrorViewModel {
    clipboard: Arc<Clipboard>,
    lifetime: LazyService<ApplicationLifetime>,
    state: RwLock<ErrorState>,
    disposed: DisposeFlag,
}

impl ErrorViewModel {
    pub fn new(clipboard: Arc<Clipboard>, lifetime: LazyService<ApplicationLifetime>) -> Self {
        Self {
            clipboard,
            lifetime,
            state: RwLock::new(ErrorState::default()),
            disposed: DisposeFlag::new(),
        }
    }

    /// 보고서 내용으로 채웁니다.
    pub fn set_fault(&self, report: &FaultReport, should_exit: bool) {
        let mut state = self.state.write();
        state.message = report.message.clone();
        state.details = report.detail.clone();
        state.should_exit = should_exit;
    }

    pub fn message(&self) -> String {
        self.state.read().message.clone()
    }

    pub fn details(&self) -> String {
        self.state.read().details.clone()
    }

    pub fn should_exit(&self) -> bool {
        self.state.read().should_exit
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }

    /// 메시지와 상세 내용을 빈 줄로 구분해 클립보드에 복사합니다.
    pub fn copy_to_clipboard(&self) {
        let text = {
            let state = self.state.read();
            format!("{}\n\n{}", state.message, state.details)
        };
        self.clipboard.set_text(text);
    }
}

impl ViewModel for ErrorViewModel {
    /// 대화상자가 닫히면 수명이 끝납니다.
    fn on_unloaded(&self) {
        if self.should_exit() {
            match self.lifetime.get() {
                Ok(lifetime) => {
                    info!("🛑 Fatal error dialog closed, shutting down");
                    lifetime.request_shutdown();
                }
                Err(e) => error!("Cannot request shutdown after fatal error: {}", e),
            }
        }
        self.dispose();
    }
}

impl Disposable for ErrorViewModel {
    fn dispose(&self) {
        if self.disposed.begin() {
            debug!("ErrorViewModel disposed");
        }
    }
}

impl Construct for ErrorViewModel {
    const LIFETIME: Lifetime = Lifetime::Transient;

    fn construct(provider: &ServiceProvider) -> AppResult<Self> {
        Ok(Self::new(provider.resolve()?, provider.lazy()))
    }
}
