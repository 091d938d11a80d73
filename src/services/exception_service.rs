//! # Exception Service
//!
//! `FaultSink`가 사용하는 기본 `FaultDisplay` 구현입니다.
//!
//! ```text
//! FaultSink::report
//!    └─ ExceptionService::show_fault(report, exit_after)
//!         ├─ ErrorViewModel 해석 (Transient) + 내용 채우기
//!         ├─ ViewLocator::build_as::<ErrorView>
//!         └─ Dispatcher::post → ApplicationLifetime::show_dialog
//! ```
//!
//! 어느 스레드에서 호출되어도 창 조작은 UI 스레드에서 일어납니다.

use std::sync::Arc;
use log::debug;
use crate::core::dispatcher::Dispatcher;
use crate::core::errors::{AppError, AppResult};
use crate::core::faults::{FaultDisplay, FaultReport};
use crate::core::provider::{ServiceProvider, WeakProvider};
use crate::core::registry::{Construct, Lifetime};
use crate::services::lifetime::ApplicationLifetime;
use crate::view_models::windows::ErrorViewModel;
use crate::views::windows::ErrorView;
use crate::views::ViewLocator;

pub struct ExceptionService {
    provider: WeakProvider,
    locator: Arc<ViewLocator>,
    lifetime: Arc<ApplicationLifetime>,
    dispatcher: Arc<Dispatcher>,
}

impl ExceptionService {
    /// 에러 대화상자를 만듭니다. 화면에 띄우지는 않습니다.
    pub fn build_dialog(&self, report: &FaultReport, exit_after: bool) -> AppResult<Arc<ErrorView>> {
        let provider = self.provider.upgrade()?;
        let vm = provider.resolve::<ErrorViewModel>()?;
        vm.set_fault(report, exit_after);
        self.locator.build_as::<ErrorView>(vm)
    }
}

impl FaultDisplay for ExceptionService {
    fn show_fault(&self, report: &FaultReport, exit_after: bool) -> AppResult<()> {
        if self.dispatcher.is_closed() {
            return Err(AppError::DispatcherClosed);
        }

        let dialog = self.build_dialog(report, exit_after)?;
        debug!("Showing error dialog (exit_after = {})", exit_after);

        let lifetime = Arc::clone(&self.lifetime);
        self.dispatcher.post(move || lifetime.show_dialog(dialog));
        Ok(())
    }
}

impl Construct for ExceptionService {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(provider: &ServiceProvider) -> AppResult<Self> {
        Ok(Self {
            provider: provider.downgrade(),
            locator: provider.resolve()?,
            lifetime: provider.resolve()?,
            dispatcher: provider.resolve()?,
        })
    }
}

crate::register_service!(ExceptionService);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use crate::core::faults::FaultOrigin;
    use crate::core::registry::ServiceCollection;
    use crate::services::clipboard::Clipboard;
    use crate::views::{HasViewModel, TopLevel};

    fn provider(dispatcher: Arc<Dispatcher>) -> ServiceProvider {
        let mut services = ServiceCollection::new();
        services.add_instance(dispatcher).unwrap();
        services.add_constructed::<Clipboard>().unwrap();
        services.add_constructed::<ApplicationLifetime>().unwrap();
        services.add_constructed::<ErrorViewModel>().unwrap();
        services.add_constructed::<ErrorView>().unwrap();
        services.add_constructed::<ExceptionService>().unwrap();
        services
            .add_singleton(|provider| Ok(ViewLocator::with_bindings(provider).bind::<ErrorView, ErrorViewModel>()))
            .unwrap();
        services.build()
    }

    fn report() -> FaultReport {
        FaultReport {
            message: "Test".to_string(),
            detail: "Fault(\"Test\")".to_string(),
            origin: FaultOrigin::Foreground,
            terminating: false,
            occurred_at: Local::now(),
        }
    }

    #[test]
    fn test_show_fault_opens_dialog_on_ui_thread() {
        let dispatcher = Arc::new(Dispatcher::new());
        let provider = provider(dispatcher.clone());
        let service = provider.resolve::<ExceptionService>().unwrap();
        let lifetime = provider.resolve::<ApplicationLifetime>().unwrap();

        service.show_fault(&report(), false).unwrap();
        assert_eq!(lifetime.open_dialogs(), 0);

        assert_eq!(dispatcher.run_pending().unwrap(), 1);
        assert_eq!(lifetime.open_dialogs(), 1);

        let dialog = lifetime.top_dialog().unwrap();
        assert_eq!(dialog.window().title(), "Error");
        assert!(dialog.render().contains("Test"));
    }

    #[test]
    fn test_dialog_is_bound_to_filled_view_model() {
        let provider = provider(Arc::new(Dispatcher::new()));
        let service = provider.resolve::<ExceptionService>().unwrap();

        let dialog = service.build_dialog(&report(), true).unwrap();
        let vm = dialog.view_model().unwrap();

        assert_eq!(vm.message(), "Test");
        assert_eq!(vm.details(), "Fault(\"Test\")");
        assert!(vm.should_exit());
    }

    #[test]
    fn test_closing_fatal_dialog_requests_shutdown() {
        let dispatcher = Arc::new(Dispatcher::new());
        let provider = provider(dispatcher.clone());
        let service = provider.resolve::<ExceptionService>().unwrap();
        let lifetime = provider.resolve::<ApplicationLifetime>().unwrap();

        service.show_fault(&report(), true).unwrap();
        dispatcher.run_pending().unwrap();
        assert!(lifetime.dismiss_dialog());

        assert!(lifetime.is_shutdown_requested());
        assert!(dispatcher.is_closed());
    }

    #[test]
    fn test_closed_dispatcher_is_an_error() {
        let dispatcher = Arc::new(Dispatcher::new());
        let provider = provider(dispatcher.clone());
        let service = provider.resolve::<ExceptionService>().unwrap();
        dispatcher.shutdown();

        assert!(matches!(service.show_fault(&report(), false), Err(AppError::DispatcherClosed)));
    }
}
