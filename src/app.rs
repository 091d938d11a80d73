//! # Composition Root
//!
//! 프로세스당 하나의 `App`이 서비스 프로바이더, UI 디스패처, 폴트 수집기를 소유합니다.
//! 전역 정적 로케이터는 없으며, 필요한 곳에 `App` 또는 `ServiceProvider`를 명시적으로 넘깁니다.
//!
//! ## 시작 순서
//!
//! ```text
//! App::build()
//!    ├─ [1] Dispatcher 인스턴스 + register_service!/register_view! 테이블 등록
//!    ├─ [2] ServiceProvider 생성 (SHELL_EAGER_INIT=true면 싱글톤 선생성)
//!    └─ [3] FaultSink ← ExceptionService 연결
//! App::show_root()          // UI 스레드에서
//! App::run()                // shutdown 요청까지 디스패처 루프
//! App::shutdown()           // 싱글톤 정리
//! ```

use std::sync::Arc;
use std::thread;
use log::{info, warn};
use crate::config::ResolverConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::errors::{AppError, AppResult, ErrorContext};
use crate::core::faults::{self, FaultOrigin, FaultRecord, FaultSink};
use crate::core::provider::ServiceProvider;
use crate::core::registry::{Lifetime, ServiceCollection};
use crate::services::{ApplicationLifetime, Clipboard, ExceptionService};
use crate::utils::display_terminal::{
    print_boxed_title, print_final_summary, print_step_complete, print_step_start,
};
use crate::view_models::downcast_view_model;
use crate::view_models::windows::{ErrorViewModel, RootViewModel};
use crate::views::windows::RootView;
use crate::views::{View, ViewLocator, ViewRegistration};

pub const HELP: &str = "\
Commands:
  error     raise a test fault from the root view model
  ui-panic  panic inside a UI action
  bg-error  fail a background task
  panic     panic on an unmanaged thread
  fatal     report a terminating fault (closing its dialog exits)
  dismiss   close the topmost dialog
  copy      copy the topmost error to the clipboard
  quit      shut down
  help      show this list";

struct AppInner {
    provider: ServiceProvider,
    dispatcher: Arc<Dispatcher>,
    faults: Arc<FaultSink>,
    lifetime: Arc<ApplicationLifetime>,
}

/// 애플리케이션 조합 루트 (복제본은 같은 상태를 공유)
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    /// 정적 등록 테이블의 모든 서비스로 만듭니다.
    pub fn build() -> AppResult<Self> {
        Self::build_with(ServiceCollection::new())
    }

    /// 미리 등록된 서비스에 정적 등록 테이블을 더해 만듭니다.
    pub fn build_with(mut services: ServiceCollection) -> AppResult<Self> {
        print_boxed_title("🚀 THANK YOU LETTER");

        print_step_start(1, "Registering services");
        let dispatcher = Arc::new(Dispatcher::new());
        services.add_instance(Arc::clone(&dispatcher))?;
        services.add_registered()?;
        print_step_complete(1, "Services registered", services.len());

        let singletons = services
            .descriptors()
            .filter(|d| d.lifetime() == Lifetime::Singleton)
            .count();
        let transients = services.len() - singletons;
        let views = inventory::iter::<ViewRegistration>().count();

        print_step_start(2, "Building service provider");
        let provider = services.build();
        if ResolverConfig::eager_init() {
            provider.initialize_all()?;
        }
        print_step_complete(2, "Service provider ready", singletons);

        print_step_start(3, "Connecting fault sink");
        let faults = Arc::new(FaultSink::new());
        dispatcher.set_fault_sink(&faults);
        let display: Arc<ExceptionService> = provider.resolve()?;
        faults.set_display(display);
        let lifetime: Arc<ApplicationLifetime> = provider.resolve()?;
        print_step_complete(3, "Fault sink connected", 1);

        print_final_summary(singletons, transients, views);

        Ok(Self {
            inner: Arc::new(AppInner {
                provider,
                dispatcher,
                faults,
                lifetime,
            }),
        })
    }

    pub fn provider(&self) -> &ServiceProvider {
        &self.inner.provider
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn faults(&self) -> &Arc<FaultSink> {
        &self.inner.faults
    }

    pub fn lifetime(&self) -> &Arc<ApplicationLifetime> {
        &self.inner.lifetime
    }

    /// 포착되지 않은 panic을 폴트 수집기로 보냅니다.
    pub fn install_panic_hook(&self) {
        faults::install_panic_hook(Arc::clone(&self.inner.faults), (*self.inner.dispatcher).clone());
    }

    /// 메인 창을 만들어 띄웁니다. UI 스레드에서 호출해야 합니다.
    pub fn show_root(&self) -> AppResult<()> {
        let vm = self.provider().resolve::<RootViewModel>()?;
        let locator = self.provider().resolve::<ViewLocator>()?;
        let view = locator.build_as::<RootView>(vm)?;
        self.lifetime().show_main_window(view);
        info!("🏠 Main window shown");
        Ok(())
    }

    /// 콘솔 명령 하나를 실행합니다. UI 스레드에서 호출해야 합니다.
    pub fn execute(&self, command: &str) -> AppResult<()> {
        match command.trim() {
            "" => Ok(()),
            "error" => self.provider().resolve::<RootViewModel>()?.show_error(),
            "ui-panic" => {
                self.dispatcher().post(|| panic!("UI action crashed"));
                Ok(())
            }
            "bg-error" => {
                self.faults().spawn_background("report-writer", || {
                    Err(AppError::Fault("Background report failed".to_string()))
                })?;
                Ok(())
            }
            "panic" => {
                thread::Builder::new()
                    .name("unmanaged-worker".to_string())
                    .spawn(crash_unmanaged_worker)
                    .context("Failed to spawn unmanaged worker")?;
                Ok(())
            }
            "fatal" => {
                self.faults().report(FaultRecord::new(
                    AppError::Fault("Fatal test fault".to_string()),
                    FaultOrigin::Foreground,
                    true,
                ));
                Ok(())
            }
            "dismiss" => {
                if !self.lifetime().dismiss_dialog() {
                    println!("No dialog is open.");
                }
                Ok(())
            }
            "copy" => self.copy_top_error(),
            "quit" | "exit" => {
                self.lifetime().request_shutdown();
                Ok(())
            }
            "help" => {
                println!("{}", HELP);
                Ok(())
            }
            other => {
                warn!("Unknown command: {}", other);
                println!("Unknown command '{}'. Type 'help' for the list.", other);
                Ok(())
            }
        }
    }

    /// `shutdown` 요청까지 디스패처 루프를 돌립니다.
    pub fn run(&self) -> AppResult<()> {
        self.dispatcher().run()
    }

    /// 창을 닫고 생성된 싱글톤을 역순으로 정리합니다.
    pub fn shutdown(&self) {
        self.lifetime().request_shutdown();
        self.provider().shutdown();
    }

    fn copy_top_error(&self) -> AppResult<()> {
        let vm = self
            .lifetime()
            .top_dialog()
            .and_then(|dialog| dialog.element().data_context())
            .and_then(|vm| downcast_view_model::<ErrorViewModel>(&vm));

        match vm {
            Some(vm) => {
                vm.copy_to_clipboard();
                let text = self.provider().resolve::<Clipboard>()?.text().unwrap_or_default();
                println!("📋 Copied:\n{}", text);
            }
            None => println!("No error dialog is open."),
        }
        Ok(())
    }
}

fn crash_unmanaged_worker() {
    panic!("Unmanaged worker crashed");
}
