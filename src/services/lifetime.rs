//! # Application Lifetime
//!
//! 메인 창 슬롯, 열린 대화상자 스택, 종료 요청을 관리합니다.
//!
//! 모든 창 조작은 UI 스레드에서 호출된다고 가정합니다. 다른 스레드에서는
//! `Dispatcher::post`로 넘겨서 호출합니다.
//!
//! ```text
//! request_shutdown()
//!    ├─ 열린 대화상자를 위에서부터 닫음   (unloaded 이벤트 발생)
//!    ├─ 메인 창을 닫음
//!    └─ Dispatcher::shutdown()         (run 루프 종료)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::info;
use parking_lot::{Mutex, RwLock};
use crate::core::dispatcher::Dispatcher;
use crate::core::errors::AppResult;
use crate::core::provider::ServiceProvider;
use crate::core::registry::{Construct, Lifetime};
use crate::utils::display_terminal::render_window;
use crate::views::{TopLevel, View};

pub struct ApplicationLifetime {
    dispatcher: Arc<Dispatcher>,
    main_window: RwLock<Option<Arc<dyn TopLevel>>>,
    dialogs: Mutex<Vec<Arc<dyn TopLevel>>>,
    shutdown_requested: AtomicBool,
}

impl ApplicationLifetime {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            main_window: RwLock::new(None),
            dialogs: Mutex::new(Vec::new()),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    /// 메인 창으로 지정하고 화면에 띄웁니다.
    pub fn show_main_window(&self, view: Arc<dyn TopLevel>) {
        *self.main_window.write() = Some(Arc::clone(&view));
        if view.window().show() {
            println!("{}", render_window(&view.window().title(), &view.render()));
        }
    }

    pub fn main_window(&self) -> Option<Arc<dyn TopLevel>> {
        self.main_window.read().clone()
    }

    /// 메인 창 위에 모달 대화상자로 띄웁니다.
    pub fn show_dialog(&self, view: Arc<dyn TopLevel>) {
        if self.is_shutdown_requested() {
            return;
        }
        let owner = self.main_window();
        let shown = view.window().show_dialog(owner.as_ref().map(|owner| owner.window()));
        if shown {
            println!("{}", render_window(&view.window().title(), &view.render()));
            self.dialogs.lock().push(view);
        }
    }

    /// 가장 위의 대화상자를 닫습니다. 열린 대화상자가 없으면 `false`
    pub fn dismiss_dialog(&self) -> bool {
        let top = self.dialogs.lock().pop();
        match top {
            Some(dialog) => {
                dialog.window().close();
                true
            }
            None => false,
        }
    }

    pub fn top_dialog(&self) -> Option<Arc<dyn TopLevel>> {
        self.dialogs.lock().last().cloned()
    }

    pub fn open_dialogs(&self) -> usize {
        self.dialogs.lock().len()
    }

    /// 모든 창을 닫고 디스패처를 멈춥니다. 두 번째 호출부터는 아무것도 하지 않습니다.
    pub fn request_shutdown(&self) {
        if self.shutdown_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("👋 Shutdown requested");

        let dialogs = std::mem::take(&mut *self.dialogs.lock());
        for dialog in dialogs.into_iter().rev() {
            dialog.window().close();
        }
        let main_window = self.main_window.write().take();
        if let Some(main_window) = main_window {
            main_window.window().close();
        }

        self.dispatcher.shutdown();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }
}

impl Construct for ApplicationLifetime {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(provider: &ServiceProvider) -> AppResult<Self> {
        Ok(Self::new(provider.resolve::<Dispatcher>()?))
    }
}

crate::register_service!(ApplicationLifetime);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{Element, Window};

    struct TestWindow {
        window: Window,
    }

    impl TestWindow {
        fn new(title: &str) -> Arc<Self> {
            Arc::new(Self { window: Window::new("TestWindow", title) })
        }
    }

    impl View for TestWindow {
        fn element(&self) -> &Element {
            self.window.element()
        }
    }

    impl TopLevel for TestWindow {
        fn window(&self) -> &Window {
            &self.window
        }
    }

    #[test]
    fn test_dialogs_stack_on_main_window() {
        let lifetime = ApplicationLifetime::new(Arc::new(Dispatcher::new()));
        let main = TestWindow::new("Main");
        let first = TestWindow::new("First");
        let second = TestWindow::new("Second");

        lifetime.show_main_window(main.clone());
        lifetime.show_dialog(first.clone());
        lifetime.show_dialog(second.clone());

        assert_eq!(lifetime.open_dialogs(), 2);
        assert_eq!(first.window.owner().as_deref(), Some("Main"));

        assert!(lifetime.dismiss_dialog());
        assert!(!second.window.is_open());
        assert!(first.window.is_open());
        assert!(lifetime.dismiss_dialog());
        assert!(!lifetime.dismiss_dialog());
    }

    #[test]
    fn test_request_shutdown_closes_everything_once() {
        let dispatcher = Arc::new(Dispatcher::new());
        let lifetime = ApplicationLifetime::new(dispatcher.clone());
        let main = TestWindow::new("Main");
        let dialog = TestWindow::new("Dialog");
        lifetime.show_main_window(main.clone());
        lifetime.show_dialog(dialog.clone());

        lifetime.request_shutdown();
        lifetime.request_shutdown();

        assert!(lifetime.is_shutdown_requested());
        assert!(!main.window.is_open());
        assert!(!dialog.window.is_open());
        assert!(lifetime.main_window().is_none());
        assert!(dispatcher.is_closed());

        lifetime.show_dialog(TestWindow::new("Late"));
        assert_eq!(lifetime.open_dialogs(), 0);
    }
}
