//! 에러 대화상자

use crate::core::errors::AppResult;
use crate::core::provider::ServiceProvider;
use crate::core::registry::{Construct, Lifetime};
use crate::view_models::windows::ErrorViewModel;
use crate::views::{Element, HasViewModel, TopLevel, View, Window};

pub struct ErrorView {
    window: Window,
}

impl ErrorView {
    pub fn new() -> Self {
        Self {
            window: Window::new("ErrorView", "Error"),
        }
    }
}

impl Default for ErrorView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for ErrorView {
    fn element(&self) -> &Element {
        self.window.element()
    }

    fn render(&self) -> String {
        let vm = match self.view_model() {
            Ok(vm) => vm,
            Err(e) => return e.to_string(),
        };

        let mut body = vm.message();
        let details = vm.details();
        if !details.is_empty() {
            body.push_str("\n\nDetails:\n");
            body.push_str(&details);
        }
        body.push_str(if vm.should_exit() {
            "\n\n[dismiss] close and exit   [copy] copy to clipboard"
        } else {
            "\n\n[dismiss] close   [copy] copy to clipboard"
        });
        body
    }
}

impl HasViewModel for ErrorView {
    type Model = ErrorViewModel;
}

impl TopLevel for ErrorView {
    fn window(&self) -> &Window {
        &self.window
    }
}

impl Construct for ErrorView {
    const LIFETIME: Lifetime = Lifetime::Transient;

    fn construct(_: &ServiceProvider) -> AppResult<Self> {
        Ok(Self::new())
    }
}

crate::register_view!(ErrorView => ErrorViewModel);
