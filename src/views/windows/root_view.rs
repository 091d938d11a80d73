//! 메인 창

use crate::core::errors::AppResult;
use crate::core::provider::ServiceProvider;
use crate::core::registry::{Construct, Lifetime};
use crate::view_models::windows::RootViewModel;
use crate::views::{Element, HasViewModel, TopLevel, View, Window};

pub const ROOT_TITLE: &str = "Thank You Letter";

pub struct RootView {
    window: Window,
}

impl RootView {
    pub fn new() -> Self {
        Self {
            window: Window::new("RootView", ROOT_TITLE),
        }
    }
}

impl Default for RootView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for RootView {
    fn element(&self) -> &Element {
        self.window.element()
    }

    fn render(&self) -> String {
        match self.view_model() {
            Ok(vm) => format!(
                "{}\n\nType 'error' to raise a test fault, 'help' for all commands.",
                vm.greeting()
            ),
            Err(e) => e.to_string(),
        }
    }
}

impl HasViewModel for RootView {
    type Model = RootViewModel;
}

impl TopLevel for RootView {
    fn window(&self) -> &Window {
        &self.window
    }
}

impl Construct for RootView {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(_: &ServiceProvider) -> AppResult<Self> {
        Ok(Self::new())
    }
}

crate::register_view!(RootView => RootViewModel);
