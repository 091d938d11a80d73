//! 프로세스 내부 클립보드
//!
//! 창 시스템의 클립보드 대신 마지막으로 복사된 텍스트를 보관합니다.

use log::debug;
use parking_lot::RwLock;
use crate::core::errors::AppResult;
use crate::core::provider::ServiceProvider;
use crate::core::registry::{Construct, Lifetime};

#[derive(Debug, Default)]
pub struct Clipboard {
    text: RwLock<Option<String>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        debug!("📋 Copied {} chars to clipboard", text.chars().count());
        *self.text.write() = Some(text);
    }

    pub fn text(&self) -> Option<String> {
        self.text.read().clone()
    }
}

impl Construct for Clipboard {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(_: &ServiceProvider) -> AppResult<Self> {
        Ok(Self::new())
    }
}

crate::register_service!(Clipboard);
