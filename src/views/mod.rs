//! # Views
//!
//! 뷰모델을 화면에 표시하는 계층입니다. 실제 창 시스템 대신 헤드리스 요소 모델을 사용하며,
//! 창은 터미널에 그려집니다.
//!
//! ## 구성 요소
//!
//! | 타입 | 역할 |
//! |------|------|
//! | [`Element`] | 데이터 컨텍스트 + loaded/unloaded 이벤트 |
//! | [`View`] | 요소를 가진 모든 뷰 |
//! | [`TextBlock`] | 텍스트만 가진 자리표시자 |
//! | [`Window`] / [`TopLevel`] | 최상위 창, 대화상자 |
//! | [`HasViewModel`] | 데이터 컨텍스트를 구체 뷰모델 타입으로 꺼내는 접근자 |
//! | [`ViewLocator`] | 뷰모델 타입 → 뷰 타입 매핑 |

pub mod element;
pub mod locator;
pub mod windows;

use std::any::type_name;
use std::sync::Arc;
use parking_lot::RwLock;
use crate::core::errors::{AppError, AppResult};
use crate::core::registry::short_type_name;
use crate::view_models::{downcast_view_model, AsAny, ViewModel};

pub use element::{Element, HandlerId};
pub use locator::{ViewLocator, ViewRegistration};

/// 모든 뷰의 공통 trait
pub trait View: AsAny {
    fn element(&self) -> &Element;

    /// 터미널 출력용 표현
    fn render(&self) -> String {
        self.element().name().to_string()
    }
}

/// 데이터 컨텍스트를 기대하는 뷰모델 타입으로 꺼내는 접근자
pub trait HasViewModel: View + Sized {
    type Model: ViewModel;

    /// 데이터 컨텍스트가 없거나 타입이 다르면 `InvalidDataContext`
    fn view_model(&self) -> AppResult<Arc<Self::Model>> {
        self.element()
            .data_context()
            .and_then(|vm| downcast_view_model::<Self::Model>(&vm))
            .ok_or_else(|| AppError::InvalidDataContext {
                expected: short_type_name(type_name::<Self::Model>()),
            })
    }
}

/// 텍스트 자리표시자
#[derive(Debug)]
pub struct TextBlock {
    element: Element,
    text: String,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            element: Element::new("TextBlock"),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl View for TextBlock {
    fn element(&self) -> &Element {
        &self.element
    }

    fn render(&self) -> String {
        self.text.clone()
    }
}

/// 최상위 창
#[derive(Debug)]
pub struct Window {
    element: Element,
    title: RwLock<String>,
    owner: RwLock<Option<String>>,
}

impl Window {
    pub fn new(name: &str, title: impl Into<String>) -> Self {
        Self {
            element: Element::new(name),
            title: RwLock::new(title.into()),
            owner: RwLock::new(None),
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn title(&self) -> String {
        self.title.read().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write() = title.into();
    }

    /// 대화상자로 띄운 경우 소유 창의 제목
    pub fn owner(&self) -> Option<String> {
        self.owner.read().clone()
    }

    pub fn is_open(&self) -> bool {
        self.element.is_visible()
    }

    pub fn show(&self) -> bool {
        self.element.show()
    }

    /// `owner` 위에 모달 대화상자로 띄웁니다.
    pub fn show_dialog(&self, owner: Option<&Window>) -> bool {
        *self.owner.write() = owner.map(Window::title);
        self.element.show()
    }

    pub fn close(&self) -> bool {
        self.element.hide()
    }
}

/// 창을 가진 뷰
pub trait TopLevel: View {
    fn window(&self) -> &Window;
}
