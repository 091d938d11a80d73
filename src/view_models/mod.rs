//! # View Models
//!
//! 뷰에 바인딩되는 상태와 명령을 담는 계층입니다. 뷰모델은 자신을 표시할 뷰를 모르며,
//! `ViewLocator`가 뷰모델의 구체 타입으로 뷰를 찾아 연결합니다.
//!
//! ## 생명주기
//!
//! ```text
//! ViewLocator::build(vm)
//!    └─ view.loaded   → vm.on_loaded()
//!    └─ view.unloaded → vm.on_unloaded() → 두 훅 모두 해제
//! ```
//!
//! 명시적 해제가 필요한 뷰모델은 `Disposable` + `DisposeFlag`를 사용합니다.

pub mod windows;

use std::any::Any;
use std::sync::Arc;
use crate::core::registry::TypeKey;

pub use crate::core::registry::{Disposable, DisposeFlag};

/// 타입 소거된 값을 구체 타입으로 되돌리기 위한 trait
///
/// `Arc<dyn ViewModel>`에서 호출할 때는 `(*vm).as_any()`처럼 역참조해야
/// `Arc` 자체가 아닌 안쪽 값의 타입을 얻습니다.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// 구체 타입의 키
    fn type_key(&self) -> TypeKey;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }
}

/// 모든 뷰모델의 공통 trait
pub trait ViewModel: AsAny {
    /// 연결된 뷰가 화면에 올라왔을 때
    fn on_loaded(&self) {}

    /// 연결된 뷰가 화면에서 내려갔을 때
    fn on_unloaded(&self) {}
}

/// 뷰모델 타입으로 다운캐스트합니다.
pub fn downcast_view_model<M: ViewModel>(vm: &Arc<dyn ViewModel>) -> Option<Arc<M>> {
    Arc::clone(vm).into_any().downcast::<M>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;
    impl ViewModel for Greeter {}

    struct Farewell;
    impl ViewModel for Farewell {}

    #[test]
    fn test_type_key_sees_through_trait_object() {
        let vm: Arc<dyn ViewModel> = Arc::new(Greeter);

        assert_eq!((*vm).type_key(), TypeKey::of::<Greeter>());
        assert!((*vm).as_any().is::<Greeter>());
    }

    #[test]
    fn test_downcast_view_model() {
        let vm: Arc<dyn ViewModel> = Arc::new(Greeter);

        let greeter = downcast_view_model::<Greeter>(&vm).unwrap();
        assert!(std::ptr::eq(
            Arc::as_ptr(&greeter) as *const u8,
            Arc::as_ptr(&vm) as *const u8
        ));
        assert!(downcast_view_model::<Farewell>(&vm).is_none());
    }
}
