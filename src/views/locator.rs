//! # View Locator
//!
//! 뷰모델 인스턴스의 구체 타입으로 등록된 뷰를 찾아 만들고, 데이터 컨텍스트와
//! 생명주기 훅을 연결합니다.
//!
//! ## 바인딩 규칙
//!
//! | 입력 | 결과 |
//! |------|------|
//! | 뷰모델이 아니거나 없음 | `TextBlock("ViewModel is null or does not inherit from ViewModel")` |
//! | `Arc<dyn ViewModel>` 또는 바인딩된 `Arc<M>` | 아래 규칙으로 진행 |
//! | 바인딩 없음 | `TextBlock("Could not find view for {type}")` + warn 로그 |
//! | 뷰 해석 실패 | 에러 메시지를 담은 `TextBlock` + error 로그 |
//! | 정상 | 데이터 컨텍스트가 설정되고 훅이 연결된 뷰 |
//!
//! `build_content`는 `&dyn Any`만 받으므로 바인딩이 없는 구체 타입 `Arc<M>`은
//! 뷰모델로 인식하지 못하고 첫 행으로 처리됩니다. 구체 타입을 알면 `build`를 사용합니다.
//!
//! 뷰 인스턴스는 프로바이더에서 해석하므로 뷰 타입의 `Construct::LIFETIME`이 그대로 적용됩니다.
//!
//! ```rust,ignore
//! register_view!(RootView => RootViewModel);
//!
//! let locator = provider.resolve::<ViewLocator>()?;
//! let view = locator.build(provider.resolve::<RootViewModel>()?);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use log::{debug, error, warn};
use once_cell::sync::OnceCell;
use crate::core::errors::{AppError, AppResult};
use crate::core::provider::{ServiceProvider, WeakProvider};
use crate::core::registry::{Construct, Lifetime, TypeKey};
use crate::view_models::ViewModel;
use crate::views::{HandlerId, TextBlock, View};

pub const NOT_A_VIEW_MODEL: &str = "ViewModel is null or does not inherit from ViewModel";

type ViewFactory = fn(&ServiceProvider) -> AppResult<Arc<dyn View>>;

/// `&dyn Any`에 담긴 `Arc<M>`을 `Arc<dyn ViewModel>`로 바꿉니다.
type Upcast = fn(&dyn Any) -> Option<Arc<dyn ViewModel>>;

/// 정적 뷰 등록 테이블의 항목
///
/// `register_view!` 매크로가 생성하며 `inventory`로 수집됩니다.
pub struct ViewRegistration {
    pub view_model: fn() -> TypeKey,
    pub view: fn() -> TypeKey,
    pub factory: ViewFactory,
    /// `TypeId::of::<Arc<M>>`
    pub handle: fn() -> TypeId,
    pub upcast: Upcast,
}

impl ViewRegistration {
    pub const fn of<V, M>() -> Self
    where
        V: View + Construct,
        M: ViewModel + Construct,
    {
        Self {
            view_model: TypeKey::of::<M>,
            view: TypeKey::of::<V>,
            factory: resolve_view::<V>,
            handle: TypeId::of::<Arc<M>>,
            upcast: upcast::<M>,
        }
    }
}

inventory::collect!(ViewRegistration);

fn upcast<M: ViewModel>(content: &dyn Any) -> Option<Arc<dyn ViewModel>> {
    let vm: Arc<dyn ViewModel> = content.downcast_ref::<Arc<M>>()?.clone();
    Some(vm)
}

fn resolve_view<V: View>(provider: &ServiceProvider) -> AppResult<Arc<dyn View>> {
    let view: Arc<dyn View> = provider.resolve::<V>()?;
    Ok(view)
}

/// 뷰와 뷰모델을 서비스로 등록하고 둘을 연결합니다.
///
/// ```rust,ignore
/// register_view!(ErrorView => ErrorViewModel);
/// ```
#[macro_export]
macro_rules! register_view {
    ($view:ty => $view_model:ty) => {
        $crate::inventory::submit! {
            $crate::views::locator::ViewRegistration::of::<$view, $view_model>()
        }
        $crate::register_service!($view, $view_model);
    };
}

#[derive(Clone, Copy)]
struct ViewBinding {
    view: TypeKey,
    factory: ViewFactory,
}

/// 뷰모델 타입 → 뷰 타입 매핑
///
/// 테이블은 생성 시 한 번 만들어지고 이후 읽기 전용입니다.
pub struct ViewLocator {
    provider: WeakProvider,
    bindings: HashMap<TypeId, ViewBinding>,
    handles: HashMap<TypeId, Upcast>,
}

impl ViewLocator {
    /// `register_view!`로 수집된 모든 바인딩으로 만듭니다.
    pub fn new(provider: &ServiceProvider) -> Self {
        let mut locator = Self::with_bindings(provider);
        for registration in inventory::iter::<ViewRegistration>() {
            locator.insert((registration.view_model)(), (registration.view)(), registration.factory);
            locator.handles.insert((registration.handle)(), registration.upcast);
        }
        debug!("🪟 ViewLocator ready with {} binding(s)", locator.len());
        locator
    }

    /// 빈 테이블로 시작합니다. `bind`로 직접 채웁니다.
    pub fn with_bindings(provider: &ServiceProvider) -> Self {
        Self {
            provider: provider.downgrade(),
            bindings: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    /// 같은 뷰모델 타입에 대한 첫 바인딩이 유지됩니다.
    pub fn bind<V, M>(mut self) -> Self
    where
        V: View,
        M: ViewModel,
    {
        self.insert(TypeKey::of::<M>(), TypeKey::of::<V>(), resolve_view::<V>);
        self.handles.insert(TypeId::of::<Arc<M>>(), upcast::<M>);
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 뷰모델 타입에 연결된 뷰 타입
    pub fn view_for<M: ViewModel>(&self) -> Option<TypeKey> {
        self.bindings.get(&TypeId::of::<M>()).map(|binding| binding.view)
    }

    /// 내용이 뷰모델인지 확인합니다.
    ///
    /// `Arc<dyn ViewModel>`과 바인딩된 뷰모델의 `Arc<M>`만 인식합니다.
    pub fn matches(&self, content: Option<&dyn Any>) -> bool {
        content.and_then(|content| self.view_model_of(content)).is_some()
    }

    /// 타입을 알 수 없는 내용으로 뷰를 만듭니다. 인식 규칙은 `matches`와 같습니다.
    pub fn build_content(&self, content: Option<&dyn Any>) -> Arc<dyn View> {
        match content.and_then(|content| self.view_model_of(content)) {
            Some(vm) => self.build(vm),
            None => Arc::new(TextBlock::new(NOT_A_VIEW_MODEL)),
        }
    }

    fn view_model_of(&self, content: &dyn Any) -> Option<Arc<dyn ViewModel>> {
        if let Some(vm) = content.downcast_ref::<Arc<dyn ViewModel>>() {
            return Some(Arc::clone(vm));
        }
        let upcast = self.handles.get(&(*content).type_id())?;
        upcast(content)
    }

    /// 뷰모델에 맞는 뷰를 만들고 데이터 컨텍스트와 생명주기 훅을 연결합니다.
    pub fn build(&self, vm: Arc<dyn ViewModel>) -> Arc<dyn View> {
        let key = (*vm).type_key();
        let Some(binding) = self.bindings.get(&key.id()) else {
            warn!("⚠️ Could not find view for {}", key);
            return Arc::new(TextBlock::new(format!("Could not find view for {}", key.full_name())));
        };

        let view = match self.provider.upgrade().and_then(|provider| (binding.factory)(&provider)) {
            Ok(view) => view,
            Err(e) => {
                error!("❌ Failed to create {} for {}: {}", binding.view, key, e);
                return Arc::new(TextBlock::new(e.to_string()));
            }
        };

        view.element().set_data_context(Some(Arc::clone(&vm)));
        attach_lifecycle(&*view, vm);
        view
    }

    /// 특정 뷰 타입으로 만듭니다. 연결된 뷰가 `V`가 아니면 `TypeMismatch`
    pub fn build_as<V: View>(&self, vm: Arc<dyn ViewModel>) -> AppResult<Arc<V>> {
        let view = self.build(vm);
        view.into_any().downcast::<V>().map_err(|_| AppError::TypeMismatch {
            service: TypeKey::of::<V>().to_string(),
        })
    }

    fn insert(&mut self, view_model: TypeKey, view: TypeKey, factory: ViewFactory) {
        if let Some(existing) = self.bindings.get(&view_model.id()) {
            debug!(
                "Keeping {} for {}, ignoring {}",
                existing.view, view_model, view
            );
            return;
        }
        self.bindings.insert(view_model.id(), ViewBinding { view, factory });
    }
}

impl Construct for ViewLocator {
    const LIFETIME: Lifetime = Lifetime::Singleton;

    fn construct(provider: &ServiceProvider) -> AppResult<Self> {
        Ok(Self::new(provider))
    }
}

crate::register_service!(ViewLocator);

/// loaded → `on_loaded`, unloaded → `on_unloaded` 후 두 훅 모두 해제
fn attach_lifecycle(view: &dyn View, vm: Arc<dyn ViewModel>) {
    let hooks: Arc<OnceCell<(HandlerId, HandlerId)>> = Arc::new(OnceCell::new());
    let element = view.element();

    let loaded = {
        let vm = Arc::clone(&vm);
        element.on_loaded(move |_| vm.on_loaded())
    };
    let unloaded = {
        let hooks = Arc::clone(&hooks);
        element.on_unloaded(move |el| {
            vm.on_unloaded();
            if let Some((loaded, unloaded)) = hooks.get() {
                el.detach_loaded(*loaded);
                el.detach_unloaded(*unloaded);
            }
        })
    };
    let _ = hooks.set((loaded, unloaded));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ServiceCollection;
    use crate::views::{Element, HasViewModel};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct EditorViewModel {
        events: Mutex<Vec<&'static str>>,
    }

    impl ViewModel for EditorViewModel {
        fn on_loaded(&self) {
            self.events.lock().push("loaded");
        }

        fn on_unloaded(&self) {
            self.events.lock().push("unloaded");
        }
    }

    struct OrphanViewModel;
    impl ViewModel for OrphanViewModel {}

    struct BrokenViewModel;
    impl ViewModel for BrokenViewModel {}

    struct EditorView {
        element: Element,
    }

    impl View for EditorView {
        fn element(&self) -> &Element {
            &self.element
        }
    }

    impl HasViewModel for EditorView {
        type Model = EditorViewModel;
    }

    struct OtherEditorView {
        element: Element,
    }

    impl View for OtherEditorView {
        fn element(&self) -> &Element {
            &self.element
        }
    }

    struct BrokenView {
        element: Element,
    }

    impl View for BrokenView {
        fn element(&self) -> &Element {
            &self.element
        }
    }

    fn provider() -> ServiceProvider {
        let mut services = ServiceCollection::new();
        services
            .add_transient(|_| Ok(EditorView { element: Element::new("EditorView") }))
            .unwrap();
        services
            .add_transient(|_| Ok(OtherEditorView { element: Element::new("OtherEditorView") }))
            .unwrap();
        services
            .add_transient::<BrokenView, _>(|_| Err(AppError::Fault("missing template".to_string())))
            .unwrap();
        services.build()
    }

    fn locator(provider: &ServiceProvider) -> ViewLocator {
        ViewLocator::with_bindings(provider)
            .bind::<EditorView, EditorViewModel>()
            .bind::<OtherEditorView, EditorViewModel>()
            .bind::<BrokenView, BrokenViewModel>()
    }

    fn text_of(view: &Arc<dyn View>) -> String {
        view.render()
    }

    #[test]
    fn test_build_sets_data_context_to_same_instance() {
        let provider = provider();
        let locator = locator(&provider);
        let vm: Arc<dyn ViewModel> = Arc::new(EditorViewModel::default());

        let view = locator.build(Arc::clone(&vm));
        let context = view.element().data_context().unwrap();

        assert!(Arc::ptr_eq(&context, &vm));
        assert!((*view).as_any().is::<EditorView>());
    }

    #[test]
    fn test_first_binding_wins() {
        let provider = provider();
        let locator = locator(&provider);

        assert_eq!(locator.len(), 2);
        assert_eq!(locator.view_for::<EditorViewModel>(), Some(TypeKey::of::<EditorView>()));
    }

    #[test]
    fn test_unmapped_view_model_gets_placeholder() {
        let provider = provider();
        let locator = locator(&provider);

        let view = locator.build(Arc::new(OrphanViewModel));

        assert!((*view).as_any().is::<TextBlock>());
        let text = text_of(&view);
        assert!(text.starts_with("Could not find view for "));
        assert!(text.ends_with("OrphanViewModel"));
    }

    #[test]
    fn test_non_view_model_content_gets_placeholder() {
        let provider = provider();
        let locator = locator(&provider);

        assert_eq!(text_of(&locator.build_content(None)), NOT_A_VIEW_MODEL);
        assert_eq!(text_of(&locator.build_content(Some(&42u32))), NOT_A_VIEW_MODEL);
        assert!(!locator.matches(Some(&"text")));

        let vm: Arc<dyn ViewModel> = Arc::new(EditorViewModel::default());
        assert!(locator.matches(Some(&vm)));
        assert!((*locator.build_content(Some(&vm))).as_any().is::<EditorView>());
    }

    #[test]
    fn test_concrete_handle_content_is_recognized_only_when_bound() {
        let provider = provider();
        let locator = locator(&provider);

        let bound = Arc::new(EditorViewModel::default());
        assert!(locator.matches(Some(&bound)));
        let view = locator.build_content(Some(&bound));
        assert!((*view).as_any().is::<EditorView>());
        let context = view.element().data_context().unwrap();
        assert!(Arc::ptr_eq(&context, &(bound.clone() as Arc<dyn ViewModel>)));

        // 바인딩이 없는 구체 타입은 Any만으로는 뷰모델인지 알 수 없음
        let orphan = Arc::new(OrphanViewModel);
        assert!(!locator.matches(Some(&orphan)));
        assert_eq!(text_of(&locator.build_content(Some(&orphan))), NOT_A_VIEW_MODEL);
    }

    #[test]
    fn test_view_construction_failure_becomes_placeholder() {
        let provider = provider();
        let locator = locator(&provider);

        let view = locator.build(Arc::new(BrokenViewModel));
        assert_eq!(text_of(&view), "missing template");
    }

    #[test]
    fn test_lifecycle_hooks_fire_once_and_detach() {
        let provider = provider();
        let locator = locator(&provider);
        let vm = Arc::new(EditorViewModel::default());

        let view = locator.build_as::<EditorView>(vm.clone()).unwrap();
        assert_eq!(view.element().handler_counts(), (1, 1));

        view.element().show();
        view.element().hide();
        view.element().hide();
        view.element().show();
        view.element().hide();

        assert_eq!(*vm.events.lock(), vec!["loaded", "unloaded"]);
        assert_eq!(view.element().handler_counts(), (0, 0));
        assert!(Arc::ptr_eq(&view.view_model().unwrap(), &vm));
    }

    #[test]
    fn test_each_view_gets_its_own_hooks() {
        let provider = provider();
        let locator = locator(&provider);
        let vm = Arc::new(EditorViewModel::default());

        let first = locator.build_as::<EditorView>(vm.clone()).unwrap();
        let second = locator.build_as::<EditorView>(vm.clone()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        first.element().show();
        second.element().show();
        first.element().hide();

        assert_eq!(*vm.events.lock(), vec!["loaded", "loaded", "unloaded"]);
        assert_eq!(second.element().handler_counts(), (1, 1));
    }

    #[test]
    fn test_build_as_wrong_type_is_mismatch() {
        let provider = provider();
        let locator = locator(&provider);

        let result = locator.build_as::<OtherEditorView>(Arc::new(EditorViewModel::default()));
        assert!(matches!(result, Err(AppError::TypeMismatch { .. })));
    }

    #[test]
    fn test_dropped_provider_yields_placeholder() {
        let provider = provider();
        let locator = locator(&provider);
        drop(provider);

        let view = locator.build(Arc::new(EditorViewModel::default()));
        assert_eq!(text_of(&view), AppError::ProviderDisposed.to_string());
    }
}
