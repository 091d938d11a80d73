//! # Service Registry - 싱글톤/트랜지언트 등록 테이블
//!
//! 이 모듈은 셸의 의존성 주입 시스템에서 "등록" 단계를 담당합니다.
//! 요청 타입(`TypeKey`)마다 정확히 하나의 `ServiceDescriptor`를 보관하며,
//! 조합이 끝나면 `ServiceCollection::build()`로 읽기 전용 `ServiceProvider`를 만듭니다.
//!
//! ## 등록 경로
//!
//! | 경로 | 중복 시 동작 | 용도 |
//! |------|--------------|------|
//! | `add_singleton` / `add_transient` | `DuplicateRegistration` 에러 | 명시적 팩토리 |
//! | `add_instance` | `DuplicateRegistration` 에러 | 미리 만들어진 인프라 객체 |
//! | `add_constructed::<T>()` | `DuplicateRegistration` 에러 | 생성자 주입 (`Construct`) |
//! | `try_add_singleton` / `try_add_transient` | 기존 등록 유지, `false` 반환 | 기본값 제공 |
//! | `add_registered()` | `DuplicateRegistration` 에러 | `register_service!` 테이블 전체 |
//!
//! ## 정적 등록 테이블
//!
//! 런타임 리플렉션 대신 `inventory`로 컴파일 타임에 등록 정보를 수집합니다.
//!
//! ```rust,ignore
//! struct Clipboard;
//!
//! impl Construct for Clipboard {
//!     const LIFETIME: Lifetime = Lifetime::Singleton;
//!
//!     fn construct(_: &ServiceProvider) -> AppResult<Self> {
//!         Ok(Clipboard)
//!     }
//! }
//!
//! register_service!(Clipboard);
//!
//! let mut services = ServiceCollection::new();
//! services.add_registered()?;
//! let provider = services.build();
//! let clipboard = provider.resolve::<Clipboard>()?;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use log::debug;
use crate::config::ResolverConfig;
use crate::core::errors::{AppError, AppResult};
use crate::core::provider::ServiceProvider;

/// 타입 소거된 서비스 인스턴스
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 타입 소거된 팩토리
pub(crate) type Factory = Arc<dyn Fn(&ServiceProvider) -> AppResult<Instance> + Send + Sync>;

/// 프로바이더 종료 시 싱글톤 인스턴스에 대해 호출되는 정리 함수
pub(crate) type Teardown = fn(&Instance);

/// 요청된 기능을 식별하는 키
///
/// 동등성과 해시는 `TypeId`만으로 결정되며, 이름은 진단 메시지용입니다.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 모듈 경로를 포함한 전체 타입 이름
    pub fn full_name(&self) -> &'static str {
        self.name
    }

    /// 모듈 경로를 제거한 타입 이름 (제네릭 인자 유지)
    ///
    /// `thank_you_letter::core::provider::LazyService<thank_you_letter::A>`
    /// → `LazyService<A>`
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

/// `std::any::type_name`의 각 경로 세그먼트에서 모듈 경로를 제거합니다.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;

    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';') {
            out.push_str(strip_module_path(&full[segment_start..i]));
            out.push(c);
            segment_start = i + c.len_utf8();
        }
    }
    out.push_str(strip_module_path(&full[segment_start..]));
    out
}

fn strip_module_path(segment: &str) -> &str {
    match segment.rfind("::") {
        Some(pos) => &segment[pos + 2..],
        None => segment,
    }
}

/// 서비스 수명
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// 프로세스당 하나, 첫 요청 시 생성
    Singleton,
    /// 요청마다 새 인스턴스
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::Transient => f.write_str("transient"),
        }
    }
}

/// 생성자 주입을 지원하는 타입
///
/// `construct`는 필요한 의존성을 프로바이더에서 해석해 인스턴스를 만듭니다.
/// `LIFETIME`은 타입에 붙는 수명 플래그로, `add_constructed`와 `register_service!`,
/// 그리고 뷰 로케이터가 뷰를 만들 때 사용합니다.
pub trait Construct: Sized + Send + Sync + 'static {
    const LIFETIME: Lifetime = Lifetime::Transient;

    fn construct(provider: &ServiceProvider) -> AppResult<Self>;

    /// 프로바이더 종료 시 싱글톤 인스턴스에 대해 한 번 호출됩니다.
    fn shutdown(&self) {}
}

/// 명시적으로 해제되는 타입
///
/// 종료자 대신 `ServiceProvider::shutdown()`이 생성 역순으로 `dispose`를 호출합니다.
/// 여러 번 호출되어도 안전해야 하며, 보통 `DisposeFlag`로 두 번째 호출을 무시합니다.
pub trait Disposable: Send + Sync + 'static {
    fn dispose(&self);
}

/// 한 번만 `true`를 돌려주는 해제 플래그
#[derive(Debug, Default)]
pub struct DisposeFlag(AtomicBool);

impl DisposeFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// 처음 호출될 때만 `true`
    pub fn begin(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_disposed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// 등록 항목: 키 + 수명 + 팩토리
///
/// 조합 단계에서 한 번 만들어지고 이후 변경되지 않습니다.
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub(crate) key: TypeKey,
    pub(crate) lifetime: Lifetime,
    pub(crate) factory: Factory,
    pub(crate) teardown: Option<Teardown>,
}

impl ServiceDescriptor {
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    fn new<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<T> + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            lifetime,
            factory: Arc::new(move |provider: &ServiceProvider| {
                factory(provider).map(|value| Arc::new(value) as Instance)
            }),
            teardown: None,
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

/// 서비스 등록 빌더
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
    index: HashMap<TypeId, usize>,
    contention_timeout: Duration,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
            contention_timeout: ResolverConfig::contention_timeout(),
        }
    }

    /// 다른 스레드가 생성 중인 싱글톤을 기다리는 최대 시간을 지정합니다.
    pub fn with_contention_timeout(mut self, timeout: Duration) -> Self {
        self.contention_timeout = timeout;
        self
    }

    pub fn add_singleton<T, F>(&mut self, factory: F) -> AppResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<T> + Send + Sync + 'static,
    {
        self.insert(ServiceDescriptor::new::<T, F>(Lifetime::Singleton, factory), false)?;
        Ok(self)
    }

    pub fn add_transient<T, F>(&mut self, factory: F) -> AppResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<T> + Send + Sync + 'static,
    {
        self.insert(ServiceDescriptor::new::<T, F>(Lifetime::Transient, factory), false)?;
        Ok(self)
    }

    /// 외부에서 생성된 인스턴스를 싱글톤으로 등록합니다.
    pub fn add_instance<T: Send + Sync + 'static>(&mut self, instance: Arc<T>) -> AppResult<&mut Self> {
        let descriptor = ServiceDescriptor {
            key: TypeKey::of::<T>(),
            lifetime: Lifetime::Singleton,
            factory: Arc::new(move |_: &ServiceProvider| Ok(instance.clone() as Instance)),
            teardown: None,
        };
        self.insert(descriptor, false)?;
        Ok(self)
    }

    /// `T::LIFETIME`과 `T::construct`로 등록합니다.
    pub fn add_constructed<T: Construct>(&mut self) -> AppResult<&mut Self> {
        let mut descriptor = ServiceDescriptor::new::<T, _>(T::LIFETIME, T::construct);
        if T::LIFETIME == Lifetime::Singleton {
            descriptor.teardown = Some(shutdown_constructed::<T>);
        }
        self.insert(descriptor, false)?;
        Ok(self)
    }

    /// 프로바이더 종료 시 `dispose`가 호출되는 싱글톤을 등록합니다.
    pub fn add_disposable_singleton<T, F>(&mut self, factory: F) -> AppResult<&mut Self>
    where
        T: Disposable,
        F: Fn(&ServiceProvider) -> AppResult<T> + Send + Sync + 'static,
    {
        let mut descriptor = ServiceDescriptor::new::<T, F>(Lifetime::Singleton, factory);
        descriptor.teardown = Some(dispose_instance::<T>);
        self.insert(descriptor, false)?;
        Ok(self)
    }

    /// 이미 등록된 키면 기존 등록을 유지하고 `false`를 반환합니다.
    pub fn try_add_singleton<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<T> + Send + Sync + 'static,
    {
        matches!(self.insert(ServiceDescriptor::new::<T, F>(Lifetime::Singleton, factory), true), Ok(true))
    }

    /// 이미 등록된 키면 기존 등록을 유지하고 `false`를 반환합니다.
    pub fn try_add_transient<T, F>(&mut self, factory: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<T> + Send + Sync + 'static,
    {
        matches!(self.insert(ServiceDescriptor::new::<T, F>(Lifetime::Transient, factory), true), Ok(true))
    }

    /// `register_service!` / `register_view!`로 수집된 모든 타입을 등록합니다.
    pub fn add_registered(&mut self) -> AppResult<&mut Self> {
        for registration in inventory::iter::<ServiceRegistration>() {
            debug!("📦 Registering: {}", short_type_name((registration.name)()));
            (registration.register)(self)?;
        }
        Ok(self)
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.iter()
    }

    /// 등록을 확정하고 읽기 전용 프로바이더를 만듭니다.
    pub fn build(self) -> ServiceProvider {
        ServiceProvider::from_descriptors(self.descriptors, self.contention_timeout)
    }

    fn insert(&mut self, descriptor: ServiceDescriptor, keep_existing: bool) -> AppResult<bool> {
        let id = descriptor.key.id();
        if let Some(&existing) = self.index.get(&id) {
            if keep_existing {
                return Ok(false);
            }
            return Err(AppError::DuplicateRegistration {
                service: descriptor.key.to_string(),
                existing: self.descriptors[existing].lifetime,
                requested: descriptor.lifetime,
            });
        }

        self.index.insert(id, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(true)
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

fn shutdown_constructed<T: Construct>(instance: &Instance) {
    if let Some(service) = instance.downcast_ref::<T>() {
        service.shutdown();
    }
}

fn dispose_instance<T: Disposable>(instance: &Instance) {
    if let Some(service) = instance.downcast_ref::<T>() {
        service.dispose();
    }
}

/// 정적 등록 테이블의 항목
///
/// `register_service!` 매크로가 생성하며 `inventory`로 수집됩니다.
pub struct ServiceRegistration {
    /// 진단용 타입 이름
    pub name: fn() -> &'static str,
    /// 컬렉션에 등록하는 함수
    pub register: fn(&mut ServiceCollection) -> AppResult<()>,
}

impl ServiceRegistration {
    pub const fn of<T: Construct>() -> Self {
        Self {
            name: std::any::type_name::<T>,
            register: register_constructed::<T>,
        }
    }
}

fn register_constructed<T: Construct>(services: &mut ServiceCollection) -> AppResult<()> {
    services.add_constructed::<T>().map(|_| ())
}

inventory::collect!(ServiceRegistration);

/// `Construct` 타입을 정적 등록 테이블에 추가합니다.
///
/// ```rust,ignore
/// register_service!(ExceptionService, ApplicationLifetime);
/// ```
#[macro_export]
macro_rules! register_service {
    ($($service:ty),+ $(,)?) => {
        $(
            $crate::inventory::submit! {
                $crate::core::registry::ServiceRegistration::of::<$service>()
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Settings {
        theme: &'static str,
    }

    struct Clock;

    impl Construct for Clock {
        const LIFETIME: Lifetime = Lifetime::Singleton;

        fn construct(_: &ServiceProvider) -> AppResult<Self> {
            Ok(Clock)
        }
    }

    #[test]
    fn test_short_type_name_strips_module_paths() {
        assert_eq!(short_type_name("alpha::beta::Gamma"), "Gamma");
        assert_eq!(
            short_type_name("crate::core::provider::LazyService<crate::views::RootView>"),
            "LazyService<RootView>"
        );
        assert_eq!(short_type_name("(a::B, c::D)"), "(B, D)");
        assert_eq!(short_type_name("u32"), "u32");
    }

    #[test]
    fn test_type_key_equality_uses_type_id() {
        assert_eq!(TypeKey::of::<Settings>(), TypeKey::of::<Settings>());
        assert_ne!(TypeKey::of::<Settings>(), TypeKey::of::<Clock>());
        assert_eq!(TypeKey::of::<Settings>().to_string(), "Settings");
    }

    #[test]
    fn test_duplicate_registration_is_configuration_error() {
        let mut services = ServiceCollection::new();
        services.add_singleton(|_| Ok(Settings { theme: "light" })).unwrap();

        let error = services
            .add_transient(|_| Ok(Settings { theme: "dark" }))
            .err()
            .expect("duplicate must fail");

        match error {
            AppError::DuplicateRegistration { service, existing, requested } => {
                assert_eq!(service, "Settings");
                assert_eq!(existing, Lifetime::Singleton);
                assert_eq!(requested, Lifetime::Transient);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_try_add_keeps_first_registration() {
        let mut services = ServiceCollection::new();
        assert!(services.try_add_singleton(|_| Ok(Settings { theme: "light" })));
        assert!(!services.try_add_singleton(|_| Ok(Settings { theme: "dark" })));

        let provider = services.build();
        assert_eq!(provider.resolve::<Settings>().unwrap().theme, "light");
    }

    #[test]
    fn test_add_constructed_uses_type_lifetime() {
        let mut services = ServiceCollection::new();
        services.add_constructed::<Clock>().unwrap();

        let descriptor = services.descriptors().next().unwrap();
        assert_eq!(descriptor.lifetime(), Lifetime::Singleton);
        assert!(descriptor.teardown.is_some());
        assert!(services.contains::<Clock>());
        assert!(!services.contains::<Settings>());
    }

    struct Socket {
        flag: DisposeFlag,
        closes: std::sync::atomic::AtomicUsize,
    }

    impl Disposable for Socket {
        fn dispose(&self) {
            if self.flag.begin() {
                self.closes.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_dispose_flag_fires_once() {
        let flag = DisposeFlag::new();
        assert!(!flag.is_disposed());
        assert!(flag.begin());
        assert!(!flag.begin());
        assert!(flag.is_disposed());
    }

    #[test]
    fn test_disposable_singleton_is_disposed_at_shutdown() {
        let mut services = ServiceCollection::new();
        services
            .add_disposable_singleton(|_| {
                Ok(Socket {
                    flag: DisposeFlag::new(),
                    closes: std::sync::atomic::AtomicUsize::new(0),
                })
            })
            .unwrap();
        let provider = services.build();

        let socket = provider.resolve::<Socket>().unwrap();
        provider.shutdown();
        socket.dispose();

        assert_eq!(socket.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_instance_registers_singleton() {
        let shared = Arc::new(Settings { theme: "system" });
        let mut services = ServiceCollection::new();
        services.add_instance(shared.clone()).unwrap();

        let provider = services.build();
        let resolved = provider.resolve::<Settings>().unwrap();
        assert!(Arc::ptr_eq(&shared, &resolved));
    }
}
