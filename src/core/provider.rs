//! # Service Provider - 지연 해석기
//!
//! `ServiceCollection::build()`가 만드는 읽기 전용 컨테이너입니다.
//! 싱글톤 접근의 유일한 경로이며 여러 스레드에서 동시에 호출해도 안전합니다.
//!
//! ## 해석 과정
//!
//! ```text
//! resolve::<T>()
//!    ├─ 등록 조회 (O(1))            → 없으면 NotRegistered
//!    ├─ 게시된 싱글톤 확인 (잠금 없음) → 있으면 즉시 반환
//!    ├─ 현재 호출 체인 검사          → 이미 해석 중이면 CircularDependency
//!    ├─ Singleton: LazyCell          → 한 번만 생성, 나머지는 대기
//!    └─ Transient: 팩토리 직접 호출   → 매번 새 인스턴스
//! ```
//!
//! ## 호출 체인 추적
//!
//! 스레드마다 "현재 해석 중인 (컨테이너, 키)" 스택을 유지합니다. 팩토리가 자기 자신(또는
//! 자기를 요청한 상위 타입)을 다시 요청하면 `A -> B -> A` 형태의 체인과 함께
//! 즉시 실패하므로 교착 상태에 빠지지 않습니다.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use crate::core::errors::{panic_message, AppError, AppResult};
use crate::core::faults::catching;
use crate::core::lazy_cell::{CellState, LazyCell};
use crate::core::registry::{Instance, Lifetime, ServiceDescriptor, TypeKey};
use crate::utils::display_terminal::{print_boxed_title, print_step_complete, print_step_start, print_sub_task};

thread_local! {
    /// (컨테이너 주소, 키). 서로 다른 컨테이너의 같은 타입은 별개로 취급
    static RESOLVING: RefCell<Vec<(usize, TypeKey)>> = const { RefCell::new(Vec::new()) };
}

/// 호출 체인에 키를 올려두고, drop 시 내립니다.
struct ResolutionScope;

impl ResolutionScope {
    fn enter(provider: usize, key: &TypeKey) -> AppResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack.iter().position(|(p, k)| *p == provider && k == key) {
                let chain = stack[start..]
                    .iter()
                    .filter(|(p, _)| *p == provider)
                    .map(|(_, k)| k)
                    .chain(std::iter::once(key))
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(AppError::CircularDependency {
                    service: key.to_string(),
                    chain,
                });
            }
            stack.push((provider, *key));
            Ok(ResolutionScope)
        })
    }
}

impl Drop for ResolutionScope {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

struct ProviderEntry {
    descriptor: ServiceDescriptor,
    cell: Option<LazyCell>,
}

pub(crate) struct ProviderInner {
    entries: HashMap<TypeId, ProviderEntry>,
    created: Mutex<Vec<TypeId>>,
    contention_timeout: Duration,
    shut_down: AtomicBool,
}

/// 의존성 해석 컨테이너
///
/// 복제 비용이 작으며(`Arc`), 모든 복제본은 같은 싱글톤 캐시를 공유합니다.
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

impl ServiceProvider {
    pub(crate) fn from_descriptors(descriptors: Vec<ServiceDescriptor>, contention_timeout: Duration) -> Self {
        let entries = descriptors
            .into_iter()
            .map(|descriptor| {
                let cell = match descriptor.lifetime {
                    Lifetime::Singleton => Some(LazyCell::new()),
                    Lifetime::Transient => None,
                };
                (descriptor.key.id(), ProviderEntry { descriptor, cell })
            })
            .collect();

        Self {
            inner: Arc::new(ProviderInner {
                entries,
                created: Mutex::new(Vec::new()),
                contention_timeout,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// 지정된 타입의 인스턴스를 가져옵니다.
    ///
    /// 싱글톤은 첫 요청에서 생성해 캐시하고, 트랜지언트는 매번 새로 만듭니다.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> AppResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        self.resolve_key(&key)?
            .downcast::<T>()
            .map_err(|_| AppError::TypeMismatch { service: key.to_string() })
    }

    /// 등록되지 않았거나 해석에 실패하면 `None`을 반환합니다.
    pub fn try_resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    /// 타입 소거된 해석
    pub fn resolve_key(&self, key: &TypeKey) -> AppResult<Instance> {
        if self.inner.shut_down.load(Ordering::Acquire) {
            return Err(AppError::ProviderDisposed);
        }

        let entry = self
            .inner
            .entries
            .get(&key.id())
            .ok_or_else(|| AppError::NotRegistered { service: key.to_string() })?;

        if let Some(Ok(instance)) = entry.cell.as_ref().and_then(LazyCell::get) {
            return Ok(instance.clone());
        }

        let _scope = ResolutionScope::enter(Arc::as_ptr(&self.inner) as usize, &entry.descriptor.key)?;

        match &entry.cell {
            None => self.construct(&entry.descriptor),
            Some(cell) => cell.get_or_init(&entry.descriptor.key, self.inner.contention_timeout, || {
                let instance = self.construct(&entry.descriptor)?;
                if entry.descriptor.teardown.is_some() {
                    self.inner.created.lock().push(key.id());
                }
                debug!("✓ Created singleton {}", entry.descriptor.key);
                Ok(instance)
            }),
        }
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.inner.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn lifetime_of<T: ?Sized + 'static>(&self) -> Option<Lifetime> {
        self.inner
            .entries
            .get(&TypeId::of::<T>())
            .map(|entry| entry.descriptor.lifetime)
    }

    /// 싱글톤 셀의 현재 상태 (트랜지언트 또는 미등록이면 `None`)
    pub fn singleton_state<T: ?Sized + 'static>(&self) -> Option<CellState> {
        self.inner
            .entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.cell.as_ref())
            .map(LazyCell::state)
    }

    pub fn registered_keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.inner.entries.values().map(|entry| &entry.descriptor.key)
    }

    /// 첫 `get()` 시점에 해석하는 지연 핸들을 만듭니다.
    pub fn lazy<T: Send + Sync + 'static>(&self) -> LazyService<T> {
        LazyService::new(self.downgrade())
    }

    pub fn downgrade(&self) -> WeakProvider {
        WeakProvider {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// 등록된 모든 싱글톤을 미리 생성합니다.
    ///
    /// 구성/해석 에러를 첫 사용 시점이 아니라 시작 시점에 드러내고 싶을 때 사용합니다.
    pub fn initialize_all(&self) -> AppResult<usize> {
        print_boxed_title("🔄 INITIALIZING SERVICE REGISTRY");
        print_step_start(1, "Creating singleton instances");

        let mut count = 0;
        for entry in self.inner.entries.values() {
            if entry.descriptor.lifetime != Lifetime::Singleton {
                continue;
            }
            let name = entry.descriptor.key.to_string();
            print_sub_task(&name, "Creating...");
            self.resolve_key(&entry.descriptor.key)?;
            print_sub_task(&name, "✓ Created");
            count += 1;
        }

        print_step_complete(1, "Singleton instances created", count);
        Ok(count)
    }

    /// 생성된 싱글톤을 생성 역순으로 정리합니다.
    ///
    /// 두 번째 호출부터는 아무것도 하지 않습니다. 종료 후의 해석은 `ProviderDisposed`로 실패합니다.
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let created = std::mem::take(&mut *self.inner.created.lock());
        info!("🧹 Disposing {} singleton(s)", created.len());

        for id in created.into_iter().rev() {
            let Some(entry) = self.inner.entries.get(&id) else {
                continue;
            };
            let (Some(teardown), Some(Ok(instance))) =
                (entry.descriptor.teardown, entry.cell.as_ref().and_then(LazyCell::get))
            else {
                continue;
            };
            if let Err(payload) = catching(|| teardown(instance)) {
                error!(
                    "Disposing {} panicked: {}",
                    entry.descriptor.key,
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    fn construct(&self, descriptor: &ServiceDescriptor) -> AppResult<Instance> {
        match catching(|| (descriptor.factory)(self)) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Factory for {} panicked: {}", descriptor.key, message);
                Err(AppError::FactoryPanicked {
                    service: descriptor.key.to_string(),
                    message,
                })
            }
        }
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.inner.entries.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// 소유권 순환 없이 보관할 수 있는 프로바이더 참조
#[derive(Clone)]
pub struct WeakProvider {
    inner: Weak<ProviderInner>,
}

impl WeakProvider {
    pub fn upgrade(&self) -> AppResult<ServiceProvider> {
        self.inner
            .upgrade()
            .map(|inner| ServiceProvider { inner })
            .ok_or(AppError::ProviderDisposed)
    }
}

/// 첫 접근 시 해석되고 결과를 캐시하는 지연 서비스 핸들
pub struct LazyService<T> {
    provider: WeakProvider,
    value: OnceCell<Arc<T>>,
}

impl<T: Send + Sync + 'static> LazyService<T> {
    pub fn new(provider: WeakProvider) -> Self {
        Self {
            provider,
            value: OnceCell::new(),
        }
    }

    pub fn get(&self) -> AppResult<Arc<T>> {
        self.value
            .get_or_try_init(|| self.provider.upgrade()?.resolve::<T>())
            .cloned()
    }

    pub fn is_value_created(&self) -> bool {
        self.value.get().is_some()
    }
}
