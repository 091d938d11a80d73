//! # Core Framework Module
//!
//! 데스크톱 셸의 핵심 런타임입니다. 서비스 등록/해석, UI 스레드 디스패치,
//! 처리되지 않은 폴트 수집을 담당하며 뷰/뷰모델 계층은 이 모듈 위에 올라갑니다.
//!
//! ## 모듈 구성
//!
//! ### [`registry`] - 서비스 등록
//! - **ServiceCollection**: 요청 타입마다 하나의 등록 항목을 보관하는 빌더
//! - **Construct**: 생성자 주입 + 타입별 수명 플래그
//! - **정적 등록 테이블**: `inventory` 기반 `register_service!`
//!
//! ### [`provider`] / [`lazy_cell`] - 지연 해석기
//! - **ServiceProvider**: 싱글톤 접근의 유일한 경로
//! - **LazyCell**: 키당 한 번만 생성, 결과는 잠금 없이 게시
//! - **순환 감지**: 호출 체인 스택으로 `A -> B -> A`를 즉시 보고
//! - **LazyService**: 첫 `get()`까지 해석을 미루는 핸들
//!
//! ### [`dispatcher`] - UI 스레드 관문
//! - `invoke` / `invoke_async` / `post`, FIFO 큐, UI 스레드 판별
//!
//! ### [`faults`] - 폴트 수집기
//! - 포그라운드/백그라운드/관리되지 않는 스레드의 실패를 하나의 경로로 보고
//! - 이중 폴트 시 최소 경로, panic hook, 백그라운드 작업 실행기
//!
//! ### [`errors`] - 통합 에러 처리
//! - **AppError**: 구성/해석/바인딩/디스패치/런타임 폴트를 하나의 열거형으로
//!
//! ## Spring Framework와의 비교
//!
//! | Spring | 이 프레임워크 |
//! |--------|---------------|
//! | `@Component` | `impl Construct` + `register_service!` |
//! | `ApplicationContext` | `ServiceProvider` |
//! | `@Scope("singleton")` / `@Scope("prototype")` | `Lifetime::Singleton` / `Lifetime::Transient` |
//! | `ObjectProvider<T>` | `LazyService<T>` |
//! | `@PreDestroy` | `Construct::shutdown` / `Disposable` |
//! | `BeanCurrentlyInCreationException` | `AppError::CircularDependency` |
//!
//! ## 사용 패턴
//!
//! ```rust,ignore
//! use thank_you_letter::core::{Construct, Lifetime, ServiceCollection, ServiceProvider};
//!
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
//! let mut services = ServiceCollection::new();
//! services.add_constructed::<Clipboard>()?;
//! let provider = services.build();
//!
//! let a = provider.resolve::<Clipboard>()?;
//! let b = provider.resolve::<Clipboard>()?;
//! assert!(Arc::ptr_eq(&a, &b));
//! ```
//!
//! ## 트러블슈팅
//!
//! ### 순환 참조 감지
//! ```text
//! Circular dependency detected while resolving RootView: RootView -> RootViewModel -> RootView
//! ```
//! **해결**: 한쪽 의존성을 `LazyService<T>`로 바꾸거나 계층을 단방향으로 재설계
//!
//! ### 미등록 타입 에러
//! ```text
//! Service not registered: Clipboard
//! ```
//! **해결**: `register_service!` 적용 또는 `ServiceCollection::add_*`로 직접 등록

pub mod errors;
pub mod registry;
pub mod lazy_cell;
pub mod provider;
pub mod dispatcher;
pub mod faults;

pub use errors::*;
pub use registry::*;
pub use provider::{LazyService, ServiceProvider, WeakProvider};
pub use dispatcher::{DispatchOperation, Dispatcher};
pub use faults::{install_panic_hook, FaultDisplay, FaultOrigin, FaultRecord, FaultReport, FaultSink};
