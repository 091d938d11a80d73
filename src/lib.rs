//! 감사 편지 데스크톱 셸
//!
//! 헤드리스 창 모델 위에서 동작하는 애플리케이션 셸입니다.
//! 타입 기반 서비스 레지스트리, 뷰모델 → 뷰 바인딩, UI 스레드 디스패처,
//! 처리되지 않은 폴트를 에러 대화상자로 보여주는 수집기를 제공합니다.
//!
//! # Features
//!
//! - **서비스 레지스트리**: Singleton/Transient 수명, 지연 생성, 순환 의존성 감지
//! - **정적 등록**: `register_service!` / `register_view!` 매크로
//! - **뷰 로케이터**: 뷰모델 타입으로 뷰를 찾아 데이터 컨텍스트와 생명주기 연결
//! - **UI 디스패처**: `invoke` / `invoke_async` / `post`
//! - **폴트 수집기**: 포그라운드, 백그라운드, 관리되지 않는 스레드의 실패를 한곳에서 처리
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │      App        │ ← 조합 루트
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Views / Locator │ ← 창, 대화상자
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   ViewModels    │ ← 상태와 명령
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Services     │ ← 클립보드, 생명주기, 예외 표시
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │      Core       │ ← 레지스트리, 디스패처, 폴트 수집기
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use thank_you_letter::app::App;
//!
//! let app = App::build()?;
//! app.dispatcher().bind_current_thread()?;
//! app.install_panic_hook();
//! app.show_root()?;
//! app.run()?;
//! app.shutdown();
//! ```

pub mod app;
pub mod core;
pub mod config;
pub mod services;
pub mod utils;
pub mod view_models;
pub mod views;

#[doc(hidden)]
pub use inventory;
