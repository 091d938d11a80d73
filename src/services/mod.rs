//! # Application Services
//!
//! 셸 런타임 위에서 동작하는 애플리케이션 서비스입니다. 모두 `register_service!`로
//! 정적 등록 테이블에 올라가며 `App::build()`에서 프로바이더에 등록됩니다.
//!
//! | 서비스 | 수명 | 역할 |
//! |--------|------|------|
//! | [`Clipboard`] | Singleton | 에러 내용 복사 대상 |
//! | [`ApplicationLifetime`] | Singleton | 메인 창, 대화상자 스택, 종료 요청 |
//! | [`ExceptionService`] | Singleton | `FaultDisplay` 구현, 에러 대화상자 표시 |
//!
//! ## Spring 비교
//!
//! | Spring | 여기 |
//! |--------|------|
//! | `@Service` | `impl Construct` + `register_service!` |
//! | `@ControllerAdvice` | `ExceptionService` (`FaultDisplay`) |
//! | `ConfigurableApplicationContext.close()` | `ApplicationLifetime::request_shutdown()` |

pub mod clipboard;
pub mod exception_service;
pub mod lifetime;

pub use clipboard::Clipboard;
pub use exception_service::ExceptionService;
pub use lifetime::ApplicationLifetime;
