//! # Application Error Handling System
//!
//! 셸 런타임 전체에서 사용하는 통합 에러 타입입니다.
//! 서비스 등록/해석, 뷰 바인딩, UI 스레드 디스패치, 설정 파일 처리에서 발생하는
//! 모든 실패를 하나의 `AppError` 열거형으로 표현합니다.
//!
//! ## 에러 분류
//!
//! | 분류 | 변형 | 처리 방식 |
//! |------|------|-----------|
//! | 구성 에러 | `DuplicateRegistration`, `NotRegistered` | 시작 시점에 치명적, 복구 없음 |
//! | 해석 에러 | `CircularDependency`, `ContentionTimeout`, `ResolutionFailed`, `FactoryPanicked`, `TypeMismatch`, `ProviderDisposed` | 해당 해석만 실패, 호출자에게 전파 |
//! | 바인딩 에러 | `InvalidDataContext` | 뷰 단위 실패 |
//! | 디스패치 에러 | `DispatcherClosed`, `Panicked` | 호출자에게 재전달 |
//! | 런타임 폴트 | `Fault`, `SettingsError`, `InternalError` | `FaultSink`로 집결 |
//!
//! ## Clone 가능한 에러
//!
//! 실패한 싱글톤 셀은 같은 에러를 이후 모든 접근에서 다시 돌려주어야 하므로
//! `AppError`는 `Clone`을 구현합니다. 내부 원인은 `Arc<AppError>`로 보관합니다.
//!
//! ```rust,ignore
//! use crate::core::errors::{AppError, AppResult};
//!
//! fn load_greeting(provider: &ServiceProvider) -> AppResult<String> {
//!     let config = provider.resolve::<AppConfig>()?;
//!     config.get::<String>("greeting")?
//!         .ok_or_else(|| AppError::SettingsError("greeting is not set".to_string()))
//! }
//! ```

use std::sync::Arc;
use thiserror::Error;
use crate::core::registry::Lifetime;

/// 애플리케이션 전역 에러 타입
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// 같은 타입이 두 번 등록됨 (구성 에러)
    ///
    /// `try_add_*` 계열을 제외한 모든 등록 경로에서 중복은 시작 시점의 치명적 에러입니다.
    #[error("Duplicate registration: {service} is already registered as {existing}, cannot register again as {requested}")]
    DuplicateRegistration {
        service: String,
        existing: Lifetime,
        requested: Lifetime,
    },

    /// 등록되지 않은 타입 요청
    #[error("Service not registered: {service}")]
    NotRegistered { service: String },

    /// 현재 호출 체인에서 이미 해석 중인 타입을 다시 요청함
    #[error("Circular dependency detected while resolving {service}: {chain}")]
    CircularDependency { service: String, chain: String },

    /// 다른 스레드가 생성 중인 싱글톤이 제한 시간 안에 게시되지 않음
    #[error("Timed out after {waited_ms}ms waiting for {service} to be constructed on another thread")]
    ContentionTimeout { service: String, waited_ms: u64 },

    /// 싱글톤 셀이 실패 상태로 전이됨
    ///
    /// 실패한 셀은 재시도하지 않고 이 에러를 그대로 다시 돌려줍니다.
    #[error("Failed to resolve service {service}. Possible causes: 1. Service not registered; 2. Circular dependency detected; 3. Thread contention during initialization.")]
    ResolutionFailed {
        service: String,
        #[source]
        source: Arc<AppError>,
    },

    /// 팩토리 실행 중 panic 발생
    #[error("Factory for {service} panicked: {message}")]
    FactoryPanicked { service: String, message: String },

    /// 등록된 팩토리가 요청과 다른 타입을 생성함
    #[error("Type mismatch for service: {service}")]
    TypeMismatch { service: String },

    /// 서비스 프로바이더가 이미 해제됨
    #[error("Service provider has been disposed")]
    ProviderDisposed,

    /// 뷰의 데이터 컨텍스트가 없거나 기대한 뷰모델 타입이 아님
    #[error("DataContext is null or not of the expected type '{expected}'")]
    InvalidDataContext { expected: String },

    /// UI 디스패처가 종료되어 작업을 받을 수 없음
    #[error("Dispatcher is not running")]
    DispatcherClosed,

    /// 마샬링된 작업 또는 백그라운드 작업이 panic으로 종료됨
    #[error("Action panicked: {0}")]
    Panicked(String),

    /// 설정 파일 읽기/쓰기 에러
    #[error("Settings error: {0}")]
    SettingsError(String),

    /// 사용자 코드(커맨드 등)에서 올라온 런타임 폴트
    #[error("{0}")]
    Fault(String),

    /// 내부 에러
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 시작 단계에서 복구할 수 없는 구성/해석 에러인지 확인합니다.
    pub fn is_fatal_at_startup(&self) -> bool {
        match self {
            AppError::DuplicateRegistration { .. }
            | AppError::NotRegistered { .. }
            | AppError::CircularDependency { .. }
            | AppError::ContentionTimeout { .. }
            | AppError::FactoryPanicked { .. }
            | AppError::TypeMismatch { .. } => true,
            AppError::ResolutionFailed { source, .. } => source.is_fatal_at_startup(),
            _ => false,
        }
    }
}

/// 편의성을 위한 Result 타입 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 외부 라이브러리 에러를 AppError로 변환하는 확장 trait
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> AppResult<T>;

    /// 클로저를 사용하여 지연 평가된 컨텍스트를 제공합니다.
    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", f(), e)))
    }
}

/// panic payload에서 사람이 읽을 수 있는 메시지를 꺼냅니다.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_resolution_failed_exposes_source() {
        let error = AppError::ResolutionFailed {
            service: "RootViewModel".to_string(),
            source: Arc::new(AppError::NotRegistered { service: "Clipboard".to_string() }),
        };

        assert!(error.to_string().contains("RootViewModel"));
        let source = error.source().expect("source should be kept");
        assert_eq!(source.to_string(), "Service not registered: Clipboard");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::NotRegistered { service: "A".to_string() }.is_fatal_at_startup());
        assert!(!AppError::Fault("boom".to_string()).is_fatal_at_startup());
        assert!(!AppError::DispatcherClosed.is_fatal_at_startup());

        let wrapped = AppError::ResolutionFailed {
            service: "A".to_string(),
            source: Arc::new(AppError::CircularDependency {
                service: "A".to_string(),
                chain: "A -> A".to_string(),
            }),
        };
        assert!(wrapped.is_fatal_at_startup());
    }

    #[test]
    fn test_error_context_trait() {
        let result: Result<(), &str> = Err("original error");
        let app_result = result.context("Additional context");

        assert!(app_result.is_err());
        if let Err(AppError::InternalError(msg)) = app_result {
            assert!(msg.contains("Additional context"));
            assert!(msg.contains("original error"));
        } else {
            panic!("Expected InternalError");
        }
    }

    #[test]
    fn test_panic_message_from_payloads() {
        let static_payload: Box<dyn std::any::Any + Send> = Box::new("static");
        let owned_payload: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        let other_payload: Box<dyn std::any::Any + Send> = Box::new(42u8);

        assert_eq!(panic_message(static_payload.as_ref()), "static");
        assert_eq!(panic_message(owned_payload.as_ref()), "owned");
        assert_eq!(panic_message(other_payload.as_ref()), "Box<dyn Any>");
    }
}
