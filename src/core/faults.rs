//! # Unhandled Fault Sink
//!
//! 처리되지 않은 모든 실패가 모이는 단일 종착점입니다.
//!
//! | 발생 위치 | 진입점 | `terminating` |
//! |-----------|--------|---------------|
//! | UI 스레드 작업 (`Dispatcher::post`) | `on_foreground_fault` | `false` |
//! | 백그라운드 작업 (`spawn_background`) | `on_background_fault` | `false` |
//! | 포착되지 않은 UI 스레드 panic (panic hook) | `report` (`Foreground`) | `true` |
//! | 관리되지 않는 스레드의 panic (panic hook) | `on_thread_fault` | `false` |
//!
//! 보고 과정에서 다시 실패(이중 폴트)하면 재귀하지 않고 최소 경로로 빠집니다.
//! 최소 경로는 `show_fault(.., exit_after = true)`를 한 번 시도하고, 그마저 실패하면 로그만 남깁니다.

use std::cell::Cell;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use chrono::{DateTime, Local};
use log::error;
use parking_lot::RwLock;
use crate::core::dispatcher::Dispatcher;
use crate::core::errors::{panic_message, AppError, AppResult, ErrorContext};

thread_local! {
    static CATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    static REPORTING: Cell<bool> = const { Cell::new(false) };
}

/// `catch_unwind`로 `f`를 실행합니다.
///
/// 실행 중에는 panic hook이 이 panic을 무시하도록 표시합니다. 처리 책임은 호출자에게 있습니다.
pub(crate) fn catching<R>(f: impl FnOnce() -> R) -> thread::Result<R> {
    CATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CATCH_DEPTH.with(|depth| depth.set(depth.get() - 1));
    result
}

fn inside_catch_site() -> bool {
    CATCH_DEPTH.with(|depth| depth.get() > 0)
}

/// 폴트가 발생한 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOrigin {
    Foreground,
    BackgroundTask,
    UnmanagedThread,
}

impl fmt::Display for FaultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultOrigin::Foreground => f.write_str("foreground"),
            FaultOrigin::BackgroundTask => f.write_str("background task"),
            FaultOrigin::UnmanagedThread => f.write_str("unmanaged thread"),
        }
    }
}

/// 포착 지점에서 만들어져 `FaultSink`가 한 번 소비하는 기록
#[derive(Debug, Clone)]
pub struct FaultRecord {
    pub error: AppError,
    pub origin: FaultOrigin,
    pub terminating: bool,
    pub user_visible: bool,
    pub occurred_at: DateTime<Local>,
}

impl FaultRecord {
    pub fn new(error: AppError, origin: FaultOrigin, terminating: bool) -> Self {
        Self {
            error,
            origin,
            terminating,
            user_visible: true,
            occurred_at: Local::now(),
        }
    }

    /// 로그에만 남기고 화면에는 띄우지 않습니다.
    pub fn silent(mut self) -> Self {
        self.user_visible = false;
        self
    }
}

/// 화면 표시용으로 정리된 폴트
#[derive(Debug, Clone, PartialEq)]
pub struct FaultReport {
    /// 바깥 에러부터 안쪽 원인까지 한 줄씩
    pub message: String,
    /// 가장 안쪽 원인의 디버그 표현
    pub detail: String,
    pub origin: FaultOrigin,
    pub terminating: bool,
    pub occurred_at: DateTime<Local>,
}

impl FaultReport {
    pub fn from_record(record: &FaultRecord) -> Self {
        let (chain, detail) = describe_chain(&record.error);
        let message = match (record.origin, record.terminating) {
            (FaultOrigin::UnmanagedThread, true) => format!("Fatal error on non-UI thread: {}", chain),
            (FaultOrigin::UnmanagedThread, false) => format!("Non-UI thread error: {}", chain),
            _ => chain,
        };

        Self {
            message,
            detail,
            origin: record.origin,
            terminating: record.terminating,
            occurred_at: record.occurred_at,
        }
    }
}

/// 에러 체인을 바깥 → 안쪽 순서로 펼칩니다.
pub fn describe_chain(error: &(dyn Error + 'static)) -> (String, String) {
    let mut lines = vec![error.to_string()];
    let mut innermost = error;
    while let Some(source) = innermost.source() {
        lines.push(source.to_string());
        innermost = source;
    }
    (lines.join("\n"), format!("{:?}", innermost))
}

/// 폴트를 사용자에게 보여주는 협력자
pub trait FaultDisplay: Send + Sync {
    fn show_fault(&self, report: &FaultReport, exit_after: bool) -> AppResult<()>;
}

/// 폴트 수집기
pub struct FaultSink {
    display: RwLock<Option<Arc<dyn FaultDisplay>>>,
    reported: AtomicUsize,
}

impl FaultSink {
    /// 표시 협력자 없이 로그만 남기는 수집기
    pub fn new() -> Self {
        Self {
            display: RwLock::new(None),
            reported: AtomicUsize::new(0),
        }
    }

    pub fn with_display(display: Arc<dyn FaultDisplay>) -> Self {
        let sink = Self::new();
        sink.set_display(display);
        sink
    }

    /// 표시 협력자를 교체합니다. 조합 루트에서 서비스가 준비된 뒤 연결할 때 사용합니다.
    pub fn set_display(&self, display: Arc<dyn FaultDisplay>) {
        *self.display.write() = Some(display);
    }

    /// 지금까지 `report`에 들어온 폴트 수
    pub fn reported(&self) -> usize {
        self.reported.load(Ordering::Acquire)
    }

    pub fn on_foreground_fault(&self, error: AppError) {
        self.report(FaultRecord::new(error, FaultOrigin::Foreground, false));
    }

    pub fn on_background_fault(&self, error: AppError) {
        self.report(FaultRecord::new(error, FaultOrigin::BackgroundTask, false));
    }

    pub fn on_thread_fault(&self, error: AppError, terminating: bool) {
        self.report(FaultRecord::new(error, FaultOrigin::UnmanagedThread, terminating));
    }

    /// 모든 폴트의 단일 처리 경로
    pub fn report(&self, record: FaultRecord) {
        self.reported.fetch_add(1, Ordering::AcqRel);
        let report = FaultReport::from_record(&record);

        if REPORTING.with(Cell::get) {
            self.fallback(&report, "fault raised while another fault was being reported".to_string());
            return;
        }

        REPORTING.with(|flag| flag.set(true));
        let _reset = ResetReporting;

        match catching(|| self.deliver(&report, record.user_visible)) {
            Ok(Ok(())) => {}
            Ok(Err(secondary)) => self.fallback(&report, secondary.to_string()),
            Err(payload) => self.fallback(&report, panic_message(payload.as_ref())),
        }
    }

    /// 이름 있는 스레드에서 `f`를 실행하고, 실패는 백그라운드 폴트로 보고합니다.
    pub fn spawn_background<F>(self: &Arc<Self>, name: &str, f: F) -> AppResult<JoinHandle<()>>
    where
        F: FnOnce() -> AppResult<()> + Send + 'static,
    {
        let sink = Arc::clone(self);
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || match catching(f) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => sink.on_background_fault(error),
                Err(payload) => sink.on_background_fault(AppError::Panicked(panic_message(payload.as_ref()))),
            })
            .with_context(|| format!("Failed to spawn background task '{}'", name))
    }

    fn deliver(&self, report: &FaultReport, user_visible: bool) -> AppResult<()> {
        error!("[{}] {}", report.origin, report.message);
        if !user_visible {
            return Ok(());
        }
        match self.current_display() {
            Some(display) => display.show_fault(report, report.terminating),
            None => Ok(()),
        }
    }

    fn fallback(&self, primary: &FaultReport, secondary: String) {
        error!("❌ Fault while handling fault: {} (original: {})", secondary, primary.message);

        let Some(display) = self.current_display() else {
            return;
        };
        let report = FaultReport {
            message: secondary,
            detail: primary.message.clone(),
            origin: primary.origin,
            terminating: true,
            occurred_at: Local::now(),
        };
        match catching(|| display.show_fault(&report, true)) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => error!("❌ Fallback fault display failed: {}", error),
            Err(payload) => error!("❌ Fallback fault display panicked: {}", panic_message(payload.as_ref())),
        }
    }

    fn current_display(&self) -> Option<Arc<dyn FaultDisplay>> {
        self.display.read().clone()
    }
}

impl Default for FaultSink {
    fn default() -> Self {
        Self::new()
    }
}

struct ResetReporting;

impl Drop for ResetReporting {
    fn drop(&mut self) {
        REPORTING.with(|flag| flag.set(false));
    }
}

/// 포착 지점 밖에서 발생한 panic을 `FaultSink`로 보냅니다.
///
/// 기존 hook은 그대로 이어서 호출합니다. UI 스레드의 panic은 종료성 폴트로 분류됩니다.
pub fn install_panic_hook(sink: Arc<FaultSink>, dispatcher: Dispatcher) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if inside_catch_site() {
            return;
        }

        let thread = thread::current();
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".to_string());
        let message = format!(
            "thread '{}' panicked at {}: {}",
            thread.name().unwrap_or("<unnamed>"),
            location,
            panic_message(info.payload())
        );

        let error = AppError::Fault(message);
        if dispatcher.check_access() {
            // UI 스레드가 풀리면 메시지 루프도 끝나므로 종료 폴트
            sink.report(FaultRecord::new(error, FaultOrigin::Foreground, true));
        } else {
            sink.on_thread_fault(error, false);
        }
        previous(info);
    }));
}
