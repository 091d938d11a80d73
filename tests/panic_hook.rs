//! 프로세스 전역 panic hook 테스트
//!
//! hook은 프로세스 전체에 영향을 주므로 별도 테스트 바이너리에서 하나의 테스트로만 실행합니다.

use std::sync::Arc;
use std::thread;
use parking_lot::Mutex;
use thank_you_letter::core::errors::{AppError, AppResult};
use thank_you_letter::core::{install_panic_hook, Dispatcher, FaultDisplay, FaultOrigin, FaultReport, FaultSink};

#[derive(Default)]
struct RecordingDisplay {
    shown: Mutex<Vec<(FaultReport, bool)>>,
}

impl FaultDisplay for RecordingDisplay {
    fn show_fault(&self, report: &FaultReport, exit_after: bool) -> AppResult<()> {
        self.shown.lock().push((report.clone(), exit_after));
        Ok(())
    }
}

fn stray_worker() {
    panic!("stray worker crashed");
}

fn ui_thread_crash() {
    panic!("ui thread crashed");
}

#[test]
fn test_panic_hook_reports_only_uncaught_panics() {
    let display = Arc::new(RecordingDisplay::default());
    let sink = Arc::new(FaultSink::with_display(display.clone()));
    let dispatcher = Dispatcher::new();
    dispatcher.set_fault_sink(&sink);
    dispatcher.bind_current_thread().unwrap();
    install_panic_hook(sink.clone(), dispatcher.clone());

    // 포착 지점 안의 panic은 호출자에게 에러로 돌아가고 hook은 무시
    let caught = dispatcher.invoke::<_, ()>(|| panic!("handled by invoke"));
    assert!(matches!(caught, Err(AppError::Panicked(ref message)) if message == "handled by invoke"));
    assert_eq!(sink.reported(), 0);

    let worker = thread::Builder::new()
        .name("stray-worker".to_string())
        .spawn(stray_worker)
        .unwrap();
    assert!(worker.join().is_err());

    // hook은 panic한 스레드에서 동기적으로 실행되므로 join 이후에는 기록이 끝나 있음
    assert_eq!(sink.reported(), 1);

    let shown = display.shown.lock();
    assert_eq!(shown.len(), 1);
    let (report, exit_after) = &shown[0];
    assert_eq!(report.origin, FaultOrigin::UnmanagedThread);
    assert!(!report.terminating);
    assert!(!exit_after);
    assert!(report.message.starts_with("Non-UI thread error: thread 'stray-worker' panicked at "));
    assert!(report.message.ends_with("stray worker crashed"));
    drop(shown);

    // 포착 지점 밖에서 UI 스레드가 풀리면 종료 폴트로 보고
    let unwound = std::panic::catch_unwind(|| ui_thread_crash());
    assert!(unwound.is_err());
    assert_eq!(sink.reported(), 2);

    let shown = display.shown.lock();
    let (report, exit_after) = &shown[1];
    assert_eq!(report.origin, FaultOrigin::Foreground);
    assert!(report.terminating);
    assert!(*exit_after);
    assert!(!report.message.contains("non-UI"));
    assert!(report.message.starts_with("thread '"));
    assert!(report.message.ends_with("ui thread crashed"));
}
