//! # UI Dispatcher
//!
//! UI 요소 변경을 하나의 스레드(UI 스레드)에서만 일어나게 하는 관문입니다.
//!
//! | 연산 | 호출 스레드가 UI 스레드일 때 | 그 외 |
//! |------|------------------------------|-------|
//! | `invoke` | 그 자리에서 실행 | 큐에 넣고 완료까지 대기 |
//! | `invoke_async` | 즉시 완료된 future | 완료 시 resolve되는 future |
//! | `post` / `post_fallible` | 큐에 넣고 바로 반환 | 큐에 넣고 바로 반환 |
//!
//! 큐는 FIFO입니다. `invoke` 계열의 panic은 호출자에게 `AppError::Panicked`로 돌아가고,
//! `post` 계열의 panic과 에러는 `FaultSink`에 포그라운드 폴트로 보고됩니다.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new();
//! let worker = {
//!     let dispatcher = dispatcher.clone();
//!     std::thread::spawn(move || dispatcher.invoke(|| window.show()))
//! };
//! dispatcher.run()?; // shutdown() 전까지 UI 스레드를 점유
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use crate::core::errors::{panic_message, AppError, AppResult};
use crate::core::faults::{catching, FaultSink};

/// `invoke_async`의 결과
pub type DispatchOperation<R> = BoxFuture<'static, AppResult<R>>;

type Job = Box<dyn FnOnce() + Send>;

enum Message {
    Job(Job),
    Shutdown,
}

struct DispatcherInner {
    /// 종료 후 남은 작업을 버릴 때 `None`이 됨
    sender: Mutex<Option<mpsc::Sender<Message>>>,
    receiver: Mutex<mpsc::Receiver<Message>>,
    ui_thread: OnceCell<ThreadId>,
    closed: AtomicBool,
    sink: RwLock<Weak<FaultSink>>,
}

/// UI 스레드 작업 큐 (복제본은 같은 큐를 공유)
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            inner: Arc::new(DispatcherInner {
                sender: Mutex::new(Some(sender)),
                receiver: Mutex::new(receiver),
                ui_thread: OnceCell::new(),
                closed: AtomicBool::new(false),
                sink: RwLock::new(Weak::new()),
            }),
        }
    }

    /// `post` 계열 작업의 실패를 보고할 수집기를 연결합니다.
    pub fn set_fault_sink(&self, sink: &Arc<FaultSink>) {
        *self.inner.sink.write() = Arc::downgrade(sink);
    }

    /// 현재 스레드를 UI 스레드로 지정합니다. 한 번 지정되면 바뀌지 않습니다.
    pub fn bind_current_thread(&self) -> AppResult<()> {
        let current = thread::current().id();
        let bound = *self.inner.ui_thread.get_or_init(|| current);
        if bound == current {
            Ok(())
        } else {
            Err(AppError::InternalError(
                "Dispatcher is already bound to another thread".to_string(),
            ))
        }
    }

    /// 현재 스레드가 UI 스레드인지 확인합니다.
    pub fn check_access(&self) -> bool {
        self.inner.ui_thread.get() == Some(&thread::current().id())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// UI 스레드에서 `f`를 실행하고 결과를 기다립니다.
    pub fn invoke<F, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_closed() {
            return Err(AppError::DispatcherClosed);
        }
        if self.check_access() {
            return run_caught(f);
        }
        futures::executor::block_on(self.invoke_async(f))
    }

    /// UI 스레드에서 `f`를 실행하고, 완료 시 resolve되는 future를 돌려줍니다.
    pub fn invoke_async<F, R>(&self, f: F) -> DispatchOperation<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_closed() {
            return future::ready(Err(AppError::DispatcherClosed)).boxed();
        }
        if self.check_access() {
            return future::ready(run_caught(f)).boxed();
        }

        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            // 호출자가 기다리기를 포기했으면 수신 측이 이미 없을 수 있음
            let _ = tx.send(run_caught(f));
        });
        if let Err(error) = self.enqueue(job) {
            return future::ready(Err(error)).boxed();
        }

        async move { rx.await.unwrap_or_else(|_| Err(AppError::DispatcherClosed)) }.boxed()
    }

    /// 기다리지 않고 UI 스레드 큐에 넣습니다.
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_fallible(move || {
            f();
            Ok(())
        });
    }

    /// 에러를 돌려줄 수 있는 `post`. 에러와 panic은 포그라운드 폴트로 보고됩니다.
    pub fn post_fallible<F>(&self, f: F)
    where
        F: FnOnce() -> AppResult<()> + Send + 'static,
    {
        if self.is_closed() {
            warn!("Dispatcher is closed; dropping posted action");
            return;
        }

        let inner = Arc::downgrade(&self.inner);
        let job: Job = Box::new(move || {
            let failure = match catching(f) {
                Ok(Ok(())) => return,
                Ok(Err(error)) => error,
                Err(payload) => AppError::Panicked(panic_message(payload.as_ref())),
            };
            match inner.upgrade().and_then(|inner| inner.sink.read().upgrade()) {
                Some(sink) => sink.on_foreground_fault(failure),
                None => error!("Unhandled UI action failure: {}", failure),
            }
        });

        if let Err(error) = self.enqueue(job) {
            warn!("Dropping posted action: {}", error);
        }
    }

    /// 호출 스레드를 UI 스레드로 지정하고 `shutdown()`까지 큐를 처리합니다.
    pub fn run(&self) -> AppResult<()> {
        self.bind_current_thread()?;
        info!("🖥️  UI dispatcher running");

        loop {
            let message = self.inner.receiver.lock().recv();
            match message {
                Ok(Message::Job(job)) => job(),
                Ok(Message::Shutdown) | Err(_) => break,
            }
        }

        self.inner.closed.store(true, Ordering::Release);
        self.drop_abandoned();
        info!("🛑 UI dispatcher stopped");
        Ok(())
    }

    /// 지금 큐에 있는 작업만 처리하고 반환합니다. 처리한 작업 수를 돌려줍니다.
    pub fn run_pending(&self) -> AppResult<usize> {
        self.bind_current_thread()?;

        let mut processed = 0;
        loop {
            let message = self.inner.receiver.lock().try_recv();
            match message {
                Ok(Message::Job(job)) => {
                    job();
                    processed += 1;
                }
                Ok(Message::Shutdown) => {
                    self.inner.closed.store(true, Ordering::Release);
                    self.drop_abandoned();
                    break;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(processed)
    }

    /// 새 작업을 거부하고 `run()` 루프를 끝냅니다. 이미 큐에 있는 작업은 먼저 처리됩니다.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("Dispatcher shutdown requested");
        if let Some(sender) = self.inner.sender.lock().as_ref() {
            let _ = sender.send(Message::Shutdown);
        }
    }

    /// 종료 신호 뒤에 들어온 작업을 실행하지 않고 버립니다.
    ///
    /// 작업이 버려지면 `invoke` 계열의 응답 채널도 닫혀 호출자는 `DispatcherClosed`를 받습니다.
    fn drop_abandoned(&self) {
        // 송신 측을 먼저 내려서 이후의 enqueue는 모두 DispatcherClosed로 실패
        drop(self.inner.sender.lock().take());

        let mut dropped = 0;
        loop {
            let message = self.inner.receiver.lock().try_recv();
            match message {
                Ok(Message::Job(job)) => {
                    drop(job);
                    dropped += 1;
                }
                Ok(Message::Shutdown) => {}
                Err(_) => break,
            }
        }
        if dropped > 0 {
            warn!("Dispatcher closed; dropped {} queued action(s)", dropped);
        }
    }

    fn enqueue(&self, job: Job) -> AppResult<()> {
        let sender = self.inner.sender.lock();
        match sender.as_ref() {
            Some(sender) => sender.send(Message::Job(job)).map_err(|_| AppError::DispatcherClosed),
            None => Err(AppError::DispatcherClosed),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("ui_thread", &self.inner.ui_thread.get())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn run_caught<F, R>(f: F) -> AppResult<R>
where
    F: FnOnce() -> R,
{
    catching(f).map_err(|payload| AppError::Panicked(panic_message(payload.as_ref())))
}
