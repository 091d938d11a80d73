//! 싱글톤 한 개를 감싸는 지연 초기화 셀
//!
//! 상태 전이는 `Uninitialized → Initializing → Initialized | Faulted` 한 방향입니다.
//!
//! - 첫 호출자만 팩토리를 실행하고, 동시에 들어온 호출자는 결과(또는 실패)가
//!   게시될 때까지 기다립니다.
//! - 게시된 결과는 `OnceCell`에 보관되어 이후에는 잠금 없이 읽습니다.
//! - 실패한 셀은 재시도하지 않고 같은 에러를 매번 돌려줍니다.
//! - 같은 스레드에서 초기화 중인 셀을 다시 요청하면 즉시 실패합니다.
//! - 다른 스레드를 기다리는 시간은 `timeout`으로 제한됩니다.

use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use crate::core::errors::{AppError, AppResult};
use crate::core::registry::{Instance, TypeKey};

/// 셀의 관찰 가능한 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Uninitialized,
    Initializing,
    Initialized,
    Faulted,
}

pub(crate) struct LazyCell {
    published: OnceCell<AppResult<Instance>>,
    owner: Mutex<Option<ThreadId>>,
    ready: Condvar,
}

impl LazyCell {
    pub(crate) fn new() -> Self {
        Self {
            published: OnceCell::new(),
            owner: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// 게시된 결과가 있으면 잠금 없이 돌려줍니다.
    pub(crate) fn get(&self) -> Option<&AppResult<Instance>> {
        self.published.get()
    }

    pub(crate) fn state(&self) -> CellState {
        match self.published.get() {
            Some(Ok(_)) => CellState::Initialized,
            Some(Err(_)) => CellState::Faulted,
            None if self.owner.lock().is_some() => CellState::Initializing,
            None => CellState::Uninitialized,
        }
    }

    pub(crate) fn get_or_init<F>(&self, key: &TypeKey, timeout: Duration, init: F) -> AppResult<Instance>
    where
        F: FnOnce() -> AppResult<Instance>,
    {
        if let Some(outcome) = self.published.get() {
            return outcome.clone();
        }

        let current = thread::current().id();
        let deadline = Instant::now() + timeout;
        {
            let mut owner = self.owner.lock();
            loop {
                if let Some(outcome) = self.published.get() {
                    return outcome.clone();
                }
                match *owner {
                    None => {
                        *owner = Some(current);
                        break;
                    }
                    Some(id) if id == current => {
                        return Err(AppError::CircularDependency {
                            service: key.to_string(),
                            chain: format!("{} -> {}", key, key),
                        });
                    }
                    Some(_) => {
                        if self.ready.wait_until(&mut owner, deadline).timed_out() {
                            if let Some(outcome) = self.published.get() {
                                return outcome.clone();
                            }
                            return Err(AppError::ContentionTimeout {
                                service: key.to_string(),
                                waited_ms: timeout.as_millis() as u64,
                            });
                        }
                    }
                }
            }
        }

        // `init`에서 panic으로 빠져나가도 대기자는 깨워야 함
        let _release = ReleaseOnDrop(self);

        let outcome = init().map_err(|source| AppError::ResolutionFailed {
            service: key.to_string(),
            source: Arc::new(source),
        });
        let _ = self.published.set(outcome.clone());
        outcome
    }
}

struct ReleaseOnDrop<'a>(&'a LazyCell);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        let mut owner = self.0.owner.lock();
        *owner = None;
        self.0.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    struct Marker;

    fn key() -> TypeKey {
        TypeKey::of::<Marker>()
    }

    #[test]
    fn test_publishes_once_and_caches() {
        let cell = LazyCell::new();
        let runs = AtomicUsize::new(0);
        assert_eq!(cell.state(), CellState::Uninitialized);

        let first = cell
            .get_or_init(&key(), Duration::from_secs(1), || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(7u32) as Instance)
            })
            .unwrap();
        let second = cell
            .get_or_init(&key(), Duration::from_secs(1), || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(8u32) as Instance)
            })
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cell.state(), CellState::Initialized);
    }

    #[test]
    fn test_faulted_cell_replays_error_without_retry() {
        let cell = LazyCell::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            let error = cell
                .get_or_init(&key(), Duration::from_secs(1), || {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::NotRegistered { service: "Clipboard".to_string() })
                })
                .err()
                .unwrap();
            match error {
                AppError::ResolutionFailed { service, source } => {
                    assert_eq!(service, "Marker");
                    assert!(matches!(*source, AppError::NotRegistered { .. }));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cell.state(), CellState::Faulted);
    }

    #[test]
    fn test_reentrant_init_on_same_thread_fails_fast() {
        let cell = LazyCell::new();

        let result = cell.get_or_init(&key(), Duration::from_secs(1), || {
            let inner = cell.get_or_init(&key(), Duration::from_secs(1), || Ok(Arc::new(1u8) as Instance));
            assert!(matches!(inner, Err(AppError::CircularDependency { .. })));
            inner
        });

        match result {
            Err(AppError::ResolutionFailed { source, .. }) => {
                assert!(matches!(*source, AppError::CircularDependency { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_waiter_times_out_while_other_thread_constructs() {
        let cell = Arc::new(LazyCell::new());
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let builder = {
            let cell = cell.clone();
            let started = started.clone();
            let release = release.clone();
            thread::spawn(move || {
                cell.get_or_init(&key(), Duration::from_secs(5), || {
                    started.wait();
                    release.wait();
                    Ok(Arc::new(1u8) as Instance)
                })
            })
        };

        started.wait();
        assert_eq!(cell.state(), CellState::Initializing);
        let waited = cell.get_or_init(&key(), Duration::from_millis(50), || Ok(Arc::new(2u8) as Instance));
        assert!(matches!(waited, Err(AppError::ContentionTimeout { waited_ms: 50, .. })));

        release.wait();
        let built = builder.join().unwrap().unwrap();
        let after = cell.get_or_init(&key(), Duration::from_millis(50), || Ok(Arc::new(3u8) as Instance)).unwrap();
        assert!(Arc::ptr_eq(&built, &after));
    }
}
