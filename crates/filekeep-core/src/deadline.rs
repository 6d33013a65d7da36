//! Bounded waits around native suspension points.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{Result, StoreError};

/// Await `fut`, failing with [`StoreError::Timeout`] if it takes longer than `after`.
pub async fn bounded<T, F>(op: &'static str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("{} timed out after {:?}", op, after);
            Err(StoreError::Timeout { op, after })
        }
    }
}

/// Set once the caller of a blocking call has given up on it.
///
/// Blocking work checks it before its commit point and bails out instead of
/// committing.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail if cancelled. Call right before making a change durable.
    pub fn check(&self, op: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(StoreError::Task(format!("{} cancelled", op)));
        }
        Ok(())
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Run a blocking storage call on the blocking pool, bounded by `after`.
pub async fn bounded_blocking<T, F>(op: &'static str, after: Duration, f: F) -> Result<T>
where
    F: FnOnce(&CancelFlag) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    bounded_blocking_with(op, after, f, || {}).await
}

/// Like [`bounded_blocking`], with a hook that nudges the call to stop.
///
/// On timeout the flag is raised, `on_timeout` runs, and the call is awaited
/// to completion before returning, so nothing it does outlives the caller.
/// A call that still finishes successfully has made its change durable, and
/// its value is returned instead of the timeout.
pub async fn bounded_blocking_with<T, F, I>(
    op: &'static str,
    after: Duration,
    f: F,
    on_timeout: I,
) -> Result<T>
where
    F: FnOnce(&CancelFlag) -> Result<T> + Send + 'static,
    T: Send + 'static,
    I: FnOnce(),
{
    let flag = CancelFlag::default();
    let task_flag = flag.clone();
    let mut task = tokio::task::spawn_blocking(move || f(&task_flag));

    match tokio::time::timeout(after, &mut task).await {
        Ok(joined) => joined?,
        Err(_) => {
            log::warn!("{} timed out after {:?}, cancelling", op, after);
            flag.cancel();
            on_timeout();
            match task.await? {
                Ok(value) => {
                    log::warn!("{} completed after its deadline; keeping the result", op);
                    Ok(value)
                }
                Err(e) => {
                    log::debug!("{} stopped after cancel: {}", op, e);
                    Err(StoreError::Timeout { op, after })
                }
            }
        }
    }
}
