//! Worker pool and job handles

use crate::error::TaskError;
use crate::tracker::{InFlight, Tracker};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, oneshot};

/// Identifier of a submitted job (unique per pool)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

struct PoolInner {
    name: String,
    capacity: usize,
    permits: Arc<Semaphore>,
    runtime: Handle,
    tracker: Arc<Tracker>,
    next_id: AtomicU64,
}

/// Bounded pool of blocking workers
///
/// At most `capacity` jobs run at once; further submissions queue on the
/// pool's semaphore without blocking the submitter. Cloning is cheap and
/// clones share the same capacity.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("available", &self.inner.permits.available_permits())
            .finish()
    }
}

impl WorkerPool {
    /// Create a standalone pool with its own job tracking
    pub fn new(name: impl Into<String>, capacity: usize, runtime: Handle) -> Self {
        Self::with_tracker(name, capacity, runtime, Arc::new(Tracker::default()))
    }

    pub(crate) fn with_tracker(
        name: impl Into<String>,
        capacity: usize,
        runtime: Handle,
        tracker: Arc<Tracker>,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                name: name.into(),
                capacity,
                permits: Arc::new(Semaphore::new(capacity)),
                runtime,
                tracker,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Jobs and callbacks not yet settled (shared with sibling pools of an executor)
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.active()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.permits.is_closed()
    }

    /// Submit a blocking job; returns immediately
    pub fn submit<T, F>(&self, label: impl Into<String>, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let id = JobId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let label = label.into();
        let (tx, rx) = oneshot::channel();

        let job_guard = InFlight::enter(&self.inner.tracker);
        let handle_guard = InFlight::enter(&self.inner.tracker);
        let permits = self.inner.permits.clone();
        let pool = self.inner.name.clone();

        log::trace!("[{}] {} '{}' submitted", pool, id, label);

        self.inner.runtime.spawn(async move {
            let outcome = match permits.acquire_owned().await {
                Ok(permit) => {
                    let joined = tokio::task::spawn_blocking(job).await;
                    drop(permit);
                    match joined {
                        Ok(result) => result,
                        Err(err) if err.is_panic() => {
                            Err(TaskError::Panicked(panic_message(&*err.into_panic())))
                        }
                        Err(_) => Err(TaskError::Cancelled),
                    }
                }
                Err(_) => Err(TaskError::ShutDown { pool }),
            };
            // Receiver may be gone if the handle was dropped
            let _ = tx.send(outcome);
            drop(job_guard);
        });

        JobHandle {
            id,
            label,
            rx,
            runtime: self.inner.runtime.clone(),
            guard: handle_guard,
        }
    }

    /// Stop accepting work; queued jobs complete with `TaskError::ShutDown`
    pub fn close(&self) {
        self.inner.permits.close();
    }
}

/// Handle to a submitted job
///
/// Either register a callback with [`JobHandle::on_complete`] or await the
/// result with [`JobHandle::join`]; both consume the handle.
pub struct JobHandle<T> {
    id: JobId,
    label: String,
    rx: oneshot::Receiver<Result<T, TaskError>>,
    runtime: Handle,
    guard: InFlight,
}

impl<T> fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

impl<T: Send + 'static> JobHandle<T> {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run `callback` once the job settles
    ///
    /// The callback runs on the runtime, never on the submitting thread.
    /// A panic inside it is caught and logged.
    pub fn on_complete<C>(self, callback: C)
    where
        C: FnOnce(Result<T, TaskError>) + Send + 'static,
    {
        let JobHandle {
            id,
            label,
            rx,
            runtime,
            guard,
        } = self;

        runtime.spawn(async move {
            let outcome = rx.await.unwrap_or(Err(TaskError::Cancelled));
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || callback(outcome))) {
                log::error!(
                    "{} '{}' completion callback panicked: {}",
                    id,
                    label,
                    panic_message(&*payload)
                );
            }
            drop(guard);
        });
    }

    /// Wait for the job's result
    pub async fn join(self) -> Result<T, TaskError> {
        let JobHandle { rx, guard, .. } = self;
        let outcome = rx.await.unwrap_or(Err(TaskError::Cancelled));
        drop(guard);
        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn pool(capacity: usize) -> WorkerPool {
        WorkerPool::new("test", capacity, Handle::current())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_join_returns_value() {
        let pool = pool(2);
        let handle = pool.submit("add", || Ok(2 + 2));
        assert_eq!(handle.join().await, Ok(4));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_callback_runs_exactly_once() {
        let pool = pool(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let counter = calls.clone();
        pool.submit("value", || Ok::<_, TaskError>("done"))
            .on_complete(move |result| {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(result);
            });

        assert_eq!(rx.recv().await, Some(Ok("done")));
        // Sender was moved into the callback; channel closes once it has run
        assert_eq!(rx.recv().await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_job_error_reaches_callback() {
        let pool = pool(1);
        let (tx, mut rx) = mpsc::unbounded_channel();

        pool.submit("fails", || Err::<(), _>(TaskError::failed("model missing")))
            .on_complete(move |result| {
                let _ = tx.send(result);
            });

        assert_eq!(
            rx.recv().await,
            Some(Err(TaskError::Failed("model missing".to_string())))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_job_panic_is_contained() {
        let pool = pool(1);
        let handle = pool.submit("boom", || -> Result<(), TaskError> { panic!("kaboom") });

        assert_eq!(handle.join().await, Err(TaskError::Panicked("kaboom".to_string())));

        // Pool still usable afterwards
        assert_eq!(pool.submit("after", || Ok(1)).join().await, Ok(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_callback_panic_is_swallowed() {
        let pool = pool(1);
        pool.submit("ok", || Ok(())).on_complete(|_| panic!("callback bug"));

        let tracker = pool.inner.tracker.clone();
        tokio::time::timeout(Duration::from_secs(5), tracker.wait_idle())
            .await
            .unwrap();
        assert_eq!(pool.submit("after", || Ok(7)).join().await, Ok(7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_capacity_bounds_concurrency() {
        let pool = pool(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let running = running.clone();
                let peak = peak.clone();
                pool.submit(format!("job {i}"), move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                })
            })
            .collect();

        for handle in handles {
            handle.join().await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_closed_pool_rejects_jobs() {
        let pool = pool(1);
        pool.close();

        let result = pool.submit("late", || Ok(())).join().await;
        assert_eq!(
            result,
            Err(TaskError::ShutDown {
                pool: "test".to_string()
            })
        );
    }
}
