use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Callback<A> = dyn Fn(A) -> BoxFuture + Send + Sync;

/// Rate limiter that coalesces bursts of calls into at most one callback
/// invocation per window.
///
/// Every call replaces the pending firing, so only the most recent
/// arguments survive. The firing is scheduled for `wait` after the last
/// *actual* firing (or after the first call ever), not after the first
/// call of the burst. A burst that outlasts the window therefore fires
/// more than once.
pub struct Throttle<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    wait: Duration,
    callback: Box<Callback<A>>,
    state: Mutex<ThrottleState>,
}

#[derive(Default)]
struct ThrottleState {
    last_fire: Option<Instant>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl<A: Send + 'static> Throttle<A> {
    pub fn new<F, Fut>(wait: Duration, callback: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: Box<Callback<A>> = Box::new(move |args| -> BoxFuture { Box::pin(callback(args)) });
        Self {
            inner: Arc::new(Inner {
                wait,
                callback,
                state: Mutex::new(ThrottleState::default()),
            }),
        }
    }

    /// Schedule a throttled invocation with `args`.
    ///
    /// Must be called from within a Tokio runtime. Outside of one the call
    /// is dropped with a warning and `false` is returned.
    pub fn call(&self, args: A) -> bool {
        let Ok(handle) = Handle::try_current() else {
            tracing::warn!("throttled call outside of a tokio runtime, skipping");
            return false;
        };

        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let baseline = *state.last_fire.get_or_insert(now);

        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        let delay = self.inner.wait.saturating_sub(now.duration_since(baseline));
        let inner = Arc::clone(&self.inner);
        state.pending = Some(handle.spawn(async move {
            sleep(delay).await;
            if let Some(fire) = inner.try_fire(generation, args) {
                fire.await;
            }
        }));
        true
    }

    pub fn wait(&self) -> Duration {
        self.inner.wait
    }

    /// Whether a firing is scheduled but has not started yet.
    pub fn has_pending(&self) -> bool {
        let state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<A> Inner<A> {
    fn try_fire(&self, generation: u64, args: A) -> Option<BoxFuture> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation != generation {
            return None;
        }
        let now = Instant::now();
        let elapsed = state.last_fire.map_or(self.wait, |last| now.duration_since(last));
        if elapsed < self.wait {
            return None;
        }
        state.last_fire = Some(now);
        // Detach: a newer call must not abort a firing that already began.
        state.pending = None;
        Some((self.callback)(args))
    }
}

impl<A> Clone for Throttle<A> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<A> fmt::Debug for Throttle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle").field("wait", &self.inner.wait).finish_non_exhaustive()
    }
}
