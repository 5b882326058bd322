use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Trailing debounce: only the last value handed to `call` within a quiet
/// period comes out, and every call restarts the period.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet_period: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    pub fn call(&mut self, value: T) {
        self.call_at(value, Instant::now());
    }

    pub fn call_at(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet_period));
    }

    /// The latest value, once its quiet period has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Wait out the quiet period and take the value. `None` if nothing is
    /// waiting.
    pub async fn settled(&mut self) -> Option<T> {
        let deadline = self.pending.as_ref()?.1;
        sleep_until(deadline).await;
        self.poll(Instant::now())
    }
}
