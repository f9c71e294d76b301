use std::time::Duration;

use async_trait::async_trait;

/// Pluggable wait primitive consumed by the retry loop.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the caller for at least `delay`.
    async fn sleep(&self, delay: Duration);
}

/// Production sleeper backed by the tokio timer.
///
/// Zero delays return immediately without touching the timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl TokioSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}
