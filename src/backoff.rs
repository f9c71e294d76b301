use std::time::Duration;

use rand::Rng;

use crate::error::TxEngineError;

/// Maps a zero-based attempt index to the delay inserted before the next
/// attempt.
pub trait BackoffStrategy: std::fmt::Debug + Send + Sync {
    /// Delay to wait after attempt `attempt` failed.
    fn delay(&self, attempt: u32) -> Duration;
}

/// Strategy that never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl NoBackoff {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BackoffStrategy for NoBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Exponential backoff with additive jitter.
///
/// The deterministic term `base · multiplier^attempt` is capped at
/// `max_delay_ms`; the uniform jitter in `[0, jitter_ms]` is added after
/// capping, so an observed delay may exceed the cap by up to the jitter.
///
/// ```rust
/// use sql_tx_engine::prelude::*;
///
/// let backoff = ExponentialBackoff::new(100, 5_000, 2.0, 0).unwrap();
/// assert_eq!(backoff.delay(3).as_millis(), 800);
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: f64,
    jitter_ms: u64,
}

impl ExponentialBackoff {
    /// Create a strategy, validating the parameter bounds.
    ///
    /// # Errors
    /// `TxEngineError::InvalidArgument` if `max_delay_ms < base_delay_ms` or
    /// `multiplier <= 1.0`.
    pub fn new(
        base_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
        jitter_ms: u64,
    ) -> Result<Self, TxEngineError> {
        if max_delay_ms < base_delay_ms {
            return Err(TxEngineError::InvalidArgument(format!(
                "max delay ({max_delay_ms}ms) must be at least the base delay ({base_delay_ms}ms)"
            )));
        }
        if multiplier.is_nan() || multiplier <= 1.0 {
            return Err(TxEngineError::InvalidArgument(format!(
                "multiplier must be greater than 1.0, got {multiplier}"
            )));
        }
        Ok(Self {
            base_delay_ms,
            max_delay_ms,
            multiplier,
            jitter_ms,
        })
    }

    /// Create a builder with the pack-standard defaults.
    #[must_use]
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// The capped deterministic term for an attempt, without jitter.
    fn capped_delay_ms(&self, attempt: u32) -> u64 {
        let raw = (self.base_delay_ms as f64) * self.multiplier.powi(attempt as i32);
        let capped = raw.min(self.max_delay_ms as f64);
        capped as u64
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let mut delay_ms = self.capped_delay_ms(attempt);
        if self.jitter_ms > 0 {
            delay_ms += rand::thread_rng().gen_range(0..=self.jitter_ms);
        }
        Duration::from_millis(delay_ms)
    }
}

/// Fluent builder for [`ExponentialBackoff`].
#[derive(Debug, Clone)]
pub struct ExponentialBackoffBuilder {
    base_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: f64,
    jitter_ms: u64,
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter_ms: 0,
        }
    }
}

impl ExponentialBackoffBuilder {
    #[must_use]
    pub fn base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn jitter_ms(mut self, ms: u64) -> Self {
        self.jitter_ms = ms;
        self
    }

    /// Validate and build the strategy.
    ///
    /// # Errors
    /// Same bounds as [`ExponentialBackoff::new`].
    pub fn build(self) -> Result<ExponentialBackoff, TxEngineError> {
        ExponentialBackoff::new(
            self.base_delay_ms,
            self.max_delay_ms,
            self.multiplier,
            self.jitter_ms,
        )
    }
}
