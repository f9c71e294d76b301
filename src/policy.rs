use std::sync::Arc;

use crate::backoff::{BackoffStrategy, NoBackoff};
use crate::types::IsolationLevel;

/// Retry budget plus the backoff strategy that paces it.
///
/// `max_retries` counts additional attempts after the first: a policy with
/// `max_retries = k` allows `k + 1` attempts in total.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Arc<dyn BackoffStrategy>,
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(max_retries: u32, backoff: Arc<dyn BackoffStrategy>) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self::new(0, Arc::new(NoBackoff))
    }

    /// Additional attempts allowed after the first.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The pacing strategy.
    #[must_use]
    pub fn backoff(&self) -> &dyn BackoffStrategy {
        self.backoff.as_ref()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retries()
    }
}

/// Per-run options.
///
/// The zero value is meaningful: no isolation override (the session default
/// prevails) and the manager's configured default retry policy.
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    /// Isolation level to apply at begin time, or `None` to leave the
    /// session default untouched.
    pub isolation: Option<IsolationLevel>,
    /// Retry policy for this run, or `None` to use the manager's default.
    pub retry_policy: Option<RetryPolicy>,
}

impl TxOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the isolation level for this run.
    #[must_use]
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = Some(isolation);
        self
    }

    /// Override the retry policy for this run.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_policy_never_retries_and_never_waits() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 0);
        assert_eq!(policy.backoff().delay(0), Duration::ZERO);
    }

    #[test]
    fn default_options_override_nothing() {
        let options = TxOptions::new();
        assert!(options.isolation.is_none());
        assert!(options.retry_policy.is_none());
    }

    #[test]
    fn options_builders() {
        let options = TxOptions::new()
            .with_isolation(IsolationLevel::Serializable)
            .with_retry_policy(RetryPolicy::new(2, Arc::new(NoBackoff)));
        assert_eq!(options.isolation, Some(IsolationLevel::Serializable));
        assert_eq!(options.retry_policy.unwrap().max_retries(), 2);
    }
}
