use tracing::{debug, warn};

use crate::classify::{ErrorClassifier, ErrorKind};
use crate::connection::Connection;
use crate::error::TxEngineError;
use crate::operation::Operation;
use crate::plan::ExecutionPlan;
use crate::policy::{RetryPolicy, TxOptions};
use crate::sleeper::{Sleeper, TokioSleeper};

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Sum of affected-row counts across the successful attempt only;
    /// partial totals from failed attempts are discarded.
    pub affected_rows: u64,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
}

/// Executes an ordered batch of operations as one database transaction,
/// retrying transient failures, recovering broken sessions, and refusing to
/// silently replay a non-idempotent batch whose commit outcome is unknown.
///
/// One manager drives one [`Connection`]; the connection is used exclusively
/// by the manager for the duration of each `run`.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use sql_tx_engine::prelude::*;
///
/// # async fn demo(conn: impl Connection) -> Result<(), TxEngineError> {
/// let mut manager = TransactionManager::builder(conn)
///     .default_policy(RetryPolicy::new(
///         3,
///         Arc::new(ExponentialBackoff::new(100, 5_000, 2.0, 50)?),
///     ))
///     .finish();
///
/// let ops: Vec<Box<dyn Operation>> = vec![
///     Box::new(
///         QueryOperation::new(Query::new(
///             "UPDATE accounts SET balance = balance - $1 WHERE id = $2",
///             vec![ParamValue::Int(100), ParamValue::Int(42)],
///         ))
///         .idempotent(false),
///     ),
/// ];
/// let result = manager.run(ops, &TxOptions::new()).await?;
/// assert_eq!(result.affected_rows, 1);
/// # Ok(()) }
/// ```
pub struct TransactionManager<C> {
    connection: C,
    classifier: ErrorClassifier,
    sleeper: Box<dyn Sleeper>,
    default_policy: RetryPolicy,
}

impl<C: Connection> TransactionManager<C> {
    /// Create a manager with the default classifier, the tokio sleeper, and
    /// a zero-retry default policy.
    #[must_use]
    pub fn new(connection: C) -> Self {
        Self::builder(connection).finish()
    }

    /// Start configuring a manager.
    #[must_use]
    pub fn builder(connection: C) -> TransactionManagerBuilder<C> {
        TransactionManagerBuilder {
            connection,
            classifier: ErrorClassifier::default(),
            sleeper: Box::new(TokioSleeper::new()),
            default_policy: RetryPolicy::no_retries(),
        }
    }

    /// Execute a batch of operations as one transaction.
    ///
    /// The batch is frozen into an [`ExecutionPlan`] once, before the first
    /// transaction begins; retries replay the same plan in the same order.
    /// Deferred operations rebuild their query inside every attempt.
    ///
    /// # Errors
    /// - `InvalidArgument` for an empty batch, and any eager build failure,
    ///   before any transaction is begun.
    /// - `UnknownCommitState` when a commit call fails on a non-idempotent
    ///   batch, wrapping the commit error as its source.
    /// - Otherwise the last attempt's error, unchanged, once it classifies
    ///   `Fatal` or the retry budget is spent.
    pub async fn run(
        &mut self,
        operations: Vec<Box<dyn Operation>>,
        options: &TxOptions,
    ) -> Result<RunResult, TxEngineError> {
        let plan = ExecutionPlan::build(operations)?;
        self.run_plan(&plan, options).await
    }

    /// Execute a single operation as one transaction.
    ///
    /// # Errors
    /// As for [`run`](Self::run).
    pub async fn run_one(
        &mut self,
        operation: Box<dyn Operation>,
        options: &TxOptions,
    ) -> Result<RunResult, TxEngineError> {
        self.run(vec![operation], options).await
    }

    /// Give the connection back to the host.
    #[must_use]
    pub fn into_connection(self) -> C {
        self.connection
    }

    async fn run_plan(
        &mut self,
        plan: &ExecutionPlan,
        options: &TxOptions,
    ) -> Result<RunResult, TxEngineError> {
        let policy = options
            .retry_policy
            .clone()
            .unwrap_or_else(|| self.default_policy.clone());

        let mut attempt: u32 = 0;
        loop {
            debug!(attempt, steps = plan.len(), "beginning transaction attempt");
            let mut committing = false;
            let outcome = self
                .attempt(plan, options, attempt == 0, &mut committing)
                .await;

            let err = match outcome {
                Ok(affected_rows) => {
                    return Ok(RunResult {
                        affected_rows,
                        attempts: attempt + 1,
                    });
                }
                Err(err) => err,
            };

            self.safe_rollback().await;

            // A failed commit on a non-idempotent batch may or may not have
            // become durable; replaying would risk duplicate effects. This
            // outranks classification and the retry budget.
            if committing && !plan.is_idempotent() {
                return Err(TxEngineError::unknown_commit_state(err));
            }

            let kind = self.classifier.classify(&err);
            if kind == ErrorKind::Fatal {
                return Err(err);
            }
            if attempt >= policy.max_retries() {
                return Err(err);
            }
            if kind == ErrorKind::Connection {
                self.connection.close().await;
            }

            let delay = policy.backoff().delay(attempt);
            warn!(
                attempt,
                ?kind,
                delay_ms = delay.as_millis() as u64,
                "transaction attempt failed; retrying"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &mut self,
        plan: &ExecutionPlan,
        options: &TxOptions,
        allow_reconnect: bool,
        committing: &mut bool,
    ) -> Result<u64, TxEngineError> {
        self.begin(options, allow_reconnect).await?;

        let mut total: u64 = 0;
        for step in plan.steps() {
            let query = step.resolve()?;
            total += self.connection.execute(&query).await?;
        }

        *committing = true;
        self.connection.commit().await?;
        Ok(total)
    }

    /// Begin a transaction. On the first attempt of a run, one begin failure
    /// is absorbed by discarding the (possibly stale, long-lived) session and
    /// beginning once more; this reconnect is not charged to the retry
    /// budget. The second failure, like any begin failure on a later
    /// attempt, propagates into the normal classification path.
    async fn begin(
        &mut self,
        options: &TxOptions,
        allow_reconnect: bool,
    ) -> Result<(), TxEngineError> {
        match self.connection.begin_with_options(options).await {
            Ok(()) => Ok(()),
            Err(_first) if allow_reconnect => {
                debug!("begin failed on first attempt; reconnecting once");
                self.connection.close().await;
                self.connection
                    .begin_with_options(options)
                    .await
                    .map_err(TxEngineError::from)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Roll back, discarding any rollback error: the attempt's original
    /// error must never be masked by the cleanup failing.
    async fn safe_rollback(&mut self) {
        if let Err(err) = self.connection.rollback().await {
            debug!(error = %err, "rollback failed; ignoring");
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for TransactionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("connection", &self.connection)
            .field("default_policy", &self.default_policy)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`TransactionManager`].
pub struct TransactionManagerBuilder<C> {
    connection: C,
    classifier: ErrorClassifier,
    sleeper: Box<dyn Sleeper>,
    default_policy: RetryPolicy,
}

impl<C: Connection> TransactionManagerBuilder<C> {
    /// Replace the error classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the sleeper.
    #[must_use]
    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Set the policy used when `TxOptions::retry_policy` is absent.
    #[must_use]
    pub fn default_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Build the manager.
    #[must_use]
    pub fn finish(self) -> TransactionManager<C> {
        TransactionManager {
            connection: self.connection,
            classifier: self.classifier,
            sleeper: self.sleeper,
            default_policy: self.default_policy,
        }
    }
}
