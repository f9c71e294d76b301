/*!
 * SQL Tx Engine - driver-agnostic transaction orchestration
 *
 * This crate executes an ordered batch of data-modifying SQL operations as a
 * single logical database transaction, retrying transient failures with
 * backoff, recovering broken sessions, and refusing to silently replay a
 * non-idempotent batch whose commit outcome is unknown.
 *
 * # Features
 *
 * - Retry state machine over a host-supplied [`Connection`]
 * - Deepest-first error classification into fatal / transient / connection
 *   kinds, with pluggable driver heuristics
 * - Exponential backoff with additive jitter, pluggable sleep primitive
 * - Execution plans that freeze a batch once and replay it on every retry,
 *   with optional per-attempt deferred query building
 * - Explicit commit-uncertainty reporting for non-idempotent batches
 *
 * # Example
 *
 * ```rust,no_run
 * use std::sync::Arc;
 * use sql_tx_engine::prelude::*;
 *
 * async fn transfer(conn: impl Connection) -> Result<(), TxEngineError> {
 *     let policy = RetryPolicy::new(
 *         3,
 *         Arc::new(ExponentialBackoff::new(100, 5_000, 2.0, 50)?),
 *     );
 *     let mut manager = TransactionManager::builder(conn)
 *         .default_policy(policy)
 *         .finish();
 *
 *     let ops: Vec<Box<dyn Operation>> = vec![
 *         Box::new(QueryOperation::new(Query::new(
 *             "UPDATE accounts SET balance = balance - $1 WHERE id = $2",
 *             vec![ParamValue::Int(100), ParamValue::Int(1)],
 *         ))),
 *         Box::new(QueryOperation::new(Query::new(
 *             "UPDATE accounts SET balance = balance + $1 WHERE id = $2",
 *             vec![ParamValue::Int(100), ParamValue::Int(2)],
 *         ))),
 *     ];
 *
 *     let options = TxOptions::new().with_isolation(IsolationLevel::Serializable);
 *     let result = manager.run(ops, &options).await?;
 *     assert_eq!(result.affected_rows, 2);
 *     Ok(())
 * }
 * ```
 */

#![forbid(unsafe_code)]

// Re-export everything that should be part of the public API
pub mod prelude {
    //! Convenient imports for common functionality.

    pub use crate::backoff::{BackoffStrategy, ExponentialBackoff, NoBackoff};
    pub use crate::classify::{ErrorClassifier, ErrorKind, Heuristics, SqlStateHeuristics};
    pub use crate::connection::Connection;
    pub use crate::error::{DriverDiagnostics, DriverError, ErrorCode, TxEngineError};
    pub use crate::manager::{RunResult, TransactionManager};
    pub use crate::operation::{Operation, QueryOperation};
    pub use crate::plan::ExecutionPlan;
    pub use crate::policy::{RetryPolicy, TxOptions};
    pub use crate::query::Query;
    pub use crate::sleeper::{Sleeper, TokioSleeper};
    pub use crate::types::{IsolationLevel, ParamType, ParamValue, ReuseHint};
}

// Core modules
pub mod backoff;
pub mod classify;
pub mod connection;
pub mod error;
pub mod manager;
pub mod operation;
pub mod plan;
pub mod policy;
pub mod query;
pub mod sleeper;
pub mod types;

// Direct exports of frequently used types for simplicity
pub use backoff::{BackoffStrategy, ExponentialBackoff, NoBackoff};
pub use classify::{ErrorClassifier, ErrorKind, Heuristics, SqlStateHeuristics};
pub use connection::Connection;
pub use error::{DriverDiagnostics, DriverError, ErrorCode, TxEngineError};
pub use manager::{RunResult, TransactionManager, TransactionManagerBuilder};
pub use operation::{Operation, QueryOperation};
pub use plan::ExecutionPlan;
pub use policy::{RetryPolicy, TxOptions};
pub use query::Query;
pub use sleeper::{Sleeper, TokioSleeper};
pub use types::{IsolationLevel, ParamType, ParamValue, ReuseHint};
