use crate::error::TxEngineError;
use crate::query::Query;

/// A unit of data-modifying work submitted to the engine.
///
/// `build` produces the statement to execute. For ordinary operations it is
/// called once, when the plan is constructed, and the resulting [`Query`] is
/// replayed on every retry. Operations that derive their SQL from reads
/// performed earlier in the same transaction override [`defer_build`] to
/// return `true`; the engine then calls `build` inside every attempt instead,
/// so the statement reflects that attempt's view of the data.
///
/// `is_idempotent` describes the effect of the resulting statement on the
/// database, not of calling the method: it must return `true` exactly when
/// executing the statement twice in a row leaves the database in the same
/// state as executing it once. The engine uses the conjunction over a whole
/// batch to decide whether a failed commit can safely be retried.
pub trait Operation: Send + Sync {
    /// Produce the query for this operation.
    ///
    /// # Errors
    /// Propagated out of `run`; a failure from a deferred build is classified
    /// like any other in-transaction error.
    fn build(&self) -> Result<Query, TxEngineError>;

    /// Whether executing this operation's query twice yields the same final
    /// database state as executing it once.
    fn is_idempotent(&self) -> bool;

    /// Whether `build` must be re-run inside each attempt's transaction.
    ///
    /// A per-type constant: all instances of an implementation answer the
    /// same way.
    fn defer_build(&self) -> bool {
        false
    }
}

/// The common case: an operation wrapping an already-built query.
///
/// ```rust
/// use sql_tx_engine::prelude::*;
///
/// let op = QueryOperation::new(Query::new(
///     "UPDATE counters SET n = 0 WHERE id = $1",
///     vec![ParamValue::Int(1)],
/// ))
/// .idempotent(true);
/// assert!(op.is_idempotent());
/// ```
#[derive(Debug, Clone)]
pub struct QueryOperation {
    query: Query,
    idempotent: bool,
}

impl QueryOperation {
    /// Wrap a query; assumed non-idempotent until marked otherwise.
    #[must_use]
    pub fn new(query: Query) -> Self {
        Self {
            query,
            idempotent: false,
        }
    }

    /// Declare whether re-executing the query is effect-equivalent to
    /// executing it once.
    #[must_use]
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }
}

impl Operation for QueryOperation {
    fn build(&self) -> Result<Query, TxEngineError> {
        Ok(self.query.clone())
    }

    fn is_idempotent(&self) -> bool {
        self.idempotent
    }
}
