use crate::error::TxEngineError;
use crate::types::{ParamType, ParamValue, ReuseHint};

/// An executable SQL statement: text, ordered parameters, their driver-facing
/// type tags, and an advisory reuse hint.
///
/// Immutable once constructed; the engine replays the same `Query` values on
/// every retry of an eagerly built step.
///
/// ```rust
/// use sql_tx_engine::prelude::*;
///
/// let q = Query::new(
///     "UPDATE accounts SET balance = balance - $1 WHERE id = $2",
///     vec![ParamValue::Int(100), ParamValue::Int(42)],
/// );
/// assert_eq!(q.types().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<ParamValue>,
    types: Vec<ParamType>,
    reuse: ReuseHint,
}

impl Query {
    /// Create a query, inferring one type tag per parameter value.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<ParamValue>) -> Self {
        let types = params.iter().map(ParamValue::param_type).collect();
        Self {
            sql: sql.into(),
            params,
            types,
            reuse: ReuseHint::default(),
        }
    }

    /// Create a query with no parameters.
    #[must_use]
    pub fn new_without_params(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Create a query with explicit type tags.
    ///
    /// # Errors
    /// Returns `TxEngineError::InvalidArgument` if the tag list does not have
    /// the same arity as the parameter list.
    pub fn with_types(
        sql: impl Into<String>,
        params: Vec<ParamValue>,
        types: Vec<ParamType>,
    ) -> Result<Self, TxEngineError> {
        if types.len() != params.len() {
            return Err(TxEngineError::InvalidArgument(format!(
                "expected {} parameter types, got {}",
                params.len(),
                types.len()
            )));
        }
        Ok(Self {
            sql: sql.into(),
            params,
            types,
            reuse: ReuseHint::default(),
        })
    }

    /// Set the statement-reuse hint.
    #[must_use]
    pub fn with_reuse_hint(mut self, reuse: ReuseHint) -> Self {
        self.reuse = reuse;
        self
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameter values, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[ParamValue] {
        &self.params
    }

    /// The type tags, same arity as `params`.
    #[must_use]
    pub fn types(&self) -> &[ParamType] {
        &self.types
    }

    /// The advisory reuse hint.
    #[must_use]
    pub fn reuse_hint(&self) -> ReuseHint {
        self.reuse
    }
}
