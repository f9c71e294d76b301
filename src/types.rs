use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Scalar values bound to query placeholders.
///
/// The same enum is used regardless of backend so operations do not need to
/// branch on driver types:
/// ```rust
/// use sql_tx_engine::prelude::*;
///
/// let params = vec![
///     ParamValue::Int(1),
///     ParamValue::Text("alice".into()),
///     ParamValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl ParamValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The driver-facing type tag for this value.
    #[must_use]
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
            Self::Text(_) => ParamType::Text,
            Self::Bool(_) => ParamType::Bool,
            Self::Timestamp(_) => ParamType::Timestamp,
            Self::Null => ParamType::Null,
            Self::Json(_) => ParamType::Json,
            Self::Blob(_) => ParamType::Blob,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let ParamValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let ParamValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }
}

/// Type tag a driver may use when binding a parameter.
///
/// Tags are advisory metadata carried alongside the values; the engine never
/// interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
    Text,
    Bool,
    Timestamp,
    Null,
    Json,
    Blob,
}

/// Transaction isolation level applied at begin time.
///
/// Absence (the `Option::None` side of `TxOptions::isolation`) means the
/// session default prevails and no `SET TRANSACTION` statement is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Advisory hint about how long a prepared form of a query is worth keeping.
///
/// Purely an optimization hint for the connection; it must never affect
/// execution results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReuseHint {
    /// No reuse expected.
    #[default]
    None,
    /// The statement recurs within a single transaction.
    PerTransaction,
    /// The statement recurs for the lifetime of the connection.
    PerConnection,
}
