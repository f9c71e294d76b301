use thiserror::Error;

/// Errors raised out of [`TransactionManager::run`](crate::manager::TransactionManager::run)
/// and the plan/backoff constructors.
#[derive(Debug, Error)]
pub enum TxEngineError {
    /// A failure reported by the underlying connection (or an operation
    /// wrapping one). Carries the driver's diagnostics chain.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Constructor-level rejection: empty plans, mismatched parameter/type
    /// arity, out-of-range backoff parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation failed to produce its query.
    #[error("operation build failed: {0}")]
    OperationBuild(String),

    /// A commit call failed after the session had accepted every statement,
    /// on a batch that is not idempotent. The transaction may or may not be
    /// durable on the server; replaying it could duplicate effects.
    #[error(
        "commit failed in unknown state; manual reconciliation required \
         because the operation batch is not idempotent"
    )]
    UnknownCommitState(#[source] Box<TxEngineError>),
}

impl TxEngineError {
    /// Wrap an attempt error as a commit-uncertainty failure.
    #[must_use]
    pub fn unknown_commit_state(cause: TxEngineError) -> Self {
        Self::UnknownCommitState(Box::new(cause))
    }

    /// True if this is the commit-uncertainty error.
    #[must_use]
    pub fn is_unknown_commit_state(&self) -> bool {
        matches!(self, Self::UnknownCommitState(_))
    }
}

/// Status code attached to a driver error: some drivers report numeric
/// vendor codes, others report SQLSTATE-shaped strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// Numeric vendor code (e.g. MySQL 1213).
    Numeric(i64),
    /// Textual code, typically starting with a 5-character SQLSTATE.
    Text(String),
}

/// Structured diagnostics some drivers expose alongside the error itself,
/// in the `[sqlstate, vendor code, message]` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverDiagnostics {
    /// SQLSTATE from the diagnostics record, when textual.
    pub sqlstate: Option<String>,
    /// Vendor code from the diagnostics record, when numeric.
    pub code: Option<i64>,
    /// Driver-level message, if distinct from the error message.
    pub message: Option<String>,
}

/// Driver-agnostic database error.
///
/// Hosts adapt their driver's error type into this shape so the classifier
/// can inspect SQLSTATEs and vendor codes without knowing the driver.
/// Wrapping layers chain through `source`, and the classifier walks that
/// chain deepest-first: the innermost frame carries the driver's own
/// diagnostics and wins over any re-wrapped outer frame.
///
/// ```rust
/// use sql_tx_engine::prelude::*;
///
/// let err = DriverError::new("statement aborted")
///     .with_source(DriverError::new("Deadlock found").with_code(1213));
/// assert_eq!(err.chain().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DriverError {
    message: String,
    code: Option<ErrorCode>,
    diagnostics: Option<DriverDiagnostics>,
    sqlstate: Option<String>,
    source: Option<Box<DriverError>>,
}

impl DriverError {
    /// Create an error with a message and no diagnostics.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            diagnostics: None,
            sqlstate: None,
            source: None,
        }
    }

    /// Attach a numeric status code.
    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(ErrorCode::Numeric(code));
        self
    }

    /// Attach a textual status code.
    #[must_use]
    pub fn with_text_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(ErrorCode::Text(code.into()));
        self
    }

    /// Attach a structured diagnostics record.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DriverDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Attach the SQLSTATE reported by a dedicated accessor on the driver
    /// error (consulted last during extraction).
    #[must_use]
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    /// Chain an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: DriverError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The human-readable message for this frame.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The status code for this frame, if any.
    #[must_use]
    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    /// The structured diagnostics for this frame, if any.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&DriverDiagnostics> {
        self.diagnostics.as_ref()
    }

    /// The accessor-reported SQLSTATE for this frame, if any.
    #[must_use]
    pub fn sqlstate(&self) -> Option<&str> {
        self.sqlstate.as_deref()
    }

    /// The wrapped cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&DriverError> {
        self.source.as_deref()
    }

    /// Iterate the causal chain from this (outermost) frame to the deepest
    /// cause. Callers that want driver-authoritative order reverse it.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Iterator over a [`DriverError`] causal chain, outermost first.
pub struct Chain<'a> {
    next: Option<&'a DriverError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a DriverError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.cause();
        Some(current)
    }
}
