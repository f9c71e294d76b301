use std::sync::Arc;

use crate::error::{DriverError, ErrorCode, TxEngineError};

/// What the engine may do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Deterministic failure; retrying cannot help.
    Fatal,
    /// Likely to succeed on a fresh attempt (deadlock, serialization
    /// failure, lock timeout).
    Transient,
    /// The session itself is broken; retry after discarding it.
    Connection,
}

/// Driver-specific knowledge about which diagnostics indicate a broken
/// session or a transient condition.
///
/// Both predicates receive the extracted `(sqlstate, vendor code, message)`
/// tuple for one error frame.
pub trait Heuristics: Send + Sync {
    /// Does this frame describe a broken or lost session?
    fn is_connection_issue(&self, sqlstate: Option<&str>, code: Option<i64>, message: &str)
        -> bool;

    /// Does this frame describe a condition worth retrying on the same
    /// session?
    fn is_transient_issue(&self, sqlstate: Option<&str>, code: Option<i64>, message: &str)
        -> bool;
}

/// SQLSTATE and vendor-code tuple extracted from one error frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticTuple {
    /// Five-character SQLSTATE, when one could be determined.
    pub sqlstate: Option<String>,
    /// Numeric vendor code, when one could be determined.
    pub code: Option<i64>,
}

/// Extract the `(sqlstate, code)` pair from a single frame.
///
/// Sources are consulted in authority order: the structured diagnostics
/// record seeds both fields; the frame's own status code fills remaining
/// gaps (a non-zero numeric code becomes the vendor code, a textual code of
/// at least five characters contributes its first five as the SQLSTATE); the
/// dedicated SQLSTATE accessor is a last resort, so a textual status code
/// wins over it.
#[must_use]
pub fn extract_diagnostics(frame: &DriverError) -> DiagnosticTuple {
    let mut out = DiagnosticTuple::default();

    if let Some(diag) = frame.diagnostics() {
        out.sqlstate = diag.sqlstate.clone();
        out.code = diag.code;
    }

    match frame.code() {
        Some(ErrorCode::Numeric(n)) => {
            // A zero code means "absent" on drivers that always report one.
            if *n != 0 && out.code.is_none() {
                out.code = Some(*n);
            }
        }
        Some(ErrorCode::Text(s)) => {
            if out.sqlstate.is_none() && s.chars().count() >= 5 {
                out.sqlstate = Some(s.chars().take(5).collect());
            }
        }
        None => {}
    }

    if out.sqlstate.is_none() {
        if let Some(state) = frame.sqlstate() {
            if !state.is_empty() {
                out.sqlstate = Some(state.to_string());
            }
        }
    }

    out
}

/// Reduces a failure to an [`ErrorKind`] by walking its causal chain.
///
/// The chain is inspected deepest-first: vendor wrappers re-wrap driver
/// exceptions, and the driver's own SQLSTATE is more authoritative than any
/// outer layer. For each frame the heuristics are asked about a connection
/// issue first, then a transient one; the first positive answer decides the
/// kind. A chain with no positive answer is `Fatal`.
#[derive(Clone)]
pub struct ErrorClassifier {
    heuristics: Arc<dyn Heuristics>,
}

impl ErrorClassifier {
    /// Create a classifier around the given heuristics.
    #[must_use]
    pub fn new(heuristics: Arc<dyn Heuristics>) -> Self {
        Self { heuristics }
    }

    /// Classify an error raised during an attempt.
    #[must_use]
    pub fn classify(&self, error: &TxEngineError) -> ErrorKind {
        match error {
            TxEngineError::Driver(driver) => self.classify_chain(driver),
            // Non-driver failures carry no diagnostics; probe on message
            // alone, which the default heuristics answer negatively.
            other => self
                .probe(None, None, &other.to_string())
                .unwrap_or(ErrorKind::Fatal),
        }
    }

    fn classify_chain(&self, outermost: &DriverError) -> ErrorKind {
        let frames: Vec<&DriverError> = outermost.chain().collect();
        for frame in frames.into_iter().rev() {
            let diag = extract_diagnostics(frame);
            if let Some(kind) = self.probe(diag.sqlstate.as_deref(), diag.code, frame.message()) {
                return kind;
            }
        }
        ErrorKind::Fatal
    }

    fn probe(&self, sqlstate: Option<&str>, code: Option<i64>, message: &str) -> Option<ErrorKind> {
        if self.heuristics.is_connection_issue(sqlstate, code, message) {
            return Some(ErrorKind::Connection);
        }
        if self.heuristics.is_transient_issue(sqlstate, code, message) {
            return Some(ErrorKind::Transient);
        }
        None
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(Arc::new(SqlStateHeuristics))
    }
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier").finish_non_exhaustive()
    }
}

/// Default heuristics keyed on standard SQLSTATE classes plus well-known
/// MySQL and PostgreSQL codes. Anything unrecognized is left to classify as
/// `Fatal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlStateHeuristics;

/// MySQL client codes for a lost or unreachable server.
const MYSQL_CONNECTION_CODES: [i64; 3] = [2002, 2006, 2013];

/// MySQL codes for deadlock and lock-wait timeout.
const MYSQL_TRANSIENT_CODES: [i64; 2] = [1213, 1205];

impl Heuristics for SqlStateHeuristics {
    fn is_connection_issue(
        &self,
        sqlstate: Option<&str>,
        code: Option<i64>,
        message: &str,
    ) -> bool {
        if let Some(state) = sqlstate {
            // Class 08: connection exceptions. 57P01..57P03: server shutdown
            // or refusal on PostgreSQL.
            if state.starts_with("08") || matches!(state, "57P01" | "57P02" | "57P03") {
                return true;
            }
        }
        if let Some(code) = code {
            if MYSQL_CONNECTION_CODES.contains(&code) {
                return true;
            }
        }
        let message = message.to_ascii_lowercase();
        ["server has gone away", "lost connection", "connection reset", "broken pipe"]
            .iter()
            .any(|needle| message.contains(needle))
    }

    fn is_transient_issue(&self, sqlstate: Option<&str>, code: Option<i64>, message: &str) -> bool {
        if let Some(state) = sqlstate {
            // Class 40: transaction rollback (serialization failure,
            // deadlock). 55P03: lock not available on PostgreSQL.
            if state.starts_with("40") || state == "55P03" {
                return true;
            }
        }
        if let Some(code) = code {
            if MYSQL_TRANSIENT_CODES.contains(&code) {
                return true;
            }
        }
        let message = message.to_ascii_lowercase();
        message.contains("deadlock") || message.contains("could not serialize")
    }
}
