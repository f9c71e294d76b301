use async_trait::async_trait;

use crate::error::DriverError;
use crate::policy::TxOptions;
use crate::query::Query;

/// The session boundary the host supplies.
///
/// The engine owns the connection exclusively for the duration of a `run`
/// and drives it through repeated begin/execute/commit cycles. Driver
/// failures are reported as [`DriverError`] so the classifier can inspect
/// SQLSTATEs and vendor codes without knowing the driver.
#[async_trait]
pub trait Connection: Send {
    /// Open a transaction. When `options.isolation` is set, apply it to this
    /// transaction only (e.g. `START TRANSACTION ISOLATION LEVEL ...`);
    /// otherwise the session default prevails. Must not implicitly reconnect
    /// while a transaction is already active.
    async fn begin_with_options(&mut self, options: &TxOptions) -> Result<(), DriverError>;

    /// Execute one statement inside the open transaction and return the
    /// affected-row count.
    async fn execute(&mut self, query: &Query) -> Result<u64, DriverError>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<(), DriverError>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> Result<(), DriverError>;

    /// Discard the physical session. Idempotent; the next database
    /// operation must establish a fresh session. The engine may call this
    /// twice in a row on the first-attempt reconnect path.
    async fn close(&mut self);
}
