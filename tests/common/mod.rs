//! Shared test harness: a scripted connection and a recording sleeper that
//! append to one event log, so tests can assert on the exact order of
//! begin/execute/commit/rollback/close/sleep across attempts.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sql_tx_engine::prelude::*;

/// One observable call made by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin(Option<IsolationLevel>),
    Execute(String),
    Commit,
    Rollback,
    Close,
    Sleep(Duration),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

pub fn count(log: &EventLog, pred: impl Fn(&Event) -> bool) -> usize {
    log.lock().unwrap().iter().filter(|e| pred(e)).count()
}

/// Scripted connection. Each call appends to the log, then pops the next
/// scripted result for that call kind; an exhausted script defaults to
/// success (`Ok(())`, one affected row for `execute`).
pub struct MockConnection {
    log: EventLog,
    begins: VecDeque<Result<(), DriverError>>,
    executes: VecDeque<Result<u64, DriverError>>,
    commits: VecDeque<Result<(), DriverError>>,
    rollbacks: VecDeque<Result<(), DriverError>>,
}

impl MockConnection {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            begins: VecDeque::new(),
            executes: VecDeque::new(),
            commits: VecDeque::new(),
            rollbacks: VecDeque::new(),
        }
    }

    pub fn begin_ok(mut self) -> Self {
        self.begins.push_back(Ok(()));
        self
    }

    pub fn begin_err(mut self, err: DriverError) -> Self {
        self.begins.push_back(Err(err));
        self
    }

    pub fn execute_rows(mut self, rows: u64) -> Self {
        self.executes.push_back(Ok(rows));
        self
    }

    pub fn execute_err(mut self, err: DriverError) -> Self {
        self.executes.push_back(Err(err));
        self
    }

    pub fn commit_ok(mut self) -> Self {
        self.commits.push_back(Ok(()));
        self
    }

    pub fn commit_err(mut self, err: DriverError) -> Self {
        self.commits.push_back(Err(err));
        self
    }

    pub fn rollback_err(mut self, err: DriverError) -> Self {
        self.rollbacks.push_back(Err(err));
        self
    }

    fn push(&self, event: Event) {
        self.log.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn begin_with_options(&mut self, options: &TxOptions) -> Result<(), DriverError> {
        self.push(Event::Begin(options.isolation));
        self.begins.pop_front().unwrap_or(Ok(()))
    }

    async fn execute(&mut self, query: &Query) -> Result<u64, DriverError> {
        self.push(Event::Execute(query.sql().to_string()));
        self.executes.pop_front().unwrap_or(Ok(1))
    }

    async fn commit(&mut self) -> Result<(), DriverError> {
        self.push(Event::Commit);
        self.commits.pop_front().unwrap_or(Ok(()))
    }

    async fn rollback(&mut self) -> Result<(), DriverError> {
        self.push(Event::Rollback);
        self.rollbacks.pop_front().unwrap_or(Ok(()))
    }

    async fn close(&mut self) {
        self.push(Event::Close);
    }
}

/// Sleeper that records the requested delay instead of waiting.
pub struct RecordingSleeper {
    log: EventLog,
}

impl RecordingSleeper {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.log.lock().unwrap().push(Event::Sleep(delay));
    }
}

/// Heuristics wrapper that counts probes, for asserting the classifier was
/// (or was not) consulted.
pub struct CountingHeuristics {
    pub probes: Arc<AtomicU32>,
    inner: SqlStateHeuristics,
}

impl CountingHeuristics {
    pub fn new() -> (Arc<Self>, Arc<AtomicU32>) {
        let probes = Arc::new(AtomicU32::new(0));
        let this = Arc::new(Self {
            probes: probes.clone(),
            inner: SqlStateHeuristics,
        });
        (this, probes)
    }
}

impl Heuristics for CountingHeuristics {
    fn is_connection_issue(
        &self,
        sqlstate: Option<&str>,
        code: Option<i64>,
        message: &str,
    ) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.inner.is_connection_issue(sqlstate, code, message)
    }

    fn is_transient_issue(&self, sqlstate: Option<&str>, code: Option<i64>, message: &str) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.inner.is_transient_issue(sqlstate, code, message)
    }
}

/// Eager operation that counts how many times `build` is called.
pub struct CountingOperation {
    sql: String,
    idempotent: bool,
    pub builds: Arc<AtomicU32>,
}

impl CountingOperation {
    pub fn new(sql: impl Into<String>, idempotent: bool) -> Self {
        Self {
            sql: sql.into(),
            idempotent,
            builds: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl Operation for CountingOperation {
    fn build(&self) -> Result<Query, TxEngineError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Query::new_without_params(self.sql.clone()))
    }

    fn is_idempotent(&self) -> bool {
        self.idempotent
    }
}

/// Deferred operation: rebuilt inside every attempt, stamping the build
/// ordinal into the SQL so tests can see which attempt produced it.
pub struct DeferredOperation {
    prefix: String,
    idempotent: bool,
    pub builds: Arc<AtomicU32>,
}

impl DeferredOperation {
    pub fn new(prefix: impl Into<String>, idempotent: bool) -> Self {
        Self {
            prefix: prefix.into(),
            idempotent,
            builds: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl Operation for DeferredOperation {
    fn build(&self) -> Result<Query, TxEngineError> {
        let n = self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Query::new_without_params(format!("{} -- build {n}", self.prefix)))
    }

    fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    fn defer_build(&self) -> bool {
        true
    }
}

/// A plain non-idempotent insert.
pub fn insert_op(sql: &str) -> Box<dyn Operation> {
    Box::new(QueryOperation::new(Query::new_without_params(sql)))
}

/// A plain idempotent statement.
pub fn idempotent_op(sql: &str) -> Box<dyn Operation> {
    Box::new(QueryOperation::new(Query::new_without_params(sql)).idempotent(true))
}

/// Driver error that the default heuristics classify `Transient`.
pub fn transient_error(message: &str) -> DriverError {
    DriverError::new(message).with_sqlstate("40001")
}

/// Driver error that the default heuristics classify `Connection`.
pub fn connection_error(message: &str) -> DriverError {
    DriverError::new(message).with_sqlstate("08006")
}

/// Driver error that the default heuristics classify `Fatal`.
pub fn fatal_error(message: &str) -> DriverError {
    DriverError::new(message).with_sqlstate("42601")
}

/// Deterministic doubling backoff starting at 100ms.
pub fn doubling_backoff() -> Arc<dyn BackoffStrategy> {
    Arc::new(ExponentialBackoff::new(100, 5_000, 2.0, 0).unwrap())
}

/// Manager wired to the shared log: recording sleeper, default classifier.
pub fn manager_with_policy(
    conn: MockConnection,
    log: &EventLog,
    policy: RetryPolicy,
) -> TransactionManager<MockConnection> {
    TransactionManager::builder(conn)
        .sleeper(RecordingSleeper::new(log.clone()))
        .default_policy(policy)
        .finish()
}
