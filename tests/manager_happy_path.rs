mod common;

use common::*;
use sql_tx_engine::prelude::*;

#[tokio::test]
async fn two_operations_commit_and_sum_affected_rows() {
    let log = new_log();
    let conn = MockConnection::new(log.clone())
        .begin_ok()
        .execute_rows(1)
        .execute_rows(3)
        .commit_ok();
    let mut manager = manager_with_policy(conn, &log, RetryPolicy::no_retries());

    let ops: Vec<Box<dyn Operation>> = vec![
        idempotent_op("UPDATE t SET a = 0"),
        insert_op("INSERT INTO t (a) VALUES (1)"),
    ];
    let result = manager.run(ops, &TxOptions::new()).await.unwrap();

    assert_eq!(
        result,
        RunResult {
            affected_rows: 4,
            attempts: 1
        }
    );
    assert_eq!(
        events(&log),
        vec![
            Event::Begin(None),
            Event::Execute("UPDATE t SET a = 0".to_string()),
            Event::Execute("INSERT INTO t (a) VALUES (1)".to_string()),
            Event::Commit,
        ]
    );
}

#[tokio::test]
async fn isolation_level_is_passed_through_to_begin() {
    let log = new_log();
    let conn = MockConnection::new(log.clone());
    let mut manager = manager_with_policy(conn, &log, RetryPolicy::no_retries());

    let options = TxOptions::new().with_isolation(IsolationLevel::Serializable);
    manager
        .run_one(idempotent_op("UPDATE t SET a = 0"), &options)
        .await
        .unwrap();

    assert_eq!(
        events(&log)[0],
        Event::Begin(Some(IsolationLevel::Serializable))
    );
}

#[tokio::test]
async fn empty_batch_is_rejected_before_any_begin() {
    let log = new_log();
    let conn = MockConnection::new(log.clone());
    let mut manager = manager_with_policy(conn, &log, RetryPolicy::no_retries());

    let err = manager.run(Vec::new(), &TxOptions::new()).await.unwrap_err();
    assert!(matches!(err, TxEngineError::InvalidArgument(_)));
    assert!(events(&log).is_empty());
}

#[tokio::test]
async fn single_operation_form_runs_one_step() {
    let log = new_log();
    let conn = MockConnection::new(log.clone()).execute_rows(2);
    let mut manager = manager_with_policy(conn, &log, RetryPolicy::no_retries());

    let result = manager
        .run_one(insert_op("INSERT INTO t (a) VALUES (1)"), &TxOptions::new())
        .await
        .unwrap();
    assert_eq!(result.affected_rows, 2);
    assert_eq!(count(&log, |e| matches!(e, Event::Execute(_))), 1);
}
