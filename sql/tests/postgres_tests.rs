//! Postgres integration tests using testcontainers.
//!
//! # Requirements
//!
//! Docker must be running. Run with `cargo test -p txsync-sql -- --ignored`.

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

use txsync_core::{DataAccessError, Member, MemberRepository, SqlErrorKind, TransactionStatus};
use txsync_sql::{ConnectionStrategy, SqlTemplate};
use txsync_testing::fixtures::{INITIAL_BALANCE, MEMBER_A, id, member_a};
use txsync_testing::postgres::PostgresDatabase;

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_postgres_commit_and_rollback() {
    let db = PostgresDatabase::start().await;
    let coordinator = db.coordinator();
    let repository = db.repository();

    coordinator
        .run_in_transaction(|_| async {
            repository.save(&member_a()).await?;
            Ok::<_, DataAccessError>(())
        })
        .await
        .expect("commit");

    let handle = coordinator.begin().await.expect("begin");
    handle
        .bind(repository.update(&id(MEMBER_A), 0))
        .await
        .expect("update");
    coordinator.rollback(&handle).await.expect("rollback");

    assert_eq!(handle.status(), TransactionStatus::RolledBack);
    let member = repository.find_by_id(&id(MEMBER_A)).await.expect("find");
    assert_eq!(member.money, INITIAL_BALANCE);
    assert_eq!(db.provider().stats().in_use(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_postgres_error_classification() {
    let db = PostgresDatabase::start_with(ConnectionStrategy::Direct).await;
    let repository = db.repository();

    repository.save(&member_a()).await.expect("save");
    let err = repository
        .save(&Member::new(MEMBER_A, 5))
        .await
        .expect_err("duplicate");
    assert_eq!(err.kind(), Some(SqlErrorKind::DuplicateKey));

    let err = SqlTemplate::new(db.provider())
        .update("typo", sqlx::query("select * from membr"))
        .await
        .expect_err("unknown table");
    assert_eq!(err.kind(), Some(SqlErrorKind::BadSqlGrammar));

    let err = repository.find_by_id(&id("nobody")).await.expect_err("missing");
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_postgres_uncommitted_writes_are_invisible_to_others() {
    let db = PostgresDatabase::start().await;
    let coordinator = db.coordinator();
    let repository = db.repository();
    repository.save(&member_a()).await.expect("seed");

    let handle = coordinator.begin().await.expect("begin");
    handle
        .bind(repository.update(&id(MEMBER_A), 1))
        .await
        .expect("update");

    // outside the binding: another pooled connection
    let outside = repository.find_by_id(&id(MEMBER_A)).await.expect("find");
    assert_eq!(outside.money, INITIAL_BALANCE);

    coordinator.commit(&handle).await.expect("commit");
    let after = repository.find_by_id(&id(MEMBER_A)).await.expect("find");
    assert_eq!(after.money, 1);
}
