//! Member repository behavior against SQLite.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use txsync_core::{DataAccessError, Member, MemberId, MemberRepository, SqlErrorKind};
use txsync_sql::{ConnectionStrategy, SqlTemplate};
use txsync_testing::fixtures::{INITIAL_BALANCE, MEMBER_A, MEMBER_B, id, member_a, member_b};
use txsync_testing::{TestDatabase, init_tracing};

#[tokio::test]
async fn test_save_then_find() {
    init_tracing();
    let db = TestDatabase::new().await;
    let repository = db.repository();

    let saved = repository.save(&member_a()).await.expect("save");
    assert_eq!(saved, member_a());

    let found = repository.find_by_id(&id(MEMBER_A)).await.expect("find");
    assert_eq!(found, member_a());
}

#[tokio::test]
async fn test_find_missing_member_is_not_found() {
    let db = TestDatabase::new().await;

    let err = db.repository().find_by_id(&id("nobody")).await.expect_err("missing");

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "member not found: nobody");
}

#[tokio::test]
async fn test_update_reports_affected_rows() {
    let db = TestDatabase::new().await;
    db.seed(&[member_a()]).await;
    let repository = db.repository();

    assert_eq!(repository.update(&id(MEMBER_A), 8_000).await.expect("update"), 1);
    assert_eq!(repository.update(&id("nobody"), 8_000).await.expect("update unknown"), 0);
    assert_eq!(db.balance(MEMBER_A).await, Some(8_000));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let db = TestDatabase::new().await;
    db.seed(&[member_a()]).await;
    let repository = db.repository();

    repository.delete(&id(MEMBER_A)).await.expect("delete");
    repository.delete(&id(MEMBER_A)).await.expect("delete again");

    assert_eq!(db.balance(MEMBER_A).await, None);
}

#[tokio::test]
async fn test_duplicate_key_is_classified() {
    let db = TestDatabase::new().await;
    let repository = db.repository();
    repository.save(&member_a()).await.expect("first save");

    let err = repository
        .save(&Member::new(MEMBER_A, 1))
        .await
        .expect_err("duplicate id");

    assert!(err.is_duplicate_key());
    assert!(matches!(&err, DataAccessError::Write { operation, .. } if operation == "save"));
    assert!(err.sql().is_some_and(|sql| sql.starts_with("insert into member")));
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(db.balance(MEMBER_A).await, Some(INITIAL_BALANCE));
    assert_eq!(db.provider().stats().in_use(), 0);
}

#[tokio::test]
async fn test_bad_grammar_is_classified() {
    let db = TestDatabase::new().await;
    let template = SqlTemplate::new(db.provider());

    let err = template
        .update("typo", sqlx::query("updat member set money = $1").bind(1_i64))
        .await
        .expect_err("syntax error");

    assert_eq!(err.kind(), Some(SqlErrorKind::BadSqlGrammar));
    assert_eq!(err.sql(), Some("updat member set money = $1"));
}

#[tokio::test]
async fn test_explicit_connection_is_left_open() {
    let db = TestDatabase::new().await;
    let repository = db.repository();
    let provider = db.provider();

    let mut connection = provider.acquire().await.expect("acquire");

    repository.save_on(&mut connection, &member_a()).await.expect("save_on");
    assert_eq!(
        repository.update_on(&mut connection, &id(MEMBER_A), 9_000).await.expect("update_on"),
        1
    );
    let found = repository.find_by_id_on(&mut connection, &id(MEMBER_A)).await.expect("find_on");
    assert_eq!(found.money, 9_000);

    repository.delete_on(&mut connection, &id(MEMBER_A)).await.expect("delete_on");
    let err = repository
        .find_by_id_on(&mut connection, &id(MEMBER_A))
        .await
        .expect_err("deleted");
    assert!(err.is_not_found());

    // still leased to the caller
    assert!(connection.executor().is_ok());
    assert_eq!(provider.stats().in_use(), 1);

    provider.release(connection).await;
    assert_eq!(provider.stats().in_use(), 0);
}

#[tokio::test]
async fn test_explicit_connection_transaction() {
    let db = TestDatabase::new().await;
    db.seed(&[member_a(), member_b()]).await;
    let repository = db.repository();
    let provider = db.provider();

    let mut connection = provider.acquire().await.expect("acquire");
    assert!(connection.auto_commit());

    connection.begin().await.expect("begin");
    assert!(!connection.auto_commit());
    repository.update_on(&mut connection, &id(MEMBER_A), 0).await.expect("update_on");
    repository.update_on(&mut connection, &id(MEMBER_B), 20_000).await.expect("update_on");
    connection.rollback().await.expect("rollback");
    assert!(connection.auto_commit());

    provider.release(connection).await;

    assert_eq!(db.balance(MEMBER_A).await, Some(INITIAL_BALANCE));
    assert_eq!(db.balance(MEMBER_B).await, Some(INITIAL_BALANCE));
}

#[tokio::test]
async fn test_direct_strategy_releases_every_lease() {
    let db = TestDatabase::with_strategy(ConnectionStrategy::Direct).await;
    let repository = db.repository();

    repository.save(&member_a()).await.expect("save");
    repository.find_by_id(&id(MEMBER_A)).await.expect("find");
    repository.update(&id(MEMBER_A), 1).await.expect("update");
    repository.delete(&id(MEMBER_A)).await.expect("delete");
    let _ = repository.find_by_id(&MemberId::new(MEMBER_A)).await;

    let provider = db.provider();
    let stats = provider.stats();
    assert_eq!(stats.acquired(), stats.released());
    assert_eq!(provider.strategy(), ConnectionStrategy::Direct);
}
