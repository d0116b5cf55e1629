//! SQL-backed [`MemberRepository`].
//!
//! Every operation comes in two forms:
//!
//! - the trait methods resolve the connection per call through
//!   [`SqlTemplate`] (bound transaction first, else a fresh lease);
//! - the `*_on` methods run on an explicit [`Connection`] supplied by the
//!   caller and never close it.

use crate::connection::Connection;
use crate::provider::ConnectionProvider;
use crate::template::SqlTemplate;
use futures::future::BoxFuture;
use sqlx::Row;
use sqlx::any::AnyRow;
use std::sync::Arc;
use txsync_core::{DataAccessError, Member, MemberId, MemberRepository, Result};

const INSERT_MEMBER: &str = "insert into member(member_id, money) values ($1, $2)";
const SELECT_MEMBER: &str = "select member_id, money from member where member_id = $1";
const UPDATE_MONEY: &str = "update member set money = $1 where member_id = $2";
const DELETE_MEMBER: &str = "delete from member where member_id = $1";

/// Member repository over any `sqlx` backend.
#[derive(Debug, Clone)]
pub struct SqlMemberRepository {
    template: SqlTemplate,
}

impl SqlMemberRepository {
    /// Create a repository drawing connections from `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            template: SqlTemplate::new(provider),
        }
    }

    /// The template used for statement execution.
    #[must_use]
    pub const fn template(&self) -> &SqlTemplate {
        &self.template
    }

    /// Insert `member` on `connection`.
    ///
    /// # Errors
    ///
    /// Returns `Write` (kind `DuplicateKey` for an existing id).
    pub async fn save_on(&self, connection: &mut Connection, member: &Member) -> Result<Member> {
        SqlTemplate::update_on(connection, "save", insert(member)).await?;
        Ok(member.clone())
    }

    /// Load a member on `connection`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row matches, `Read` if the query fails.
    pub async fn find_by_id_on(&self, connection: &mut Connection, member_id: &MemberId) -> Result<Member> {
        SqlTemplate::query_optional_on(connection, "find_by_id", select(member_id), map_member)
            .await?
            .ok_or_else(|| DataAccessError::member_not_found(member_id.as_str()))
    }

    /// Set a balance on `connection`; returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `Write` if the statement fails.
    pub async fn update_on(&self, connection: &mut Connection, member_id: &MemberId, money: i64) -> Result<u64> {
        SqlTemplate::update_on(connection, "update", update(member_id, money)).await
    }

    /// Delete a member on `connection`.
    ///
    /// # Errors
    ///
    /// Returns `Write` if the statement fails.
    pub async fn delete_on(&self, connection: &mut Connection, member_id: &MemberId) -> Result<()> {
        SqlTemplate::update_on(connection, "delete", delete(member_id)).await?;
        Ok(())
    }
}

impl MemberRepository for SqlMemberRepository {
    fn save<'a>(&'a self, member: &'a Member) -> BoxFuture<'a, Result<Member>> {
        Box::pin(async move {
            self.template.update("save", insert(member)).await?;
            tracing::debug!(member_id = %member.member_id, money = member.money, "Member saved");
            Ok(member.clone())
        })
    }

    fn find_by_id<'a>(&'a self, member_id: &'a MemberId) -> BoxFuture<'a, Result<Member>> {
        Box::pin(async move {
            self.template
                .query_optional("find_by_id", select(member_id), map_member)
                .await?
                .ok_or_else(|| DataAccessError::member_not_found(member_id.as_str()))
        })
    }

    fn update<'a>(&'a self, member_id: &'a MemberId, money: i64) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            let rows = self.template.update("update", update(member_id, money)).await?;
            tracing::debug!(member_id = %member_id, money, rows, "Member balance updated");
            Ok(rows)
        })
    }

    fn delete<'a>(&'a self, member_id: &'a MemberId) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.template.update("delete", delete(member_id)).await?;
            Ok(())
        })
    }
}

fn insert(member: &Member) -> crate::template::AnyQuery<'_> {
    sqlx::query(INSERT_MEMBER)
        .bind(member.member_id.as_str())
        .bind(member.money)
}

fn select(member_id: &MemberId) -> crate::template::AnyQuery<'_> {
    sqlx::query(SELECT_MEMBER).bind(member_id.as_str())
}

fn update(member_id: &MemberId, money: i64) -> crate::template::AnyQuery<'_> {
    sqlx::query(UPDATE_MONEY).bind(money).bind(member_id.as_str())
}

fn delete(member_id: &MemberId) -> crate::template::AnyQuery<'_> {
    sqlx::query(DELETE_MEMBER).bind(member_id.as_str())
}

fn map_member(row: &AnyRow) -> std::result::Result<Member, sqlx::Error> {
    Ok(Member {
        member_id: MemberId::new(row.try_get::<String, _>("member_id")?),
        money: row.try_get("money")?,
    })
}
