//! `member` table DDL.

use crate::template::SqlTemplate;
use txsync_core::Result;

/// Portable across Postgres and SQLite.
pub const CREATE_MEMBER_TABLE: &str = "create table if not exists member (\
    member_id varchar(10) primary key, \
    money integer not null default 0)";

/// Drops the table if present.
pub const DROP_MEMBER_TABLE: &str = "drop table if exists member";

/// Create the `member` table if it does not exist.
///
/// # Errors
///
/// Returns `Connection` / `Write` if the DDL cannot be executed.
pub async fn create_member_table(template: &SqlTemplate) -> Result<()> {
    template.update("create_member_table", sqlx::query(CREATE_MEMBER_TABLE)).await?;
    tracing::info!("Member table ready");
    Ok(())
}

/// Drop the `member` table.
///
/// # Errors
///
/// Returns `Connection` / `Write` if the DDL cannot be executed.
pub async fn drop_member_table(template: &SqlTemplate) -> Result<()> {
    template.update("drop_member_table", sqlx::query(DROP_MEMBER_TABLE)).await?;
    Ok(())
}
