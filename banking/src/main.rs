//! Transfer demo.
//!
//! Connects to `DATABASE_URL` (SQLite file by default), seeds two members and
//! runs one successful transfer and one that is rolled back.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use txsync_banking::{BLOCKED_MEMBER, MemberService};
use txsync_core::{Member, MemberId, MemberRepository, RetryPolicy};
use txsync_sql::schema::create_member_table;
use txsync_sql::{DataSourceConfig, SqlMemberRepository, TransactionCoordinator, provider_from_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banking=info,txsync_banking=info,txsync_sql=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== txsync: Account Transfer ===\n");

    let config = DataSourceConfig::from_env().context("Invalid database configuration")?;
    let provider = provider_from_config(&config).context("Failed to configure connection provider")?;
    let repository = SqlMemberRepository::new(Arc::clone(&provider));
    let service = MemberService::new(TransactionCoordinator::new(provider), repository.clone());

    create_member_table(repository.template()).await?;

    let member_a = MemberId::new("memberA");
    let member_b = MemberId::new("memberB");
    let blocked = MemberId::new(BLOCKED_MEMBER);

    for id in [&member_a, &member_b, &blocked] {
        repository.delete(id).await?;
        repository.save(&Member::new(id.clone(), 10_000)).await?;
    }
    print_balances(&repository, &[&member_a, &member_b, &blocked]).await?;

    println!("\n>>> memberA sends 2000 to memberB");
    service
        .account_transfer_with_retry(&RetryPolicy::default(), &member_a, &member_b, 2_000)
        .await?;
    print_balances(&repository, &[&member_a, &member_b]).await?;

    println!("\n>>> memberA sends 2000 to {BLOCKED_MEMBER}");
    match service.account_transfer(&member_a, &blocked, 2_000).await {
        Ok(()) => println!("unexpected success"),
        Err(e) => println!("failed as expected: {e}"),
    }
    print_balances(&repository, &[&member_a, &blocked]).await?;

    Ok(())
}

async fn print_balances(repository: &SqlMemberRepository, ids: &[&MemberId]) -> anyhow::Result<()> {
    for id in ids {
        let member = repository.find_by_id(id).await?;
        println!("  {}: {}", member.member_id, member.money);
    }
    Ok(())
}
