// Simple Bank - Admin CLI
//
//   bank migrate              create the schema
//   bank users                list users
//   bank accounts <user_id>   list a user's bank accounts

use anyhow::{bail, Context, Result};
use simple_bank::{
    all_users, count_bank_accounts, find_user_by_id, get_bank_accounts, open_database, AppConfig,
};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    match args.get(1).map(String::as_str) {
        Some("migrate") => run_migrate(&config),
        Some("users") => run_users(&config),
        Some("accounts") => {
            let user_id = args
                .get(2)
                .context("Usage: bank accounts <user_id>")?
                .parse::<i64>()
                .context("user_id must be an integer")?;
            run_accounts(&config, user_id)
        }
        Some(other) => bail!("Unknown command '{}'\n{}", other, USAGE),
        None => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

const USAGE: &str = "Usage: bank <migrate | users | accounts <user_id>>";

fn run_migrate(config: &AppConfig) -> Result<()> {
    println!("🔧 Setting up database {}...", config.database_url);
    let conn = open_database(&config.database_url)?;
    println!("✓ Schema ready");
    println!("✓ {} bank accounts on record", count_bank_accounts(&conn)?);
    Ok(())
}

fn run_users(config: &AppConfig) -> Result<()> {
    let conn = open_database(&config.database_url)?;
    let users = all_users(&conn)?;

    println!("👤 {} users", users.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for user in users {
        println!("{:>6}  {}", user.id, user.full_name());
    }
    Ok(())
}

fn run_accounts(config: &AppConfig, user_id: i64) -> Result<()> {
    let conn = open_database(&config.database_url)?;
    let user = find_user_by_id(&conn, user_id)?;
    let accounts = get_bank_accounts(&conn, user.id)?;

    println!("💳 {} accounts for {}", accounts.len(), user.full_name());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for account in accounts {
        println!(
            "{:>6}  {}  {:<30} {:>14}",
            account.id, account.account_number, account.name, account.balance
        );
    }
    Ok(())
}
