//! Operator CLI for the project ledger.
//!
//! # Responsibility
//! - Verify `projectledger_core` linkage and database schema state.
//! - Print ledger balances for inspection without going through a server.
//!
//! Configuration comes from `PROJECTLEDGER_*` environment variables; `--db`
//! overrides the database path.

use clap::{Parser, Subcommand};
use log::warn;
use projectledger_core::db::migrations::latest_version;
use projectledger_core::db::{open_db, schema_version};
use projectledger_core::{
    core_version, init_logging_from_config, ping, BudgetBalance, LedgerConfig, ProjectRepository,
    SqliteProjectRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "projectledger")]
#[command(about = "Project ledger operations CLI")]
struct Cli {
    /// SQLite database file. Overrides PROJECTLEDGER_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core crate linkage and version.
    Ping,
    /// Open the database, apply migrations and print the schema version.
    Schema,
    /// Print remaining, allocated and gross budget of one project.
    Summary { project_id: Uuid },
    /// Print every active project balance; fails if a project was rebalanced
    /// below its allocations.
    Check,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = LedgerConfig::from_env()?;
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    init_logging_from_config(&config)?;

    match cli.command {
        Command::Ping => {
            println!("projectledger_core ping={}", ping());
            println!("projectledger_core version={}", core_version());
        }
        Command::Schema => {
            let conn = open_db(&config.db_path)?;
            println!(
                "schema_version={} latest_supported={}",
                schema_version(&conn)?,
                latest_version()
            );
        }
        Command::Summary { project_id } => {
            let conn = open_db(&config.db_path)?;
            let balance = SqliteProjectRepository::new(&conn).balance(project_id)?;
            print_balance(&balance);
        }
        Command::Check => {
            let conn = open_db(&config.db_path)?;
            let balances = SqliteProjectRepository::new(&conn).balances()?;
            for balance in &balances {
                print_balance(balance);
            }
            let overdrawn = balances
                .iter()
                .filter(|balance| balance.is_overdrawn())
                .count();
            println!("projects={} overdrawn={overdrawn}", balances.len());
            if overdrawn > 0 {
                warn!("event=ledger_check module=cli status=error overdrawn={overdrawn}");
                return Err(
                    format!("{overdrawn} project(s) allocate more than their gross budget").into(),
                );
            }
        }
    }
    Ok(())
}

fn print_balance(balance: &BudgetBalance) {
    println!(
        "project_id={} remaining={} allocated={} gross={}",
        balance.project_id,
        balance.remaining,
        balance.allocated,
        balance.gross()
    );
}
