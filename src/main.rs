use byeboros::args::{Args, CategoriesSubcommand, Command, RecordSubcommand};
use byeboros::model::TransactionKind;
use byeboros::{commands, Config, Mode, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().byeboros_home().path();

    // When BYEBOROS_IN_TEST_MODE is set and non-empty the in-memory sheet and a fixed clock are
    // used instead of Google Sheets.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.client_secret(), init_args.sheet_url())
                .await?
                .print()
        }

        Command::Auth(auth_args) => {
            let config = Config::load(home).await?;
            if auth_args.verify() {
                commands::auth_verify(&config).await?.print()
            } else {
                commands::auth(&config).await?.print()
            }
        }

        Command::Transactions(transactions_args) => {
            let config = Config::load(home).await?;
            commands::transactions(&config, mode, transactions_args.clone())
                .await?
                .print()
        }

        Command::Analysis(analysis_args) => {
            let config = Config::load(home).await?;
            commands::analysis(&config, mode, analysis_args.clone())
                .await?
                .print()
        }

        Command::Record(record_args) => {
            let config = Config::load(home).await?;
            let (kind, args) = match record_args.kind() {
                RecordSubcommand::Expense(args) => (TransactionKind::Expense, args),
                RecordSubcommand::Income(args) => (TransactionKind::Income, args),
            };
            commands::record(&config, mode, kind, args.clone())
                .await?
                .print()
        }

        Command::Categories(categories_args) => {
            let config = Config::load(home).await?;
            match categories_args.action() {
                CategoriesSubcommand::List(args) => {
                    commands::categories_list(&config, mode, args.clone())
                        .await?
                        .print()
                }
                CategoriesSubcommand::Save(args) => {
                    commands::categories_save(&config, mode, args.clone())
                        .await?
                        .print()
                }
            }
        }

        Command::Mcp(_mcp_args) => commands::mcp(Config::load(home).await?, mode)
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => {
            // Only this crate logs at the requested level.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
