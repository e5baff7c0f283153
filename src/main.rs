use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use eventfx::cli::{parse_currency_code, parse_positive_amount};
use eventfx::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for eventfx::AppCommand {
    fn from(cmd: Commands) -> eventfx::AppCommand {
        match cmd {
            Commands::Rate { code } => eventfx::AppCommand::Rate { code },
            Commands::Rates => eventfx::AppCommand::Rates,
            Commands::Convert { from, to, amount } => {
                eventfx::AppCommand::Convert { from, to, amount }
            }
            Commands::Events {
                budget,
                currency,
                date_from,
                date_to,
                reactive,
            } => eventfx::AppCommand::Events {
                budget,
                currency,
                date_from,
                date_to,
                reactive,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the rate of a currency in roubles
    Rate {
        #[arg(value_parser = parse_currency_code)]
        code: String,
    },
    /// Display the current exchange-rate table
    Rates,
    /// Convert an amount between two currencies
    Convert {
        #[arg(value_parser = parse_currency_code)]
        from: String,
        #[arg(value_parser = parse_currency_code)]
        to: String,
        #[arg(value_parser = parse_positive_amount)]
        amount: Decimal,
    },
    /// List events affordable within a budget
    Events {
        /// Budget amount, greater than zero
        #[arg(long, value_parser = parse_positive_amount)]
        budget: Decimal,
        /// Budget currency code, e.g. USD
        #[arg(long, value_parser = parse_currency_code)]
        currency: String,
        /// First day of the window (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date_from: Option<NaiveDate>,
        /// Last day of the window (YYYY-MM-DD), defaults to a week from today
        #[arg(long)]
        date_to: Option<NaiveDate>,
        /// Run on the calling task instead of the task pool
        #[arg(long)]
        reactive: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => eventfx::cli::setup::setup(),
        Some(cmd) => eventfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
