use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use portfolio_schema::cli::{run_provision, run_schema, run_verify};

#[derive(Parser)]
#[command(name = "portfolio-schema")]
#[command(
    about = "Provision the portfolio tables and policies on a hosted Postgres project",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables, security policies and the seed profile (idempotent)
    Provision {
        /// TOML file listing the strategies to try, in order
        #[arg(long, env = "PROVISION_STRATEGIES")]
        strategies: Option<PathBuf>,

        /// Per-request timeout in seconds for HTTP strategies
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip the table readability check
        #[arg(long)]
        skip_verify: bool,
    },

    /// Print the SQL script for manual application
    Schema,

    /// Check that every table is readable through the REST interface
    Verify,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("portfolio_schema=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Provision {
            strategies,
            timeout,
            skip_verify,
        } => run_provision(strategies, timeout, skip_verify)?,
        Commands::Schema => run_schema()?,
        Commands::Verify => run_verify()?,
    }

    Ok(())
}
