use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ProvisionConfig, StrategyFile};
use crate::provision::{Application, Progress, ProvisionOptions, RestSeed, provision};
use crate::schema::SchemaBatch;

use super::print_table_status;

pub fn run_provision(
    strategies: Option<PathBuf>,
    timeout: Option<u64>,
    skip_verify: bool,
) -> anyhow::Result<()> {
    let mut config = ProvisionConfig::from_env()?;
    if let Some(path) = strategies {
        let file = StrategyFile::load(&path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?;
        config.apply_strategy_file(file);
    }
    if let Some(secs) = timeout {
        config.timeout = Duration::from_secs(secs);
    }

    let batch = SchemaBatch::portfolio();
    println!("Provisioning portfolio schema on {}", config.base_url);
    println!("Target: {}", batch.summary());
    println!();

    let report = provision(
        &config,
        &batch,
        ProvisionOptions {
            verify: !skip_verify,
        },
        print_progress,
    )?;

    if report.application.attempts.is_empty() {
        println!("No strategies configured.");
    }

    if let Some(verification) = &report.verification {
        println!();
        println!("Verifying tables...");
        for (table, status) in &verification.tables {
            print_table_status(table, status);
        }
    }

    match &report.rest_seed {
        RestSeed::NotAttempted => {}
        RestSeed::AlreadyPresent => println!("Profile row already present."),
        RestSeed::Inserted => println!("Default profile inserted over REST."),
        RestSeed::Failed(reason) => println!("Could not seed profile over REST: {reason}"),
    }

    println!();
    if let Some(strategy) = report.application.applied_by() {
        println!("Schema applied via {strategy}.");
        return Ok(());
    }

    if report.tables_ready() {
        println!("Tables are readable and the profile row exists, but row-level security");
        println!("and the access policies were neither applied nor checked.");
        println!();
    }
    print_manual_instructions(&report.application, &batch);

    if report.application.all_auth_rejected() {
        anyhow::bail!(
            "credentials were rejected by every strategy; check SUPABASE_SERVICE_ROLE_KEY"
        );
    }
    Ok(())
}

fn print_progress(progress: Progress<'_>) {
    match progress {
        Progress::Trying { strategy, target } => println!("Trying {strategy} ({target})"),
        Progress::Finished(attempt) => match &attempt.result {
            Ok(()) => println!("  applied"),
            Err(e) => println!("  failed: {e}"),
        },
    }
}

fn print_manual_instructions(application: &Application, batch: &SchemaBatch) {
    println!("========================================");
    println!("Could not apply the schema automatically.");
    println!("Strategies tried:");
    for attempt in &application.attempts {
        println!("  - {} ({})", attempt.strategy, attempt.target);
    }
    println!();
    println!("Run the following SQL in the project's SQL editor.");
    println!("It is safe to run more than once.");
    println!("========================================");
    println!();
    print!("{}", batch.to_script());
}
