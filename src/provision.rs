//! The provisioning workflow: apply the batch through the first strategy
//! that accepts it, then check the tables are readable.

use tracing::{info, warn};

use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::rest::{RestClient, TableStatus};
use crate::schema::{PORTFOLIO_TABLES, SchemaBatch};
use crate::strategy::{SqlExecutor, StrategyError, build_strategies};

/// One strategy tried against the target.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub strategy: String,
    pub target: String,
    pub result: std::result::Result<(), StrategyError>,
}

#[derive(Debug, Clone, Default)]
pub struct Application {
    pub attempts: Vec<Attempt>,
}

impl Application {
    /// Name of the strategy that applied the batch.
    pub fn applied_by(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|attempt| attempt.result.is_ok())
            .map(|attempt| attempt.strategy.as_str())
    }

    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.applied_by().is_some()
    }

    /// True when strategies were tried and every one refused the credentials.
    #[must_use]
    pub fn all_auth_rejected(&self) -> bool {
        !self.attempts.is_empty()
            && self
                .attempts
                .iter()
                .all(|attempt| matches!(&attempt.result, Err(e) if e.is_auth()))
    }
}

/// Reported while strategies run so callers can show progress as it happens.
#[derive(Debug)]
pub enum Progress<'a> {
    Trying { strategy: &'a str, target: &'a str },
    Finished(&'a Attempt),
}

pub struct Provisioner {
    strategies: Vec<Box<dyn SqlExecutor>>,
}

impl Provisioner {
    pub fn new(strategies: Vec<Box<dyn SqlExecutor>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &ProvisionConfig) -> Result<Self> {
        Ok(Self::new(build_strategies(config)?))
    }

    /// Try each strategy in order, stopping at the first that applies the
    /// whole batch.
    pub fn apply(&self, batch: &SchemaBatch) -> Application {
        self.apply_with(batch, |_| {})
    }

    pub fn apply_with(
        &self,
        batch: &SchemaBatch,
        mut on_progress: impl FnMut(Progress<'_>),
    ) -> Application {
        let mut application = Application::default();

        for strategy in &self.strategies {
            let target = strategy.target();
            info!(strategy = strategy.name(), %target, "trying strategy");
            on_progress(Progress::Trying {
                strategy: strategy.name(),
                target: &target,
            });

            let result = strategy.execute(batch);
            match &result {
                Ok(()) => info!(strategy = strategy.name(), "schema applied"),
                Err(e) => warn!(strategy = strategy.name(), error = %e, "strategy failed"),
            }

            let attempt = Attempt {
                strategy: strategy.name().to_string(),
                target,
                result,
            };
            on_progress(Progress::Finished(&attempt));

            let applied = attempt.result.is_ok();
            application.attempts.push(attempt);
            if applied {
                break;
            }
        }

        application
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub tables: Vec<(&'static str, TableStatus)>,
}

impl Verification {
    #[must_use]
    pub fn all_readable(&self) -> bool {
        self.tables.iter().all(|(_, status)| status.is_readable())
    }
}

/// Probe every portfolio table through the REST interface.
pub fn verify(rest: &RestClient) -> Verification {
    let tables = PORTFOLIO_TABLES
        .iter()
        .map(|table| {
            let status = rest.probe_table(table.name);
            if let TableStatus::Unreadable { reason } = &status {
                warn!(table = table.name, %reason, "table not readable");
            }
            (table.name, status)
        })
        .collect();
    Verification { tables }
}

/// Outcome of seeding the profile over REST when no SQL strategy worked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestSeed {
    NotAttempted,
    AlreadyPresent,
    Inserted,
    Failed(String),
}

fn seed_via_rest(rest: &RestClient, batch: &SchemaBatch) -> RestSeed {
    let Some(seed) = batch.seed() else {
        return RestSeed::NotAttempted;
    };
    match rest.profile_exists() {
        Ok(true) => RestSeed::AlreadyPresent,
        Ok(false) => match rest.insert_profile(seed) {
            Ok(()) => {
                info!("default profile inserted over REST");
                RestSeed::Inserted
            }
            Err(e) => RestSeed::Failed(e.to_string()),
        },
        Err(e) => RestSeed::Failed(e.to_string()),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProvisionOptions {
    pub verify: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self { verify: true }
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub application: Application,
    pub verification: Option<Verification>,
    pub rest_seed: RestSeed,
}

impl ProvisionReport {
    /// A strategy ran the whole batch. Readable tables and a seeded profile
    /// say nothing about row-level security or the policies, so they never
    /// count.
    #[must_use]
    pub fn schema_applied(&self) -> bool {
        self.application.is_applied()
    }

    /// Every table answered and the profile row exists, whether or not the
    /// batch was applied.
    #[must_use]
    pub fn tables_ready(&self) -> bool {
        let readable = self
            .verification
            .as_ref()
            .is_some_and(Verification::all_readable);
        readable && matches!(self.rest_seed, RestSeed::Inserted | RestSeed::AlreadyPresent)
    }
}

/// Connect, execute the ordered batch, verify.
///
/// When every SQL strategy fails but all tables turn out readable, the
/// profile seed is attempted over REST, guarded by the same emptiness check.
/// `on_progress` sees each strategy as it is tried.
pub fn provision(
    config: &ProvisionConfig,
    batch: &SchemaBatch,
    options: ProvisionOptions,
    on_progress: impl FnMut(Progress<'_>),
) -> Result<ProvisionReport> {
    let provisioner = Provisioner::from_config(config)?;
    let application = provisioner.apply_with(batch, on_progress);

    if !options.verify {
        return Ok(ProvisionReport {
            application,
            verification: None,
            rest_seed: RestSeed::NotAttempted,
        });
    }

    let rest = RestClient::new(config)?;
    let verification = verify(&rest);

    let rest_seed = if !application.is_applied() && verification.all_readable() {
        seed_via_rest(&rest, batch)
    } else {
        RestSeed::NotAttempted
    };

    Ok(ProvisionReport {
        application,
        verification: Some(verification),
        rest_seed,
    })
}
