use std::fmt;

use super::policy::Policy;
use super::quote_literal;
use super::tables::{PORTFOLIO_TABLES, TableDef};
use crate::types::NewProfile;

/// One idempotent step of the provisioning batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(TableDef),
    EnableRowLevelSecurity(&'static str),
    DropPolicy(Policy),
    CreatePolicy(Policy),
    /// Insert the singleton profile only when the table is empty.
    SeedProfile(NewProfile),
}

impl Statement {
    pub fn to_sql(&self) -> String {
        match self {
            Self::CreateTable(table) => table.create_sql(),
            Self::EnableRowLevelSecurity(table) => {
                format!("ALTER TABLE {table} ENABLE ROW LEVEL SECURITY")
            }
            Self::DropPolicy(policy) => policy.drop_sql(),
            Self::CreatePolicy(policy) => policy.create_sql(),
            Self::SeedProfile(profile) => seed_profile_sql(profile),
        }
    }
}

fn seed_profile_sql(profile: &NewProfile) -> String {
    let text = |name: &'static str, value: &str| (name, quote_literal(value));
    let values = [
        text("full_name", &profile.full_name),
        text("title", &profile.title),
        text("hero_tagline", &profile.hero_tagline),
        text("hero_subtitle", &profile.hero_subtitle),
        text("email", &profile.email),
        text("location", &profile.location),
        text("years_experience", &profile.years_experience),
        text("projects_delivered", &profile.projects_delivered),
        text("open_source_contributions", &profile.open_source_contributions),
        text("client_satisfaction", &profile.client_satisfaction),
        ("available_for_work", profile.available_for_work.to_string()),
    ];

    let columns: Vec<&str> = values.iter().map(|(name, _)| *name).collect();
    let literals: Vec<&str> = values.iter().map(|(_, value)| value.as_str()).collect();

    format!(
        "INSERT INTO profile ({})\nSELECT {}\nWHERE NOT EXISTS (SELECT 1 FROM profile LIMIT 1)",
        columns.join(", "),
        literals.join(", ")
    )
}

/// Ordered statements that bring a target database to the portfolio schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaBatch {
    statements: Vec<Statement>,
}

impl SchemaBatch {
    pub fn portfolio() -> Self {
        Self::with_seed(NewProfile::default())
    }

    /// Tables first, then row-level security, then each policy replaced
    /// (drop-if-exists, create), then the guarded seed insert.
    pub fn with_seed(seed: NewProfile) -> Self {
        let mut statements: Vec<Statement> = PORTFOLIO_TABLES
            .iter()
            .copied()
            .map(Statement::CreateTable)
            .collect();

        statements.extend(
            PORTFOLIO_TABLES
                .iter()
                .map(|table| Statement::EnableRowLevelSecurity(table.name)),
        );

        for table in &PORTFOLIO_TABLES {
            for policy in Policy::for_table(table.name) {
                statements.push(Statement::DropPolicy(policy));
                statements.push(Statement::CreatePolicy(policy));
            }
        }

        statements.push(Statement::SeedProfile(seed));
        Self { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// The profile the seed step inserts, if the batch has one.
    pub fn seed(&self) -> Option<&NewProfile> {
        self.statements.iter().find_map(|statement| match statement {
            Statement::SeedProfile(profile) => Some(profile),
            _ => None,
        })
    }

    /// The bare statements, each terminated by `;`.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for statement in &self.statements {
            sql.push_str(&statement.to_sql());
            sql.push_str(";\n\n");
        }
        sql
    }

    /// The statements wrapped in a single transaction, for endpoints that
    /// accept a script.
    pub fn to_script(&self) -> String {
        format!("BEGIN;\n\n{}COMMIT;\n", self.to_sql())
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for statement in &self.statements {
            match statement {
                Statement::CreateTable(_) => summary.tables += 1,
                Statement::EnableRowLevelSecurity(_) => summary.rls_enabled += 1,
                Statement::CreatePolicy(policy) if policy.is_read() => {
                    summary.read_policies += 1;
                }
                Statement::CreatePolicy(_) => summary.write_policies += 1,
                Statement::DropPolicy(_) => {}
                Statement::SeedProfile(_) => summary.seed_rows += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub tables: usize,
    pub rls_enabled: usize,
    pub read_policies: usize,
    pub write_policies: usize,
    pub seed_rows: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tables, row-level security on {}, {} read + {} write policies, {} seed row",
            self.tables, self.rls_enabled, self.read_policies, self.write_policies, self.seed_rows
        )
    }
}
