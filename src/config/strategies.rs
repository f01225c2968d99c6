use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Hosted management API, `POST /v1/projects/{ref}/database/query`.
    ManagementApi,
    /// The dashboard's query endpoint, `POST {base}/pg-meta/default/query`.
    PgMeta,
    /// A SQL-executing function exposed through REST, `POST {base}/rest/v1/rpc/exec_sql`.
    Rpc,
    /// Direct wire-protocol connection.
    Postgres,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ManagementApi => "management-api",
            Self::PgMeta => "pg-meta",
            Self::Rpc => "rpc",
            Self::Postgres => "postgres",
        };
        f.write_str(s)
    }
}

/// One entry of the ordered strategy list.
///
/// `url` overrides the endpoint derived from the project URL; for `postgres`
/// it is the connection URL and is required. `{ref}` in a URL is replaced by
/// the project ref.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StrategySpec {
    pub kind: StrategyKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl StrategySpec {
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            url: None,
            name: None,
        }
    }

    pub fn with_url(kind: StrategyKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: Some(url.into()),
            name: None,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.kind.to_string())
    }
}

/// TOML file listing strategies to try, in order.
///
/// ```toml
/// timeout_secs = 20
///
/// [[strategy]]
/// kind = "pg-meta"
///
/// [[strategy]]
/// kind = "postgres"
/// url = "postgresql://postgres.{ref}@aws-0-us-east-1.pooler.supabase.com:6543/postgres?sslmode=require"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct StrategyFile {
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default, rename = "strategy")]
    pub strategies: Vec<StrategySpec>,
}

impl StrategyFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
