use std::fmt;
use std::time::Duration;

use url::Url;

use super::strategies::{StrategyFile, StrategyKind, StrategySpec};
use crate::error::{Error, Result};

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VARS: [&str; 2] = ["SUPABASE_SERVICE_ROLE_KEY", "SUPABASE_KEY"];
pub const DB_URL_VAR: &str = "SUPABASE_DB_URL";
pub const PROJECT_REF_VAR: &str = "SUPABASE_PROJECT_REF";

const HOSTED_SUFFIX: &str = ".supabase.co";

/// Everything the provisioner needs, validated once at start-up.
#[derive(Clone)]
pub struct ProvisionConfig {
    /// Project base URL, always with a trailing `/`.
    pub base_url: Url,
    pub api_key: String,
    pub project_ref: Option<String>,
    pub strategies: Vec<StrategySpec>,
    /// Per-request bound for HTTP strategies.
    pub timeout: Duration,
    /// Bound on establishing a direct database connection.
    pub connect_timeout: Duration,
}

impl ProvisionConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let url = get(URL_VAR);
        let key = KEY_VARS.iter().find_map(|name| get(*name));

        let (url, api_key) = match (url, key) {
            (Some(url), Some(key)) => (url, key),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(URL_VAR.to_string());
                }
                if key.is_none() {
                    missing.push(KEY_VARS.join(" or "));
                }
                return Err(Error::ConfigurationMissing(format!(
                    "{} must be set",
                    missing.join(" and ")
                )));
            }
        };

        let base_url = normalize_base_url(&url)?;
        let project_ref = get(PROJECT_REF_VAR).or_else(|| project_ref_from_url(&base_url));
        let strategies = default_strategies(project_ref.is_some(), get(DB_URL_VAR));

        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            project_ref,
            strategies,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        })
    }

    /// Replace the default strategy list with the file's, when it lists any.
    pub fn apply_strategy_file(&mut self, file: StrategyFile) {
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if !file.strategies.is_empty() {
            self.strategies = file.strategies;
        }
    }

    /// Substitute `{ref}` in an endpoint template.
    pub fn expand(&self, template: &str) -> Result<String> {
        if !template.contains("{ref}") {
            return Ok(template.to_string());
        }
        let project_ref = self.project_ref.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "'{template}' needs a project ref; set {PROJECT_REF_VAR} or use a *{HOSTED_SUFFIX} URL"
            ))
        })?;
        Ok(template.replace("{ref}", project_ref))
    }
}

impl fmt::Debug for ProvisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"***")
            .field("project_ref", &self.project_ref)
            .field("strategies", &self.strategies)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn default_strategies(has_project_ref: bool, db_url: Option<String>) -> Vec<StrategySpec> {
    let mut strategies = Vec::new();
    if has_project_ref {
        strategies.push(StrategySpec::new(StrategyKind::ManagementApi));
    }
    strategies.push(StrategySpec::new(StrategyKind::PgMeta));
    strategies.push(StrategySpec::new(StrategyKind::Rpc));
    if let Some(db_url) = db_url {
        strategies.push(StrategySpec::with_url(StrategyKind::Postgres, db_url));
    }
    strategies
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "{URL_VAR} must be an http(s) URL, got '{raw}'"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `https://<ref>.supabase.co` yields `<ref>`.
fn project_ref_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let project_ref = host.strip_suffix(HOSTED_SUFFIX)?;
    if project_ref.is_empty() || project_ref.contains('.') {
        return None;
    }
    Some(project_ref.to_string())
}
