//! Ways of getting the schema script executed on the remote database.
//!
//! Which endpoint accepts arbitrary SQL differs between plans and
//! deployments, so each option is a named [`SqlExecutor`] and the provisioner
//! walks an ordered list of them.

mod http;
mod postgres;

pub use http::{HttpQueryStrategy, MANAGEMENT_API_ENDPOINT, build_client};
pub use postgres::PostgresStrategy;

use thiserror::Error;
use url::Url;

use crate::config::{ProvisionConfig, StrategyKind};
use crate::error::Result;
use crate::schema::SchemaBatch;

/// Raw responses are cut to this many characters in reports.
pub const MAX_RESPONSE_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    /// Rejected, missing, timed out or unreachable. The next strategy is tried.
    #[error("endpoint unavailable: {0}")]
    EndpointUnavailable(String),

    /// The endpoint answered but refused the credentials.
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),
}

impl StrategyError {
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationRejected(_))
    }
}

pub trait SqlExecutor {
    fn name(&self) -> &str;

    /// Where the strategy sends SQL, safe to print.
    fn target(&self) -> String;

    /// Run the whole batch. Either every statement is applied or none are.
    fn execute(&self, batch: &SchemaBatch) -> std::result::Result<(), StrategyError>;
}

/// Instantiate the configured strategies in order.
pub fn build_strategies(config: &ProvisionConfig) -> Result<Vec<Box<dyn SqlExecutor>>> {
    let client = build_client(config.timeout)?;
    config
        .strategies
        .iter()
        .map(|spec| -> Result<Box<dyn SqlExecutor>> {
            Ok(match spec.kind {
                StrategyKind::Postgres => Box::new(PostgresStrategy::from_spec(spec, config)?),
                _ => Box::new(HttpQueryStrategy::from_spec(spec, config, client.clone())?),
            })
        })
        .collect()
}

/// Render a URL with any password replaced by `***`.
pub fn mask_url(url: &Url) -> String {
    let mut masked = url.clone();
    if masked.password().is_some() {
        let _ = masked.set_password(Some("***"));
    }
    masked.to_string()
}

/// Cut `text` to at most `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
