use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::{MAX_RESPONSE_CHARS, SqlExecutor, StrategyError, truncate};
use crate::config::{ProvisionConfig, StrategyKind, StrategySpec};
use crate::error::{Error, Result};
use crate::schema::SchemaBatch;

pub const MANAGEMENT_API_ENDPOINT: &str =
    "https://api.supabase.com/v1/projects/{ref}/database/query";

pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("portfolio-schema/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Posts the whole script as one JSON field to an HTTP query endpoint.
pub struct HttpQueryStrategy {
    name: String,
    endpoint: Url,
    body_field: &'static str,
    api_key: String,
    client: Client,
    /// Wrap the statements in `BEGIN`/`COMMIT`. Off for endpoints that
    /// already run the body inside a transaction of their own.
    explicit_transaction: bool,
}

impl HttpQueryStrategy {
    pub fn new(
        name: impl Into<String>,
        endpoint: Url,
        body_field: &'static str,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint,
            body_field,
            api_key: api_key.into(),
            client,
            explicit_transaction: true,
        }
    }

    /// Send the bare statements. `exec_sql` runs its argument through
    /// `EXECUTE` inside the request's transaction, where `BEGIN`/`COMMIT`
    /// are rejected.
    #[must_use]
    pub fn without_transaction(mut self) -> Self {
        self.explicit_transaction = false;
        self
    }

    pub fn from_spec(
        spec: &StrategySpec,
        config: &ProvisionConfig,
        client: Client,
    ) -> Result<Self> {
        let (default_endpoint, body_field) = match spec.kind {
            StrategyKind::ManagementApi => (MANAGEMENT_API_ENDPOINT.to_string(), "query"),
            StrategyKind::PgMeta => (
                config.base_url.join("pg-meta/default/query")?.to_string(),
                "query",
            ),
            StrategyKind::Rpc => (
                config.base_url.join("rest/v1/rpc/exec_sql")?.to_string(),
                "sql_query",
            ),
            StrategyKind::Postgres => {
                return Err(Error::Config(
                    "postgres is not an HTTP strategy".to_string(),
                ));
            }
        };

        let template = spec.url.as_deref().unwrap_or(&default_endpoint);
        let endpoint = Url::parse(&config.expand(template)?)?;

        let strategy = Self::new(
            spec.display_name(),
            endpoint,
            body_field,
            config.api_key.clone(),
            client,
        );
        Ok(match spec.kind {
            StrategyKind::Rpc => strategy.without_transaction(),
            _ => strategy,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The SQL text placed in the request body.
    pub fn payload(&self, batch: &SchemaBatch) -> String {
        if self.explicit_transaction {
            batch.to_script()
        } else {
            batch.to_sql()
        }
    }
}

impl SqlExecutor for HttpQueryStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> String {
        self.endpoint.to_string()
    }

    fn execute(&self, batch: &SchemaBatch) -> std::result::Result<(), StrategyError> {
        let mut body = Map::new();
        body.insert(self.body_field.to_string(), Value::String(self.payload(batch)));

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| StrategyError::EndpointUnavailable(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
        debug!(strategy = %self.name, %status, "query endpoint responded");
        classify_response(status, &text)
    }
}

/// Only 200, 201 and 204 count as applied.
pub(crate) fn classify_response(
    status: StatusCode,
    body: &str,
) -> std::result::Result<(), StrategyError> {
    let detail = || {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            truncate(body, MAX_RESPONSE_CHARS)
        )
    };
    match status {
        StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(StrategyError::AuthenticationRejected(detail()))
        }
        _ => Err(StrategyError::EndpointUnavailable(detail())),
    }
}
