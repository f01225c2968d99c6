use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};
use url::Url;

use super::{SqlExecutor, StrategyError, mask_url};
use crate::config::{ProvisionConfig, StrategyKind, StrategySpec};
use crate::error::{Error, Result};
use crate::schema::SchemaBatch;

/// SQLSTATE classes that mean the server refused the login.
const AUTH_SQLSTATES: [&str; 2] = ["28P01", "28000"];

/// Applies the batch over a direct database connection inside one
/// transaction.
pub struct PostgresStrategy {
    name: String,
    url: Url,
    connect_timeout: Duration,
    /// Limit for the transaction once connected, lock waits included.
    timeout: Duration,
}

impl PostgresStrategy {
    pub fn new(
        name: impl Into<String>,
        url: Url,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            url,
            connect_timeout,
            timeout,
        }
    }

    /// The API key is used as the password when the URL carries none.
    pub fn from_spec(spec: &StrategySpec, config: &ProvisionConfig) -> Result<Self> {
        if spec.kind != StrategyKind::Postgres {
            return Err(Error::Config(format!("{} is not a postgres strategy", spec.kind)));
        }
        let template = spec.url.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "strategy '{}' needs a connection url",
                spec.display_name()
            ))
        })?;

        let mut url = Url::parse(&config.expand(template)?)?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(Error::Config(format!(
                "strategy '{}' url must use postgres:// or postgresql://",
                spec.display_name()
            )));
        }
        if url.password().is_none() {
            url.set_password(Some(&config.api_key))
                .map_err(|()| Error::Config("connection url cannot carry a password".to_string()))?;
        }

        Ok(Self::new(
            spec.display_name(),
            url,
            config.connect_timeout,
            config.timeout,
        ))
    }

    async fn apply(&self, sql: &str) -> std::result::Result<(), StrategyError> {
        let options = PgConnectOptions::from_str(self.url.as_str()).map_err(classify_sqlx)?;

        let mut conn = bounded(self.connect_timeout, "connection", async {
            options.connect().await.map_err(classify_sqlx)
        })
        .await?;
        debug!(strategy = %self.name, "connected");

        let result = bounded(self.timeout, "schema transaction", async {
            let mut tx = conn.begin().await.map_err(classify_sqlx)?;
            sqlx::raw_sql(&server_timeouts(self.timeout))
                .execute(&mut *tx)
                .await
                .map_err(classify_sqlx)?;
            sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(classify_sqlx)?;
            tx.commit().await.map_err(classify_sqlx)
        })
        .await;

        if let Err(e) = conn.close().await {
            warn!(strategy = %self.name, error = %e, "failed to close connection cleanly");
        }
        result
    }
}

/// Lets the server abort lock waits and slow statements itself, rolling the
/// transaction back before the client gives up.
fn server_timeouts(limit: Duration) -> String {
    let ms = limit.as_millis().max(1);
    format!("SET LOCAL lock_timeout = {ms}; SET LOCAL statement_timeout = {ms};")
}

async fn bounded<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = std::result::Result<T, StrategyError>>,
) -> std::result::Result<T, StrategyError> {
    tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
        Err(StrategyError::EndpointUnavailable(format!(
            "{what} timed out after {}s",
            limit.as_secs_f32()
        )))
    })
}

impl SqlExecutor for PostgresStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> String {
        mask_url(&self.url)
    }

    fn execute(&self, batch: &SchemaBatch) -> std::result::Result<(), StrategyError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StrategyError::EndpointUnavailable(format!("runtime: {e}")))?;
        runtime.block_on(self.apply(&batch.to_sql()))
    }
}

fn classify_sqlx(e: sqlx::Error) -> StrategyError {
    let is_auth = e
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| AUTH_SQLSTATES.contains(&code.as_ref()));
    if is_auth {
        StrategyError::AuthenticationRejected(e.to_string())
    } else {
        StrategyError::EndpointUnavailable(e.to_string())
    }
}
