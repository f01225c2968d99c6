//! PostgREST access to the provisioned tables: readability checks and the
//! REST seed path.

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ProvisionConfig;
use crate::error::{Error, Result};
use crate::strategy::{MAX_RESPONSE_CHARS, build_client, truncate};
use crate::types::{NewProfile, RowId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// The table answered a select; `sampled` is how many rows came back
    /// from a `limit=1` probe.
    Readable { sampled: usize },
    Unreadable { reason: String },
}

impl TableStatus {
    #[must_use]
    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Readable { .. })
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RestClient {
    pub fn new(config: &ProvisionConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout)?,
            base_url: config.base_url.join("rest/v1/")?,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        Ok(self.base_url.join(table)?)
    }

    /// `GET /rest/v1/<table>?select=id&limit=1`. Transport errors are
    /// reported as unreadable rather than returned.
    pub fn probe_table(&self, table: &str) -> TableStatus {
        let result = self
            .get::<Vec<RowId>>(table, &[("select", "id"), ("limit", "1")])
            .map(|rows| rows.len());
        match result {
            Ok(sampled) => TableStatus::Readable { sampled },
            Err(e) => TableStatus::Unreadable {
                reason: e.to_string(),
            },
        }
    }

    /// Whether `profile` holds any row. Only `id` is read, so extra or
    /// renamed columns do not matter.
    pub fn profile_exists(&self) -> Result<bool> {
        let rows: Vec<RowId> = self.get("profile", &[("select", "id"), ("limit", "1")])?;
        Ok(!rows.is_empty())
    }

    pub fn insert_profile(&self, profile: &NewProfile) -> Result<()> {
        let url = self.table_url("profile")?;
        let resp = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(profile)
            .send()?;
        check_status(resp).map(drop)
    }

    fn get<T: DeserializeOwned>(&self, table: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.table_url(table)?;
        let resp = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()?;
        Ok(check_status(resp)?.json()?)
    }
}

fn check_status(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    Err(Error::UnexpectedResponse {
        url,
        status,
        body: truncate(&body, MAX_RESPONSE_CHARS),
    })
}
