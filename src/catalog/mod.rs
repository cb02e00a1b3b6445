pub mod dto;
pub mod normalize;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::FetchError;

pub use dto::RawSection;
pub use normalize::into_snapshot;

pub const DEFAULT_BASE_URL: &str = "https://api.uwaterloo.ca/v2";

/// Remote source of course schedules.
///
/// An empty list means the course is not offered in that term.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_schedule(
        &self,
        term: u32,
        subject: &str,
        catalog_number: &str,
    ) -> Result<Vec<RawSection>, FetchError>;
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Client for the University of Waterloo Open Data v2 schedule endpoint.
pub struct UwCatalogClient {
    client: Client,
    config: CatalogConfig,
}

impl UwCatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn schedule_url(&self, term: u32, subject: &str, catalog_number: &str) -> String {
        format!(
            "{}/terms/{}/{}/{}/schedule.json?key={}",
            self.config.base_url.trim_end_matches('/'),
            term,
            subject,
            catalog_number,
            self.config.api_key
        )
    }
}

#[async_trait]
impl CatalogApi for UwCatalogClient {
    async fn fetch_schedule(
        &self,
        term: u32,
        subject: &str,
        catalog_number: &str,
    ) -> Result<Vec<RawSection>, FetchError> {
        let url = self.schedule_url(term, subject, catalog_number);
        debug!("fetching schedule for {} {} ({})", subject, catalog_number, term);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.config.timeout)
            } else {
                FetchError::from(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body_text = response.text().await?;
        parse_schedule(&body_text)
    }
}

/// Extracts the section list from a schedule response body.
pub fn parse_schedule(body: &str) -> Result<Vec<RawSection>, FetchError> {
    let parsed: dto::ScheduleResponse = serde_json::from_str(body)?;
    Ok(parsed.data)
}

/// Catalog that never offers anything.
pub struct NoopCatalogClient;

#[async_trait]
impl CatalogApi for NoopCatalogClient {
    async fn fetch_schedule(
        &self,
        _term: u32,
        _subject: &str,
        _catalog_number: &str,
    ) -> Result<Vec<RawSection>, FetchError> {
        Ok(Vec::new())
    }
}
