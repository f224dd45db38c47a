//! Client for the membership directory.
//!
//! This module provides the `DirectoryClient` struct for signing in and
//! fetching the unit's member list.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::DirectoryConfig;
use crate::models::{Member, MemberRecord};
use crate::pipeline::RosterSource;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the member-list report, relative to the directory base URL.
const MEMBER_LIST_PATH: &str = "services/umlu/report/member-list";

/// HTTP request timeout in seconds.
/// 30s allows for a slow report download on a large unit.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Directory client. Holds the cookie jar of the signed-in session.
#[derive(Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: Url,
    sign_in_url: Url,
}

impl DirectoryClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid directory base URL {}", config.base_url))?;
        let sign_in_url = Url::parse(&config.sign_in_url)
            .with_context(|| format!("Invalid directory sign-in URL {}", config.sign_in_url))?;

        Ok(Self {
            client,
            base_url,
            sign_in_url,
        })
    }

    /// Sign in to the directory. The session cookie is kept by the client.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.sign_in_url.clone())
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .context("Failed to send directory sign-in request")?;

        Self::check_response(response).await?;
        info!(username = %username, "Signed in to membership directory");
        Ok(())
    }

    /// Bind this signed-in client to a unit, for use as a roster source.
    pub fn for_unit(self, unit_number: impl Into<String>) -> DirectoryRoster {
        DirectoryRoster {
            client: self,
            unit_number: unit_number.into(),
        }
    }

    fn member_list_url(&self, unit_number: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(MEMBER_LIST_PATH)
            .context("Failed to build member list URL")?;
        url.query_pairs_mut()
            .append_pair("lang", "eng")
            .append_pair("unitNumber", unit_number);
        Ok(url)
    }

    /// Pass a successful response through, or turn it into an `ApiError`
    /// carrying the (truncated) body.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body).into())
    }

    /// GET a JSON document, backing off and retrying while the directory
    /// answers 429.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);

        for attempt in 0..=MAX_RATE_LIMIT_RETRIES {
            let response = self
                .client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url.path()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Self::check_response(response)
                    .await?
                    .json()
                    .await
                    .with_context(|| format!("Failed to parse JSON response from {}", url.path()));
            }
            if attempt < MAX_RATE_LIMIT_RETRIES {
                warn!(path = url.path(), retry = attempt + 1, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(ApiError::RateLimited.into())
    }

    /// Fetch the unit's member list.
    pub async fn fetch_members(&self, unit_number: &str) -> Result<Vec<Member>> {
        let url = self.member_list_url(unit_number)?;
        let records: Vec<MemberRecord> = self.get(url).await.context("Failed to fetch member list")?;
        debug!(count = records.len(), "Member list received");
        Ok(records.iter().map(MemberRecord::to_member).collect())
    }
}

/// A signed-in directory client bound to one unit.
pub struct DirectoryRoster {
    client: DirectoryClient,
    unit_number: String,
}

#[async_trait]
impl RosterSource for DirectoryRoster {
    async fn fetch_members(&self) -> Result<Vec<Member>> {
        self.client.fetch_members(&self.unit_number).await
    }
}
