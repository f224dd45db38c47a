use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::pipeline::SpreadsheetStore;

use super::SheetsError;

// ============================================================================
// Constants
// ============================================================================

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Value operations on one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    access_token: String,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url =
            Url::parse(SHEETS_API_BASE).map_err(|e| SheetsError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
        })
    }

    /// `.../spreadsheets/{id}/values/{range}{suffix}` with the range encoded
    /// as a single path segment.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SheetsError::from_status(status, &body))
        }
    }

    /// Read the formatted cell values of a range. Trailing empty rows and
    /// cells are omitted by the API.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(range, "")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = Self::check_response(response).await?;

        let body: ValueRange = response.json().await?;
        debug!(range = %range, rows = body.values.len(), "Read sheet range");
        Ok(body.values)
    }

    pub async fn clear_values(&self, range: &str) -> Result<(), SheetsError> {
        let url = self.values_url(range, ":clear")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&json!({}))
            .send()
            .await?;
        Self::check_response(response).await?;
        debug!(range = %range, "Cleared sheet range");
        Ok(())
    }

    /// Write rows starting at the top-left of `range`, parsing them as if
    /// typed by a user so dates become real date cells.
    pub async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        let mut url = self.values_url(range, "")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check_response(response).await?;
        debug!(range = %range, rows = rows.len(), "Updated sheet range");
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetStore for SheetsClient {
    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        Ok(SheetsClient::get_values(self, range).await?)
    }

    async fn clear_values(&self, range: &str) -> Result<()> {
        Ok(SheetsClient::clear_values(self, range).await?)
    }

    async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<()> {
        Ok(SheetsClient::update_values(self, range, rows).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::new("sheet123", "token").expect("client builds")
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = client()
            .values_url("Sacrament Adult Speaker!A3:D", "")
            .expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/Sacrament%20Adult%20Speaker!A3:D"
        );
    }

    #[test]
    fn test_values_url_clear_suffix() {
        let url = client()
            .values_url("Potential Youth Speakers!A2:C", ":clear")
            .expect("url builds");
        assert!(url.path().ends_with("/values/Potential%20Youth%20Speakers!A2:C:clear"));
    }

    #[test]
    fn test_value_range_without_values() {
        let body: ValueRange = serde_json::from_str(r#"{"range": "Sheet1!A3:D5", "majorDimension": "ROWS"}"#)
            .expect("parse empty value range");
        assert!(body.values.is_empty());

        let body: ValueRange =
            serde_json::from_str(r#"{"values": [["Alice", "", "1/1/2020"], ["Bob"]]}"#)
                .expect("parse value range");
        assert_eq!(body.values[1], vec!["Bob"]);
    }
}
