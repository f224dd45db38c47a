//! Google OAuth2 token handling for the Sheets client.
//!
//! The token file layout accepts both the `token`/`expiry` names written by
//! google-auth and the `access_token`/`token_expiry` names written by the
//! older oauth2client storage, so an existing token can be reused.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::sheets::SheetsError;

/// OAuth scope for reading and writing spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Refresh tokens this close to expiry rather than risk a 401 mid-run.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Redirect URI used when the client secret does not list one.
const DEFAULT_REDIRECT_URI: &str = "http://localhost";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleToken {
    #[serde(alias = "access_token")]
    pub token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// RFC 3339 expiry time
    #[serde(default, alias = "token_expiry")]
    pub expiry: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl GoogleToken {
    /// Whether the access token should be refreshed before use. A missing or
    /// unreadable expiry counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|expiry| now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry.with_timezone(&Utc))
            .unwrap_or(true)
    }
}

/// OAuth client credentials from the Cloud Console `client_secret.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    #[serde(alias = "web")]
    pub installed: InstalledApp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecret {
    /// Load the first client secret file that exists among `candidates`.
    pub fn load(candidates: &[PathBuf]) -> Result<Self, SheetsError> {
        let path = candidates.iter().find(|p| p.exists()).ok_or_else(|| {
            let looked = candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            SheetsError::CredentialsNotFound(looked)
        })?;

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SheetsError::InvalidCredentials(format!("{}: {}", path.display(), e)))
    }

    fn redirect_uri(&self) -> &str {
        self.installed
            .redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// Consent page URL for the spreadsheet scope, requesting offline access
    /// so a refresh token is issued.
    pub fn authorization_url(&self) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.installed.auth_uri)
            .map_err(|e| SheetsError::InvalidUrl(format!("{}: {}", self.installed.auth_uri, e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.installed.client_id)
            .append_pair("redirect_uri", self.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", SHEETS_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url)
    }
}

/// Pull the authorization code out of what the user pasted: either the bare
/// code or the full URL the browser was redirected to.
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn expiry_from(expires_in: Option<i64>) -> String {
    (Utc::now() + Duration::seconds(expires_in.unwrap_or(3600))).to_rfc3339()
}

async fn post_token_form(uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse, SheetsError> {
    let client = reqwest::Client::new();
    let response = client.post(uri).form(form).send().await?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        let lowered = body.to_lowercase();
        if (status.as_u16() == 400 || status.as_u16() == 401) && lowered.contains("invalid_grant") {
            return Err(SheetsError::AuthExpired);
        }
        return Err(SheetsError::TokenExchange(format!("HTTP {}: {}", status, body)));
    }

    Ok(serde_json::from_str(&body)?)
}

/// Exchange an authorization code for a token.
pub async fn exchange_code(secret: &ClientSecret, code: &str) -> Result<GoogleToken, SheetsError> {
    let app = &secret.installed;
    let mut form = vec![
        ("code", code),
        ("client_id", app.client_id.as_str()),
        ("redirect_uri", secret.redirect_uri()),
        ("grant_type", "authorization_code"),
    ];
    if let Some(client_secret) = app.client_secret.as_deref() {
        form.push(("client_secret", client_secret));
    }

    let response = post_token_form(&app.token_uri, &form).await?;
    Ok(GoogleToken {
        token: response.access_token,
        refresh_token: response.refresh_token,
        token_uri: app.token_uri.clone(),
        client_id: app.client_id.clone(),
        client_secret: app.client_secret.clone(),
        expiry: Some(expiry_from(response.expires_in)),
    })
}

/// Get a new access token using the refresh token.
pub async fn refresh_token(token: &GoogleToken) -> Result<GoogleToken, SheetsError> {
    let refresh_token = token.refresh_token.as_deref().ok_or(SheetsError::AuthExpired)?;

    let mut form = vec![
        ("client_id", token.client_id.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    if let Some(secret) = token.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let response = post_token_form(&token.token_uri, &form).await?;
    let mut refreshed = token.clone();
    refreshed.token = response.access_token;
    refreshed.expiry = Some(expiry_from(response.expires_in));
    if response.refresh_token.is_some() {
        refreshed.refresh_token = response.refresh_token;
    }
    Ok(refreshed)
}

pub fn load_token(path: &Path) -> Result<GoogleToken, SheetsError> {
    if !path.exists() {
        return Err(SheetsError::TokenNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_token(path: &Path, token: &GoogleToken) -> Result<(), SheetsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(token)?;
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    debug!(path = %path.display(), "Saved Google token");
    Ok(())
}

/// Load the stored token, refreshing and re-saving it when expired, and
/// return the access token.
pub async fn valid_access_token(path: &Path) -> Result<String, SheetsError> {
    let token = load_token(path)?;
    if !token.is_expired(Utc::now()) {
        return Ok(token.token);
    }

    info!("Google access token expired, refreshing");
    let refreshed = refresh_token(&token).await?;
    save_token(path, &refreshed)?;
    Ok(refreshed.token)
}
