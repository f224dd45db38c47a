use std::path::PathBuf;

use thiserror::Error;

use crate::utils::truncate_string;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google token expired or revoked - run with --authorize")]
    AuthExpired,

    #[error("Google token not found at {0} - run with --authorize")]
    TokenNotFound(PathBuf),

    #[error("OAuth client secret not found (looked in {0})")]
    CredentialsNotFound(String),

    #[error("Invalid client secret format: {0}")]
    InvalidCredentials(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid Sheets URL: {0}")]
    InvalidUrl(String),

    #[error("Sheets API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SheetsError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return SheetsError::AuthExpired;
        }
        SheetsError::Api {
            status: status.as_u16(),
            message: truncate_string(body, MAX_ERROR_BODY_LENGTH),
        }
    }
}
