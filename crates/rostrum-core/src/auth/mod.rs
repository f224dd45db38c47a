//! Authentication for the two external services.
//!
//! This module provides:
//! - `CredentialStore`: the directory password, kept in the OS keychain
//! - `google`: the Google OAuth token used by the Sheets client, persisted
//!   as JSON in the config directory and refreshed when expired

pub mod credentials;
pub mod google;

pub use credentials::CredentialStore;
pub use google::{ClientSecret, GoogleToken};
