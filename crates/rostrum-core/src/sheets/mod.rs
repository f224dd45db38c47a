//! Google Sheets client.
//!
//! Talks to the Sheets v4 REST API directly over reqwest with a bearer token
//! from [`crate::auth::google`]. Only the three value operations the speaker
//! sync needs are implemented: get, clear and update of an A1 range.

pub mod client;
pub mod error;

pub use client::SheetsClient;
pub use error::SheetsError;
