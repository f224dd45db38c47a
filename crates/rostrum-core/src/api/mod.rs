//! Membership directory client.
//!
//! This module provides the `DirectoryClient` for signing in to the
//! membership directory and downloading the unit's member list, which is
//! the roster the speaker lists are built from.
//!
//! The directory uses a cookie session established by a form sign-in.

pub mod client;
pub mod error;

pub use client::{DirectoryClient, DirectoryRoster};
pub use error::ApiError;
