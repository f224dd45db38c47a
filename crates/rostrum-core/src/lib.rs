//! Core library for rostrum.
//!
//! Builds the "who should speak next" lists for a congregation's adult and
//! youth speaker rotations. The roster comes from the membership directory,
//! past talks come from the ward spreadsheet, and the ranked lists are
//! written back to the same spreadsheet.
//!
//! - `api`: membership directory client
//! - `sheets`: Google Sheets client
//! - `auth`: directory password storage and Google OAuth tokens
//! - `history`: parsing past talks out of sheet rows
//! - `ranking`: the candidate ordering
//! - `pipeline`: the end-to-end sync run

pub mod api;
pub mod auth;
pub mod blacklist;
pub mod config;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod ranking;
pub mod sheets;
pub mod utils;

pub use blacklist::Blacklist;
pub use config::{Config, RunSettings};
pub use history::{History, HistoryError};
pub use models::{CandidateEntry, Group, LastSpoken, Member, Roster, SheetLayout};
pub use pipeline::{RosterSource, SpeakerSync, SpreadsheetStore, SyncReport};
pub use ranking::rank;
