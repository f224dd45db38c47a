//! Data models for the speaker rotation.
//!
//! This module contains the data structures shared by the clients and the
//! ranking code:
//!
//! - `Member`, `Roster`: Directory records keyed by name, with contact info
//! - `Group`, `GroupLayout`, `SheetLayout`: Adult/Youth pools and where each
//!   one lives in the spreadsheet
//! - `LastSpoken`, `CandidateEntry`: Ranked output rows

pub mod candidate;
pub mod group;
pub mod member;

pub use candidate::{CandidateEntry, LastSpoken};
pub use group::{Group, GroupLayout, SheetLayout};
pub use member::{Member, MemberRecord, Roster};
