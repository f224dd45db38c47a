use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Literal written to the sheet for members with no recorded talk.
pub const NEVER_LITERAL: &str = "NEVER";

/// When a member last spoke.
///
/// `Never` is declared first so the derived ordering places it before every
/// dated talk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LastSpoken {
    Never,
    Dated(NaiveDate),
}

impl LastSpoken {
    pub fn is_never(&self) -> bool {
        matches!(self, LastSpoken::Never)
    }
}

impl std::fmt::Display for LastSpoken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastSpoken::Never => write!(f, "{}", NEVER_LITERAL),
            LastSpoken::Dated(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// One ranked row of a group's candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntry {
    pub name: String,
    pub phone: String,
    pub last_spoken: LastSpoken,
}

impl CandidateEntry {
    /// The `name, phone, date` cells written to the output range.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.phone.clone(),
            self.last_spoken.to_string(),
        ]
    }
}
