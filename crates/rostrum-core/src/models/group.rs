use serde::{Deserialize, Serialize};

use super::Member;

/// Youngest age (exclusive) for the youth speaker pool.
const YOUTH_MIN_AGE_EXCLUSIVE: u32 = 12;

/// Oldest age (exclusive) for the youth speaker pool.
const YOUTH_MAX_AGE_EXCLUSIVE: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Adult,
    Youth,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Group::Adult => write!(f, "Adult"),
            Group::Youth => write!(f, "Youth"),
        }
    }
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Adult, Group::Youth];

    /// Whether a member belongs to this group's speaker pool.
    ///
    /// Adults are anyone the directory marks as adult. Youth are non-adults
    /// strictly older than 12 and strictly younger than 18; a non-adult with
    /// no recorded age is in neither pool.
    pub fn is_eligible(&self, member: &Member) -> bool {
        match self {
            Group::Adult => member.is_adult,
            Group::Youth => {
                !member.is_adult
                    && member
                        .age
                        .map(|age| age > YOUTH_MIN_AGE_EXCLUSIVE && age < YOUTH_MAX_AGE_EXCLUSIVE)
                        .unwrap_or(false)
            }
        }
    }

    pub fn layout<'a>(&self, layout: &'a SheetLayout) -> &'a GroupLayout {
        match self {
            Group::Adult => &layout.adult,
            Group::Youth => &layout.youth,
        }
    }
}

/// Where one group's history and candidate list live in the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupLayout {
    /// A1 range holding `name, ..., date` rows of past talks.
    pub history_range: String,
    /// Zero-based column within `history_range` holding the talk date.
    pub date_column: usize,
    /// A1 range the ranked `name, phone, date` rows are written to.
    pub output_range: String,
}

impl GroupLayout {
    /// Spreadsheet row number of the first row in `history_range`, used to
    /// point at offending cells in error messages. Falls back to 1.
    pub fn history_first_row(&self) -> usize {
        let cells = self
            .history_range
            .rsplit_once('!')
            .map(|(_, cells)| cells)
            .unwrap_or(&self.history_range);
        let start = cells.split(':').next().unwrap_or(cells);
        start
            .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$')
            .parse()
            .unwrap_or(1)
    }
}

/// Both groups' layouts. Deserializes from a partial override: any group or
/// field missing from the input keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SheetLayoutOverride")]
pub struct SheetLayout {
    pub adult: GroupLayout,
    pub youth: GroupLayout,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GroupLayoutOverride {
    history_range: Option<String>,
    date_column: Option<usize>,
    output_range: Option<String>,
}

impl GroupLayoutOverride {
    fn apply(self, base: GroupLayout) -> GroupLayout {
        GroupLayout {
            history_range: self.history_range.unwrap_or(base.history_range),
            date_column: self.date_column.unwrap_or(base.date_column),
            output_range: self.output_range.unwrap_or(base.output_range),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SheetLayoutOverride {
    adult: GroupLayoutOverride,
    youth: GroupLayoutOverride,
}

impl From<SheetLayoutOverride> for SheetLayout {
    fn from(layout: SheetLayoutOverride) -> Self {
        let base = SheetLayout::default();
        Self {
            adult: layout.adult.apply(base.adult),
            youth: layout.youth.apply(base.youth),
        }
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            adult: GroupLayout {
                history_range: "Sacrament Adult Speaker!A3:D".to_string(),
                date_column: 2,
                output_range: "Potential Adult Speakers!A2:C".to_string(),
            },
            youth: GroupLayout {
                history_range: "Sacrament Youth Speaker!A3:D".to_string(),
                date_column: 3,
                output_range: "Potential Youth Speakers!A2:C".to_string(),
            },
        }
    }
}
