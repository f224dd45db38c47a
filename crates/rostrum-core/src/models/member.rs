use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::utils::format_phone;

/// A member record as returned by the directory's member-list report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    pub name: String,
    #[serde(rename = "isAdult", default)]
    pub is_adult: bool,
    #[serde(rename = "actualAge", default)]
    pub actual_age: Option<u32>,
    #[serde(default, alias = "phoneNumber")]
    pub phone: Option<String>,
}

impl MemberRecord {
    /// Convert to the domain `Member`, normalizing the phone number.
    pub fn to_member(&self) -> Member {
        Member {
            name: self.name.trim().to_string(),
            is_adult: self.is_adult,
            age: self.actual_age,
            phone: self
                .phone
                .as_deref()
                .map(|p| format_phone(p.trim()))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub is_adult: bool,
    /// Only meaningful when `is_adult` is false.
    pub age: Option<u32>,
    pub phone: String,
}

impl Member {
    pub fn adult(name: &str, phone: &str) -> Self {
        Self {
            name: name.to_string(),
            is_adult: true,
            age: None,
            phone: phone.to_string(),
        }
    }

    pub fn youth(name: &str, age: u32, phone: &str) -> Self {
        Self {
            name: name.to_string(),
            is_adult: false,
            age: Some(age),
            phone: phone.to_string(),
        }
    }
}

/// The current membership, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: HashMap<String, Member>,
}

impl Roster {
    /// Build a roster from directory members. When two records share a name
    /// the later one wins.
    pub fn from_members(members: impl IntoIterator<Item = Member>) -> Self {
        let mut map = HashMap::new();
        for member in members {
            if member.name.is_empty() {
                warn!("Skipping directory record with an empty name");
                continue;
            }
            if let Some(previous) = map.insert(member.name.clone(), member) {
                warn!(name = %previous.name, "Duplicate name in directory, keeping the later record");
            }
        }
        Self { members: map }
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
