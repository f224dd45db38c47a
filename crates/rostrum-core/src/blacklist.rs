//! Names excluded from every candidate list.
//!
//! The blacklist is a plain text file with one member name per line, used to
//! keep inactive or otherwise unavailable members off the lists.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    names: HashSet<String>,
}

impl Blacklist {
    /// Parse one name per line. Surrounding whitespace is trimmed and blank
    /// lines are ignored.
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read blacklist file {}", path.display()))?;
        let blacklist = Self::parse(&contents);
        debug!(path = %path.display(), count = blacklist.len(), "Loaded blacklist");
        Ok(blacklist)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Blacklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
