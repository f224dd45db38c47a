//! The speaker sync run.
//!
//! Loads the roster, reads both groups' speaking history, ranks each group
//! and writes the lists back to the spreadsheet. Every read and both
//! rankings finish before any range is cleared, so a failed read leaves the
//! previous lists in place.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::blacklist::Blacklist;
use crate::history::{History, HistoryError};
use crate::models::{CandidateEntry, Group, GroupLayout, Member, Roster, SheetLayout};
use crate::ranking::rank;

/// Where the roster comes from.
#[async_trait]
pub trait RosterSource {
    async fn fetch_members(&self) -> Result<Vec<Member>>;
}

/// Range-based access to the spreadsheet holding history and output.
#[async_trait]
pub trait SpreadsheetStore {
    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>>;
    async fn clear_values(&self, range: &str) -> Result<()>;
    async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<()>;
}

/// Replace a group's output range with its ranked candidates.
///
/// The range is cleared first so rows from a longer previous list do not
/// linger below the new one.
pub async fn write_candidates<S>(
    store: &S,
    layout: &GroupLayout,
    candidates: &[CandidateEntry],
) -> Result<()>
where
    S: SpreadsheetStore + Sync + ?Sized,
{
    store
        .clear_values(&layout.output_range)
        .await
        .with_context(|| format!("Failed to clear {}", layout.output_range))?;

    if candidates.is_empty() {
        debug!(range = %layout.output_range, "No candidates to write");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = candidates.iter().map(CandidateEntry::to_row).collect();
    store
        .update_values(&layout.output_range, &rows)
        .await
        .with_context(|| format!("Failed to write {}", layout.output_range))
}

#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group: Group,
    pub candidates: Vec<CandidateEntry>,
    /// History rows skipped because they could not be parsed.
    pub issues: Vec<HistoryError>,
}

impl GroupReport {
    pub fn never_spoken(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.last_spoken.is_never())
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub roster_size: usize,
    pub groups: Vec<GroupReport>,
    /// True when nothing was written.
    pub dry_run: bool,
}

impl SyncReport {
    pub fn group(&self, group: Group) -> Option<&GroupReport> {
        self.groups.iter().find(|r| r.group == group)
    }

    pub fn issue_count(&self) -> usize {
        self.groups.iter().map(|r| r.issues.len()).sum()
    }
}

pub struct SpeakerSync<'a, R: ?Sized, S: ?Sized> {
    roster_source: &'a R,
    store: &'a S,
    blacklist: &'a Blacklist,
    layout: &'a SheetLayout,
    dry_run: bool,
}

impl<'a, R, S> SpeakerSync<'a, R, S>
where
    R: RosterSource + Sync + ?Sized,
    S: SpreadsheetStore + Sync + ?Sized,
{
    pub fn new(
        roster_source: &'a R,
        store: &'a S,
        blacklist: &'a Blacklist,
        layout: &'a SheetLayout,
    ) -> Self {
        Self {
            roster_source,
            store,
            blacklist,
            layout,
            dry_run: false,
        }
    }

    /// Rank without clearing or writing anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the sync and report what was ranked.
    ///
    /// All reads and rankings complete before the first clear, so a failed
    /// read changes nothing. Writes then go group by group, Adult first: if
    /// the Youth clear or update fails, the Adult list has already been
    /// replaced and stays that way. Running again repairs the Youth list.
    pub async fn run(&self) -> Result<SyncReport> {
        let members = self
            .roster_source
            .fetch_members()
            .await
            .context("Failed to load roster")?;
        let roster = Roster::from_members(members);
        info!(members = roster.len(), blacklisted = self.blacklist.len(), "Roster loaded");

        let mut groups = Vec::with_capacity(Group::ALL.len());
        for group in Group::ALL {
            let layout = group.layout(self.layout);
            let rows = self
                .store
                .get_values(&layout.history_range)
                .await
                .with_context(|| format!("Failed to read {} speaker history", group))?;
            let history = History::from_rows(group, layout, &rows);

            let candidates = rank(group, &roster, &history, self.blacklist);
            let report = GroupReport {
                group,
                candidates,
                issues: history.issues,
            };
            info!(
                group = %group,
                candidates = report.candidates.len(),
                never_spoken = report.never_spoken(),
                skipped_rows = report.issues.len(),
                "Ranked speakers"
            );
            groups.push(report);
        }

        if !self.dry_run {
            for report in &groups {
                let layout = report.group.layout(self.layout);
                write_candidates(self.store, layout, &report.candidates).await?;
                info!(group = %report.group, range = %layout.output_range, "Wrote candidate list");
            }
        }

        Ok(SyncReport {
            roster_size: roster.len(),
            groups,
            dry_run: self.dry_run,
        })
    }
}
