//! Candidate ranking.
//!
//! Merges the current roster, one group's speaking history and the blacklist
//! into the ordered list of who should be asked to speak next. Members who
//! have never spoken come first, then everyone else from the longest ago to
//! the most recent talk, with ties broken alphabetically.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::blacklist::Blacklist;
use crate::history::History;
use crate::models::{CandidateEntry, Group, LastSpoken, Roster};

/// Rank one group's speaking candidates.
///
/// The result contains only current, non-blacklisted members eligible for
/// `group`, each once, sorted ascending by `(last_spoken, name)`.
pub fn rank(
    group: Group,
    roster: &Roster,
    history: &History,
    blacklist: &Blacklist,
) -> Vec<CandidateEntry> {
    let mut speakers: BTreeMap<&str, LastSpoken> = BTreeMap::new();

    // History entries for people still on the roster
    for (name, date) in history.iter() {
        match roster.get(name) {
            Some(member) if group.is_eligible(member) => {
                speakers.insert(name, LastSpoken::Dated(date));
            }
            Some(_) => {
                debug!(group = %group, name = %name, "Dropping history for member no longer eligible");
            }
            None => {
                debug!(group = %group, name = %name, "Dropping history for former member");
            }
        }
    }

    // Everyone eligible with nothing on record
    for member in roster.members() {
        if !speakers.contains_key(member.name.as_str())
            && !blacklist.contains(&member.name)
            && group.is_eligible(member)
        {
            speakers.insert(member.name.as_str(), LastSpoken::Never);
        }
    }

    speakers.retain(|name, _| !blacklist.contains(name));

    let mut ordered: Vec<(LastSpoken, &str)> = speakers
        .into_iter()
        .map(|(name, last_spoken)| (last_spoken, name))
        .collect();
    ordered.sort();

    ordered
        .into_iter()
        .filter_map(|(last_spoken, name)| match roster.get(name) {
            Some(member) => Some(CandidateEntry {
                name: member.name.clone(),
                phone: member.phone.clone(),
                last_spoken,
            }),
            None => {
                warn!(group = %group, name = %name, "Candidate missing from roster, skipping");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::Member;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn history(group: Group, talks: &[(&str, NaiveDate)]) -> History {
        let mut history = History::new(group);
        for (name, date) in talks {
            history.record(name, *date);
        }
        history
    }

    fn names(candidates: &[CandidateEntry]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_blacklisted_member_with_history_excluded() {
        let roster = Roster::from_members(vec![
            Member::adult("Alice", "555-0001"),
            Member::adult("Bob", "555-0002"),
        ]);
        let history = history(Group::Adult, &[("Alice", date(2020, 1, 1))]);
        let blacklist = Blacklist::from_iter(["Bob"]);

        let ranked = rank(Group::Adult, &roster, &history, &blacklist);
        assert_eq!(
            ranked,
            vec![CandidateEntry {
                name: "Alice".to_string(),
                phone: "555-0001".to_string(),
                last_spoken: LastSpoken::Dated(date(2020, 1, 1)),
            }]
        );

        // Blacklist wins even when the member has a talk on record
        let history = self::history(
            Group::Adult,
            &[("Alice", date(2020, 1, 1)), ("Bob", date(2018, 1, 1))],
        );
        let ranked = rank(Group::Adult, &roster, &history, &blacklist);
        assert_eq!(names(&ranked), vec!["Alice"]);
    }

    #[test]
    fn test_youth_with_no_history_is_never() {
        let roster = Roster::from_members(vec![Member::youth("Carol", 15, "555-0003")]);
        let ranked = rank(
            Group::Youth,
            &roster,
            &History::new(Group::Youth),
            &Blacklist::default(),
        );
        assert_eq!(
            ranked,
            vec![CandidateEntry {
                name: "Carol".to_string(),
                phone: "555-0003".to_string(),
                last_spoken: LastSpoken::Never,
            }]
        );
    }

    #[test]
    fn test_former_member_history_dropped() {
        let roster = Roster::from_members(vec![Member::adult("Alice", "")]);
        let history = history(
            Group::Adult,
            &[("Dave", date(2019, 3, 4)), ("Alice", date(2020, 1, 1))],
        );
        let ranked = rank(Group::Adult, &roster, &history, &Blacklist::default());
        assert_eq!(names(&ranked), vec!["Alice"]);
    }

    #[test]
    fn test_youth_age_boundaries_excluded() {
        let roster = Roster::from_members(vec![
            Member::youth("Eve", 12, ""),
            Member::youth("Frank", 18, ""),
        ]);
        let ranked = rank(
            Group::Youth,
            &roster,
            &History::new(Group::Youth),
            &Blacklist::default(),
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_equal_dates_ordered_by_name() {
        let roster = Roster::from_members(vec![Member::adult("Zed", ""), Member::adult("Amy", "")]);
        let history = history(
            Group::Adult,
            &[("Zed", date(2021, 5, 2)), ("Amy", date(2021, 5, 2))],
        );
        let ranked = rank(Group::Adult, &roster, &history, &Blacklist::default());
        assert_eq!(names(&ranked), vec!["Amy", "Zed"]);
    }

    #[test]
    fn test_never_spoken_first_then_oldest_talk() {
        let roster = Roster::from_members(vec![
            Member::adult("Recent", ""),
            Member::adult("Old", ""),
            Member::adult("Zoe New", ""),
            Member::adult("Abe New", ""),
            Member::adult("Middle", ""),
        ]);
        let history = history(
            Group::Adult,
            &[
                ("Recent", date(2023, 8, 20)),
                ("Old", date(2015, 2, 1)),
                ("Middle", date(2019, 6, 9)),
            ],
        );

        let ranked = rank(Group::Adult, &roster, &history, &Blacklist::default());
        assert_eq!(names(&ranked), vec!["Abe New", "Zoe New", "Old", "Middle", "Recent"]);

        let first_dated = ranked
            .iter()
            .position(|c| !c.last_spoken.is_never())
            .expect("dated entries present");
        assert!(ranked[..first_dated].iter().all(|c| c.last_spoken.is_never()));
        assert!(ranked[first_dated..].iter().all(|c| !c.last_spoken.is_never()));
    }

    #[test]
    fn test_history_entry_for_ineligible_member_dropped() {
        // Spoke as a youth, has since aged out
        let roster = Roster::from_members(vec![
            Member::youth("Gus", 18, ""),
            Member::youth("Hal", 14, ""),
        ]);
        let history = history(
            Group::Youth,
            &[("Gus", date(2020, 4, 5)), ("Hal", date(2022, 1, 9))],
        );
        let ranked = rank(Group::Youth, &roster, &history, &Blacklist::default());
        assert_eq!(names(&ranked), vec!["Hal"]);
    }

    #[test]
    fn test_adult_and_youth_lists_are_disjoint() {
        let roster = Roster::from_members(vec![
            Member::adult("Alice", ""),
            Member::adult("Bob", ""),
            Member::youth("Carol", 15, ""),
            Member::youth("Dan", 13, ""),
            Member::youth("Kid", 8, ""),
        ]);
        // Carol somehow appears in the adult sheet too
        let adult_history = history(
            Group::Adult,
            &[("Alice", date(2020, 1, 1)), ("Carol", date(2021, 1, 1))],
        );
        let youth_history = history(Group::Youth, &[("Carol", date(2021, 1, 1))]);

        let adults = rank(Group::Adult, &roster, &adult_history, &Blacklist::default());
        let youth = rank(Group::Youth, &roster, &youth_history, &Blacklist::default());

        assert_eq!(names(&adults), vec!["Bob", "Alice"]);
        assert_eq!(names(&youth), vec!["Dan", "Carol"]);
        for candidate in &adults {
            assert!(!youth.iter().any(|y| y.name == candidate.name));
        }
    }

    #[test]
    fn test_rank_is_deterministic() {
        let roster = Roster::from_members(
            (0..50).map(|i| Member::adult(&format!("Member {:02}", i), "")),
        );
        let history = history(
            Group::Adult,
            &[
                ("Member 07", date(2020, 1, 1)),
                ("Member 31", date(2020, 1, 1)),
                ("Member 02", date(2018, 7, 7)),
            ],
        );
        let blacklist = Blacklist::from_iter(["Member 10", "Member 11"]);

        let first = rank(Group::Adult, &roster, &history, &blacklist);
        let second = rank(Group::Adult, &roster, &history, &blacklist);
        assert_eq!(first, second);
        assert_eq!(first.len(), 48);
        assert!(first.iter().all(|c| roster.contains(&c.name)));
        assert!(first.iter().all(|c| !blacklist.contains(&c.name)));
    }

    #[test]
    fn test_empty_roster_yields_empty_list() {
        let history = history(Group::Adult, &[("Dave", date(2019, 3, 4))]);
        let ranked = rank(Group::Adult, &Roster::default(), &history, &Blacklist::default());
        assert!(ranked.is_empty());
    }
}
