//! Detect double-booked project managers.
//!
//! Two calls conflict when they share an assignee and their time ranges overlap
//! under half-open semantics: `a.start < b.end && b.start < a.end`. A call that
//! ends exactly when another starts is NOT a conflict.
//!
//! Conflicting pairs are grouped by `(assignee, earlier start of the pair)`.
//! Pairs that land on the same key merge into one group. A call that overlaps
//! several peers starting at different times shows up in each of those groups.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::event::{Event, EventId};

/// Identifies a conflict group: the assignee and the earliest start among the
/// pair(s) that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    pub assignee_id: String,
    pub start: DateTime<Utc>,
}

/// Two or more overlapping calls for the same assignee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictGroup {
    pub key: GroupKey,
    pub events: Vec<Event>,
}

/// The result of [`detect_conflicts`]: groups ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictGroups {
    groups: BTreeMap<GroupKey, Vec<Event>>,
}

impl ConflictGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&[Event]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, GroupKey, Vec<Event>> {
        self.groups.iter()
    }

    /// Whether the call with `id` takes part in any conflict.
    pub fn contains_event(&self, id: &EventId) -> bool {
        self.groups
            .values()
            .any(|events| events.iter().any(|e| &e.id == id))
    }

    /// Ids of every call involved in at least one conflict, each listed once.
    pub fn conflicting_ids(&self) -> Vec<EventId> {
        let mut seen = HashSet::new();
        self.groups
            .values()
            .flatten()
            .filter(|e| seen.insert(e.id.clone()))
            .map(|e| e.id.clone())
            .collect()
    }

    pub fn into_groups(self) -> Vec<ConflictGroup> {
        self.groups
            .into_iter()
            .map(|(key, events)| ConflictGroup { key, events })
            .collect()
    }

    /// Human-readable banner text, or `None` when there is nothing to report.
    ///
    /// `name_of` maps an assignee id to a display name; unresolved ids are
    /// printed as-is.
    ///
    /// ```
    /// # use schedule_engine::ConflictGroups;
    /// let groups = ConflictGroups::default();
    /// assert_eq!(groups.summary(|_| None), None);
    /// ```
    pub fn summary<'a, F>(&self, name_of: F) -> Option<String>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        if self.groups.is_empty() {
            return None;
        }

        let n = self.groups.len();
        let details: Vec<String> = self
            .groups
            .iter()
            .map(|(key, events)| {
                let assignee = name_of(&key.assignee_id).unwrap_or(key.assignee_id.as_str());
                format!(
                    "{}: {} overlapping calls starting at {}",
                    assignee,
                    events.len(),
                    key.start.format("%H:%M")
                )
            })
            .collect();

        Some(format!(
            "Found {} scheduling conflict{}: {}",
            n,
            if n == 1 { "" } else { "s" },
            details.join("; ")
        ))
    }
}

impl<'a> IntoIterator for &'a ConflictGroups {
    type Item = (&'a GroupKey, &'a Vec<Event>);
    type IntoIter = btree_map::Iter<'a, GroupKey, Vec<Event>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// A single existing call that collides with a candidate slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlap {
    pub event: Event,
    pub overlap_minutes: i64,
}

/// Group every pair of same-assignee calls whose time ranges overlap.
///
/// All timestamps are parsed up front; the first unparsable one fails the call
/// with [`ScheduleError::InvalidTimestamp`](crate::ScheduleError::InvalidTimestamp)
/// naming its event.
pub fn detect_conflicts(events: &[Event]) -> Result<ConflictGroups> {
    let spans = events
        .iter()
        .map(Event::span)
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<GroupKey, Vec<Event>> = BTreeMap::new();

    for (i, a) in events.iter().enumerate() {
        let (a_start, a_end) = spans[i];
        for (j, b) in events.iter().enumerate().skip(i + 1) {
            if a.assignee_id != b.assignee_id {
                continue;
            }
            let (b_start, b_end) = spans[j];
            // Half-open: touching ranges (a.end == b.start) do not overlap.
            let overlaps = a_start < b_end && b_start < a_end;
            if !overlaps {
                continue;
            }

            let key = GroupKey {
                assignee_id: a.assignee_id.clone(),
                start: a_start.min(b_start),
            };
            let members = groups.entry(key).or_default();
            for event in [a, b] {
                if !members.iter().any(|m| m.id == event.id) {
                    members.push(event.clone());
                }
            }
        }
    }

    tracing::debug!(
        events = events.len(),
        groups = groups.len(),
        "conflict detection finished"
    );

    Ok(ConflictGroups { groups })
}

/// Find the existing calls a candidate would collide with.
///
/// Only calls with the candidate's assignee are considered. An existing call
/// with the candidate's own id is skipped, so a reschedule is not reported as
/// clashing with its previous slot.
pub fn check_conflicts(candidate: &Event, existing: &[Event]) -> Result<Vec<Overlap>> {
    let (c_start, c_end) = candidate.valid_span()?;
    let mut overlaps = Vec::new();

    for other in existing {
        if other.id == candidate.id || other.assignee_id != candidate.assignee_id {
            continue;
        }
        let (o_start, o_end) = other.span()?;
        if c_start < o_end && o_start < c_end {
            let overlap_minutes = (c_end.min(o_end) - c_start.max(o_start)).num_minutes();
            overlaps.push(Overlap {
                event: other.clone(),
                overlap_minutes,
            });
        }
    }

    Ok(overlaps)
}
