//! List bookkeeping for both directions.
//!
//! Writing: the Docs API wants one `createParagraphBullets` call per
//! contiguous run of same-kind list paragraphs, so list lines are coalesced
//! into runs by a small state machine.
//!
//! Reading: numbered Markdown needs explicit ordinals, tracked per
//! `(list_id, nesting_level)`.

use std::collections::HashMap;

use super::requests::{BulletPreset, InsertionPoint, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    pub fn preset(self) -> BulletPreset {
        match self {
            ListKind::Bulleted => BulletPreset::Bulleted,
            ListKind::Numbered => BulletPreset::Numbered,
        }
    }
}

/// The span one compiled list line occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListItemSpan {
    pub kind: ListKind,
    pub start_index: usize,
    pub end_index: usize,
}

/// A closed run of same-kind list lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRun {
    pub kind: ListKind,
    pub start_index: usize,
    pub end_index: usize,
}

impl ListRun {
    pub fn to_request(&self, target: &InsertionPoint) -> Request {
        Request::CreateParagraphBullets {
            range: target.range(self.start_index, self.end_index),
            bullet_preset: self.kind.preset(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListRunState {
    #[default]
    Outside,
    InList {
        kind: ListKind,
        start_index: usize,
        end_index: usize,
    },
}

/// Pure transition: feed the next line (`None` for a non-list line or the end
/// of input) and get the new state plus the run that closed, if any.
pub fn transition(state: ListRunState, line: Option<ListItemSpan>) -> (ListRunState, Option<ListRun>) {
    match (state, line) {
        (ListRunState::Outside, None) => (ListRunState::Outside, None),
        (ListRunState::Outside, Some(item)) => (open(item), None),
        (
            ListRunState::InList {
                kind,
                start_index,
                end_index,
            },
            line,
        ) => {
            let closed = ListRun {
                kind,
                start_index,
                end_index,
            };
            match line {
                Some(item) if item.kind == kind => (
                    ListRunState::InList {
                        kind,
                        start_index,
                        end_index: item.end_index,
                    },
                    None,
                ),
                Some(item) => (open(item), Some(closed)),
                None => (ListRunState::Outside, Some(closed)),
            }
        }
    }
}

fn open(item: ListItemSpan) -> ListRunState {
    ListRunState::InList {
        kind: item.kind,
        start_index: item.start_index,
        end_index: item.end_index,
    }
}

/// Mutable wrapper around [`transition`] that collects closed runs.
#[derive(Debug, Default)]
pub struct ListRunTracker {
    state: ListRunState,
    closed: Vec<ListRun>,
}

impl ListRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Option<ListItemSpan>) {
        let (state, closed) = transition(self.state, line);
        self.state = state;
        self.closed.extend(closed);
    }

    /// Flushes any open run and returns every run in document order.
    pub fn finish(mut self) -> Vec<ListRun> {
        self.push(None);
        self.closed
    }
}

/// Ordinals for numbered lists on the read path.
#[derive(Debug, Default)]
pub struct ListOrdinals {
    counters: HashMap<(String, usize), usize>,
}

impl ListOrdinals {
    /// Next ordinal for an item of `list_id` at `nesting_level`. Deeper levels
    /// of the same list restart once a shallower item appears.
    pub fn next(&mut self, list_id: &str, nesting_level: usize) -> usize {
        self.counters
            .retain(|(id, level), _| id != list_id || *level <= nesting_level);
        let counter = self
            .counters
            .entry((list_id.to_string(), nesting_level))
            .or_insert(0);
        *counter += 1;
        *counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: ListKind, start: usize, end: usize) -> Option<ListItemSpan> {
        Some(ListItemSpan {
            kind,
            start_index: start,
            end_index: end,
        })
    }

    #[test]
    fn test_outside_stays_outside_on_plain_lines() {
        assert_eq!(
            transition(ListRunState::Outside, None),
            (ListRunState::Outside, None)
        );
    }

    #[test]
    fn test_same_kind_extends_run() {
        let (state, closed) = transition(ListRunState::Outside, item(ListKind::Bulleted, 1, 4));
        assert!(closed.is_none());

        let (state, closed) = transition(state, item(ListKind::Bulleted, 5, 9));
        assert!(closed.is_none());
        assert_eq!(
            state,
            ListRunState::InList {
                kind: ListKind::Bulleted,
                start_index: 1,
                end_index: 9,
            }
        );
    }

    #[test]
    fn test_kind_change_closes_run() {
        let state = ListRunState::InList {
            kind: ListKind::Bulleted,
            start_index: 1,
            end_index: 9,
        };
        let (state, closed) = transition(state, item(ListKind::Numbered, 10, 14));

        assert_eq!(
            closed,
            Some(ListRun {
                kind: ListKind::Bulleted,
                start_index: 1,
                end_index: 9,
            })
        );
        assert_eq!(
            state,
            ListRunState::InList {
                kind: ListKind::Numbered,
                start_index: 10,
                end_index: 14,
            }
        );
    }

    #[test]
    fn test_plain_line_closes_run() {
        let state = ListRunState::InList {
            kind: ListKind::Numbered,
            start_index: 3,
            end_index: 8,
        };
        let (state, closed) = transition(state, None);

        assert_eq!(state, ListRunState::Outside);
        assert_eq!(closed.map(|r| (r.start_index, r.end_index)), Some((3, 8)));
    }

    #[test]
    fn test_tracker_flushes_open_run_on_finish() {
        let mut tracker = ListRunTracker::new();
        tracker.push(item(ListKind::Bulleted, 1, 3));
        tracker.push(item(ListKind::Bulleted, 4, 6));
        tracker.push(None);
        tracker.push(item(ListKind::Numbered, 10, 12));

        let runs = tracker.finish();
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].start_index, runs[0].end_index), (1, 6));
        assert_eq!(runs[1].kind, ListKind::Numbered);
    }

    #[test]
    fn test_ordinals_restart_deeper_levels() {
        let mut ordinals = ListOrdinals::default();

        assert_eq!(ordinals.next("a", 0), 1);
        assert_eq!(ordinals.next("a", 1), 1);
        assert_eq!(ordinals.next("a", 1), 2);
        assert_eq!(ordinals.next("a", 0), 2);
        assert_eq!(ordinals.next("a", 1), 1);
        assert_eq!(ordinals.next("b", 0), 1);
    }
}
