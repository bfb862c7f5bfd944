//! Linear edit history: an ordered snapshot sequence and a cursor into it.

use crate::asset::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

impl HistoryAction {
    pub const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
        }
    }

    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Undo => "nothing to undo",
            Self::Redo => "nothing to redo",
        }
    }
}

/// Snapshot sequence plus cursor.
///
/// `cursor` is `None` exactly when the sequence is empty; otherwise it points
/// at the snapshot currently shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryState {
    sequence: Vec<Snapshot>,
    cursor: Option<usize>,
}

impl HistoryState {
    pub const fn new() -> Self {
        Self {
            sequence: Vec::new(),
            cursor: None,
        }
    }

    /// Rebuilds a state from a persisted sequence and index.
    ///
    /// Out-of-range indices are clamped onto the sequence; an empty sequence
    /// always yields the empty state.
    pub fn restore(sequence: Vec<Snapshot>, current_index: i64) -> Self {
        if sequence.is_empty() {
            return Self::new();
        }
        let last = sequence.len() - 1;
        let cursor = usize::try_from(current_index).map_or(0, |index| index.min(last));
        Self {
            sequence,
            cursor: Some(cursor),
        }
    }

    /// Drops the redo branch, pushes `snapshot` and moves the cursor onto it.
    ///
    /// Returns how many snapshots were discarded from the redo branch.
    pub fn append(&mut self, snapshot: Snapshot) -> usize {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        let discarded = self.sequence.len().saturating_sub(keep);
        self.sequence.truncate(keep);
        self.sequence.push(snapshot);
        self.cursor = Some(self.sequence.len() - 1);
        tracing::debug!(
            length = self.sequence.len(),
            discarded,
            "history snapshot appended"
        );
        discarded
    }

    /// Moves the cursor back one step. Returns `false` when already at the original.
    pub fn undo(&mut self) -> bool {
        self.step(HistoryAction::Undo)
    }

    /// Moves the cursor forward one step. Returns `false` when already at the tip.
    pub fn redo(&mut self) -> bool {
        self.step(HistoryAction::Redo)
    }

    fn step(&mut self, action: HistoryAction) -> bool {
        let next = match (action, self.cursor) {
            (HistoryAction::Undo, Some(cursor)) if cursor > 0 => Some(cursor - 1),
            (HistoryAction::Redo, Some(cursor)) if cursor + 1 < self.sequence.len() => {
                Some(cursor + 1)
            }
            _ => None,
        };

        match next {
            Some(cursor) => {
                self.cursor = Some(cursor);
                tracing::debug!(cursor, "{}", action.applied_message());
                true
            }
            None => {
                tracing::debug!(cursor = ?self.cursor, "{}", action.empty_message());
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.sequence.clear();
        self.cursor = None;
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|cursor| self.sequence.get(cursor))
    }

    pub fn original(&self) -> Option<&Snapshot> {
        self.sequence.first()
    }

    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor in the persisted encoding, `-1` when empty.
    pub fn current_index(&self) -> i64 {
        self.cursor
            .and_then(|cursor| i64::try_from(cursor).ok())
            .unwrap_or(-1)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.sequence
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.sequence.len())
    }
}
