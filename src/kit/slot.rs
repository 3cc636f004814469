//! The 128-slot kit grid
//!
//! Slots are fixed note/octave positions, indexed 0..127 in row-major
//! note-within-octave order. The order never changes after creation; only
//! the file assignment of a slot does. An assignment distinguishes "never
//! assigned" from "was assigned, file later deleted" so the renderer can
//! tell silence-by-choice from a tombstone.

use serde::{Deserialize, Serialize};

use crate::kit::id::FileId;

/// Note names in grid column order
pub const NOTES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Octave labels in grid row order
pub const OCTAVES: [&str; 11] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B"];

/// Number of usable slots in a kit
pub const SLOT_COUNT: usize = 128;

/// One fixed grid position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPosition {
    pub index: usize,
    pub note: &'static str,
    pub octave: &'static str,
}

impl SlotPosition {
    /// Grid position for a slot index, `None` past the end of the grid
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= SLOT_COUNT {
            return None;
        }
        Some(SlotPosition {
            index,
            note: NOTES[index % NOTES.len()],
            octave: OCTAVES[index / NOTES.len()],
        })
    }

    /// Display name: `C-4` for naturals, `C#4` for sharps
    pub fn name(&self) -> String {
        if self.note.len() > 1 {
            format!("{}{}", self.note, self.octave)
        } else {
            format!("{}-{}", self.note, self.octave)
        }
    }
}

/// What a slot currently points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SlotAssignment {
    /// Never held a file
    #[default]
    Empty,
    /// References an imported file by id
    Assigned { file: FileId },
    /// Held a file that was later deleted from the project
    Removed { file: FileId },
}

impl SlotAssignment {
    /// The referenced file id, if the slot currently points at a live file
    pub fn file_id(&self) -> Option<FileId> {
        match self {
            SlotAssignment::Assigned { file } => Some(*file),
            _ => None,
        }
    }

    /// The referenced file id, live or tombstoned.
    ///
    /// Exports use this so a tombstone survives an archive round trip.
    pub fn referenced_id(&self) -> Option<FileId> {
        match self {
            SlotAssignment::Assigned { file } | SlotAssignment::Removed { file } => Some(*file),
            SlotAssignment::Empty => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, SlotAssignment::Assigned { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_names() {
        let first = SlotPosition::from_index(0).unwrap();
        assert_eq!(first.name(), "C-1");

        let sharp = SlotPosition::from_index(1).unwrap();
        assert_eq!(sharp.name(), "C#1");

        let second_octave = SlotPosition::from_index(12).unwrap();
        assert_eq!(second_octave.name(), "C-2");
    }

    #[test]
    fn test_last_slot_in_range() {
        let last = SlotPosition::from_index(SLOT_COUNT - 1).unwrap();
        assert_eq!(last.index, 127);
        assert_eq!(last.octave, "B");
        assert!(SlotPosition::from_index(SLOT_COUNT).is_none());
    }

    #[test]
    fn test_assignment_states_are_distinct() {
        let id = FileId::new();
        let assigned = SlotAssignment::Assigned { file: id };
        let removed = SlotAssignment::Removed { file: id };

        assert_eq!(assigned.file_id(), Some(id));
        assert_eq!(removed.file_id(), None);
        assert_eq!(removed.referenced_id(), Some(id));
        assert_eq!(SlotAssignment::Empty.referenced_id(), None);
        assert_ne!(assigned, removed);
        assert_ne!(removed, SlotAssignment::Empty);
    }
}
