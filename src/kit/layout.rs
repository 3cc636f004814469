//! Kit layout: named instrument groups tiled across the slot grid
//!
//! A layout is an ordered list of entries (short display name, repeat
//! count). One repetition of the whole layout spans `stride` consecutive
//! slots; walking the entries against `index % stride` yields the label of
//! a slot. Layout is labeling only, it never touches audio.

use serde::{Deserialize, Serialize};

use crate::kit::id::LayoutEntryId;

/// Display names are capped at four characters to fit the grid cells
pub const MAX_ENTRY_NAME_LEN: usize = 4;

/// One named group of consecutive slots inside a stride
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitLayoutEntry {
    pub id: LayoutEntryId,
    pub name: String,
    pub count: u32,
}

/// Ordered list of layout entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KitLayout {
    entries: Vec<KitLayoutEntry>,
}

impl KitLayout {
    pub fn new() -> Self {
        KitLayout::default()
    }

    pub fn from_entries(entries: Vec<KitLayoutEntry>) -> Self {
        KitLayout { entries }
    }

    pub fn entries(&self) -> &[KitLayoutEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a new unnamed entry with count 1; returns its id
    pub fn add_entry(&mut self) -> LayoutEntryId {
        let id = LayoutEntryId::new();
        self.entries.push(KitLayoutEntry {
            id,
            name: "?".to_string(),
            count: 1,
        });
        id
    }

    pub fn remove_entry(&mut self, id: LayoutEntryId) {
        self.entries.retain(|entry| entry.id != id);
    }

    /// Set an entry's repeat count; a count of zero removes the entry
    pub fn set_count(&mut self, id: LayoutEntryId, count: u32) {
        if count == 0 {
            self.remove_entry(id);
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) {
            entry.count = count;
        }
    }

    /// Set an entry's display name, truncated to four characters
    pub fn set_name(&mut self, id: LayoutEntryId, name: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == id) {
            entry.name = name.chars().take(MAX_ENTRY_NAME_LEN).collect();
        }
    }

    /// Sum of repeat counts; the default stride of the kit
    pub fn total_count(&self) -> u32 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Label for a slot index under the given stride.
    ///
    /// Walks the entries subtracting repeat counts from `index % stride`;
    /// the entry the position lands in names the slot. Stride 0 and
    /// positions past the layout total yield no label.
    pub fn label_for_slot(&self, index: usize, stride: u32) -> Option<&str> {
        if stride == 0 {
            return None;
        }
        let mut position = (index as u32 % stride) as i64;
        for entry in &self.entries {
            position -= entry.count as i64;
            if position < 0 {
                return Some(&entry.name);
            }
        }
        None
    }
}
