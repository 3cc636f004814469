//! In-memory project state
//!
//! The project owns the imported file list, the 128-slot assignment, the
//! kit layout, and the render configuration. It is only ever mutated by the
//! interactive side; background tasks get immutable snapshots. An archive
//! import replaces the whole project wholesale rather than merging.

use tracing::{debug, warn};

use crate::audio::meta::{self, AudioMetadata};
use crate::audio::wave::{self, DecodedSample};
use crate::error::Result;
use crate::kit::config::RenderConfig;
use crate::kit::id::FileId;
use crate::kit::layout::KitLayout;
use crate::kit::slot::{SlotAssignment, SLOT_COUNT};

/// One entry in the project's file list.
///
/// Removal leaves a tombstone keeping the id and ordering index, so slots
/// that referenced the file stay distinguishable from never-assigned ones.
#[derive(Debug, Clone)]
pub enum KitFile {
    Present {
        id: FileId,
        index: u32,
        name: String,
        bytes: Vec<u8>,
        sample: DecodedSample,
    },
    Removed {
        id: FileId,
        index: u32,
    },
}

impl KitFile {
    pub fn id(&self) -> FileId {
        match self {
            KitFile::Present { id, .. } | KitFile::Removed { id, .. } => *id,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            KitFile::Present { index, .. } | KitFile::Removed { index, .. } => *index,
        }
    }

    pub fn sample(&self) -> Option<&DecodedSample> {
        match self {
            KitFile::Present { sample, .. } => Some(sample),
            KitFile::Removed { .. } => None,
        }
    }
}

/// Flat, serialization-friendly view of a project; what the archive codec
/// reads and writes
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub files: Vec<SnapshotFile>,
    pub slots: Vec<Option<FileId>>,
    pub layout: KitLayout,
    pub config: RenderConfig,
}

/// One present file in a snapshot: id, ordering index, name, raw bytes
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotFile {
    pub id: FileId,
    pub index: u32,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Full project state
#[derive(Debug, Clone, Default)]
pub struct Project {
    files: Vec<KitFile>,
    slots: Vec<SlotAssignment>,
    pub layout: KitLayout,
    pub config: RenderConfig,
    next_index: u32,
}

impl Project {
    pub fn new() -> Self {
        Project {
            files: Vec::new(),
            slots: vec![SlotAssignment::Empty; SLOT_COUNT],
            layout: KitLayout::new(),
            config: RenderConfig::default(),
            next_index: 1,
        }
    }

    pub fn files(&self) -> &[KitFile] {
        &self.files
    }

    pub fn slots(&self) -> &[SlotAssignment] {
        &self.slots
    }

    pub fn file(&self, id: FileId) -> Option<&KitFile> {
        self.files.iter().find(|file| file.id() == id)
    }

    /// Import one WAV file. The bytes must decode; the caller decides what
    /// a failure means (batch import skips, single import surfaces it).
    pub fn add_wav(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<FileId> {
        let sample = wave::decode(&bytes)?;
        let id = FileId::new();
        let index = self.next_index;
        self.next_index += 1;

        let name = name.into();
        debug!(
            name = %name,
            channels = sample.format.num_channels,
            sample_rate = sample.format.sample_rate,
            bits = sample.format.bits_per_sample,
            "imported sample"
        );
        self.files.push(KitFile::Present {
            id,
            index,
            name,
            bytes,
            sample,
        });
        Ok(id)
    }

    /// Import a batch of candidate WAV files, sorted by name.
    ///
    /// Files that fail to decode are logged and skipped; they never abort
    /// the rest of the batch. Returns the ids of the files that made it in.
    pub fn import_batch(&mut self, mut files: Vec<(String, Vec<u8>)>) -> Vec<FileId> {
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut imported = Vec::new();
        for (name, bytes) in files {
            match self.add_wav(name.clone(), bytes) {
                Ok(id) => imported.push(id),
                Err(e) => warn!(file = %name, error = %e, "skipping undecodable file"),
            }
        }
        imported
    }

    /// Delete a file, leaving a tombstone in the file list and converting
    /// its slot assignments to tombstones as well.
    pub fn remove_file(&mut self, id: FileId) {
        for file in &mut self.files {
            if file.id() == id {
                *file = KitFile::Removed {
                    id,
                    index: file.index(),
                };
            }
        }
        for slot in &mut self.slots {
            if *slot == (SlotAssignment::Assigned { file: id }) {
                *slot = SlotAssignment::Removed { file: id };
            }
        }
    }

    /// Assign a file to a slot, or clear the slot with `None`.
    /// Out-of-range indices are ignored.
    pub fn assign(&mut self, slot_index: usize, file: Option<FileId>) {
        if slot_index >= self.slots.len() {
            return;
        }
        self.slots[slot_index] = match file {
            Some(file) => SlotAssignment::Assigned { file },
            None => SlotAssignment::Empty,
        };
    }

    /// Aggregate metadata over every present file in the list
    pub fn file_metadata(&self) -> AudioMetadata {
        meta::aggregate(self.files.iter().filter_map(|f| f.sample()).map(|s| &s.format))
    }

    /// Aggregate metadata over the samples currently occupying slots;
    /// this is what "auto" format resolution uses
    pub fn slot_metadata(&self) -> AudioMetadata {
        meta::aggregate(
            self.slots
                .iter()
                .filter_map(|slot| slot.file_id())
                .filter_map(|id| self.file(id))
                .filter_map(|file| file.sample())
                .map(|sample| &sample.format),
        )
    }

    /// Immutable render-task input: one optional raw-byte buffer per slot
    pub fn render_slots(&self) -> Vec<Option<Vec<u8>>> {
        self.slots
            .iter()
            .map(|slot| {
                let id = slot.file_id()?;
                match self.file(id) {
                    Some(KitFile::Present { bytes, .. }) => Some(bytes.clone()),
                    _ => None,
                }
            })
            .collect()
    }

    /// Snapshot for export: present files only, full slot array
    pub fn to_snapshot(&self) -> ProjectSnapshot {
        let files = self
            .files
            .iter()
            .filter_map(|file| match file {
                KitFile::Present {
                    id,
                    index,
                    name,
                    bytes,
                    ..
                } => Some(SnapshotFile {
                    id: *id,
                    index: *index,
                    name: name.clone(),
                    bytes: bytes.clone(),
                }),
                KitFile::Removed { .. } => None,
            })
            .collect();

        ProjectSnapshot {
            files,
            slots: self.slots.iter().map(|slot| slot.referenced_id()).collect(),
            layout: self.layout.clone(),
            config: self.config.clone(),
        }
    }

    /// Rebuild a project from an imported snapshot, replacing all state.
    ///
    /// Every file's bytes must decode; a failure aborts the import with no
    /// partial state (the caller keeps its old project).
    pub fn from_snapshot(snapshot: ProjectSnapshot) -> Result<Self> {
        let mut files = Vec::with_capacity(snapshot.files.len());
        let mut next_index = 1;
        for file in snapshot.files {
            let sample = wave::decode(&file.bytes)?;
            next_index = next_index.max(file.index + 1);
            files.push(KitFile::Present {
                id: file.id,
                index: file.index,
                name: file.name,
                bytes: file.bytes,
                sample,
            });
        }

        let known = |id: FileId| files.iter().any(|file: &KitFile| file.id() == id);
        let mut slots: Vec<SlotAssignment> = snapshot
            .slots
            .iter()
            .take(SLOT_COUNT)
            .map(|slot| match slot {
                // An id for a file the archive no longer carries is a tombstone.
                Some(id) if known(*id) => SlotAssignment::Assigned { file: *id },
                Some(id) => SlotAssignment::Removed { file: *id },
                None => SlotAssignment::Empty,
            })
            .collect();
        slots.resize(SLOT_COUNT, SlotAssignment::Empty);

        Ok(Project {
            files,
            slots,
            layout: snapshot.layout,
            config: snapshot.config,
            next_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wave::BitDepth;

    fn wav_bytes(num_channels: u16, sample_rate: u32, depth: BitDepth) -> Vec<u8> {
        let samples = vec![depth.silence_value(); 4 * num_channels as usize];
        wave::encode(&samples, num_channels, sample_rate, depth, &[]).unwrap()
    }

    #[test]
    fn test_add_and_assign() {
        let mut project = Project::new();
        let id = project.add_wav("kick.wav", wav_bytes(1, 44100, BitDepth::B16)).unwrap();

        project.assign(0, Some(id));
        assert_eq!(project.slots()[0], SlotAssignment::Assigned { file: id });
        assert_eq!(project.render_slots()[0].as_ref().map(|b| b.is_empty()), Some(false));
    }

    #[test]
    fn test_remove_leaves_tombstones() {
        let mut project = Project::new();
        let id = project.add_wav("kick.wav", wav_bytes(1, 44100, BitDepth::B16)).unwrap();
        project.assign(3, Some(id));

        project.remove_file(id);

        assert!(matches!(project.files()[0], KitFile::Removed { .. }));
        assert_eq!(project.slots()[3], SlotAssignment::Removed { file: id });
        // A tombstoned slot feeds no bytes to the renderer.
        assert!(project.render_slots()[3].is_none());
    }

    #[test]
    fn test_batch_import_skips_bad_files_sorted() {
        let mut project = Project::new();
        let imported = project.import_batch(vec![
            ("b.wav".to_string(), wav_bytes(1, 44100, BitDepth::B16)),
            ("broken.wav".to_string(), vec![1, 2, 3]),
            ("a.wav".to_string(), wav_bytes(2, 48000, BitDepth::B24)),
        ]);

        assert_eq!(imported.len(), 2);
        assert_eq!(project.files().len(), 2);
        // Sorted by name before indexing: a.wav first.
        match &project.files()[0] {
            KitFile::Present { name, index, .. } => {
                assert_eq!(name, "a.wav");
                assert_eq!(*index, 1);
            }
            other => panic!("expected present file, got {:?}", other),
        }
    }

    #[test]
    fn test_slot_metadata_only_counts_assigned() {
        let mut project = Project::new();
        let mono = project.add_wav("m.wav", wav_bytes(1, 44100, BitDepth::B16)).unwrap();
        let _stereo = project.add_wav("s.wav", wav_bytes(2, 96000, BitDepth::B24)).unwrap();

        project.assign(0, Some(mono));

        let slot_meta = project.slot_metadata();
        assert_eq!(slot_meta.channel.stereo, 0);
        assert_eq!(slot_meta.sample_rate.max, 44100);

        let file_meta = project.file_metadata();
        assert_eq!(file_meta.channel.stereo, 1);
        assert_eq!(file_meta.sample_rate.max, 96000);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut project = Project::new();
        let id = project.add_wav("kick.wav", wav_bytes(1, 44100, BitDepth::B16)).unwrap();
        project.assign(5, Some(id));
        project.config.kit_name = "test".to_string();

        let snapshot = project.to_snapshot();
        let rebuilt = Project::from_snapshot(snapshot).unwrap();

        assert_eq!(rebuilt.files().len(), 1);
        assert_eq!(rebuilt.slots()[5], SlotAssignment::Assigned { file: id });
        assert_eq!(rebuilt.config.kit_name, "test");
    }

    #[test]
    fn test_tombstone_survives_snapshot_round_trip() {
        let mut project = Project::new();
        let id = project.add_wav("kick.wav", wav_bytes(1, 44100, BitDepth::B16)).unwrap();
        project.assign(2, Some(id));
        project.remove_file(id);

        let snapshot = project.to_snapshot();
        // The removed file's bytes are gone but its slot keeps the id.
        assert!(snapshot.files.is_empty());
        assert_eq!(snapshot.slots[2], Some(id));

        let rebuilt = Project::from_snapshot(snapshot).unwrap();
        assert_eq!(rebuilt.slots()[2], SlotAssignment::Removed { file: id });
    }

    #[test]
    fn test_snapshot_with_unknown_file_id_becomes_tombstone() {
        let orphan = FileId::new();
        let snapshot = ProjectSnapshot {
            files: Vec::new(),
            slots: vec![Some(orphan), None],
            layout: KitLayout::new(),
            config: RenderConfig::default(),
        };

        let project = Project::from_snapshot(snapshot).unwrap();
        assert_eq!(project.slots()[0], SlotAssignment::Removed { file: orphan });
        assert_eq!(project.slots()[1], SlotAssignment::Empty);
    }
}
