//! Project archive codec (`.ynadk`)
//!
//! A project travels as one compressed zip archive: a UTF-8 JSON manifest
//! under `kit.ynadk` plus one binary entry per sample file under
//! `wav/<file-id>`. The manifest is version-tagged; decoding is an
//! explicit version chain rather than speculative parsing:
//!
//! * no `version` field — legacy v1, file bytes embedded in the manifest
//!   as plain numeric arrays
//! * `version: "v2"` — current, bytes live as sibling archive entries
//! * anything else — the import fails, no partial state is applied
//!
//! Export always writes the current (v2) shape at maximum compression.

use std::io::{Cursor, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{KitError, Result};
use crate::kit::config::RenderConfig;
use crate::kit::id::FileId;
use crate::kit::layout::KitLayout;
use crate::kit::project::{ProjectSnapshot, SnapshotFile};

/// Archive entry holding the JSON manifest
pub const MANIFEST_ENTRY: &str = "kit.ynadk";

/// Path prefix for per-file binary entries, keyed by file id
pub const FILE_ENTRY_PREFIX: &str = "wav/";

const CURRENT_VERSION: &str = "v2";

// ============================================================================
// Manifest shapes
// ============================================================================

/// Current manifest: file metadata only, bytes are sibling entries
#[derive(Debug, Serialize, Deserialize)]
struct ManifestV2 {
    version: String,
    files: Vec<ManifestFileV2>,
    slots: Vec<Option<FileId>>,
    kit: KitLayout,
    config: RenderConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestFileV2 {
    id: FileId,
    index: u32,
    name: String,
}

/// Legacy manifest: file bytes inline as JSON numeric arrays
#[derive(Debug, Deserialize)]
struct ManifestV1 {
    files: Vec<ManifestFileV1>,
    slots: Vec<Option<FileId>>,
    kit: KitLayout,
    config: RenderConfig,
}

#[derive(Debug, Deserialize)]
struct ManifestFileV1 {
    id: FileId,
    index: u32,
    name: String,
    bytes: Vec<u8>,
}

// ============================================================================
// Export
// ============================================================================

/// Serialize a project snapshot into `.ynadk` archive bytes.
///
/// Progress is reported 0..100 across the per-file entries; the manifest
/// write and archive finish account for the tail.
pub fn export(snapshot: &ProjectSnapshot, mut on_progress: impl FnMut(f32)) -> Result<Vec<u8>> {
    on_progress(0.0);

    let mut slots = snapshot.slots.clone();
    trim_trailing_unassigned(&mut slots);

    let manifest = ManifestV2 {
        version: CURRENT_VERSION.to_string(),
        files: snapshot
            .files
            .iter()
            .map(|file| ManifestFileV2 {
                id: file.id,
                index: file.index,
                name: file.name.clone(),
            })
            .collect(),
        slots,
        kit: snapshot.layout.clone(),
        config: snapshot.config.clone(),
    };
    let manifest_json = serde_json::to_string(&manifest)?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let archive_err = |e: zip::result::ZipError| KitError::archive(e.to_string());

    let total = snapshot.files.len().max(1);
    for (index, file) in snapshot.files.iter().enumerate() {
        writer
            .start_file(format!("{}{}", FILE_ENTRY_PREFIX, file.id), options)
            .map_err(archive_err)?;
        writer.write_all(&file.bytes)?;
        on_progress(90.0 * (index + 1) as f32 / total as f32);
    }

    writer.start_file(MANIFEST_ENTRY, options).map_err(archive_err)?;
    writer.write_all(manifest_json.as_bytes())?;
    on_progress(99.0);

    let cursor = writer.finish().map_err(archive_err)?;
    on_progress(100.0);

    let bytes = cursor.into_inner();
    debug!(
        files = snapshot.files.len(),
        bytes = bytes.len(),
        "exported archive"
    );
    Ok(bytes)
}

fn trim_trailing_unassigned(slots: &mut Vec<Option<FileId>>) {
    while slots.last() == Some(&None) {
        slots.pop();
    }
}

// ============================================================================
// Import
// ============================================================================

/// Parse `.ynadk` archive bytes back into a project snapshot.
///
/// Fails with an archive error when the manifest entry is missing, its
/// version is unrecognized, or a v2 file entry is absent. On failure, no
/// partial state escapes: the caller keeps its current project.
pub fn import(bytes: &[u8]) -> Result<ProjectSnapshot> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| KitError::archive(e.to_string()))?;

    let manifest_json = {
        let mut entry = archive
            .by_name(MANIFEST_ENTRY)
            .map_err(|_| KitError::archive(format!("missing {} entry", MANIFEST_ENTRY)))?;
        let mut json = String::new();
        entry.read_to_string(&mut json)?;
        json
    };

    let raw: serde_json::Value = serde_json::from_str(&manifest_json)?;
    match raw.get("version").and_then(|v| v.as_str()) {
        // Legacy shape carries no version tag at all.
        None => {
            debug!("importing legacy (v1) manifest");
            let manifest: ManifestV1 = serde_json::from_value(raw)?;
            Ok(ProjectSnapshot {
                files: manifest
                    .files
                    .into_iter()
                    .map(|file| SnapshotFile {
                        id: file.id,
                        index: file.index,
                        name: file.name,
                        bytes: file.bytes,
                    })
                    .collect(),
                slots: manifest.slots,
                layout: manifest.kit,
                config: manifest.config,
            })
        }
        Some(CURRENT_VERSION) => {
            debug!("importing v2 manifest");
            let manifest: ManifestV2 = serde_json::from_value(raw)?;

            let mut files = Vec::with_capacity(manifest.files.len());
            for file in manifest.files {
                let path = format!("{}{}", FILE_ENTRY_PREFIX, file.id);
                let mut entry = archive
                    .by_name(&path)
                    .map_err(|_| KitError::archive(format!("missing file entry {}", path)))?;
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                files.push(SnapshotFile {
                    id: file.id,
                    index: file.index,
                    name: file.name,
                    bytes,
                });
            }

            Ok(ProjectSnapshot {
                files,
                slots: manifest.slots,
                layout: manifest.kit,
                config: manifest.config,
            })
        }
        Some(other) => Err(KitError::UnknownArchiveVersion {
            version: other.to_string(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::config::Auto;
    use crate::kit::layout::KitLayoutEntry;
    use crate::kit::id::LayoutEntryId;
    use pretty_assertions::assert_eq;

    fn snapshot() -> ProjectSnapshot {
        let kick = FileId::new();
        let hat = FileId::new();
        ProjectSnapshot {
            files: vec![
                SnapshotFile {
                    id: kick,
                    index: 1,
                    name: "kick.wav".to_string(),
                    bytes: vec![0x52, 0x49, 0x46, 0x46, 0x01, 0x02],
                },
                SnapshotFile {
                    id: hat,
                    index: 2,
                    name: "hat.wav".to_string(),
                    bytes: vec![0xff; 1024],
                },
            ],
            slots: vec![Some(kick), None, Some(hat), None, None],
            layout: KitLayout::from_entries(vec![KitLayoutEntry {
                id: LayoutEntryId::new(),
                name: "Kick".to_string(),
                count: 2,
            }]),
            config: RenderConfig {
                sample_rate: Auto::Value(48000),
                kit_name: "roundtrip".to_string(),
                ..RenderConfig::default()
            },
        }
    }

    #[test]
    fn test_v2_round_trip() {
        let original = snapshot();
        let bytes = export(&original, |_| {}).unwrap();
        let restored = import(&bytes).unwrap();

        assert_eq!(restored.files, original.files);
        assert_eq!(restored.layout, original.layout);
        assert_eq!(restored.config, original.config);
        // Trailing unassigned slots were trimmed on export.
        assert_eq!(restored.slots, original.slots[..3].to_vec());
    }

    #[test]
    fn test_export_writes_v2_manifest_and_file_entries() {
        let original = snapshot();
        let bytes = export(&original, |_| {}).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        assert!(names.contains(&MANIFEST_ENTRY.to_string()));
        assert_eq!(names.len(), 3);

        let mut manifest = String::new();
        archive
            .by_name(MANIFEST_ENTRY)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(parsed["version"], "v2");
        // Bytes never appear inline in the current shape.
        assert!(parsed["files"][0].get("bytes").is_none());
    }

    #[test]
    fn test_legacy_v1_manifest_imports() {
        let kick = FileId::new();
        let manifest = serde_json::json!({
            "files": [{ "id": kick, "index": 1, "name": "kick.wav", "bytes": [1, 2, 3, 255] }],
            "slots": [kick, null],
            "kit": [],
            "config": {
                "channels": "auto",
                "bitDepth": 16,
                "sampleRate": "auto",
                "stride": "auto",
                "normalize": false,
                "kitName": "legacy"
            }
        });

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(MANIFEST_ENTRY, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(manifest.to_string().as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let restored = import(&bytes).unwrap();
        assert_eq!(restored.files.len(), 1);
        assert_eq!(restored.files[0].bytes, vec![1, 2, 3, 255]);
        assert_eq!(restored.files[0].name, "kick.wav");
        assert_eq!(restored.slots, vec![Some(kick), None]);
        assert_eq!(restored.config.kit_name, "legacy");
        assert!(!restored.config.normalize);
    }

    #[test]
    fn test_unknown_version_fails() {
        let manifest = serde_json::json!({
            "version": "v9",
            "files": [],
            "slots": [],
            "kit": [],
            "config": RenderConfig::default()
        });

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(MANIFEST_ENTRY, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(manifest.to_string().as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let result = import(&bytes);
        assert!(matches!(
            result,
            Err(KitError::UnknownArchiveVersion { version }) if version == "v9"
        ));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("wav/whatever", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"data").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(import(&bytes), Err(KitError::ArchiveFormat { .. })));
    }

    #[test]
    fn test_not_a_zip_fails() {
        assert!(matches!(
            import(b"definitely not a zip"),
            Err(KitError::ArchiveFormat { .. })
        ));
    }

    #[test]
    fn test_export_progress_reaches_completion() {
        let mut reported = Vec::new();
        export(&snapshot(), |p| reported.push(p)).unwrap();

        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reported.last(), Some(&100.0));
    }
}
