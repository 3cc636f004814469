//! CLI command implementations

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive;
use crate::audio::meta::AudioMetadata;
use crate::audio::wave::{self, WaveFormat};
use crate::error::Result;
use crate::kit::project::Project;
use crate::task;

use super::ConfigArgs;

/// Render loose WAV files or a project archive into one kit WAV.
pub fn render(
    inputs: &[PathBuf],
    archive_path: Option<&Path>,
    output: &Path,
    config_args: &ConfigArgs,
) -> Result<()> {
    // A project archive passed as the sole input works like --archive.
    let archive_path = archive_path.or_else(|| match inputs {
        [only] if is_kit_archive(only) => Some(only.as_path()),
        _ => None,
    });

    let (slots, config, layout_total) = match archive_path {
        Some(path) => {
            info!("rendering archive: {}", path.display());
            let snapshot = archive::import(&fs::read(path)?)?;
            let project = Project::from_snapshot(snapshot)?;
            let total = project.layout.total_count();
            let config = project.config.clone();
            (project.render_slots(), config, total)
        }
        None => {
            let project = load_inputs(inputs, config_args)?;
            let total = project.layout.total_count();
            let config = project.config.clone();
            (project.render_slots(), config, total)
        }
    };

    let rendered = task::spawn_render(slots, config, layout_total)
        .wait_with_progress(|p| debug!(progress = p, "rendering"))?;

    fs::write(output, &rendered.wav_bytes)?;
    println!(
        "Rendered {}: {} ch, {}-bit, {} Hz, {} cue points",
        output.display(),
        rendered.config.channels,
        rendered.config.bit_depth.bits(),
        rendered.config.sample_rate,
        rendered.cues_ms.len()
    );

    Ok(())
}

/// Bundle loose WAV files into a project archive.
pub fn export(inputs: &[PathBuf], output: &Path, config_args: &ConfigArgs) -> Result<()> {
    let project = load_inputs(inputs, config_args)?;
    let file_count = project.files().len();

    let bytes = task::spawn_export(project.to_snapshot())
        .wait_with_progress(|p| debug!(progress = p, "exporting"))?;

    fs::write(output, &bytes)?;
    println!("Exported {}: {} files", output.display(), file_count);

    Ok(())
}

/// Read a project archive, print its contents, optionally extract the WAVs.
pub fn import(archive_path: &Path, extract_to: Option<&Path>) -> Result<()> {
    info!("reading archive: {}", archive_path.display());

    let snapshot = task::spawn_import(fs::read(archive_path)?)
        .wait_with_progress(|p| debug!(progress = p, "importing"))?;

    let assigned = snapshot.slots.iter().flatten().count();
    println!("Archive: {}", archive_path.display());
    println!("  files: {}", snapshot.files.len());
    println!("  assigned slots: {}", assigned);
    if !snapshot.config.kit_name.is_empty() {
        println!("  kit name: {}", snapshot.config.kit_name);
    }
    for entry in snapshot.layout.entries() {
        println!("  layout: {} x{}", entry.name, entry.count);
    }
    for file in &snapshot.files {
        println!("  {} ({} bytes)", file.name, file.bytes.len());
    }

    if let Some(dir) = extract_to {
        fs::create_dir_all(dir)?;
        for file in &snapshot.files {
            fs::write(dir.join(&file.name), &file.bytes)?;
        }
        println!("Extracted {} files to {}", snapshot.files.len(), dir.display());
    }

    Ok(())
}

#[derive(Serialize)]
struct InspectedFile {
    name: String,
    format: WaveFormat,
    frames: usize,
    duration_secs: f64,
}

#[derive(Serialize)]
struct InspectReport {
    files: Vec<InspectedFile>,
    aggregate: AudioMetadata,
}

/// Print per-file formats plus the aggregate metadata as JSON.
pub fn inspect(inputs: &[PathBuf]) -> Result<()> {
    let mut files = Vec::new();
    for (name, bytes) in collect_wav_files(inputs)? {
        let sample = wave::decode(&bytes)?;
        files.push(InspectedFile {
            name,
            format: sample.format,
            frames: sample.frames(),
            duration_secs: sample.duration_secs(),
        });
    }

    let aggregate = crate::audio::meta::aggregate(files.iter().map(|f| &f.format));
    let report = InspectReport { files, aggregate };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Build a project from loose inputs: import in name order, fill slots
/// from the bottom, apply the config flags.
fn load_inputs(inputs: &[PathBuf], config_args: &ConfigArgs) -> Result<Project> {
    let files = collect_wav_files(inputs)?;
    if files.is_empty() {
        warn!("no WAV files found in the given inputs");
    }

    let mut project = Project::new();
    let ids = project.import_batch(files);
    for (slot, id) in ids.into_iter().enumerate() {
        project.assign(slot, Some(id));
    }
    project.config = config_args.to_config()?;

    Ok(project)
}

/// Gather `(name, bytes)` pairs from files and directories.
///
/// Directories are walked recursively; only `.wav` entries are kept. A
/// path that is neither a directory nor a readable file is an error.
fn collect_wav_files(inputs: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && is_wav(entry.path()) {
                    files.push((entry_name(entry.path()), fs::read(entry.path())?));
                }
            }
        } else {
            files.push((entry_name(input), fs::read(input)?));
        }
    }

    Ok(files)
}

fn is_kit_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ynadk"))
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
