//! Input expansion and output path resolution.
//!
//! This module turns the paths named on the command line into a flat list
//! of candidate input files, and derives a collision-free output path for
//! each conversion.

use batchform_config::Preset;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Upper bound for the " (N)" suffix when de-colliding output paths.
const MAX_OUTPUT_SUFFIX: u32 = 1000;

/// Expands the given paths into a flat list of candidate input files.
///
/// This function:
/// - Recursively walks each directory argument in sorted order
/// - Skips hidden directories (names starting with `.`)
/// - Keeps only files the preset accepts as input
/// - Passes non-directory arguments through unchanged, so a missing file
///   or rejected extension is reported per job instead of silently dropped
pub fn expand_inputs(paths: &[PathBuf], preset: &Preset) -> Vec<PathBuf> {
    let mut inputs = Vec::new();

    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // Skip hidden directories (but allow a hidden root)
                if entry.file_type().is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        if name.starts_with('.') && entry.depth() > 0 {
                            return false;
                        }
                    }
                }
                true
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if !preset.accepts_input(entry.path()) {
                continue;
            }
            inputs.push(entry.path().to_path_buf());
        }
    }

    inputs
}

/// Derives an output path for `input_path` with the given extension.
///
/// The natural choice is the input path with its extension swapped. When
/// that path already exists, or is the input itself (same-extension
/// conversions), a ` (N)` suffix is appended to the stem, counting up from
/// 2 until a free path is found.
///
/// Returns None when every candidate up to the suffix bound is taken.
pub fn output_path_for(input_path: &Path, extension: &str) -> Option<PathBuf> {
    let base = input_path.with_extension(extension);
    if base != input_path && !base.exists() {
        return Some(base);
    }

    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    for n in 2..=MAX_OUTPUT_SUFFIX {
        let candidate = input_path.with_file_name(format!("{} ({}).{}", stem, n, extension));
        if !candidate.exists() {
            return Some(candidate);
        }
    }

    None
}
