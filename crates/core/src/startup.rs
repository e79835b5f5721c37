//! Startup checks module for batchform
//!
//! Verifies FFmpeg is callable before the batch starts, so a missing binary
//! fails the whole run immediately instead of failing every job one by one.

use std::process::Command;
use thiserror::Error;

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("FFmpeg not available: {0}")]
    FfmpegUnavailable(String),
}

/// Parse the FFmpeg version token from `ffmpeg -version` output
///
/// Handles various FFmpeg version formats:
/// - Standard: "ffmpeg version 6.1.1 ..."
/// - N-prefixed: "ffmpeg version n7.0-... ..."
pub fn parse_ffmpeg_version(version_output: &str) -> Option<String> {
    // Look for "ffmpeg version" followed by the version string
    let version_line = version_output
        .lines()
        .find(|line| line.to_lowercase().contains("ffmpeg version"))?;

    // Extract the version token after "ffmpeg version"
    let version_part = version_line
        .to_lowercase()
        .split("ffmpeg version")
        .nth(1)?
        .trim()
        .split_whitespace()
        .next()?
        .to_string();

    // Handle n-prefixed versions (e.g., "n7.0-...")
    let version = version_part.trim_start_matches('n');
    if version.is_empty() {
        return None;
    }

    Some(version.to_string())
}

/// Check that FFmpeg is installed and callable
///
/// Runs `ffmpeg -version` and returns the detected version string for the
/// startup log line, or "unknown" when the output cannot be parsed.
///
/// # Errors
/// Returns an error if the ffmpeg binary cannot be spawned or exits with
/// a failure status.
pub fn check_ffmpeg_available() -> Result<String, StartupError> {
    let output = Command::new("ffmpeg").arg("-version").output().map_err(|e| {
        StartupError::FfmpegUnavailable(format!(
            "ffmpeg -version failed; is FFmpeg installed and in PATH? Error: {}",
            e
        ))
    })?;

    if !output.status.success() {
        return Err(StartupError::FfmpegUnavailable(
            "ffmpeg -version exited with failure".to_string(),
        ));
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    Ok(parse_ffmpeg_version(&version_output).unwrap_or_else(|| "unknown".to_string()))
}
