//! Core settings structures and loading logic

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Error type for settings operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading settings file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read settings file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse settings: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Scheduling-related settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionSettings {
    /// Maximum concurrent conversion jobs (0 = one per logical core)
    #[serde(default)]
    pub max_concurrent_jobs: u32,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 0,
        }
    }
}

/// Process exit behavior once a batch has drained
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExitSettings {
    /// Exit automatically when every job of the batch succeeded (default true)
    #[serde(default = "default_exit_when_done")]
    pub exit_when_done: bool,
    /// Grace period in seconds between batch completion and exit (default 3.0)
    #[serde(default = "default_exit_delay_secs")]
    pub exit_delay_secs: f32,
}

fn default_exit_when_done() -> bool {
    true
}

fn default_exit_delay_secs() -> f32 {
    3.0
}

impl Default for ExitSettings {
    fn default() -> Self {
        Self {
            exit_when_done: default_exit_when_done(),
            exit_delay_secs: default_exit_delay_secs(),
        }
    }
}

/// Status endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSettings {
    /// Serve batch progress as JSON on localhost (default false)
    #[serde(default)]
    pub enabled: bool,
    /// TCP port of the status endpoint (default 7979)
    #[serde(default = "default_status_port")]
    pub port: u16,
}

fn default_status_port() -> u16 {
    7979
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_status_port(),
        }
    }
}

/// A named conversion recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Name the preset is selected by on the command line
    pub name: String,
    /// Extension of the produced file, without the leading dot
    pub output_extension: String,
    /// Accepted input extensions; an empty list accepts any file
    #[serde(default)]
    pub input_extensions: Vec<String>,
    /// Arguments placed between input and output on the ffmpeg command line
    #[serde(default)]
    pub ffmpeg_args: Vec<String>,
    /// Exclusive resource classes occupied while a job of this preset runs
    #[serde(default)]
    pub exclusive: Vec<String>,
}

impl Preset {
    /// Whether this preset accepts the given input file, judged by its
    /// extension (case-insensitive). Files without an extension are only
    /// accepted when the preset declares no input extensions at all.
    pub fn accepts_input(&self, path: &Path) -> bool {
        if self.input_extensions.is_empty() {
            return true;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self
                .input_extensions
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub conversion: ConversionSettings,
    #[serde(default)]
    pub exit: ExitSettings,
    #[serde(default)]
    pub status: StatusSettings,
    /// Conversion presets, selectable by name (factory set when omitted)
    #[serde(default = "default_presets", rename = "preset")]
    pub presets: Vec<Preset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            conversion: ConversionSettings::default(),
            exit: ExitSettings::default(),
            status: StatusSettings::default(),
            presets: default_presets(),
        }
    }
}

/// Factory presets covering the common audio, image and video conversions.
pub fn default_presets() -> Vec<Preset> {
    fn preset(
        name: &str,
        output_extension: &str,
        input_extensions: &[&str],
        ffmpeg_args: &[&str],
        exclusive: &[&str],
    ) -> Preset {
        Preset {
            name: name.to_string(),
            output_extension: output_extension.to_string(),
            input_extensions: input_extensions.iter().map(|s| s.to_string()).collect(),
            ffmpeg_args: ffmpeg_args.iter().map(|s| s.to_string()).collect(),
            exclusive: exclusive.iter().map(|s| s.to_string()).collect(),
        }
    }

    const VIDEO_INPUTS: &[&str] = &[
        "mp4", "mkv", "avi", "webm", "mov", "wmv", "flv", "mpg", "mpeg", "m4v", "ts",
    ];

    vec![
        preset(
            "to-mp3",
            "mp3",
            &["wav", "flac", "ogg", "m4a", "aac", "wma", "mp4", "mkv", "avi", "webm"],
            &["-vn", "-codec:a", "libmp3lame", "-qscale:a", "2"],
            &[],
        ),
        preset(
            "to-flac",
            "flac",
            &["wav", "mp3", "ogg", "m4a", "aac"],
            &["-vn", "-codec:a", "flac"],
            &[],
        ),
        preset(
            "to-ogg",
            "ogg",
            &["wav", "flac", "mp3", "m4a", "aac"],
            &["-vn", "-codec:a", "libvorbis", "-qscale:a", "5"],
            &[],
        ),
        preset(
            "to-png",
            "png",
            &["jpg", "jpeg", "bmp", "tiff", "webp", "gif"],
            &[],
            &[],
        ),
        preset(
            "to-webp",
            "webp",
            &["jpg", "jpeg", "png", "bmp", "tiff"],
            &["-quality", "80"],
            &[],
        ),
        preset(
            "to-mp4",
            "mp4",
            VIDEO_INPUTS,
            &[
                "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac", "-b:a",
                "192k",
            ],
            &[],
        ),
        preset(
            "to-mkv",
            "mkv",
            VIDEO_INPUTS,
            &["-c:v", "libx265", "-preset", "medium", "-crf", "26", "-c:a", "copy"],
            &[],
        ),
        preset(
            "to-mp4-nvenc",
            "mp4",
            VIDEO_INPUTS,
            &[
                "-c:v", "h264_nvenc", "-preset", "p5", "-cq", "23", "-c:a", "aac", "-b:a",
                "192k",
            ],
            &["hw-encoder"],
        ),
    ]
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// Parses the settings file and fills missing optional fields with defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse settings from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Apply environment variable overrides to the settings
    ///
    /// Overrides the following values if environment variables are set:
    /// - BATCHFORM_MAX_CONCURRENT_JOBS -> conversion.max_concurrent_jobs
    /// - BATCHFORM_EXIT_WHEN_DONE -> exit.exit_when_done
    /// - BATCHFORM_EXIT_DELAY_SECS -> exit.exit_delay_secs
    /// - BATCHFORM_STATUS_ENABLED -> status.enabled
    /// - BATCHFORM_STATUS_PORT -> status.port
    pub fn apply_env_overrides(&mut self) {
        // BATCHFORM_MAX_CONCURRENT_JOBS
        if let Ok(val) = env::var("BATCHFORM_MAX_CONCURRENT_JOBS") {
            if let Ok(jobs) = val.parse::<u32>() {
                self.conversion.max_concurrent_jobs = jobs;
            }
        }

        // BATCHFORM_EXIT_WHEN_DONE
        if let Ok(val) = env::var("BATCHFORM_EXIT_WHEN_DONE") {
            // Accept "true", "1", "yes" as true; "false", "0", "no" as false
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.exit.exit_when_done = true,
                "false" | "0" | "no" => self.exit.exit_when_done = false,
                _ => {} // Invalid value, keep existing
            }
        }

        // BATCHFORM_EXIT_DELAY_SECS
        if let Ok(val) = env::var("BATCHFORM_EXIT_DELAY_SECS") {
            if let Ok(delay) = val.parse::<f32>() {
                self.exit.exit_delay_secs = delay;
            }
        }

        // BATCHFORM_STATUS_ENABLED
        if let Ok(val) = env::var("BATCHFORM_STATUS_ENABLED") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.status.enabled = true,
                "false" | "0" | "no" => self.status.enabled = false,
                _ => {}
            }
        }

        // BATCHFORM_STATUS_PORT
        if let Ok(val) = env::var("BATCHFORM_STATUS_PORT") {
            if let Ok(port) = val.parse::<u16>() {
                self.status.port = port;
            }
        }
    }

    /// Load settings from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut settings = Self::load_from_file(path)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Look up a preset by name, case-insensitively.
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
