//! Job module for representing and preparing conversion jobs.
//!
//! A job binds one input file to one output path under a named preset,
//! together with the exclusive resource flags the preset declares and the
//! conversion body the worker pool will run. Jobs move through a small
//! state machine: ready, in progress, then done or failed.

use crate::convert::{run_ffmpeg, ConvertError, FfmpegParams};
use crate::flags::{ConversionFlags, UnknownFlagError};
use crate::resolve::output_path_for;
use batchform_config::Preset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// State of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job is waiting to be admitted.
    Ready,
    /// Job is running on a worker.
    InProgress,
    /// Job completed successfully.
    Done,
    /// Job failed with an error.
    Failed,
}

impl Default for JobState {
    fn default() -> Self {
        Self::Ready
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Ready => write!(f, "ready"),
            JobState::InProgress => write!(f, "in_progress"),
            JobState::Done => write!(f, "done"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// Error type for job preparation.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// Input path does not exist
    #[error("input file does not exist: {0}")]
    InputMissing(PathBuf),

    /// Input path exists but is not a regular file
    #[error("input path is not a file: {0}")]
    NotAFile(PathBuf),

    /// Preset restricts input extensions and this file does not match
    #[error("preset '{preset}' does not accept input: {path}")]
    UnsupportedInput { preset: String, path: PathBuf },

    /// Preset declares a resource class this build does not know
    #[error(transparent)]
    UnknownResourceClass(#[from] UnknownFlagError),

    /// No collision-free output path could be derived for the input
    #[error("could not derive an output path for: {0}")]
    OutputExhausted(PathBuf),
}

/// The work a job performs when a worker picks it up.
///
/// Runs synchronously on a blocking thread and reports success or failure.
pub type ConversionBody = Box<dyn FnOnce() -> Result<(), ConvertError> + Send + 'static>;

/// A single conversion job in the batch.
///
/// Fields are private so state changes go through the marker methods and
/// the body can only be taken once, by the worker that runs it.
pub struct Job {
    id: String,
    input_path: PathBuf,
    output_path: PathBuf,
    preset_name: String,
    flags: ConversionFlags,
    state: JobState,
    created_at: i64,
    updated_at: i64,
    error_reason: Option<String>,
    body: Option<ConversionBody>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("preset_name", &self.preset_name)
            .field("flags", &self.flags)
            .field("state", &self.state)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("error_reason", &self.error_reason)
            .field("body", &self.body.as_ref().map(|_| "FnOnce"))
            .finish()
    }
}

impl Job {
    /// Create a job with an explicit conversion body.
    ///
    /// Generates a UUID for the job id and sets the initial state to Ready.
    pub fn new(
        preset_name: &str,
        input_path: PathBuf,
        output_path: PathBuf,
        flags: ConversionFlags,
        body: ConversionBody,
    ) -> Self {
        let now = current_timestamp_ms();

        Self {
            id: Uuid::new_v4().to_string(),
            input_path,
            output_path,
            preset_name: preset_name.to_string(),
            flags,
            state: JobState::Ready,
            created_at: now,
            updated_at: now,
            error_reason: None,
            body: Some(body),
        }
    }

    /// Prepare a conversion job for an input file under a preset.
    ///
    /// Validates the input, parses the preset's exclusive resource classes,
    /// derives a collision-free output path, and packages the FFmpeg
    /// invocation as the job body.
    ///
    /// # Arguments
    /// * `preset` - The preset that will drive the conversion
    /// * `input_path` - The file to convert
    ///
    /// # Errors
    /// Returns an error if the input is missing or not a file, the preset
    /// rejects the input extension, the preset names an unknown resource
    /// class, or no free output path exists.
    pub fn prepare(preset: &Preset, input_path: &Path) -> Result<Self, PrepareError> {
        if !input_path.exists() {
            return Err(PrepareError::InputMissing(input_path.to_path_buf()));
        }
        if !input_path.is_file() {
            return Err(PrepareError::NotAFile(input_path.to_path_buf()));
        }
        if !preset.accepts_input(input_path) {
            return Err(PrepareError::UnsupportedInput {
                preset: preset.name.clone(),
                path: input_path.to_path_buf(),
            });
        }

        let flags = ConversionFlags::from_names(&preset.exclusive)?;

        let output_path = output_path_for(input_path, &preset.output_extension)
            .ok_or_else(|| PrepareError::OutputExhausted(input_path.to_path_buf()))?;

        let params = FfmpegParams::new(
            input_path.to_path_buf(),
            output_path.clone(),
            preset.ffmpeg_args.clone(),
        );
        let body: ConversionBody = Box::new(move || run_ffmpeg(&params));

        Ok(Job::new(
            &preset.name,
            input_path.to_path_buf(),
            output_path,
            flags,
            body,
        ))
    }

    /// Unique job identifier (UUID).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path to the input file.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Path for the converted output file.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Name of the preset driving this job.
    pub fn preset_name(&self) -> &str {
        &self.preset_name
    }

    /// Exclusive resource flags held while the job runs.
    pub fn flags(&self) -> ConversionFlags {
        self.flags
    }

    /// Current state of the job.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Error reason if the job failed.
    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    /// Unix timestamp (milliseconds) when the job was created.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Unix timestamp (milliseconds) when the job was last updated.
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Update the job's updated_at timestamp to now.
    pub fn touch(&mut self) {
        self.updated_at = current_timestamp_ms();
    }

    /// Mark the job as running.
    pub fn mark_in_progress(&mut self) {
        self.state = JobState::InProgress;
        self.touch();
    }

    /// Mark the job as completed successfully.
    pub fn mark_done(&mut self) {
        self.state = JobState::Done;
        self.touch();
    }

    /// Mark the job as failed with a reason.
    pub fn mark_failed(&mut self, reason: &str) {
        self.state = JobState::Failed;
        self.error_reason = Some(reason.to_string());
        self.touch();
    }

    /// Check if the job is in a terminal state (done or failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Done | JobState::Failed)
    }

    /// Check if the job is running.
    pub fn is_active(&self) -> bool {
        matches!(self.state, JobState::InProgress)
    }

    /// Take the conversion body out of the job.
    ///
    /// Returns None if the body was already taken.
    pub fn take_body(&mut self) -> Option<ConversionBody> {
        self.body.take()
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
