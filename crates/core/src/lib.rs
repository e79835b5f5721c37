//! batchform
//!
//! Admission-controlled batch conversion: a fixed batch of file conversion
//! jobs is driven to completion by a polling dispatch loop that keeps jobs
//! with overlapping exclusive resources from running at the same time.

pub mod admission;
pub mod convert;
pub mod flags;
pub mod job;
pub mod logging;
pub mod pool;
pub mod progress;
pub mod resolve;
pub mod scheduler;
pub mod startup;
pub mod status_server;
pub mod watcher;

pub use batchform_config as config;
pub use batchform_config::{Preset, Settings};

pub use admission::{active_flags, can_start};
pub use convert::{build_ffmpeg_command, run_ffmpeg, ConvertError, FfmpegParams};
pub use flags::{ConversionFlags, UnknownFlagError};
pub use job::{ConversionBody, Job, JobState, PrepareError};
pub use logging::init_logging;
pub use pool::{derive_pool_size, JobOutcome, JobVerdict, WorkerPool};
pub use progress::{
    collect_system_metrics, new_shared_view, spawn_system_metrics_updater, BatchSnapshot, JobView,
    SharedBatchView, SystemMetrics,
};
pub use resolve::{expand_inputs, output_path_for};
pub use scheduler::{BatchSummary, Scheduler, DEFAULT_POLL_INTERVAL};
pub use startup::{check_ffmpeg_available, parse_ffmpeg_version, StartupError};
pub use status_server::{create_status_router, run_status_server, ServerError};
pub use watcher::{new_cancel_flag, CancelFlag, CompletionWatcher};
