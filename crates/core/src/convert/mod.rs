//! Conversion modules for batchform

pub mod ffmpeg;

pub use ffmpeg::{build_ffmpeg_command, run_ffmpeg, ConvertError, FfmpegParams};
