//! FFmpeg conversion module for batchform
//!
//! Provides functionality to build and execute FFmpeg conversion commands
//! from a preset's argument list.

use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

/// Error type for conversion operations
#[derive(Debug, Error)]
pub enum ConvertError {
    /// FFmpeg process exited with non-zero status
    #[error("ffmpeg failed with exit code: {0}")]
    FfmpegFailed(i32),

    /// FFmpeg process was terminated by signal
    #[error("ffmpeg process was terminated by signal")]
    FfmpegTerminated,

    /// IO error during conversion
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters for a single FFmpeg conversion
///
/// Contains all necessary information to execute one file conversion.
#[derive(Debug, Clone)]
pub struct FfmpegParams {
    /// Path to the input file
    pub input_path: PathBuf,
    /// Path for the converted output file
    pub output_path: PathBuf,
    /// Preset-specific arguments inserted between input and output
    pub args: Vec<String>,
}

impl FfmpegParams {
    /// Create new conversion parameters
    pub fn new(input_path: PathBuf, output_path: PathBuf, args: Vec<String>) -> Self {
        Self {
            input_path,
            output_path,
            args,
        }
    }
}

/// Build an FFmpeg command for a single conversion
///
/// Creates a Command configured with:
/// - Quiet, non-interactive invocation flags
/// - The input path
/// - The preset's argument list, verbatim and in order
/// - The output path as the final argument
///
/// # Arguments
/// * `params` - Conversion parameters including paths and preset arguments
///
/// # Returns
/// A configured Command ready for execution
pub fn build_ffmpeg_command(params: &FfmpegParams) -> Command {
    let mut cmd = Command::new("ffmpeg");

    // Non-interactive invocation: no banner, errors only, never read stdin
    cmd.arg("-hide_banner");
    cmd.arg("-loglevel").arg("error");
    cmd.arg("-nostdin");

    // Overwrite a stale partial output from an earlier aborted run
    cmd.arg("-y");

    cmd.arg("-i").arg(&params.input_path);

    for arg in &params.args {
        cmd.arg(arg);
    }

    // Output path must come last
    cmd.arg(&params.output_path);

    cmd
}

/// Execute a single FFmpeg conversion
///
/// Builds and runs the FFmpeg command, handling exit status appropriately.
/// Blocks until the process exits, so call it from a blocking context.
///
/// # Arguments
/// * `params` - Conversion parameters for the job
///
/// # Returns
/// * `Ok(())` - Conversion completed successfully
/// * `Err(ConvertError)` - Conversion failed
///
/// # Errors
/// Returns an error if:
/// - The FFmpeg process fails to start (IO error)
/// - The FFmpeg process exits with non-zero status
/// - The FFmpeg process is terminated by a signal
pub fn run_ffmpeg(params: &FfmpegParams) -> Result<(), ConvertError> {
    let mut cmd = build_ffmpeg_command(params);

    let status = cmd.status()?;

    if status.success() {
        Ok(())
    } else {
        match status.code() {
            Some(code) => Err(ConvertError::FfmpegFailed(code)),
            None => Err(ConvertError::FfmpegTerminated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::ffi::OsStr;

    /// Helper to convert Command args to a Vec of strings for easier testing
    fn get_command_args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .filter_map(|arg| arg.to_str().map(String::from))
            .collect()
    }

    /// Helper to check if args contain a flag with a specific value
    fn has_flag_with_value(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2)
            .any(|pair| pair[0] == flag && pair[1] == value)
    }

    /// Helper to check if args contain a standalone flag
    fn has_flag(args: &[String], flag: &str) -> bool {
        args.iter().any(|arg| arg == flag)
    }

    /// Helper to check that `needle` appears in `haystack` as a contiguous run
    fn has_contiguous_run(haystack: &[String], needle: &[String]) -> bool {
        if needle.is_empty() {
            return true;
        }
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    // Strategy for generating valid path-like strings
    fn path_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9_/.-]{1,50}")
            .unwrap()
            .prop_filter("non-empty path", |s| !s.is_empty())
    }

    // Strategy for generating preset argument lists
    fn args_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop::string::string_regex("[a-zA-Z0-9:._-]{1,20}").unwrap(),
            0..8,
        )
    }

    // **Feature: batchform, Property 10: FFmpeg Command Completeness**
    // **Validates: Requirements 10.1, 10.2, 10.3, 10.4**
    //
    // *For any* valid `FfmpegParams` (input path, output path, preset args),
    // the built command SHALL contain the quiet-invocation flags, the input
    // path, the preset arguments verbatim and in order, and the output path
    // as the final argument.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_ffmpeg_command_completeness(
            input_path in path_strategy(),
            output_path in path_strategy(),
            preset_args in args_strategy(),
        ) {
            let params = FfmpegParams::new(
                PathBuf::from(&input_path),
                PathBuf::from(&output_path),
                preset_args.clone(),
            );

            let cmd = build_ffmpeg_command(&params);
            let args = get_command_args(&cmd);

            // Verify program name
            prop_assert_eq!(cmd.get_program(), OsStr::new("ffmpeg"));

            // Verify quiet invocation flags (Requirements 10.1)
            prop_assert!(
                has_flag(&args, "-hide_banner"),
                "Command should contain -hide_banner, args: {:?}",
                args
            );
            prop_assert!(
                has_flag_with_value(&args, "-loglevel", "error"),
                "Command should contain -loglevel error, args: {:?}",
                args
            );
            prop_assert!(
                has_flag(&args, "-nostdin"),
                "Command should contain -nostdin, args: {:?}",
                args
            );
            prop_assert!(
                has_flag(&args, "-y"),
                "Command should contain -y, args: {:?}",
                args
            );

            // Verify input path (Requirements 10.2)
            prop_assert!(
                has_flag_with_value(&args, "-i", &input_path),
                "Command should contain -i with input path '{}', args: {:?}",
                input_path, args
            );

            // Verify preset arguments appear verbatim and in order
            // (Requirements 10.3)
            prop_assert!(
                has_contiguous_run(&args, &preset_args),
                "Command should contain preset args {:?} in order, args: {:?}",
                preset_args, args
            );

            // Verify output path is the final argument (Requirements 10.4)
            prop_assert_eq!(
                args.last().map(String::as_str),
                Some(output_path.as_str()),
                "Output path should be the last argument"
            );
        }
    }

    #[test]
    fn test_command_with_no_preset_args() {
        let params = FfmpegParams::new(
            PathBuf::from("in.bmp"),
            PathBuf::from("out.png"),
            Vec::new(),
        );

        let args = get_command_args(&build_ffmpeg_command(&params));

        // With no preset args the output immediately follows the input
        let input_pos = args.iter().position(|a| a == "in.bmp");
        assert_eq!(input_pos.map(|p| p + 1), Some(args.len() - 1));
        assert_eq!(args.last().map(String::as_str), Some("out.png"));
    }

    #[test]
    fn test_command_preserves_argument_order() {
        let params = FfmpegParams::new(
            PathBuf::from("song.wav"),
            PathBuf::from("song.mp3"),
            vec![
                "-codec:a".to_string(),
                "libmp3lame".to_string(),
                "-qscale:a".to_string(),
                "2".to_string(),
            ],
        );

        let args = get_command_args(&build_ffmpeg_command(&params));

        assert!(has_flag_with_value(&args, "-codec:a", "libmp3lame"));
        assert!(has_flag_with_value(&args, "-qscale:a", "2"));

        let codec_pos = args.iter().position(|a| a == "-codec:a").unwrap();
        let qscale_pos = args.iter().position(|a| a == "-qscale:a").unwrap();
        assert!(codec_pos < qscale_pos);
    }
}
