//! Progress module for batchform
//!
//! Provides structs for per-job views, system metrics, and batch snapshots
//! with JSON serialization support. The dispatch loop publishes a snapshot
//! after every scan so readers never observe a half-updated batch.

use crate::job::{Job, JobState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Read-only view of a single job for status reporting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobView {
    pub id: String,
    pub input_path: String,
    pub output_path: String,
    pub preset: String,
    pub state: JobState,
    pub error_reason: Option<String>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id().to_string(),
            input_path: job.input_path().display().to_string(),
            output_path: job.output_path().display().to_string(),
            preset: job.preset_name().to_string(),
            state: job.state(),
            error_reason: job.error_reason().map(String::from),
        }
    }
}

/// System-level metrics for resource monitoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemMetrics {
    pub cpu_usage_percent: f32,
    pub mem_usage_percent: f32,
    pub load_avg_1: f32,
    pub load_avg_5: f32,
    pub load_avg_15: f32,
}

/// Complete snapshot of the batch including jobs, system, and counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSnapshot {
    pub timestamp_unix_ms: i64,
    pub jobs: Vec<JobView>,
    pub system: SystemMetrics,
    pub ready_jobs: usize,
    pub running_jobs: usize,
    pub done_jobs: usize,
    pub failed_jobs: usize,
}

/// Shared batch view for concurrent access across components
pub type SharedBatchView = Arc<RwLock<BatchSnapshot>>;

impl Default for SystemMetrics {
    fn default() -> Self {
        Self {
            cpu_usage_percent: 0.0,
            mem_usage_percent: 0.0,
            load_avg_1: 0.0,
            load_avg_5: 0.0,
            load_avg_15: 0.0,
        }
    }
}

impl Default for BatchSnapshot {
    fn default() -> Self {
        Self {
            timestamp_unix_ms: 0,
            jobs: Vec::new(),
            system: SystemMetrics::default(),
            ready_jobs: 0,
            running_jobs: 0,
            done_jobs: 0,
            failed_jobs: 0,
        }
    }
}

/// Creates a new SharedBatchView instance with default values
pub fn new_shared_view() -> SharedBatchView {
    Arc::new(RwLock::new(BatchSnapshot::default()))
}

/// Collects current system metrics using sysinfo
pub fn collect_system_metrics() -> SystemMetrics {
    use sysinfo::System;

    let mut sys = System::new();
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let cpu_usage = sys.global_cpu_usage();
    let total_memory = sys.total_memory();
    let used_memory = sys.used_memory();
    let mem_usage = if total_memory > 0 {
        (used_memory as f64 / total_memory as f64 * 100.0) as f32
    } else {
        0.0
    };

    let load_avg = System::load_average();

    SystemMetrics {
        cpu_usage_percent: cpu_usage,
        mem_usage_percent: mem_usage,
        load_avg_1: load_avg.one as f32,
        load_avg_5: load_avg.five as f32,
        load_avg_15: load_avg.fifteen as f32,
    }
}

/// Spawns a background task that refreshes system metrics every 500ms.
///
/// Only the `system` and `timestamp_unix_ms` fields are written here; job
/// fields belong to the dispatch loop.
pub fn spawn_system_metrics_updater(view: SharedBatchView) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(500));
        loop {
            interval.tick().await;
            let system = collect_system_metrics();
            let mut snapshot = view.write().await;
            snapshot.system = system;
            snapshot.timestamp_unix_ms = current_timestamp_ms();
        }
    })
}

/// Get current timestamp in milliseconds since Unix epoch.
pub(crate) fn current_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::ConversionFlags;
    use proptest::prelude::*;
    use std::path::PathBuf;

    // Strategy for generating arbitrary job states
    fn job_state_strategy() -> impl Strategy<Value = JobState> {
        prop_oneof![
            Just(JobState::Ready),
            Just(JobState::InProgress),
            Just(JobState::Done),
            Just(JobState::Failed),
        ]
    }

    // **Feature: batchform, Property 9: BatchSnapshot Serialization Round-Trip**
    // **Validates: Requirements 9.2, 9.3**
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]
        #[test]
        fn prop_batch_snapshot_round_trip(
            timestamp in any::<i64>(),
            ready_jobs in 0usize..100,
            running_jobs in 0usize..100,
            done_jobs in 0usize..100,
            failed_jobs in 0usize..100,
            cpu_usage in 0.0f32..100.0,
            mem_usage in 0.0f32..100.0,
            load_1 in 0.0f32..100.0,
            load_5 in 0.0f32..100.0,
            load_15 in 0.0f32..100.0,
            job_count in 0usize..5,
            state in job_state_strategy(),
        ) {
            let jobs: Vec<JobView> = (0..job_count).map(|i| JobView {
                id: format!("job-{}", i),
                input_path: format!("/music/track{}.wav", i),
                output_path: format!("/music/track{}.mp3", i),
                preset: "to-mp3".to_string(),
                state,
                error_reason: if state == JobState::Failed {
                    Some("ffmpeg failed with exit code: 1".to_string())
                } else {
                    None
                },
            }).collect();

            let snapshot = BatchSnapshot {
                timestamp_unix_ms: timestamp,
                jobs,
                system: SystemMetrics {
                    cpu_usage_percent: cpu_usage,
                    mem_usage_percent: mem_usage,
                    load_avg_1: load_1,
                    load_avg_5: load_5,
                    load_avg_15: load_15,
                },
                ready_jobs,
                running_jobs,
                done_jobs,
                failed_jobs,
            };

            // Serialize to JSON
            let json = serde_json::to_string(&snapshot).expect("serialization should succeed");

            // Deserialize back
            let deserialized: BatchSnapshot = serde_json::from_str(&json)
                .expect("deserialization should succeed");

            // Verify round-trip produces equivalent snapshot
            prop_assert_eq!(snapshot, deserialized);
        }
    }

    #[test]
    fn test_job_view_from_job() {
        let mut job = Job::new(
            "to-mp3",
            PathBuf::from("/music/track.wav"),
            PathBuf::from("/music/track.mp3"),
            ConversionFlags::NONE,
            Box::new(|| Ok(())),
        );
        job.mark_in_progress();
        job.mark_failed("ffmpeg failed with exit code: 1");

        let view = JobView::from(&job);

        assert_eq!(view.id, job.id());
        assert_eq!(view.input_path, "/music/track.wav");
        assert_eq!(view.output_path, "/music/track.mp3");
        assert_eq!(view.preset, "to-mp3");
        assert_eq!(view.state, JobState::Failed);
        assert_eq!(
            view.error_reason,
            Some("ffmpeg failed with exit code: 1".to_string())
        );
    }

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = BatchSnapshot::default();
        assert_eq!(snapshot.timestamp_unix_ms, 0);
        assert!(snapshot.jobs.is_empty());
        assert_eq!(snapshot.ready_jobs, 0);
        assert_eq!(snapshot.running_jobs, 0);
        assert_eq!(snapshot.done_jobs, 0);
        assert_eq!(snapshot.failed_jobs, 0);
    }
}
