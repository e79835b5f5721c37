//! Dispatch loop for batchform
//!
//! Drives a fixed batch of conversion jobs to completion. Each scan applies
//! finished outcomes, recomputes the active flag set from the batch, admits
//! at most one job whose flags are disjoint from it, publishes a snapshot,
//! and sleeps. The loop owns the job list outright; workers only report
//! back over the outcome channel, so no job state is shared or locked.
//!
//! Jobs are always scanned in submission order, so an earlier job gets the
//! first claim on a contended resource. That keeps admission starvation-free
//! for a finite batch; it makes no attempt at optimal packing.

use crate::admission::{active_flags, can_start};
use crate::job::{Job, JobState};
use crate::pool::{JobOutcome, JobVerdict, WorkerPool};
use crate::progress::{current_timestamp_ms, new_shared_view, JobView, SharedBatchView};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// How often the dispatch loop rescans the batch.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Final tally of a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of jobs in the batch.
    pub total: usize,
    /// Jobs that completed successfully.
    pub done: usize,
    /// Jobs that failed.
    pub failed: usize,
}

impl BatchSummary {
    /// Whether every job in the batch completed successfully.
    pub fn all_done(&self) -> bool {
        self.done == self.total
    }
}

/// Admission-controlled dispatcher for one batch of conversion jobs.
pub struct Scheduler {
    jobs: Vec<Job>,
    pool: WorkerPool,
    outcome_rx: mpsc::UnboundedReceiver<JobOutcome>,
    view: SharedBatchView,
    poll_interval: Duration,
}

impl Scheduler {
    /// Create a scheduler over the given batch with `pool_size` workers.
    pub fn new(jobs: Vec<Job>, pool_size: usize) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::new(pool_size, outcome_tx);

        Self {
            jobs,
            pool,
            outcome_rx,
            view: new_shared_view(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the scan interval (mainly for tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Shared read-only view of the batch, updated after every scan.
    pub fn view(&self) -> SharedBatchView {
        self.view.clone()
    }

    /// Run the batch to completion.
    ///
    /// Returns once every job has reached a terminal state. Failed jobs
    /// never stall the batch; the summary reports them.
    pub async fn run(mut self) -> BatchSummary {
        info!(
            jobs = self.jobs.len(),
            workers = self.pool.size(),
            "starting batch dispatch"
        );

        loop {
            self.apply_outcomes();

            let active = active_flags(&self.jobs);
            if self.jobs.iter().all(Job::is_terminal) {
                break;
            }

            self.admit_one(active);

            self.publish_snapshot().await;
            tokio::time::sleep(self.poll_interval).await;
        }

        self.publish_snapshot().await;

        let summary = self.summary();
        info!(
            done = summary.done,
            failed = summary.failed,
            total = summary.total,
            "batch dispatch finished"
        );
        summary
    }

    /// Apply every outcome the workers have reported since the last scan.
    fn apply_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            let job = match self.jobs.get_mut(outcome.index) {
                Some(job) => job,
                None => {
                    error!(index = outcome.index, "outcome for unknown job index");
                    continue;
                }
            };

            if job.state() != JobState::InProgress {
                error!(
                    job_id = %job.id(),
                    state = %job.state(),
                    "outcome for a job that is not in progress"
                );
                continue;
            }

            match outcome.verdict {
                JobVerdict::Done => {
                    job.mark_done();
                    info!(
                        job_id = %job.id(),
                        output = %job.output_path().display(),
                        "conversion done"
                    );
                }
                JobVerdict::Failed(reason) => {
                    job.mark_failed(&reason);
                    error!(
                        job_id = %job.id(),
                        input = %job.input_path().display(),
                        reason = %reason,
                        "conversion failed"
                    );
                }
            }
        }
    }

    /// Try to admit the first ready job whose flags clear admission.
    fn admit_one(&mut self, active: crate::flags::ConversionFlags) {
        for index in 0..self.jobs.len() {
            if self.jobs[index].state() != JobState::Ready {
                continue;
            }
            if !can_start(self.jobs[index].flags(), active) {
                continue;
            }

            if self.pool.try_start(index, &mut self.jobs[index]) {
                self.jobs[index].mark_in_progress();
                let job = &self.jobs[index];
                info!(
                    job_id = %job.id(),
                    input = %job.input_path().display(),
                    preset = %job.preset_name(),
                    flags = %job.flags(),
                    "admitted conversion"
                );
            } else {
                debug!(
                    job_id = %self.jobs[index].id(),
                    "no idle worker slot, deferring admission"
                );
            }

            // One admission attempt per scan; the next scan recomputes the
            // flag set before trying again.
            break;
        }
    }

    fn summary(&self) -> BatchSummary {
        let done = self
            .jobs
            .iter()
            .filter(|job| job.state() == JobState::Done)
            .count();
        let failed = self
            .jobs
            .iter()
            .filter(|job| job.state() == JobState::Failed)
            .count();

        BatchSummary {
            total: self.jobs.len(),
            done,
            failed,
        }
    }

    /// Publish the batch state to the shared view.
    async fn publish_snapshot(&self) {
        let jobs: Vec<JobView> = self.jobs.iter().map(JobView::from).collect();

        let mut ready = 0;
        let mut running = 0;
        let mut done = 0;
        let mut failed = 0;
        for job in &self.jobs {
            match job.state() {
                JobState::Ready => ready += 1,
                JobState::InProgress => running += 1,
                JobState::Done => done += 1,
                JobState::Failed => failed += 1,
            }
        }

        let mut snapshot = self.view.write().await;
        snapshot.timestamp_unix_ms = current_timestamp_ms();
        snapshot.jobs = jobs;
        snapshot.ready_jobs = ready;
        snapshot.running_jobs = running;
        snapshot.done_jobs = done;
        snapshot.failed_jobs = failed;
    }
}
