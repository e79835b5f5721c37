//! Worker pool module for batchform
//!
//! Runs conversion bodies on a fixed set of worker slots. A slot holds the
//! handle of the task occupying it; a slot whose task has finished (or that
//! never held one) is idle and can take the next job. Outcomes flow back to
//! the dispatch loop over a channel, so the pool never touches job state.

use crate::job::Job;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Result of running one conversion body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobVerdict {
    /// The conversion completed successfully.
    Done,
    /// The conversion failed with the given reason.
    Failed(String),
}

/// Outcome message sent from a worker back to the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Index of the job in the batch.
    pub index: usize,
    /// What happened to it.
    pub verdict: JobVerdict,
}

/// Derive the worker pool size from the configured job limit.
///
/// A configured value of zero means automatic: one worker per logical CPU.
pub fn derive_pool_size(configured: u32) -> usize {
    if configured == 0 {
        num_cpus::get().max(1)
    } else {
        configured as usize
    }
}

/// Fixed-size pool of worker slots for running conversions.
pub struct WorkerPool {
    slots: Vec<Option<JoinHandle<()>>>,
    outcome_tx: mpsc::UnboundedSender<JobOutcome>,
}

/// A slot is idle when it never held a task or its task has finished.
fn slot_is_idle(slot: &Option<JoinHandle<()>>) -> bool {
    match slot {
        None => true,
        Some(handle) => handle.is_finished(),
    }
}

impl WorkerPool {
    /// Create a pool with the given number of slots (at least one).
    pub fn new(size: usize, outcome_tx: mpsc::UnboundedSender<JobOutcome>) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(size.max(1), || None);
        Self { slots, outcome_tx }
    }

    /// Number of worker slots in the pool.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently able to take a job.
    pub fn idle_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot_is_idle(slot)).count()
    }

    /// Try to start a job on an idle slot.
    ///
    /// Returns false when every slot is busy. Returns true when the job was
    /// handed to a worker; its outcome will arrive on the outcome channel.
    /// The caller marks the job in progress after a successful start.
    pub fn try_start(&mut self, index: usize, job: &mut Job) -> bool {
        let slot_index = match self.slots.iter().position(slot_is_idle) {
            Some(i) => i,
            None => return false,
        };

        let job_id = job.id().to_string();
        let output_path = job.output_path().to_path_buf();

        let body = match job.take_body() {
            Some(body) => body,
            None => {
                // A ready job without a body cannot run. Report it failed
                // through the normal channel so the batch still drains.
                error!(job_id = %job_id, "job has no conversion body");
                let _ = self.outcome_tx.send(JobOutcome {
                    index,
                    verdict: JobVerdict::Failed("conversion body missing".to_string()),
                });
                return true;
            }
        };

        let tx = self.outcome_tx.clone();
        let handle = tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(body).await;

            let verdict = match result {
                Ok(Ok(())) => {
                    if !output_path.exists() {
                        warn!(
                            job_id = %job_id,
                            output = %output_path.display(),
                            "conversion reported success but output file is missing"
                        );
                    }
                    JobVerdict::Done
                }
                Ok(Err(convert_err)) => {
                    if output_path.exists() {
                        warn!(
                            job_id = %job_id,
                            output = %output_path.display(),
                            "conversion failed but left an output file behind"
                        );
                    }
                    JobVerdict::Failed(convert_err.to_string())
                }
                Err(join_err) => {
                    JobVerdict::Failed(format!("conversion task panicked: {}", join_err))
                }
            };

            let _ = tx.send(JobOutcome { index, verdict });
        });

        self.slots[slot_index] = Some(handle);
        true
    }
}
