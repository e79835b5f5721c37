//! Admission control for the dispatch loop.
//!
//! A candidate job may start only when its exclusive resource flags are
//! disjoint from the flags of every job currently in progress. The active
//! flag set is recomputed from the batch on each scan rather than kept as
//! running state, so a finished job releases its resources the moment the
//! next scan observes its terminal state.

use crate::flags::ConversionFlags;
use crate::job::Job;

/// Whether a job with `job_flags` may start while `active` flags are held.
pub fn can_start(job_flags: ConversionFlags, active: ConversionFlags) -> bool {
    !job_flags.intersects(active)
}

/// Union of the flags of every in-progress job in the batch.
pub fn active_flags(jobs: &[Job]) -> ConversionFlags {
    jobs.iter()
        .filter(|job| job.is_active())
        .fold(ConversionFlags::NONE, |acc, job| acc | job.flags())
}
