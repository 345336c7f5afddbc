//! Accumulates one outcome per job, in submission order.

use super::OutcomeRecord;

/// Slot-per-job accumulator. Only the scheduler loop appends, so no lock is
/// needed; the order of `into_records` is job submission order regardless of
/// completion order.
#[derive(Debug, Default)]
pub struct ResultRecorder {
    slots: Vec<Option<OutcomeRecord>>,
}

impl ResultRecorder {
    /// Recorder for a batch of `jobs` jobs.
    pub fn new(jobs: usize) -> Self {
        Self {
            slots: vec![None; jobs],
        }
    }

    /// Store the outcome of job number `index`. A second outcome for the same
    /// job is ignored.
    pub fn record(&mut self, index: usize, record: OutcomeRecord) {
        match self.slots.get_mut(index) {
            Some(slot @ None) => *slot = Some(record),
            Some(Some(existing)) => {
                tracing::warn!(index, game_id = %existing.game_id, "duplicate outcome ignored");
            }
            None => tracing::warn!(index, "outcome for unknown job index ignored"),
        }
    }

    /// Number of jobs with an outcome so far.
    pub fn recorded(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_recorded(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Outcomes in submission order; jobs without an outcome are left out.
    pub fn into_records(self) -> Vec<OutcomeRecord> {
        self.slots.into_iter().flatten().collect()
    }
}
