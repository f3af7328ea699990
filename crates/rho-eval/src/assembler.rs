//! Report assembly.

use rho_core::{
    EpsilonSchedule, Result, RhoError, RobustnessRecord, RobustnessReport, WorstCaseStats,
};

/// Collects records in the order they are produced.
///
/// Records are positional: the assembler never sorts them, and
/// [`finish`](ReportAssembler::finish) checks that they line up with the
/// schedule entry by entry.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    records: Vec<RobustnessRecord>,
    worst_case: Option<WorstCaseStats>,
    training_set_size: usize,
    augmented_set_size: Option<usize>,
}

impl ReportAssembler {
    pub fn new(training_set_size: usize) -> Self {
        Self {
            records: Vec::new(),
            worst_case: None,
            training_set_size,
            augmented_set_size: None,
        }
    }

    pub fn push(&mut self, record: RobustnessRecord) {
        self.records.push(record);
    }

    /// Replace any previously attached stats.
    pub fn set_worst_case(&mut self, stats: WorstCaseStats) {
        self.worst_case = Some(stats);
    }

    pub fn set_augmented_set_size(&mut self, size: usize) {
        self.augmented_set_size = Some(size);
    }

    /// Finish the report, checking one record per budget in schedule order.
    pub fn finish(self, schedule: &EpsilonSchedule) -> Result<RobustnessReport> {
        if self.records.len() != schedule.len() {
            return Err(RhoError::ScheduleMismatch {
                expected: schedule.len(),
                got: self.records.len(),
            });
        }
        if let Some((idx, (record, eps))) = self
            .records
            .iter()
            .zip(schedule.iter())
            .enumerate()
            .find(|(_, (r, e))| r.eps != *e)
        {
            return Err(RhoError::ContractViolation(format!(
                "Record {} has eps {} but schedule entry is {}",
                idx, record.eps, eps
            )));
        }
        Ok(RobustnessReport {
            results: self.records,
            worst_case: self.worst_case,
            training_set_size: self.training_set_size,
            augmented_set_size: self.augmented_set_size,
        })
    }
}
