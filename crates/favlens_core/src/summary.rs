use std::fmt;

/// Terminal outcome of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobResultKind {
    Matched,
    NotMatched,
    Failed,
}

/// Counters for a whole run. Every recorded result lands in exactly one bucket,
/// so `total_jobs == matches + errors + non_matches` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total_jobs: usize,
    pub matches: usize,
    pub errors: usize,
    pub non_matches: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: JobResultKind) {
        self.total_jobs += 1;
        match kind {
            JobResultKind::Matched => self.matches += 1,
            JobResultKind::NotMatched => self.non_matches += 1,
            JobResultKind::Failed => self.errors += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matches: {}, Errors: {}, Total: {}",
            self.matches, self.errors, self.total_jobs
        )
    }
}
