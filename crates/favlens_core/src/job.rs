use crate::JobResultKind;

pub type JobId = u64;

/// One candidate URL, in input order. Consumed exactly once by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateJob {
    pub id: JobId,
    pub url: String,
}

/// Lifecycle of a single job. Stages only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Queued,
    Fetching,
    Normalizing,
    Comparing,
    Matched,
    NotMatched,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Matched | Stage::NotMatched | Stage::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// `Failed` is reachable from any working stage; the other terminals only
    /// follow `Comparing`.
    pub fn can_advance_to(self, next: Stage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Stage::Failed => self != Stage::Queued,
            Stage::Matched | Stage::NotMatched => self == Stage::Comparing,
            _ => (next as u8) == (self as u8) + 1,
        }
    }
}

impl From<JobResultKind> for Stage {
    fn from(kind: JobResultKind) -> Self {
        match kind {
            JobResultKind::Matched => Stage::Matched,
            JobResultKind::NotMatched => Stage::NotMatched,
            JobResultKind::Failed => Stage::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Stage;

    #[test]
    fn stages_move_forward_one_step() {
        assert!(Stage::Queued.can_advance_to(Stage::Fetching));
        assert!(Stage::Fetching.can_advance_to(Stage::Normalizing));
        assert!(Stage::Normalizing.can_advance_to(Stage::Comparing));
        assert!(!Stage::Queued.can_advance_to(Stage::Comparing));
        assert!(!Stage::Comparing.can_advance_to(Stage::Fetching));
    }

    #[test]
    fn terminal_stages_are_final() {
        assert!(Stage::Comparing.can_advance_to(Stage::Matched));
        assert!(Stage::Comparing.can_advance_to(Stage::NotMatched));
        assert!(Stage::Fetching.can_advance_to(Stage::Failed));
        assert!(!Stage::Fetching.can_advance_to(Stage::Matched));
        assert!(!Stage::Failed.can_advance_to(Stage::Fetching));
        assert!(!Stage::Matched.can_advance_to(Stage::Failed));
    }
}
