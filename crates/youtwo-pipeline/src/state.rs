//! Pipeline run state machine

use serde::Serialize;
use std::fmt;
use tracing::debug;
use youtwo_core::{GraphError, GraphResult};

/// Stage of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Gathering,
    Integrating,
    Validating,
    Done,
    Failed,
}

impl PipelineStage {
    /// The stage that follows on success, `None` for terminal stages
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Gathering => Some(PipelineStage::Integrating),
            PipelineStage::Integrating => Some(PipelineStage::Validating),
            PipelineStage::Validating => Some(PipelineStage::Done),
            PipelineStage::Done | PipelineStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }

    /// Forward by one step, or to `Failed` from any non-terminal stage
    pub fn can_transition_to(self, to: PipelineStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == PipelineStage::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Gathering => "gathering",
            PipelineStage::Integrating => "integrating",
            PipelineStage::Validating => "validating",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Records the stages a run has passed through
#[derive(Debug, Clone)]
pub struct StageTracker {
    history: Vec<PipelineStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    /// Start in `Gathering`
    pub fn new() -> Self {
        Self {
            history: vec![PipelineStage::Gathering],
        }
    }

    pub fn current(&self) -> PipelineStage {
        // history always starts with Gathering
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineStage::Gathering)
    }

    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    pub fn advance(&mut self, to: PipelineStage) -> GraphResult<()> {
        let from = self.current();
        if !from.can_transition_to(to) {
            return Err(GraphError::config(format!(
                "illegal pipeline transition {from} -> {to}"
            )));
        }
        debug!("Pipeline stage {} -> {}", from, to);
        self.history.push(to);
        Ok(())
    }

    /// Move to `Failed`; a no-op once the run is terminal
    pub fn fail(&mut self) {
        if !self.current().is_terminal() {
            self.history.push(PipelineStage::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_sequence() {
        let mut tracker = StageTracker::new();
        tracker.advance(PipelineStage::Integrating).unwrap();
        tracker.advance(PipelineStage::Validating).unwrap();
        tracker.advance(PipelineStage::Done).unwrap();

        assert_eq!(
            tracker.history(),
            &[
                PipelineStage::Gathering,
                PipelineStage::Integrating,
                PipelineStage::Validating,
                PipelineStage::Done
            ]
        );
    }

    #[test]
    fn test_stages_cannot_be_skipped_or_revisited() {
        let mut tracker = StageTracker::new();
        assert!(tracker.advance(PipelineStage::Validating).is_err());
        tracker.advance(PipelineStage::Integrating).unwrap();
        assert!(tracker.advance(PipelineStage::Gathering).is_err());
        assert!(tracker.advance(PipelineStage::Integrating).is_err());
    }

    #[test]
    fn test_failed_reachable_from_every_non_terminal_stage() {
        for stage in [
            PipelineStage::Gathering,
            PipelineStage::Integrating,
            PipelineStage::Validating,
        ] {
            assert!(stage.can_transition_to(PipelineStage::Failed));
        }
        assert!(!PipelineStage::Done.can_transition_to(PipelineStage::Failed));
        assert!(!PipelineStage::Failed.can_transition_to(PipelineStage::Failed));
    }

    #[test]
    fn test_terminal_stages_absorb() {
        let mut tracker = StageTracker::new();
        tracker.fail();
        tracker.fail();
        assert_eq!(tracker.current(), PipelineStage::Failed);
        assert_eq!(tracker.history().len(), 2);
        assert!(tracker.advance(PipelineStage::Integrating).is_err());
    }
}
