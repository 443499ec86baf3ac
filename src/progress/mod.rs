//! Progression collaborators
//!
//! The level simulation reports toggles, completions and star scores through
//! two narrow traits. Notifications are fire-and-forget: a missing or failing
//! collaborator is logged and otherwise ignored.

pub mod levels;
pub mod objectives;
pub mod scores;

pub use levels::{LevelProgression, NextScene};
pub use objectives::{ObjectiveDefinition, ObjectiveProgress, ObjectiveTracker, ObjectiveTrigger};
pub use scores::ScoreBook;

use crate::error::Result;

/// Receives gameplay milestones (objectives, achievements)
pub trait ProgressionSink {
    fn register_toggle_used(&mut self) -> Result<()>;
    fn register_level_completed(&mut self, level: usize) -> Result<()>;
    /// Level completed within the clean-run toggle budget
    fn register_level_completed_clean(&mut self, level: usize) -> Result<()>;
}

/// Receives end-of-level star scores
pub trait ScoreSink {
    fn update_score(&mut self, level: usize, stars: u32) -> Result<()>;
}

/// Optional collaborators held by a level session
#[derive(Default)]
pub struct Collaborators {
    progression: Option<Box<dyn ProgressionSink>>,
    scores: Option<Box<dyn ScoreSink>>,
    warned_progression: bool,
    warned_scores: bool,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("progression", &self.progression.is_some())
            .field("scores", &self.scores.is_some())
            .finish()
    }
}

impl Collaborators {
    pub fn new(
        progression: Option<Box<dyn ProgressionSink>>,
        scores: Option<Box<dyn ScoreSink>>,
    ) -> Self {
        Self {
            progression,
            scores,
            warned_progression: false,
            warned_scores: false,
        }
    }

    pub fn with_progression(mut self, sink: impl ProgressionSink + 'static) -> Self {
        self.progression = Some(Box::new(sink));
        self
    }

    pub fn with_scores(mut self, sink: impl ScoreSink + 'static) -> Self {
        self.scores = Some(Box::new(sink));
        self
    }

    fn progression(&mut self) -> Option<&mut (dyn ProgressionSink + 'static)> {
        if self.progression.is_none() && !self.warned_progression {
            log::warn!("No progression tracker; milestones will not be recorded");
            self.warned_progression = true;
        }
        self.progression.as_deref_mut()
    }

    pub fn toggle_used(&mut self) {
        if let Some(sink) = self.progression() {
            report("toggle", sink.register_toggle_used());
        }
    }

    pub fn level_completed(&mut self, level: usize, clean: bool) {
        if let Some(sink) = self.progression() {
            report("level completion", sink.register_level_completed(level));
            if clean {
                report("clean completion", sink.register_level_completed_clean(level));
            }
        }
    }

    pub fn update_score(&mut self, level: usize, stars: u32) {
        match self.scores.as_deref_mut() {
            Some(sink) => report("score", sink.update_score(level, stars)),
            None if !self.warned_scores => {
                log::warn!("No score store; level {level} result not saved");
                self.warned_scores = true;
            }
            None => {}
        }
    }
}

fn report(what: &str, result: Result<()>) {
    if let Err(e) = result {
        log::warn!("Failed to record {what}: {e}");
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_missing_collaborators_are_no_ops() {
        let mut c = Collaborators::default();
        c.toggle_used();
        c.level_completed(2, true);
        c.update_score(2, 3);
        c.update_score(2, 3);
        assert!(c.warned_progression);
        assert!(c.warned_scores);
    }

    #[test]
    fn test_failing_collaborators_are_swallowed() {
        let mut c = Collaborators::default()
            .with_progression(Failing)
            .with_scores(Failing);
        c.toggle_used();
        c.level_completed(0, true);
        c.update_score(0, 1);
    }

    #[test]
    fn test_clean_completion_reported_only_when_clean() {
        let (rec, mut c) = RecordingProgress::collaborators();
        c.level_completed(4, false);
        c.level_completed(5, true);
        assert_eq!(rec.borrow().completed, vec![4, 5]);
        assert_eq!(rec.borrow().clean, vec![5]);
    }
}
