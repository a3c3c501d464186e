//! The five fixed planning phases

use serde::{Deserialize, Serialize};

use crate::steps::StepName;

/// One stage of a planning run
///
/// Phases run strictly in declaration order; each completes fully before
/// the next starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Context,
    Options,
    Selection,
    Analysis,
    Compilation,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Context,
        Phase::Options,
        Phase::Selection,
        Phase::Analysis,
        Phase::Compilation,
    ];

    /// Steps launched by this phase
    pub fn steps(&self) -> &'static [StepName] {
        match self {
            Self::Context => &[StepName::Weather],
            Self::Options => &[StepName::Logistics, StepName::Accommodation],
            Self::Selection => &[StepName::Itinerary],
            Self::Analysis => &[StepName::Budget, StepName::Advisory, StepName::Souvenir],
            Self::Compilation => &[],
        }
    }

    /// 1-based position in the run
    pub fn index(&self) -> usize {
        match self {
            Self::Context => 1,
            Self::Options => 2,
            Self::Selection => 3,
            Self::Analysis => 4,
            Self::Compilation => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Options => "options",
            Self::Selection => "selection",
            Self::Analysis => "analysis",
            Self::Compilation => "compilation",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_step_belongs_to_its_phase() {
        for phase in Phase::ALL {
            for step in phase.steps() {
                assert_eq!(step.phase(), phase);
            }
        }
    }

    #[test]
    fn test_phase_order() {
        let mut sorted = Phase::ALL;
        sorted.sort();
        assert_eq!(sorted, Phase::ALL);
        assert_eq!(Phase::Selection.index(), 3);
        assert_eq!(Phase::Options.to_string(), "options");
    }
}
