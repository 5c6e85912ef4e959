//! Stage readiness verdicts and gate reason codes

use serde::{Deserialize, Serialize};
use crate::types::{MilestoneType, RelationshipStage};

/// Reason codes for stage-gate decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum GateReason {
    /// Progress and milestone mix satisfied
    G001_READY,
    /// Progress below threshold
    G002_INSUFFICIENT_PROGRESS,
    /// Progress reached, required milestone types missing
    G003_MISSING_MILESTONES,
    /// Already at the final stage; nothing to advance to
    G004_TERMINAL_STAGE,
}

impl GateReason {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::G001_READY => "G001_READY",
            Self::G002_INSUFFICIENT_PROGRESS => "G002_INSUFFICIENT_PROGRESS",
            Self::G003_MISSING_MILESTONES => "G003_MISSING_MILESTONES",
            Self::G004_TERMINAL_STAGE => "G004_TERMINAL_STAGE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::G001_READY => "Ready to advance",
            Self::G002_INSUFFICIENT_PROGRESS => "Not enough progress in this stage",
            Self::G003_MISSING_MILESTONES => "Missing required milestones",
            Self::G004_TERMINAL_STAGE => "Final stage reached",
        }
    }
}

impl std::fmt::Display for GateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Computed fresh on every advancement check; never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReadiness {
    pub is_ready: bool,
    pub current_stage: RelationshipStage,
    /// `None` at the terminal stage
    pub next_stage: Option<RelationshipStage>,
    pub current_progress: u32,
    pub required_milestone_types: Vec<MilestoneType>,
    /// Required types absent from the supplied window, in table order
    pub missing_requirement_types: Vec<MilestoneType>,
    pub reason: GateReason,
}

impl StageReadiness {
    /// Can the caller actually move to a new stage?
    pub fn can_advance(&self) -> bool {
        self.is_ready && self.next_stage.is_some()
    }
}
