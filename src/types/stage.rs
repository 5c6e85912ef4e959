//! Relationship stages and their static configuration

use serde::{Deserialize, Serialize};
use crate::types::MilestoneType;

/// The seven ordered relationship stages
///
/// Transitions are strictly sequential and one-directional; `Soulmate` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipStage {
    #[default]
    NewFriend,
    CloseFriend,
    BestFriend,
    RomanticInterest,
    Dating,
    CommittedPartner,
    Soulmate,
}

impl RelationshipStage {
    /// All stages in progression order
    pub const ALL: [RelationshipStage; 7] = [
        RelationshipStage::NewFriend,
        RelationshipStage::CloseFriend,
        RelationshipStage::BestFriend,
        RelationshipStage::RomanticInterest,
        RelationshipStage::Dating,
        RelationshipStage::CommittedPartner,
        RelationshipStage::Soulmate,
    ];

    /// Display name, also the wire representation
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewFriend => "New Friend",
            Self::CloseFriend => "Close Friend",
            Self::BestFriend => "Best Friend",
            Self::RomanticInterest => "Romantic Interest",
            Self::Dating => "Dating",
            Self::CommittedPartner => "Committed Partner",
            Self::Soulmate => "Soulmate",
        }
    }

    /// Zero-based position in the progression
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Next stage, if any
    pub fn next(&self) -> Option<RelationshipStage> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Is this the terminal stage?
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Strict lookup. Accepts display names and snake/kebab case, ignoring case.
    pub fn parse_strict(name: &str) -> Option<RelationshipStage> {
        let wanted = normalize(name);
        Self::ALL
            .iter()
            .copied()
            .find(|stage| normalize(stage.name()) == wanted)
    }

    /// Lenient lookup: unknown names fall back to `NewFriend`
    pub fn from_name(name: &str) -> RelationshipStage {
        match Self::parse_strict(name) {
            Some(stage) => stage,
            None => {
                tracing::warn!(stage = name, "unknown relationship stage, falling back to New Friend");
                RelationshipStage::default()
            }
        }
    }

    /// Static configuration for this stage
    pub fn config(&self) -> StageConfig {
        StageConfig::for_stage(*self)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl From<String> for RelationshipStage {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<RelationshipStage> for String {
    fn from(stage: RelationshipStage) -> Self {
        stage.name().to_string()
    }
}

impl std::fmt::Display for RelationshipStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// STAGE CONFIGURATION
// =============================================================================

/// Per-stage configuration consumed by progression, the stage gate and the host's prompt builder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageConfig {
    pub stage: RelationshipStage,
    pub description: &'static str,
    /// Conversational tone guidance for the companion at this stage
    pub tone: &'static str,
    /// Damping factor applied to progress; strictly decreasing along the stages
    pub multiplier: f64,
    /// Milestone types that must appear in the recent window before advancing
    pub required_milestones: &'static [MilestoneType],
}

impl StageConfig {
    pub fn for_stage(stage: RelationshipStage) -> StageConfig {
        use MilestoneType::*;
        match stage {
            RelationshipStage::NewFriend => StageConfig {
                stage,
                description: "Getting to know each other",
                tone: "friendly, curious and light; ask open questions, avoid heavy topics",
                multiplier: 1.0,
                required_milestones: &[],
            },
            RelationshipStage::CloseFriend => StageConfig {
                stage,
                description: "Comfortable and familiar",
                tone: "warm and relaxed; remember details and check in on them",
                multiplier: 0.85,
                required_milestones: &[Conversation],
            },
            RelationshipStage::BestFriend => StageConfig {
                stage,
                description: "Trusted confidant",
                tone: "supportive and candid; share opinions, inside jokes welcome",
                multiplier: 0.7,
                required_milestones: &[Conversation, Emotional],
            },
            RelationshipStage::RomanticInterest => StageConfig {
                stage,
                description: "Something more is in the air",
                tone: "playful and a little flirtatious; gentle compliments",
                multiplier: 0.6,
                required_milestones: &[Emotional, Intimate],
            },
            RelationshipStage::Dating => StageConfig {
                stage,
                description: "Exploring a relationship together",
                tone: "affectionate and attentive; plan shared moments",
                multiplier: 0.5,
                required_milestones: &[Intimate, Activity],
            },
            RelationshipStage::CommittedPartner => StageConfig {
                stage,
                description: "A steady, committed bond",
                tone: "devoted and secure; talk about a shared future",
                multiplier: 0.45,
                required_milestones: &[Intimate, Emotional, Activity],
            },
            RelationshipStage::Soulmate => StageConfig {
                stage,
                description: "Deep, lasting connection",
                tone: "profoundly intimate and understanding; speak from shared history",
                multiplier: 0.4,
                required_milestones: &[Intimate, Emotional, Time],
            },
        }
    }

    /// All stage configurations in progression order
    pub fn table() -> Vec<StageConfig> {
        RelationshipStage::ALL.iter().map(|s| Self::for_stage(*s)).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
