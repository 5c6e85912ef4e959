//! Milestone events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::types::RelationshipStage;

/// Category of a milestone; the stage gate requires a mix of these
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneType {
    Conversation,
    Emotional,
    Intimate,
    Activity,
    Time,
}

impl MilestoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Emotional => "emotional",
            Self::Intimate => "intimate",
            Self::Activity => "activity",
            Self::Time => "time",
        }
    }
}

impl std::fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only milestone log entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    /// UUID v4, unique per emission
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: MilestoneType,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_unlocked: Option<RelationshipStage>,
    pub progress_bonus: u32,
}

impl MilestoneEvent {
    pub fn new(
        kind: MilestoneType,
        title: impl Into<String>,
        description: impl Into<String>,
        progress_bonus: u32,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            description: description.into(),
            date,
            stage_unlocked: None,
            progress_bonus,
        }
    }

    pub fn with_stage_unlocked(mut self, stage: Option<RelationshipStage>) -> Self {
        self.stage_unlocked = stage;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_within_same_instant() {
        let now = Utc::now();
        let a = MilestoneEvent::new(MilestoneType::Emotional, "A", "", 5, now);
        let b = MilestoneEvent::new(MilestoneType::Emotional, "A", "", 5, now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let event = MilestoneEvent::new(MilestoneType::Time, "One Week Together", "", 15, Utc::now());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "time");
        assert!(json.get("stage_unlocked").is_none());
    }
}
