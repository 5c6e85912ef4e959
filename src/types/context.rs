//! Relationship context, behavioral aggregates and message history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::{RelationshipStage, ValidationError, check_non_negative, check_range};

/// Per user–companion context, read each time progress is computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipContext {
    /// Unknown stage names deserialize to `NewFriend`
    pub current_stage: RelationshipStage,
    /// When the current stage began; `None` when the host never recorded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_start_date: Option<DateTime<Utc>>,
    pub total_messages: u32,
    /// Conversations per day (>= 0)
    pub conversation_frequency: f64,
    /// 0-100
    pub personality_compatibility: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_personality: Option<BehaviorHistory>,
}

impl Default for RelationshipContext {
    fn default() -> Self {
        Self {
            current_stage: RelationshipStage::NewFriend,
            stage_start_date: Some(Utc::now()),
            total_messages: 0,
            conversation_frequency: 0.0,
            personality_compatibility: 0.0,
            user_personality: None,
        }
    }
}

impl RelationshipContext {
    /// Fresh context at the given stage
    pub fn at_stage(stage: RelationshipStage) -> Self {
        Self {
            current_stage: stage,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_negative("conversation_frequency", self.conversation_frequency)?;
        check_range("personality_compatibility", self.personality_compatibility, 0.0, 100.0)?;
        if let Some(ref personality) = self.user_personality {
            personality.validate()?;
        }
        Ok(())
    }
}

/// Behavioral aggregates used for the personalized progression rate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorHistory {
    /// Mean user message length in characters
    pub average_message_length: f64,
    /// 0.0-1.0
    pub emotional_openness: f64,
    /// Share of conversations the user started, 0.0-1.0
    pub initiation_ratio: f64,
    /// Mean seconds before the user replies
    pub average_response_secs: f64,
}

impl BehaviorHistory {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_negative("average_message_length", self.average_message_length)?;
        check_range("emotional_openness", self.emotional_openness, 0.0, 1.0)?;
        check_range("initiation_ratio", self.initiation_ratio, 0.0, 1.0)?;
        check_non_negative("average_response_secs", self.average_response_secs)?;
        Ok(())
    }
}

/// One message from the stored chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryMessage {
    pub fn new(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_unknown_stage_deserializes() {
        let ctx: RelationshipContext = serde_json::from_str(
            r#"{"current_stage": "Acquaintance", "personality_compatibility": 40}"#,
        )
        .unwrap();
        assert_eq!(ctx.current_stage, RelationshipStage::NewFriend);
        assert_eq!(ctx.personality_compatibility, 40.0);
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn test_missing_stage_start_is_unknown() {
        let ctx: RelationshipContext =
            serde_json::from_str(r#"{"current_stage": "Close Friend"}"#).unwrap();
        assert_eq!(ctx.stage_start_date, None);
        assert!(RelationshipContext::default().stage_start_date.is_some());
    }

    #[test]
    fn test_context_validation() {
        let ctx = RelationshipContext {
            personality_compatibility: 140.0,
            ..RelationshipContext::default()
        };
        assert!(matches!(ctx.validate(), Err(ValidationError::OutOfRange { .. })));

        let ctx = RelationshipContext {
            conversation_frequency: f64::NAN,
            ..RelationshipContext::default()
        };
        assert!(matches!(ctx.validate(), Err(ValidationError::NonFinite { .. })));
    }

    #[test]
    fn test_behavior_validation() {
        let behavior = BehaviorHistory { emotional_openness: 1.5, ..BehaviorHistory::default() };
        assert!(behavior.validate().is_err());
        assert!(BehaviorHistory::default().validate().is_ok());
    }
}
