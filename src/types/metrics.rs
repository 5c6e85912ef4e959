//! Per-turn conversation metrics

use serde::{Deserialize, Serialize};
use crate::{
    Q_WEIGHT_LENGTH, Q_WEIGHT_EMOTIONAL, Q_WEIGHT_SHARING, Q_WEIGHT_EMPATHY,
    Q_WEIGHT_HUMOR, Q_WEIGHT_INTIMACY, Q_WEIGHT_FLOW, Q_WEIGHT_DEPTH,
    Q_WEIGHT_RECIPROCITY,
};
use crate::types::{ValidationError, check_non_negative};

/// Multi-dimensional score for one user message + companion reply
///
/// Recomputed every turn, never persisted as-is. Detector outputs are in 0-10.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationMetrics {
    /// Bucketed mean message length (1, 2, 3 or 5)
    pub message_length: f64,
    /// Emotional vocabulary across both messages
    pub emotional_words: f64,
    /// Depth-weighted self-disclosure in the user message
    pub personal_sharing: f64,
    /// Empathy and validation in the companion reply
    pub empathy: f64,
    pub humor: f64,
    pub intimacy: f64,
    /// History-driven extension point (placeholder strategy returns 1)
    pub consistency: f64,
    /// History-driven extension point (placeholder strategy returns 1)
    pub time_spent: f64,
    pub conversation_flow: f64,
    pub emotional_depth: f64,
    pub reciprocity: f64,
}

impl ConversationMetrics {
    /// Create zero metrics
    pub fn zero() -> Self {
        Self::default()
    }

    /// The nine scores that feed the quality multiplier, paired with their weights
    pub fn quality_inputs(&self) -> [(f64, f64); 9] {
        [
            (self.message_length, Q_WEIGHT_LENGTH),
            (self.emotional_words, Q_WEIGHT_EMOTIONAL),
            (self.personal_sharing, Q_WEIGHT_SHARING),
            (self.empathy, Q_WEIGHT_EMPATHY),
            (self.humor, Q_WEIGHT_HUMOR),
            (self.intimacy, Q_WEIGHT_INTIMACY),
            (self.conversation_flow, Q_WEIGHT_FLOW),
            (self.emotional_depth, Q_WEIGHT_DEPTH),
            (self.reciprocity, Q_WEIGHT_RECIPROCITY),
        ]
    }

    /// Weighted sum of the quality inputs
    pub fn weighted_sum(&self) -> f64 {
        self.quality_inputs().iter().map(|(value, weight)| value * weight).sum()
    }

    /// Unweighted mean of the quality inputs
    pub fn average(&self) -> f64 {
        let inputs = self.quality_inputs();
        inputs.iter().map(|(value, _)| value).sum::<f64>() / inputs.len() as f64
    }

    /// Reject NaN, infinities and negatives
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("message_length", self.message_length),
            ("emotional_words", self.emotional_words),
            ("personal_sharing", self.personal_sharing),
            ("empathy", self.empathy),
            ("humor", self.humor),
            ("intimacy", self.intimacy),
            ("consistency", self.consistency),
            ("time_spent", self.time_spent),
            ("conversation_flow", self.conversation_flow),
            ("emotional_depth", self.emotional_depth),
            ("reciprocity", self.reciprocity),
        ];
        for (field, value) in fields {
            check_non_negative(field, value)?;
        }
        Ok(())
    }
}
