//! Progression Calculator: metrics + context → bounded progress award
//!
//! increase = round(base × quality × stage × personalized
//!                  + compatibility × w_c + min(frequency × w_f, cap)), clamped to 0..=20

use crate::config::ProgressionConfig;
use crate::{METRIC_MAX, QUALITY_MIN, QUALITY_MAX};
use crate::types::{
    BehaviorHistory, ConversationMetrics, RelationshipContext, RelationshipStage,
    StageConfig, ValidationError,
};

/// Progression calculator
#[derive(Debug, Clone, Default)]
pub struct ProgressionCalculator {
    config: ProgressionConfig,
}

impl ProgressionCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProgressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Progress awarded for one turn
    ///
    /// `behavior` drives the personalized rate; absent means a rate of 1.0.
    pub fn calculate_progress_increase(
        &self,
        metrics: &ConversationMetrics,
        context: &RelationshipContext,
        behavior: Option<&BehaviorHistory>,
    ) -> Result<u32, ValidationError> {
        metrics.validate()?;
        context.validate()?;
        if let Some(b) = behavior {
            b.validate()?;
        }

        let quality = self.quality_multiplier(metrics);
        let stage = stage_multiplier(context.current_stage);
        let rate = personalized_rate(behavior, context);
        let compatibility_bonus = context.personality_compatibility * self.config.compatibility_weight;
        let frequency_bonus = (context.conversation_frequency * self.config.frequency_weight)
            .min(self.config.frequency_cap);

        let raw = self.config.base_progress * quality * stage * rate
            + compatibility_bonus
            + frequency_bonus;
        let increase = raw.round().clamp(0.0, self.config.max_increase as f64) as u32;

        tracing::debug!(
            quality,
            stage,
            rate,
            compatibility_bonus,
            frequency_bonus,
            increase,
            "progress increase"
        );
        Ok(increase)
    }

    /// Weighted metric sum mapped onto 0.5-3.5, +bonus for exceptional turns
    pub fn quality_multiplier(&self, metrics: &ConversationMetrics) -> f64 {
        let normalized = QUALITY_MIN + (metrics.weighted_sum() / METRIC_MAX) * (QUALITY_MAX - QUALITY_MIN);
        let mut multiplier = normalized.clamp(QUALITY_MIN, QUALITY_MAX);
        if metrics.average() > self.config.exceptional_threshold {
            multiplier += self.config.exceptional_bonus;
        }
        multiplier
    }
}

/// Fixed per-stage damping, 1.0 (New Friend) down to 0.4 (Soulmate)
pub fn stage_multiplier(stage: RelationshipStage) -> f64 {
    StageConfig::for_stage(stage).multiplier
}

/// Rate >= 1.0 built from behavioral aggregates, then scaled per stage
pub fn personalized_rate(behavior: Option<&BehaviorHistory>, context: &RelationshipContext) -> f64 {
    let Some(b) = behavior else {
        return 1.0;
    };

    let mut rate = 1.0;

    if b.average_message_length > 200.0 {
        rate += 0.2;
    } else if b.average_message_length > 100.0 {
        rate += 0.1;
    }

    if b.emotional_openness > 0.7 {
        rate += 0.3;
    } else if b.emotional_openness > 0.4 {
        rate += 0.15;
    }

    if b.initiation_ratio > 0.5 {
        rate += 0.2;
    } else if b.initiation_ratio > 0.3 {
        rate += 0.1;
    }

    // 0 means "unknown", not instant
    if b.average_response_secs > 0.0 && b.average_response_secs < 60.0 {
        rate += 0.1;
    }

    rate * stage_adjustment(b, context)
}

/// What each stage rewards beyond the general rate
fn stage_adjustment(b: &BehaviorHistory, context: &RelationshipContext) -> f64 {
    let rewarded = match context.current_stage {
        RelationshipStage::NewFriend => (b.average_message_length > 50.0, 1.1),
        RelationshipStage::CloseFriend => (b.emotional_openness > 0.5, 1.1),
        RelationshipStage::BestFriend => (b.initiation_ratio > 0.4, 1.15),
        RelationshipStage::RomanticInterest => (context.personality_compatibility > 70.0, 1.2),
        RelationshipStage::Dating => (b.emotional_openness > 0.6, 1.1),
        RelationshipStage::CommittedPartner => (context.total_messages > 500, 1.1),
        RelationshipStage::Soulmate => (context.personality_compatibility > 85.0, 1.05),
    };
    match rewarded {
        (true, factor) => factor,
        (false, _) => 1.0,
    }
}

// =============================================================================
// TESTS
// =============================================================================
