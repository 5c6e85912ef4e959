//! Relationship engine: one call per chat turn, one call per advancement request
//!
//! Pipeline per turn:
//! analyze → progress increase → total_messages += 1 → milestones (one-time rules
//! deduplicated against the log) → progress += increase + bonuses (capped) → readiness preview
//!
//! The engine owns no relationship data. Callers pass their `RelationshipState`
//! in and persist it afterwards.

use chrono::{DateTime, Utc};
use crate::PROGRESS_CAP;
use crate::config::EngineConfig;
use crate::core::{
    ConversationAnalyzer, MilestoneDetector, MilestoneWindow, ProgressionCalculator, StageGate,
};
use crate::types::{Advancement, RelationshipState, Result, StageReadiness, TurnInput, TurnOutcome};

/// Relationship engine
#[derive(Debug, Clone, Default)]
pub struct RelationshipEngine {
    analyzer: ConversationAnalyzer,
    calculator: ProgressionCalculator,
    detector: MilestoneDetector,
    gate: StageGate,
    window: MilestoneWindow,
}

impl RelationshipEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            analyzer: ConversationAnalyzer::new(),
            calculator: ProgressionCalculator::with_config(config.progression.clone()),
            detector: MilestoneDetector::new(),
            gate: StageGate::with_threshold(config.gate.progress_threshold),
            window: config.gate.window,
        }
    }

    /// Swap in an analyzer with custom history signals
    pub fn with_analyzer(mut self, analyzer: ConversationAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn analyzer(&self) -> &ConversationAnalyzer {
        &self.analyzer
    }

    pub fn calculator(&self) -> &ProgressionCalculator {
        &self.calculator
    }

    pub fn detector(&self) -> &MilestoneDetector {
        &self.detector
    }

    pub fn gate(&self) -> &StageGate {
        &self.gate
    }

    pub fn window(&self) -> MilestoneWindow {
        self.window
    }

    /// Score one turn and fold it into `state`
    ///
    /// On a validation error `state` is left untouched.
    pub fn process_turn(&self, state: &mut RelationshipState, turn: &TurnInput) -> Result<TurnOutcome> {
        self.process_turn_at(state, turn, Utc::now())
    }

    /// Like `process_turn`, with an explicit clock for milestone dates and streaks
    pub fn process_turn_at(
        &self,
        state: &mut RelationshipState,
        turn: &TurnInput,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome> {
        let metrics = self.analyzer.analyze(&turn.user_message, &turn.bot_response);
        let behavior = turn.behavior.as_ref().or(state.context.user_personality.as_ref());

        let progress_increase = self
            .calculator
            .calculate_progress_increase(&metrics, &state.context, behavior)
            .map_err(|e| {
                tracing::warn!(error = %e, "turn rejected");
                e
            })?;

        // The count includes this turn, so "50 Messages" lands on the 50th
        state.context.total_messages = state.context.total_messages.saturating_add(1);

        let milestones = self.detector.check_for_new_milestones(
            &metrics,
            &state.context,
            &turn.history,
            &turn.user_message,
            &state.milestones,
            now,
        );
        let milestone_bonus: u32 = milestones.iter().map(|m| m.progress_bonus).sum();

        state.progress = state
            .progress
            .saturating_add(progress_increase)
            .saturating_add(milestone_bonus)
            .min(PROGRESS_CAP);
        state.milestones.extend(milestones.iter().cloned());

        let readiness = self.readiness(state);

        tracing::info!(
            stage = %state.context.current_stage,
            increase = progress_increase,
            bonus = milestone_bonus,
            progress = state.progress,
            milestones = milestones.len(),
            "turn processed"
        );

        Ok(TurnOutcome {
            timestamp: now,
            stage: state.context.current_stage,
            metrics,
            progress_increase,
            milestones,
            milestone_bonus,
            progress: state.progress,
            readiness,
        })
    }

    /// Readiness of the current stage over the configured milestone window
    pub fn readiness(&self, state: &RelationshipState) -> StageReadiness {
        let recent = self.window.select(state);
        self.gate
            .calculate_stage_readiness(state.progress, &state.context, recent)
    }

    /// User asked to move on: advance when the gate allows it, otherwise leave `state` alone
    pub fn request_advancement(&self, state: &mut RelationshipState) -> Advancement {
        let from = state.context.current_stage;
        let readiness = self.readiness(state);
        let advanced = self.gate.advance(state, &readiness);

        if !advanced {
            tracing::info!(stage = %from, reason = readiness.reason.code(), "advancement refused");
        }

        Advancement {
            advanced,
            from,
            to: state.context.current_stage,
            readiness,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        GateReason, MilestoneEvent, MilestoneType, RelationshipContext, RelationshipStage,
    };

    const DISCLOSURE: &str = "I've never told anyone this, but I feel really scared about my future.";
    const SUPPORT: &str =
        "I understand, and I want you to know you're not alone — that took real courage to share.";

    #[test]
    fn test_turn_accumulates_progress() {
        let engine = RelationshipEngine::new();
        let mut state = RelationshipState::default();
        let outcome = engine.process_turn(&mut state, &TurnInput::new(DISCLOSURE, SUPPORT)).unwrap();

        assert!(outcome.progress_increase > 0);
        assert!(outcome.milestones.iter().any(|m| m.title == "First Deep Conversation"));
        assert_eq!(outcome.progress, outcome.progress_increase + outcome.milestone_bonus);
        assert_eq!(state.progress, outcome.progress);
        assert_eq!(state.context.total_messages, 1);
        assert_eq!(state.milestones.len(), outcome.milestones.len());
    }

    #[test]
    fn test_progress_capped() {
        let engine = RelationshipEngine::new();
        let mut state = RelationshipState { progress: 95, ..RelationshipState::default() };
        engine.process_turn(&mut state, &TurnInput::new(DISCLOSURE, SUPPORT)).unwrap();
        assert_eq!(state.progress, 100);
    }

    #[test]
    fn test_invalid_context_leaves_state_untouched() {
        let engine = RelationshipEngine::new();
        let mut state = RelationshipState::default();
        state.context.conversation_frequency = f64::NAN;
        let before = state.progress;
        assert!(engine.process_turn(&mut state, &TurnInput::new("hi", "hello")).is_err());
        assert_eq!(state.progress, before);
        assert_eq!(state.context.total_messages, 0);
    }

    #[test]
    fn test_one_time_milestone_not_repeated() {
        let engine = RelationshipEngine::new();
        let mut state = RelationshipState::default();
        state.context.total_messages = 49;

        let first = engine.process_turn(&mut state, &TurnInput::new("ok", "ok")).unwrap();
        assert_eq!(state.context.total_messages, 50);
        assert!(first.milestones.iter().any(|m| m.title == "50 Messages"));

        let second = engine.process_turn(&mut state, &TurnInput::new("ok", "ok")).unwrap();
        assert!(second.milestones.iter().all(|m| m.title != "50 Messages"));
    }

    #[test]
    fn test_message_count_includes_current_turn() {
        let engine = RelationshipEngine::new();
        let mut state = RelationshipState::default();
        state.context.total_messages = 48;

        let forty_ninth = engine.process_turn(&mut state, &TurnInput::new("ok", "ok")).unwrap();
        assert!(forty_ninth.milestones.is_empty());

        let fiftieth = engine.process_turn(&mut state, &TurnInput::new("ok", "ok")).unwrap();
        let titles: Vec<&str> = fiftieth.milestones.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["50 Messages"]);
    }

    #[test]
    fn test_plans_in_current_message() {
        let engine = RelationshipEngine::new();
        let mut state = RelationshipState::new(RelationshipContext::at_stage(RelationshipStage::CloseFriend));
        let turn = TurnInput::new(
            "I feel like my family would enjoy it if we had a movie night together, I think it could be fun",
            "I'd love that!",
        );

        let outcome = engine.process_turn(&mut state, &turn).unwrap();
        assert!(outcome.milestones.iter().any(|m| m.title == "Making Plans"));
    }

    #[test]
    fn test_advancement_flow() {
        let engine = RelationshipEngine::new();
        let mut state = RelationshipState { progress: 100, ..RelationshipState::default() };

        let advancement = engine.request_advancement(&mut state);
        assert!(advancement.advanced);
        assert_eq!(advancement.from, RelationshipStage::NewFriend);
        assert_eq!(advancement.to, RelationshipStage::CloseFriend);
        assert_eq!(state.progress, 0);

        // CloseFriend needs a conversation milestone from the new stage
        state.progress = 100;
        let refused = engine.request_advancement(&mut state);
        assert!(!refused.advanced);
        assert_eq!(refused.readiness.reason, GateReason::G003_MISSING_MILESTONES);
        assert_eq!(state.stage(), RelationshipStage::CloseFriend);
    }

    #[test]
    fn test_soulmate_advancement_is_noop() {
        let engine = RelationshipEngine::from_config(&EngineConfig::default());
        let mut state = RelationshipState::new(RelationshipContext::at_stage(RelationshipStage::Soulmate));
        state.progress = 100;
        let now = Utc::now();
        for kind in [MilestoneType::Intimate, MilestoneType::Emotional, MilestoneType::Time] {
            state.milestones.push(MilestoneEvent::new(kind, "m", "", 1, now));
        }

        let advancement = engine.request_advancement(&mut state);
        assert!(!advancement.advanced);
        assert_eq!(advancement.readiness.reason, GateReason::G004_TERMINAL_STAGE);
        assert_eq!(state.progress, 100);
        assert_eq!(state.stage(), RelationshipStage::Soulmate);
    }
}
