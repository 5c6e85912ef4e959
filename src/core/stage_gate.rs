//! Stage Gate: readiness verdicts over the 7-stage ladder
//!
//! Transitions are one-directional and strictly sequential:
//! - NewFriend → CloseFriend → BestFriend → RomanticInterest → Dating → CommittedPartner → Soulmate
//! - Ready: progress ≥ threshold AND every required milestone type present in the window
//! - Soulmate is terminal; advancing from it is a no-op

use serde::{Deserialize, Serialize};
use crate::STAGE_PROGRESS_THRESHOLD;
use crate::types::{
    GateReason, MilestoneEvent, MilestoneType, RelationshipContext, RelationshipState,
    StageConfig, StageReadiness,
};

/// Which part of the milestone log counts as "recent"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneWindow {
    /// Everything ever recorded
    All,
    /// Milestones dated at or after the current stage began; everything when
    /// the start is unknown
    #[default]
    SinceStageStart,
    /// The last n entries of the log
    Last(usize),
}

impl MilestoneWindow {
    /// Milestones inside the window, in log order
    pub fn select<'a>(&self, state: &'a RelationshipState) -> Vec<&'a MilestoneEvent> {
        let log = &state.milestones;
        match *self {
            MilestoneWindow::All => log.iter().collect(),
            MilestoneWindow::SinceStageStart => log
                .iter()
                .filter(|m| match state.context.stage_start_date {
                    Some(start) => m.date >= start,
                    None => true,
                })
                .collect(),
            MilestoneWindow::Last(n) => log[log.len().saturating_sub(n)..].iter().collect(),
        }
    }
}

/// Stage gate
#[derive(Debug, Clone)]
pub struct StageGate {
    progress_threshold: u32,
}

impl Default for StageGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StageGate {
    pub fn new() -> Self {
        Self {
            progress_threshold: STAGE_PROGRESS_THRESHOLD,
        }
    }

    pub fn with_threshold(progress_threshold: u32) -> Self {
        Self { progress_threshold }
    }

    pub fn progress_threshold(&self) -> u32 {
        self.progress_threshold
    }

    /// Readiness of `context.current_stage` given a caller-chosen milestone window
    pub fn calculate_stage_readiness<'a, I>(
        &self,
        current_progress: u32,
        context: &RelationshipContext,
        recent_milestones: I,
    ) -> StageReadiness
    where
        I: IntoIterator<Item = &'a MilestoneEvent>,
    {
        let stage = context.current_stage;
        let required = StageConfig::for_stage(stage).required_milestones;
        let seen: Vec<MilestoneType> = recent_milestones.into_iter().map(|m| m.kind).collect();

        let missing: Vec<MilestoneType> = required
            .iter()
            .copied()
            .filter(|kind| !seen.contains(kind))
            .collect();

        let enough_progress = current_progress >= self.progress_threshold;
        let is_ready = enough_progress && missing.is_empty();
        let next_stage = stage.next();

        let reason = if !enough_progress {
            GateReason::G002_INSUFFICIENT_PROGRESS
        } else if !missing.is_empty() {
            GateReason::G003_MISSING_MILESTONES
        } else if next_stage.is_none() {
            GateReason::G004_TERMINAL_STAGE
        } else {
            GateReason::G001_READY
        };

        tracing::debug!(
            stage = %stage,
            progress = current_progress,
            missing = missing.len(),
            reason = reason.code(),
            "stage readiness"
        );

        StageReadiness {
            is_ready,
            current_stage: stage,
            next_stage,
            current_progress,
            required_milestone_types: required.to_vec(),
            missing_requirement_types: missing,
            reason,
        }
    }

    /// Apply a readiness verdict: reset progress, move to the next stage, restart the stage clock.
    /// Returns false (state untouched) when the verdict does not allow advancing.
    pub fn advance(&self, state: &mut RelationshipState, readiness: &StageReadiness) -> bool {
        if readiness.current_stage != state.context.current_stage {
            return false;
        }
        let Some(next) = readiness.next_stage.filter(|_| readiness.is_ready) else {
            return false;
        };

        tracing::info!(from = %state.context.current_stage, to = %next, "stage advanced");
        state.context.current_stage = next;
        state.context.stage_start_date = Some(chrono::Utc::now());
        state.progress = 0;
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::types::RelationshipStage;

    const NO_MILESTONES: &[MilestoneEvent] = &[];

    fn milestone(kind: MilestoneType) -> MilestoneEvent {
        MilestoneEvent::new(kind, "m", "", 5, Utc::now())
    }

    #[test]
    fn test_new_friend_needs_only_progress() {
        let gate = StageGate::new();
        let ctx = RelationshipContext::default();
        let readiness = gate.calculate_stage_readiness(100, &ctx, NO_MILESTONES);
        assert!(readiness.is_ready);
        assert_eq!(readiness.reason, GateReason::G001_READY);
        assert_eq!(readiness.next_stage, Some(RelationshipStage::CloseFriend));
        assert!(readiness.required_milestone_types.is_empty());
    }

    #[test]
    fn test_insufficient_progress() {
        let gate = StageGate::new();
        let ctx = RelationshipContext::default();
        let readiness = gate.calculate_stage_readiness(99, &ctx, NO_MILESTONES);
        assert!(!readiness.is_ready);
        assert_eq!(readiness.reason, GateReason::G002_INSUFFICIENT_PROGRESS);
    }

    #[test]
    fn test_soulmate_missing_time() {
        let gate = StageGate::new();
        let ctx = RelationshipContext::at_stage(RelationshipStage::Soulmate);
        let milestones = vec![milestone(MilestoneType::Intimate), milestone(MilestoneType::Emotional)];
        let readiness = gate.calculate_stage_readiness(100, &ctx, &milestones);
        assert!(!readiness.is_ready);
        assert_eq!(readiness.missing_requirement_types, vec![MilestoneType::Time]);
        assert_eq!(readiness.reason, GateReason::G003_MISSING_MILESTONES);
    }

    #[test]
    fn test_soulmate_complete_is_terminal() {
        let gate = StageGate::new();
        let ctx = RelationshipContext::at_stage(RelationshipStage::Soulmate);
        let milestones = vec![
            milestone(MilestoneType::Intimate),
            milestone(MilestoneType::Emotional),
            milestone(MilestoneType::Time),
        ];
        let readiness = gate.calculate_stage_readiness(100, &ctx, &milestones);
        assert!(readiness.is_ready);
        assert!(!readiness.can_advance());
        assert_eq!(readiness.reason, GateReason::G004_TERMINAL_STAGE);
    }

    #[test]
    fn test_missing_in_table_order() {
        let gate = StageGate::new();
        let ctx = RelationshipContext::at_stage(RelationshipStage::CommittedPartner);
        let readiness = gate.calculate_stage_readiness(100, &ctx, NO_MILESTONES);
        assert_eq!(
            readiness.missing_requirement_types,
            vec![MilestoneType::Intimate, MilestoneType::Emotional, MilestoneType::Activity]
        );
    }

    #[test]
    fn test_advance_resets_progress() {
        let gate = StageGate::new();
        let mut state = RelationshipState::new(RelationshipContext::default());
        state.progress = 100;
        let readiness = gate.calculate_stage_readiness(state.progress, &state.context, &state.milestones);
        assert!(gate.advance(&mut state, &readiness));
        assert_eq!(state.stage(), RelationshipStage::CloseFriend);
        assert_eq!(state.progress, 0);
    }

    #[test]
    fn test_advance_refuses_when_not_ready() {
        let gate = StageGate::new();
        let mut state = RelationshipState::new(RelationshipContext::default());
        state.progress = 40;
        let readiness = gate.calculate_stage_readiness(state.progress, &state.context, &state.milestones);
        assert!(!gate.advance(&mut state, &readiness));
        assert_eq!(state.progress, 40);
        assert_eq!(state.stage(), RelationshipStage::NewFriend);
    }

    #[test]
    fn test_custom_threshold() {
        let gate = StageGate::with_threshold(50);
        let readiness = gate.calculate_stage_readiness(50, &RelationshipContext::default(), NO_MILESTONES);
        assert!(readiness.is_ready);
    }

    #[test]
    fn test_window_selection() {
        let now = Utc::now();
        let mut state = RelationshipState::new(RelationshipContext {
            stage_start_date: Some(now - Duration::days(1)),
            ..RelationshipContext::default()
        });
        state.milestones = vec![
            MilestoneEvent::new(MilestoneType::Time, "old", "", 1, now - Duration::days(10)),
            MilestoneEvent::new(MilestoneType::Emotional, "new", "", 1, now),
            MilestoneEvent::new(MilestoneType::Intimate, "newer", "", 1, now),
        ];

        assert_eq!(MilestoneWindow::All.select(&state).len(), 3);
        let since: Vec<&str> = MilestoneWindow::SinceStageStart
            .select(&state)
            .iter()
            .map(|m| m.title.as_str())
            .collect();
        assert_eq!(since, vec!["new", "newer"]);
        assert_eq!(MilestoneWindow::Last(1).select(&state)[0].title, "newer");
        assert_eq!(MilestoneWindow::Last(10).select(&state).len(), 3);

        state.context.stage_start_date = None;
        assert_eq!(MilestoneWindow::SinceStageStart.select(&state).len(), 3);
    }
}
