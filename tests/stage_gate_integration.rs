//! Integration tests for the stage gate
//!
//! Tests the path: progress + context + milestone window → StageGate → readiness → advance

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use rapport::core::{MilestoneWindow, StageGate};
use rapport::types::{
    GateReason, MilestoneEvent, MilestoneType, RelationshipContext, RelationshipStage,
    RelationshipState, StageConfig,
};

fn event(kind: MilestoneType) -> MilestoneEvent {
    MilestoneEvent::new(kind, format!("{} milestone", kind), "", 5, Utc::now())
}

/// Soulmate with intimate + emotional but no time milestone
#[test]
fn test_soulmate_missing_time() {
    let ctx = RelationshipContext::at_stage(RelationshipStage::Soulmate);
    let milestones = vec![event(MilestoneType::Intimate), event(MilestoneType::Emotional)];
    let readiness = StageGate::new().calculate_stage_readiness(100, &ctx, &milestones);

    assert!(!readiness.is_ready);
    assert_eq!(readiness.missing_requirement_types, vec![MilestoneType::Time]);
    assert_eq!(
        readiness.required_milestone_types,
        vec![MilestoneType::Intimate, MilestoneType::Emotional, MilestoneType::Time]
    );
}

/// Below the threshold nothing else matters
#[test]
fn test_progress_required_for_every_stage() {
    let gate = StageGate::new();
    let every_type: Vec<MilestoneEvent> = [
        MilestoneType::Conversation,
        MilestoneType::Emotional,
        MilestoneType::Intimate,
        MilestoneType::Activity,
        MilestoneType::Time,
    ]
    .into_iter()
    .map(event)
    .collect();

    for stage in RelationshipStage::ALL {
        let ctx = RelationshipContext::at_stage(stage);
        let readiness = gate.calculate_stage_readiness(99, &ctx, &every_type);
        assert!(!readiness.is_ready, "{}", stage);
        assert_eq!(readiness.reason, GateReason::G002_INSUFFICIENT_PROGRESS);
        assert!(readiness.missing_requirement_types.is_empty());
    }
}

/// Required type lists grow toward Soulmate
#[test]
fn test_required_types_table() {
    let counts: Vec<usize> = StageConfig::table()
        .iter()
        .map(|c| c.required_milestones.len())
        .collect();
    assert_eq!(counts, vec![0, 1, 2, 2, 2, 3, 3]);
}

/// Walk the whole ladder with satisfied requirements
#[test]
fn test_full_ladder() {
    let gate = StageGate::new();
    let mut state = RelationshipState::default();

    while let Some(next) = state.stage().next() {
        state.progress = 100;
        let window: Vec<MilestoneEvent> = state
            .stage()
            .config()
            .required_milestones
            .iter()
            .copied()
            .map(event)
            .collect();
        let readiness = gate.calculate_stage_readiness(state.progress, &state.context, &window);
        assert_eq!(readiness.reason, GateReason::G001_READY);
        assert!(gate.advance(&mut state, &readiness));
        assert_eq!(state.stage(), next);
        assert_eq!(state.progress, 0);
    }

    assert_eq!(state.stage(), RelationshipStage::Soulmate);
    assert!(state.stage().is_terminal());
}

/// Stale verdicts are not applied to a different stage
#[test]
fn test_stale_readiness_rejected() {
    let gate = StageGate::new();
    let mut state = RelationshipState { progress: 100, ..RelationshipState::default() };
    let readiness = gate.calculate_stage_readiness(100, &state.context, &state.milestones);
    assert!(gate.advance(&mut state, &readiness));

    state.progress = 100;
    assert!(!gate.advance(&mut state, &readiness));
    assert_eq!(state.stage(), RelationshipStage::CloseFriend);
}

/// The recency window decides which milestones the gate sees
#[test]
fn test_window_changes_verdict() {
    let now = Utc::now();
    let mut state = RelationshipState::new(RelationshipContext {
        current_stage: RelationshipStage::CloseFriend,
        stage_start_date: Some(now - Duration::days(2)),
        ..RelationshipContext::default()
    });
    state.progress = 100;
    state.milestones.push(MilestoneEvent::new(
        MilestoneType::Conversation,
        "Shared Laughter",
        "",
        5,
        now - Duration::days(5),
    ));

    let gate = StageGate::new();
    let since = gate.calculate_stage_readiness(
        state.progress,
        &state.context,
        MilestoneWindow::SinceStageStart.select(&state),
    );
    assert!(!since.is_ready);

    let all = gate.calculate_stage_readiness(state.progress, &state.context, MilestoneWindow::All.select(&state));
    assert!(all.is_ready);
}
