//! Caller-owned relationship state and per-call outputs

use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use crate::types::{
    BehaviorHistory, ConversationMetrics, HistoryMessage, MilestoneEvent,
    RelationshipContext, RelationshipStage, StageReadiness,
};

/// Everything the host persists per user–companion pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipState {
    pub context: RelationshipContext,
    /// 0-100 accumulator within the current stage
    pub progress: u32,
    /// Append-only milestone log
    pub milestones: Vec<MilestoneEvent>,
}

impl RelationshipState {
    pub fn new(context: RelationshipContext) -> Self {
        Self {
            context,
            progress: 0,
            milestones: Vec::new(),
        }
    }

    pub fn stage(&self) -> RelationshipStage {
        self.context.current_stage
    }

    /// Has a milestone with this title ever been recorded?
    pub fn has_milestone(&self, title: &str) -> bool {
        self.milestones.iter().any(|m| m.title == title)
    }
}

/// One chat exchange plus the optional inputs used alongside it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnInput {
    pub user_message: String,
    pub bot_response: String,
    /// Prior messages, used for day-bucketing only
    pub history: Vec<HistoryMessage>,
    /// Overrides `context.user_personality` when present
    pub behavior: Option<BehaviorHistory>,
}

impl TurnInput {
    pub fn new(user_message: impl Into<String>, bot_response: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            bot_response: bot_response.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorHistory) -> Self {
        self.behavior = Some(behavior);
        self
    }
}

/// Result of processing one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub timestamp: DateTime<Utc>,
    pub stage: RelationshipStage,
    pub metrics: ConversationMetrics,
    /// Formula award for this turn, 0-20
    pub progress_increase: u32,
    /// Milestones recorded this turn
    pub milestones: Vec<MilestoneEvent>,
    pub milestone_bonus: u32,
    /// Progress after applying increase and bonuses, capped at 100
    pub progress: u32,
    pub readiness: StageReadiness,
}

impl TurnOutcome {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = stage_color(self.stage);
        let mut line = format!(
            "{} {} | +{} (+{} bonus) | progress={}/100 | {}",
            stage_emoji(self.stage),
            self.stage,
            self.progress_increase,
            self.milestone_bonus,
            self.progress,
            self.readiness.reason.code(),
        )
        .color(color)
        .to_string();

        for milestone in &self.milestones {
            line.push_str(&format!(
                "\n  {} {} [{}] +{}",
                "★".yellow(),
                milestone.title.bold(),
                milestone.kind,
                milestone.progress_bonus
            ));
        }
        line
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let titles: Vec<&str> = self.milestones.iter().map(|m| m.title.as_str()).collect();
        format!(
            "stage={} | increase={} | bonus={} | progress={} | ready={} | milestones=[{}]",
            self.stage,
            self.progress_increase,
            self.milestone_bonus,
            self.progress,
            self.readiness.is_ready,
            titles.join(", ")
        )
    }
}

/// Result of an advancement request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advancement {
    pub advanced: bool,
    pub from: RelationshipStage,
    pub to: RelationshipStage,
    pub readiness: StageReadiness,
}

/// Terminal color per stage
pub fn stage_color(stage: RelationshipStage) -> Color {
    match stage {
        RelationshipStage::NewFriend => Color::White,
        RelationshipStage::CloseFriend => Color::Cyan,
        RelationshipStage::BestFriend => Color::Blue,
        RelationshipStage::RomanticInterest => Color::Magenta,
        RelationshipStage::Dating => Color::BrightMagenta,
        RelationshipStage::CommittedPartner => Color::Red,
        RelationshipStage::Soulmate => Color::BrightRed,
    }
}

/// Emoji per stage
pub fn stage_emoji(stage: RelationshipStage) -> &'static str {
    match stage {
        RelationshipStage::NewFriend => "👋",
        RelationshipStage::CloseFriend => "🙂",
        RelationshipStage::BestFriend => "🤝",
        RelationshipStage::RomanticInterest => "🌹",
        RelationshipStage::Dating => "💞",
        RelationshipStage::CommittedPartner => "💍",
        RelationshipStage::Soulmate => "♾️",
    }
}
