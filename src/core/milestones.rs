//! Milestone Detector: fixed, ordered table of independent threshold rules
//!
//! Every rule is evaluated on every call; no rule suppresses another. Rules marked
//! one-time (message counts, chatting streaks) are skipped only when the caller
//! passes a log that already contains them.

use std::collections::HashSet;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use crate::types::{
    ConversationMetrics, HistoryMessage, MilestoneEvent, MilestoneType,
    RelationshipContext, RelationshipStage,
};

lazy_static! {
    /// Proposals to do something together
    static ref RE_PLANS: Regex = Regex::new(
        r"(?i)\b(let's|lets|we should|we could|together|movie night|game night|date night|road trip|want to (watch|play|go|cook|try))\b"
    ).unwrap();
}

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub metrics: &'a ConversationMetrics,
    pub context: &'a RelationshipContext,
    /// Timestamps only; text is never read
    pub history: &'a [HistoryMessage],
    /// The user's side of the current exchange
    pub user_message: &'a str,
    pub now: DateTime<Utc>,
}

/// The milestone rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MilestoneRule {
    FirstDeepConversation,
    MomentOfUnderstanding,
    HeartToHeart,
    SharedLaughter,
    InSync,
    RomanticSpark,
    GrowingCloser,
    DeepIntimacy,
    Messages50,
    Messages100,
    Messages500,
    Messages1000,
    DailyRitual,
    OneWeekTogether,
    MonthOfMemories,
    MakingPlans,
}

impl MilestoneRule {
    pub const ALL: [MilestoneRule; 16] = [
        MilestoneRule::FirstDeepConversation,
        MilestoneRule::MomentOfUnderstanding,
        MilestoneRule::HeartToHeart,
        MilestoneRule::SharedLaughter,
        MilestoneRule::InSync,
        MilestoneRule::RomanticSpark,
        MilestoneRule::GrowingCloser,
        MilestoneRule::DeepIntimacy,
        MilestoneRule::Messages50,
        MilestoneRule::Messages100,
        MilestoneRule::Messages500,
        MilestoneRule::Messages1000,
        MilestoneRule::DailyRitual,
        MilestoneRule::OneWeekTogether,
        MilestoneRule::MonthOfMemories,
        MilestoneRule::MakingPlans,
    ];

    pub fn kind(&self) -> MilestoneType {
        use MilestoneRule::*;
        match self {
            FirstDeepConversation | MomentOfUnderstanding | HeartToHeart => MilestoneType::Emotional,
            SharedLaughter | InSync | Messages50 | Messages100 | Messages500 | Messages1000 => {
                MilestoneType::Conversation
            }
            RomanticSpark | GrowingCloser | DeepIntimacy => MilestoneType::Intimate,
            DailyRitual | MakingPlans => MilestoneType::Activity,
            OneWeekTogether | MonthOfMemories => MilestoneType::Time,
        }
    }

    pub fn title(&self) -> &'static str {
        use MilestoneRule::*;
        match self {
            FirstDeepConversation => "First Deep Conversation",
            MomentOfUnderstanding => "Moment of Understanding",
            HeartToHeart => "Heart to Heart",
            SharedLaughter => "Shared Laughter",
            InSync => "In Sync",
            RomanticSpark => "Romantic Spark",
            GrowingCloser => "Growing Closer",
            DeepIntimacy => "Deep Intimacy",
            Messages50 => "50 Messages",
            Messages100 => "100 Messages",
            Messages500 => "500 Messages",
            Messages1000 => "1000 Messages",
            DailyRitual => "Daily Ritual",
            OneWeekTogether => "One Week Together",
            MonthOfMemories => "A Month of Memories",
            MakingPlans => "Making Plans",
        }
    }

    pub fn description(&self) -> &'static str {
        use MilestoneRule::*;
        match self {
            FirstDeepConversation => "Opened up about something personal and meaningful",
            MomentOfUnderstanding => "Felt truly heard and understood",
            HeartToHeart => "Shared deep feelings and personal growth",
            SharedLaughter => "Laughed together",
            InSync => "A balanced, flowing conversation",
            RomanticSpark => "Sparks are flying",
            GrowingCloser => "The bond is getting closer",
            DeepIntimacy => "A moment of deep intimacy",
            Messages50 => "Exchanged 50 messages",
            Messages100 => "Exchanged 100 messages",
            Messages500 => "Exchanged 500 messages",
            Messages1000 => "Exchanged 1000 messages",
            DailyRitual => "Chatted on three different days",
            OneWeekTogether => "Chatted on seven different days",
            MonthOfMemories => "Chatted on thirty different days",
            MakingPlans => "Made plans to do something together",
        }
    }

    pub fn progress_bonus(&self) -> u32 {
        use MilestoneRule::*;
        match self {
            FirstDeepConversation => 10,
            MomentOfUnderstanding => 8,
            HeartToHeart => 10,
            SharedLaughter => 5,
            InSync => 6,
            RomanticSpark => 12,
            GrowingCloser => 12,
            DeepIntimacy => 15,
            Messages50 => 5,
            Messages100 => 10,
            Messages500 => 20,
            Messages1000 => 30,
            DailyRitual => 5,
            OneWeekTogether => 15,
            MonthOfMemories => 25,
            MakingPlans => 6,
        }
    }

    /// Awarded at most once per relationship
    pub fn is_one_time(&self) -> bool {
        use MilestoneRule::*;
        matches!(
            self,
            Messages50 | Messages100 | Messages500 | Messages1000 | DailyRitual | OneWeekTogether | MonthOfMemories
        )
    }

    /// Does this milestone carry the next stage as `stage_unlocked`?
    pub fn unlocks_next_stage(&self) -> bool {
        matches!(
            self,
            MilestoneRule::RomanticSpark | MilestoneRule::GrowingCloser | MilestoneRule::DeepIntimacy
        )
    }

    /// Static precondition over metrics, context, history and the current message
    pub fn applies(&self, input: &RuleInput<'_>) -> bool {
        use MilestoneRule::*;
        let m = input.metrics;
        let stage = input.context.current_stage;
        let total = input.context.total_messages;
        match self {
            FirstDeepConversation => m.personal_sharing > 5.0 && m.emotional_words > 3.0,
            MomentOfUnderstanding => m.empathy > 8.0,
            HeartToHeart => m.emotional_depth > 6.0,
            SharedLaughter => m.humor > 5.0,
            InSync => m.conversation_flow > 8.0 && m.reciprocity > 7.0,
            RomanticSpark => m.intimacy > 6.0 && stage == RelationshipStage::RomanticInterest,
            GrowingCloser => m.intimacy > 7.0 && stage == RelationshipStage::Dating,
            DeepIntimacy => {
                m.intimacy > 8.0
                    && matches!(stage, RelationshipStage::CommittedPartner | RelationshipStage::Soulmate)
            }
            Messages50 => total >= 50,
            Messages100 => total >= 100,
            Messages500 => total >= 500,
            Messages1000 => total >= 1000,
            DailyRitual => check_consistent_chatting_at(input.history, 3, input.now),
            OneWeekTogether => check_consistent_chatting_at(input.history, 7, input.now),
            MonthOfMemories => check_consistent_chatting_at(input.history, 30, input.now),
            MakingPlans => {
                m.personal_sharing > 3.0
                    && stage >= RelationshipStage::CloseFriend
                    && RE_PLANS.is_match(input.user_message)
            }
        }
    }

    fn emit(&self, input: &RuleInput<'_>) -> MilestoneEvent {
        let unlocked = if self.unlocks_next_stage() {
            input.context.current_stage.next()
        } else {
            None
        };
        MilestoneEvent::new(self.kind(), self.title(), self.description(), self.progress_bonus(), input.now)
            .with_stage_unlocked(unlocked)
    }
}

/// Milestone detector
#[derive(Debug, Clone, Copy, Default)]
pub struct MilestoneDetector;

impl MilestoneDetector {
    pub fn new() -> Self {
        Self
    }

    /// Every rule satisfied by this turn, dated now
    ///
    /// Without the message text, "Making Plans" cannot fire here.
    pub fn check_for_milestones(
        &self,
        metrics: &ConversationMetrics,
        context: &RelationshipContext,
        history: &[HistoryMessage],
    ) -> Vec<MilestoneEvent> {
        self.check_for_new_milestones(metrics, context, history, "", &[], Utc::now())
    }

    /// Like `check_for_milestones`, with the user's message for text rules,
    /// skipping one-time rules already present in `log`
    pub fn check_for_new_milestones(
        &self,
        metrics: &ConversationMetrics,
        context: &RelationshipContext,
        history: &[HistoryMessage],
        user_message: &str,
        log: &[MilestoneEvent],
        now: DateTime<Utc>,
    ) -> Vec<MilestoneEvent> {
        let input = RuleInput { metrics, context, history, user_message, now };
        let awarded: HashSet<&str> = log.iter().map(|m| m.title.as_str()).collect();

        MilestoneRule::ALL
            .iter()
            .filter(|rule| !(rule.is_one_time() && awarded.contains(rule.title())))
            .filter(|rule| rule.applies(&input))
            .map(|rule| {
                let event = rule.emit(&input);
                tracing::info!(title = %event.title, kind = %event.kind, bonus = event.progress_bonus, "milestone reached");
                event
            })
            .collect()
    }
}

/// Chatted on at least `days` distinct days (offset 0 = the 24h before now)
pub fn check_consistent_chatting(history: &[HistoryMessage], days: u32) -> bool {
    check_consistent_chatting_at(history, days, Utc::now())
}

/// Deterministic variant of [`check_consistent_chatting`]
pub fn check_consistent_chatting_at(history: &[HistoryMessage], days: u32, now: DateTime<Utc>) -> bool {
    if days == 0 {
        return true;
    }
    let active_days: HashSet<i64> = history
        .iter()
        .map(|msg| (now - msg.timestamp).num_days())
        .filter(|offset| *offset >= 0)
        .collect();
    active_days.len() >= days as usize
}

// =============================================================================
// TESTS
// =============================================================================
