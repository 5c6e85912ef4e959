//! Core types for Rapport

mod stage;
mod metrics;
mod context;
mod milestone;
mod readiness;
mod outcome;
mod error;

pub use stage::{RelationshipStage, StageConfig};
pub use metrics::ConversationMetrics;
pub use context::{RelationshipContext, BehaviorHistory, HistoryMessage};
pub use milestone::{MilestoneEvent, MilestoneType};
pub use readiness::{StageReadiness, GateReason};
pub use outcome::{RelationshipState, TurnInput, TurnOutcome, Advancement, stage_color, stage_emoji};
pub use error::{ValidationError, EngineError, Result};
pub(crate) use error::{check_non_negative, check_range};
