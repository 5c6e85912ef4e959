//! Core modules for Rapport

pub mod analyzer;
pub mod progression;
pub mod milestones;
pub mod stage_gate;
pub mod engine;
pub mod api;

pub use analyzer::{ConversationAnalyzer, HistorySignal, ConstantSignal};
pub use progression::{ProgressionCalculator, stage_multiplier, personalized_rate};
pub use milestones::{MilestoneDetector, MilestoneRule, check_consistent_chatting, check_consistent_chatting_at};
pub use stage_gate::{StageGate, MilestoneWindow};
pub use engine::RelationshipEngine;
pub use api::{create_router, run_server};
