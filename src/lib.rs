//! Rapport: relationship-progression scoring engine
//!
//! Turn in, result out: Analyzer → metrics → {Progression, Milestones} → Stage Gate.
//! The engine holds no mutable state; callers own the relationship record.

pub mod config;
pub mod core;
pub mod types;

// =============================================================================
// DETECTOR CAPS
// =============================================================================

/// Upper clamp for every analyzer detector score
pub const METRIC_MAX: f64 = 10.0;

/// Baseline for conversation flow and reciprocity
pub const FLOW_BASE: f64 = 5.0;

/// Flow bonus for shared significant words is capped at this many words
pub const FLOW_SHARED_WORDS_CAP: usize = 3;

/// Words shorter than or equal to this are not "significant" for topic overlap
pub const SIGNIFICANT_WORD_MIN_CHARS: usize = 3;

/// A reply longer than this (chars) counts as a real answer to a question
pub const NON_TRIVIAL_REPLY_CHARS: usize = 20;

/// Placeholder score for consistency / time spent until history is wired in
pub const PLACEHOLDER_SIGNAL: f64 = 1.0;

// =============================================================================
// QUALITY WEIGHTS [sum = 1.0]
// =============================================================================

pub const Q_WEIGHT_LENGTH: f64 = 0.05;
pub const Q_WEIGHT_EMOTIONAL: f64 = 0.15;
pub const Q_WEIGHT_SHARING: f64 = 0.20;
pub const Q_WEIGHT_EMPATHY: f64 = 0.15;
pub const Q_WEIGHT_HUMOR: f64 = 0.10;
pub const Q_WEIGHT_INTIMACY: f64 = 0.10;
pub const Q_WEIGHT_FLOW: f64 = 0.10;
pub const Q_WEIGHT_DEPTH: f64 = 0.10;
pub const Q_WEIGHT_RECIPROCITY: f64 = 0.05;

/// Quality multiplier floor
pub const QUALITY_MIN: f64 = 0.5;

/// Quality multiplier ceiling (before the exceptional bonus)
pub const QUALITY_MAX: f64 = 3.5;

// =============================================================================
// PROGRESSION
// =============================================================================

/// Base progress per turn before multipliers
pub const BASE_PROGRESS: f64 = 2.0;

/// Hard cap on progress awarded by a single turn
pub const MAX_PROGRESS_INCREASE: u32 = 20;

/// compatibility (0-100) * weight
pub const COMPATIBILITY_WEIGHT: f64 = 0.5;

/// conversation frequency * weight, capped
pub const FREQUENCY_WEIGHT: f64 = 0.2;
pub const FREQUENCY_CAP: f64 = 2.0;

/// Average metric above which a turn is "exceptional"
pub const EXCEPTIONAL_THRESHOLD: f64 = 7.0;

/// Flat bonus added to the quality multiplier for exceptional turns
pub const EXCEPTIONAL_BONUS: f64 = 2.0;

// =============================================================================
// STAGE GATE
// =============================================================================

/// Progress needed inside a stage before advancement is considered
pub const STAGE_PROGRESS_THRESHOLD: u32 = 100;

/// Stored progress never exceeds this
pub const PROGRESS_CAP: u32 = 100;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
