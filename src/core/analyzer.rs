//! Conversation Analyzer: scores one exchange along eleven dimensions
//!
//! Lexicon scans use word-bounded, case-insensitive regexes. Which side of the
//! exchange is scanned matters:
//! - user only: personal sharing, emotional depth
//! - companion only: empathy
//! - both: emotional content, humor, intimacy
//! - pairwise: flow, reciprocity

use std::collections::HashSet;
use std::sync::Arc;
use lazy_static::lazy_static;
use regex::Regex;
use crate::{
    METRIC_MAX, FLOW_BASE, FLOW_SHARED_WORDS_CAP, SIGNIFICANT_WORD_MIN_CHARS,
    NON_TRIVIAL_REPLY_CHARS, PLACEHOLDER_SIGNAL,
};
use crate::types::ConversationMetrics;

lazy_static! {
    // =========================================================================
    // Emotional content (both messages)
    // Stems: leading boundary only, so "loved" and "lovely" count
    // =========================================================================
    static ref RE_POSITIVE: Regex = Regex::new(
        r"(?i)\b(happy|glad|excited|grateful|thankful|joy|joyful|wonderful|amazing|awesome|great|delighted|cheerful)"
    ).unwrap();

    static ref RE_INTIMATE: Regex = Regex::new(
        r"(?i)\b(love|loving|kiss|kisses|cuddle|cuddling|miss you|hold you|darling|romantic|passion|passionate|close to you|heart)"
    ).unwrap();

    static ref RE_VULNERABLE: Regex = Regex::new(
        r"(?i)\b(scared|afraid|alone|lonely|hurt|hurting|anxious|vulnerable|never told|sad|cry|crying|insecure)"
    ).unwrap();

    static ref RE_TRUST: Regex = Regex::new(
        r"(?i)\b(trust|honest|honesty|share|sharing|open up|rely on|count on|safe)"
    ).unwrap();

    static ref RE_AFFECTION: Regex = Regex::new(
        r"(?i)\b(care about|adore|sweetheart|hug|hugs|dear|fond|cherish|sweet)"
    ).unwrap();

    /// Repeated punctuation, text emoticons and common face/heart emoji
    static ref RE_EXPRESSIVE: Regex = Regex::new(
        r"(!{2,}|\?{2,}|:\)|:-\)|:\(|:D|<3|[\x{1F600}-\x{1F64F}\x{2764}\x{1F495}-\x{1F49F}])"
    ).unwrap();

    // =========================================================================
    // Personal sharing tiers (user message), weights 1/2/4/3/3/2
    // =========================================================================
    static ref RE_SHARE_BASIC: Regex = Regex::new(
        r"(?i)\b(i feel|i think|i like|i love|i enjoy|i'm feeling|my day|my job|my work)\b"
    ).unwrap();

    static ref RE_SHARE_MODERATE: Regex = Regex::new(
        r"(?i)\b(scared|worried|nervous|stressed|struggling|i wish|i hope|honestly|to be honest|i miss)\b"
    ).unwrap();

    static ref RE_SHARE_DEEP: Regex = Regex::new(
        r"(?i)\b(i've never|never told|secret|my fears?|ashamed|deep down|nobody knows|no one knows|my past|i've always wanted)\b"
    ).unwrap();

    static ref RE_SHARE_FAMILY: Regex = Regex::new(
        r"(?i)\bmy (mom|mother|dad|father|parents|brother|sister|family|grandma|grandmother|grandpa|grandfather|son|daughter|kids|children)\b"
    ).unwrap();

    static ref RE_SHARE_RELATIONSHIPS: Regex = Regex::new(
        r"(?i)\b(my ex|my boyfriend|my girlfriend|my partner|my husband|my wife|my best friend|my friends?|breakup|broke up|divorce)\b"
    ).unwrap();

    static ref RE_SHARE_FUTURE: Regex = Regex::new(
        r"(?i)\b(my future|someday|one day|my dreams?|my goals?|in the future|i want to become)\b"
    ).unwrap();

    /// Flat bonus when the user explicitly frames something as undisclosed
    static ref RE_SECRET: Regex = Regex::new(
        r"(?i)\b(never told|secret|nobody knows|no one knows)\b"
    ).unwrap();

    // =========================================================================
    // Empathy (companion reply)
    // =========================================================================
    static ref RE_EMPATHY: Regex = Regex::new(
        r"(?i)\b(i understand|i hear you|i'm here|here for you|not alone|that sounds|must be|i'm sorry|i can imagine|want you to know|i get it)\b"
    ).unwrap();

    static ref RE_VALIDATION: Regex = Regex::new(
        r"(?i)\b(courage|brave|valid|makes sense|proud of you|it's okay|it's ok|that's okay|thank you for sharing|thanks for sharing|you matter|you deserve)\b"
    ).unwrap();

    // =========================================================================
    // Humor (both messages)
    // =========================================================================
    static ref RE_HUMOR: Regex = Regex::new(
        r"(?i)\b(ha(ha)+|he(he)+|lol|lmao|rofl|funny|hilarious|joke|joking|kidding|silly|laugh|laughing)\b"
    ).unwrap();

    static ref RE_HUMOR_EMOJI: Regex = Regex::new(
        r"[\x{1F602}\x{1F923}\x{1F604}\x{1F606}\x{1F605}]"
    ).unwrap();

    // =========================================================================
    // Emotional depth (user message)
    // =========================================================================
    static ref RE_DEEP_EMOTION: Regex = Regex::new(
        r"(?i)\b(heartbroken|overwhelmed|devastated|terrified|really scared|feel lost|feel empty|means so much|deep down|grief|grieving|i've been struggling|so lonely)\b"
    ).unwrap();

    static ref RE_GROWTH: Regex = Regex::new(
        r"(?i)\b(learned|learning|growing|grown|realized|changed|better person|working on|healing|future)\b"
    ).unwrap();
}

// Per-match weights
const W_SHARE_BASIC: f64 = 1.0;
const W_SHARE_MODERATE: f64 = 2.0;
const W_SHARE_DEEP: f64 = 4.0;
const W_SHARE_FAMILY: f64 = 3.0;
const W_SHARE_RELATIONSHIPS: f64 = 3.0;
const W_SHARE_FUTURE: f64 = 2.0;
const SECRET_BONUS: f64 = 3.0;
const EXPRESSIVE_BONUS: f64 = 1.0;
const W_EMPATHY: f64 = 2.0;
const W_VALIDATION: f64 = 3.0;
const W_DEEP_EMOTION: f64 = 2.0;
const W_GROWTH: f64 = 1.0;

// =============================================================================
// HISTORY SIGNALS
// =============================================================================

/// Strategy for the history-driven dimensions (consistency, time spent)
///
/// Implementations may consult whatever history they own; the analyzer only
/// passes the current exchange. Output is clamped to 0-10.
pub trait HistorySignal: Send + Sync + std::fmt::Debug {
    fn score(&self, user_message: &str, bot_response: &str) -> f64;
}

/// Returns the same value for every exchange
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSignal(pub f64);

impl Default for ConstantSignal {
    fn default() -> Self {
        Self(PLACEHOLDER_SIGNAL)
    }
}

impl HistorySignal for ConstantSignal {
    fn score(&self, _user_message: &str, _bot_response: &str) -> f64 {
        self.0
    }
}

// =============================================================================
// ANALYZER
// =============================================================================

/// Pure, deterministic scorer for one user message + companion reply
#[derive(Debug, Clone)]
pub struct ConversationAnalyzer {
    consistency: Arc<dyn HistorySignal>,
    time_spent: Arc<dyn HistorySignal>,
}

impl Default for ConversationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationAnalyzer {
    /// Analyzer with placeholder history signals
    pub fn new() -> Self {
        Self {
            consistency: Arc::new(ConstantSignal::default()),
            time_spent: Arc::new(ConstantSignal::default()),
        }
    }

    /// Replace the consistency strategy
    pub fn with_consistency(mut self, signal: impl HistorySignal + 'static) -> Self {
        self.consistency = Arc::new(signal);
        self
    }

    /// Replace the time-spent strategy
    pub fn with_time_spent(mut self, signal: impl HistorySignal + 'static) -> Self {
        self.time_spent = Arc::new(signal);
        self
    }

    /// Score one exchange. Never fails; empty strings yield minimum scores.
    pub fn analyze(&self, user_message: &str, bot_response: &str) -> ConversationMetrics {
        let user = normalize(user_message);
        let bot = normalize(bot_response);
        let combined = format!("{} {}", user, bot);

        let metrics = ConversationMetrics {
            message_length: length_score(&user, &bot),
            emotional_words: emotional_content(&combined),
            personal_sharing: personal_sharing(&user),
            empathy: empathy(&bot),
            humor: humor(&combined),
            intimacy: intimacy(&combined),
            consistency: clamp_signal(self.consistency.score(user_message, bot_response)),
            time_spent: clamp_signal(self.time_spent.score(user_message, bot_response)),
            conversation_flow: conversation_flow(&user, &bot),
            emotional_depth: emotional_depth(&user),
            reciprocity: reciprocity(&user, &bot),
        };

        tracing::debug!(
            sharing = metrics.personal_sharing,
            emotional = metrics.emotional_words,
            empathy = metrics.empathy,
            flow = metrics.conversation_flow,
            "analyzed exchange"
        );
        metrics
    }
}

// =============================================================================
// DETECTORS
// =============================================================================

/// Bucketed mean length: >200 → 5, >100 → 3, >50 → 2, else 1
pub fn length_score(user: &str, bot: &str) -> f64 {
    let mean = (user.chars().count() + bot.chars().count()) as f64 / 2.0;
    if mean > 200.0 {
        5.0
    } else if mean > 100.0 {
        3.0
    } else if mean > 50.0 {
        2.0
    } else {
        1.0
    }
}

/// Five emotion lexicons over combined text, plus a flat expressiveness bonus
pub fn emotional_content(text: &str) -> f64 {
    let hits = count(&RE_POSITIVE, text)
        + count(&RE_INTIMATE, text)
        + count(&RE_VULNERABLE, text)
        + count(&RE_TRUST, text)
        + count(&RE_AFFECTION, text);
    let bonus = if RE_EXPRESSIVE.is_match(text) { EXPRESSIVE_BONUS } else { 0.0 };
    (hits + bonus).min(METRIC_MAX)
}

/// Depth-weighted self-disclosure in the user message
pub fn personal_sharing(user: &str) -> f64 {
    let mut score = count(&RE_SHARE_BASIC, user) * W_SHARE_BASIC
        + count(&RE_SHARE_MODERATE, user) * W_SHARE_MODERATE
        + count(&RE_SHARE_DEEP, user) * W_SHARE_DEEP
        + count(&RE_SHARE_FAMILY, user) * W_SHARE_FAMILY
        + count(&RE_SHARE_RELATIONSHIPS, user) * W_SHARE_RELATIONSHIPS
        + count(&RE_SHARE_FUTURE, user) * W_SHARE_FUTURE;
    if RE_SECRET.is_match(user) {
        score += SECRET_BONUS;
    }
    score.min(METRIC_MAX)
}

/// Empathy and validation offered by the companion
pub fn empathy(bot: &str) -> f64 {
    let score = count(&RE_EMPATHY, bot) * W_EMPATHY + count(&RE_VALIDATION, bot) * W_VALIDATION;
    score.min(METRIC_MAX)
}

/// Humor keywords and laughing emoji over combined text
///
/// Clamped like its siblings so humor cannot dominate the quality multiplier.
pub fn humor(text: &str) -> f64 {
    (count(&RE_HUMOR, text) + count(&RE_HUMOR_EMOJI, text)).min(METRIC_MAX)
}

/// Intimate and affectionate vocabulary over combined text
pub fn intimacy(text: &str) -> f64 {
    (count(&RE_INTIMATE, text) + count(&RE_AFFECTION, text)).min(METRIC_MAX)
}

/// Base 5; +1 per answered question direction; +1 per shared significant word (max 3)
pub fn conversation_flow(user: &str, bot: &str) -> f64 {
    let mut score = FLOW_BASE;

    if user.contains('?') && bot.chars().count() > NON_TRIVIAL_REPLY_CHARS {
        score += 1.0;
    }
    if bot.contains('?') && user.chars().count() > NON_TRIVIAL_REPLY_CHARS {
        score += 1.0;
    }

    let shared = significant_words(user)
        .intersection(&significant_words(bot))
        .count()
        .min(FLOW_SHARED_WORDS_CAP);
    score += shared as f64;

    score.min(METRIC_MAX)
}

/// Deep-emotion phrases (x2) and growth phrases (x1) in the user message
pub fn emotional_depth(user: &str) -> f64 {
    let score = count(&RE_DEEP_EMOTION, user) * W_DEEP_EMOTION + count(&RE_GROWTH, user) * W_GROWTH;
    score.min(METRIC_MAX)
}

/// Base 5; +2 for balanced lengths; +2 when both sides ask a question
pub fn reciprocity(user: &str, bot: &str) -> f64 {
    let mut score = FLOW_BASE;

    let user_len = user.chars().count();
    let bot_len = bot.chars().count();
    let longer = user_len.max(bot_len);
    if longer > 0 && user_len.min(bot_len) * 2 >= longer {
        score += 2.0;
    }

    if user.contains('?') && bot.contains('?') {
        score += 2.0;
    }

    score.min(METRIC_MAX)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Lowercase and fold typographic apostrophes so lexicons match "I’ve" as "i've"
fn normalize(text: &str) -> String {
    text.trim()
        .replace(|c: char| c == '\u{2019}' || c == '\u{2018}', "'")
        .to_lowercase()
}

fn count(regex: &Regex, text: &str) -> f64 {
    regex.find_iter(text).count() as f64
}

fn significant_words(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| w.chars().count() > SIGNIFICANT_WORD_MIN_CHARS)
        .collect()
}

fn clamp_signal(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, METRIC_MAX)
    } else {
        0.0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DISCLOSURE: &str = "I've never told anyone this, but I feel really scared about my future.";
    const SUPPORT: &str =
        "I understand, and I want you to know you're not alone — that took real courage to share.";

    #[test]
    fn test_empty_input() {
        let m = ConversationAnalyzer::new().analyze("", "");
        assert_eq!(m.message_length, 1.0);
        assert_eq!(m.emotional_words, 0.0);
        assert_eq!(m.personal_sharing, 0.0);
        assert_eq!(m.empathy, 0.0);
        assert_eq!(m.humor, 0.0);
        assert_eq!(m.intimacy, 0.0);
        assert_eq!(m.emotional_depth, 0.0);
        assert_eq!(m.conversation_flow, FLOW_BASE);
        assert_eq!(m.reciprocity, FLOW_BASE);
        assert_eq!(m.consistency, PLACEHOLDER_SIGNAL);
    }

    #[test]
    fn test_length_buckets() {
        assert_eq!(length_score("", ""), 1.0);
        assert_eq!(length_score(&"a".repeat(60), &"b".repeat(60)), 2.0);
        assert_eq!(length_score(&"a".repeat(150), &"b".repeat(150)), 3.0);
        assert_eq!(length_score(&"a".repeat(400), &"b".repeat(100)), 5.0);
    }

    #[test]
    fn test_disclosure_scenario() {
        let m = ConversationAnalyzer::new().analyze(DISCLOSURE, SUPPORT);
        assert!(m.personal_sharing >= 7.0, "sharing was {}", m.personal_sharing);
        assert!(m.empathy >= 7.0, "empathy was {}", m.empathy);
        assert!(m.emotional_words > 3.0, "emotional was {}", m.emotional_words);
    }

    #[test]
    fn test_emotion_stems_match_inflections() {
        assert_eq!(emotional_content("I loved it, such a lovely evening"), 2.0);
        assert_eq!(emotional_content("heartbroken and hurting"), 2.0);
        assert_eq!(emotional_content("a clove of garlic"), 0.0);
    }

    #[test]
    fn test_typographic_apostrophe() {
        let straight = personal_sharing(&normalize("I've never told anyone"));
        let curly = personal_sharing(&normalize("I\u{2019}ve never told anyone"));
        assert_eq!(straight, curly);
    }

    #[test]
    fn test_empathy_only_scores_companion() {
        let analyzer = ConversationAnalyzer::new();
        let from_user = analyzer.analyze("I understand, that must be hard", "ok");
        let from_bot = analyzer.analyze("ok", "I understand, that must be hard");
        assert_eq!(from_user.empathy, 0.0);
        assert!(from_bot.empathy > 0.0);
    }

    #[test]
    fn test_sharing_only_scores_user() {
        let analyzer = ConversationAnalyzer::new();
        let m = analyzer.analyze("hello", "My mom told me a secret about my future");
        assert_eq!(m.personal_sharing, 0.0);
    }

    #[test]
    fn test_sharing_tiers_weighted() {
        assert_eq!(personal_sharing("i think so"), 1.0);
        assert_eq!(personal_sharing("i'm worried"), 2.0);
        assert_eq!(personal_sharing("my dad called"), 3.0);
        // deep tier (4) plus the secret bonus (3)
        assert_eq!(personal_sharing("it's a secret"), 7.0);
    }

    #[test]
    fn test_detectors_clamp() {
        let flood = "love ".repeat(50);
        assert_eq!(emotional_content(&flood), METRIC_MAX);
        assert_eq!(intimacy(&flood), METRIC_MAX);
        assert_eq!(humor(&"haha lol ".repeat(20)), METRIC_MAX);
        assert_eq!(empathy(&"i understand. ".repeat(20)), METRIC_MAX);
    }

    #[test]
    fn test_expressive_bonus_once() {
        assert_eq!(emotional_content("wow!!"), 1.0);
        assert_eq!(emotional_content("wow!! really?? :)"), 1.0);
        assert_eq!(emotional_content("happy!!"), 2.0);
    }

    #[test]
    fn test_flow_questions_and_overlap() {
        let user = "what do you think about hiking trips?";
        let bot = "hiking trips are wonderful, especially mountain ones";
        // +1 answered question, +2 shared words (hiking, trips)
        assert_eq!(conversation_flow(user, bot), 8.0);
    }

    #[test]
    fn test_flow_overlap_capped() {
        let text = "alpha bravo charlie delta echo foxtrot";
        assert_eq!(conversation_flow(text, text), FLOW_BASE + 3.0);
    }

    #[test]
    fn test_reciprocity() {
        assert_eq!(reciprocity("how are you?", "good, and you?"), 9.0);
        assert_eq!(reciprocity("hi", "a much longer reply than the greeting"), 5.0);
        assert_eq!(reciprocity("", ""), 5.0);
    }

    #[test]
    fn test_pluggable_history_signals() {
        #[derive(Debug)]
        struct Fixed;
        impl HistorySignal for Fixed {
            fn score(&self, _: &str, _: &str) -> f64 {
                42.0
            }
        }

        let analyzer = ConversationAnalyzer::new()
            .with_consistency(ConstantSignal(4.0))
            .with_time_spent(Fixed);
        let m = analyzer.analyze("hi", "hello");
        assert_eq!(m.consistency, 4.0);
        assert_eq!(m.time_spent, METRIC_MAX);

        let nan = ConversationAnalyzer::new().with_consistency(ConstantSignal(f64::NAN));
        assert_eq!(nan.analyze("hi", "hello").consistency, 0.0);
    }

    #[test]
    fn test_determinism() {
        let analyzer = ConversationAnalyzer::new();
        assert_eq!(analyzer.analyze(DISCLOSURE, SUPPORT), analyzer.analyze(DISCLOSURE, SUPPORT));
    }
}
