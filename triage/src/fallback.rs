//! Fully-local fallback triage: the guaranteed-safe last resort.
//!
//! Pure function from raw text to a complete verdict using only the
//! extractor and the safety cascade (whose table embeds the GI-bleed and
//! hemodynamic-instability combination check). Always terminates; the floor
//! is PrimaryCare, and SelfCare is reachable only through the exact
//! allow-list rule.

use crate::cascade::SafetyCascade;
use crate::extract;
use crate::model::TriageVerdict;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTriageEngine;

impl FallbackTriageEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce a deterministic verdict for any non-empty text.
    pub fn triage(&self, text: &str) -> TriageVerdict {
        let signals = extract::extract_signals(text);
        let lower = text.to_lowercase();
        let hit = SafetyCascade::new().evaluate(&lower, &signals);
        tracing::info!(rule = hit.rule, urgency = %hit.urgency, "fallback triage verdict");
        hit.into_verdict(signals.coded_terms, "Deterministic rule triage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EsiLevel, UrgencyLevel};

    #[test]
    fn test_floor_is_primary_care() {
        let verdict = FallbackTriageEngine::new().triage("feeling vaguely unwell");
        assert_eq!(verdict.urgency_level, UrgencyLevel::PrimaryCare);
        assert_eq!(verdict.esi_level, EsiLevel::LessUrgent);
    }

    #[test]
    fn test_self_care_only_via_allowlist() {
        let engine = FallbackTriageEngine::new();
        let minor = engine.triage("stuffy nose");
        assert_eq!(minor.urgency_level, UrgencyLevel::SelfCare);
        assert_eq!(minor.esi_level, EsiLevel::NonUrgent);

        // Anything beyond the exact phrase escalates to at least PrimaryCare.
        let not_minor = engine.triage("stuffy nose for three weeks and wheezing");
        assert!(not_minor.urgency_level >= UrgencyLevel::PrimaryCare);
    }

    #[test]
    fn test_combination_check_reaches_emergency() {
        let verdict =
            FallbackTriageEngine::new().triage("black tarry stool and I feel lightheaded");
        assert_eq!(verdict.urgency_level, UrgencyLevel::Emergency);
        assert_eq!(verdict.esi_level, EsiLevel::Resuscitation);
        assert!(verdict.confidence >= 0.9);
    }

    #[test]
    fn test_verdict_is_complete() {
        let verdict = FallbackTriageEngine::new().triage("fever of 101 and cough");
        assert!(!verdict.explanation.is_empty());
        assert!(!verdict.reasoning_trace.is_empty());
        assert!((0.0..=1.0).contains(&verdict.confidence));
        assert!(!verdict.coded_terms.is_empty());
    }
}
