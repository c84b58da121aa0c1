//! ESI severity classification over symptom text and reasoning output.
//!
//! Criteria are checked strictly in acuity order: ESI-1, then ESI-2, then
//! the ESI-5 allow-list, and finally a resource-need score splits ESI-3 from
//! ESI-4. The reasoning output participates only through its red flags.

use crate::extract;
use crate::model::EsiLevel;
use crate::patterns;
use crate::reasoning::ReasoningOutcome;

/// Stateless classifier over the immutable pattern tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EsiClassifier;

impl EsiClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a report into one of the five acuity levels.
    pub fn classify(&self, text: &str, reasoning: &ReasoningOutcome) -> EsiLevel {
        let lower = text.to_lowercase();

        if self.meets_esi1(&lower, reasoning) {
            return EsiLevel::Resuscitation;
        }
        if self.meets_esi2(&lower, reasoning) {
            return EsiLevel::Emergent;
        }
        if self.meets_esi5(&lower, reasoning) {
            return EsiLevel::NonUrgent;
        }
        if self.resource_score(&lower) >= 2 {
            EsiLevel::Urgent
        } else {
            // Default to ESI-4 rather than anything lower.
            EsiLevel::LessUrgent
        }
    }

    /// Immediate life threat: extreme fever, cardiopulmonary co-occurrence,
    /// blood loss patterns, ESI-1 keywords, or a life-threatening red flag.
    fn meets_esi1(&self, lower: &str, reasoning: &ReasoningOutcome) -> bool {
        if extract::extract_temperature(lower).map_or(false, |t| t >= 104.0) {
            return true;
        }
        if patterns::has_chest_pain(lower) && patterns::has_breathing_difficulty(lower) {
            return true;
        }
        if patterns::has_blood_emergency(lower) || patterns::has_gi_bleed_instability(lower) {
            return true;
        }
        patterns::contains_any(lower, patterns::ESI1_KEYWORDS)
            || reasoning
                .red_flags
                .iter()
                .any(|flag| flag.to_lowercase().contains("life-threatening"))
    }

    /// High-risk presentation: high fever, isolated cardiopulmonary symptom,
    /// blood patterns, persistent headache, ESI-2 keywords, or an
    /// emergency/urgent red flag.
    fn meets_esi2(&self, lower: &str, reasoning: &ReasoningOutcome) -> bool {
        if extract::extract_temperature(lower).map_or(false, |t| t >= 102.0) {
            return true;
        }
        if patterns::has_chest_pain(lower) || patterns::has_breathing_difficulty(lower) {
            return true;
        }
        if patterns::has_blood_emergency(lower) {
            return true;
        }
        if patterns::has_persistent_headache(lower) {
            return true;
        }
        if patterns::contains_any(lower, patterns::ESI2_KEYWORDS) {
            return true;
        }
        reasoning.red_flags.iter().any(|flag| {
            let flag = flag.to_lowercase();
            flag.contains("emergency") || flag.contains("urgent")
        })
    }

    /// Self-care is permitted only for allow-listed minor symptoms with no
    /// conflicting red flags.
    fn meets_esi5(&self, lower: &str, reasoning: &ReasoningOutcome) -> bool {
        if !patterns::matches_minor_allowlist(lower) {
            return false;
        }
        reasoning.red_flags.is_empty()
            || reasoning
                .red_flags
                .iter()
                .all(|flag| flag.to_lowercase().contains("minor"))
    }

    /// Anticipated resource needs: high-resource terms count double.
    fn resource_score(&self, lower: &str) -> u32 {
        if patterns::contains_any(lower, patterns::HIGH_RESOURCE_TERMS) {
            2
        } else if patterns::contains_any(lower, patterns::MEDIUM_RESOURCE_TERMS) {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::{ReasoningOutcome, ReasoningProvenance};

    fn no_reasoning() -> ReasoningOutcome {
        ReasoningOutcome {
            steps: Vec::new(),
            red_flags: Vec::new(),
            risk_factors: Vec::new(),
            preliminary_urgency: None,
            confidence: 0.5,
            provenance: ReasoningProvenance::LocalRules,
        }
    }

    fn with_red_flag(flag: &str) -> ReasoningOutcome {
        ReasoningOutcome {
            red_flags: vec![flag.to_string()],
            ..no_reasoning()
        }
    }

    #[test]
    fn test_esi1_criteria() {
        let clf = EsiClassifier::new();
        let r = no_reasoning();
        assert_eq!(clf.classify("fever of 105", &r), EsiLevel::Resuscitation);
        assert_eq!(
            clf.classify("chest pain and shortness of breath", &r),
            EsiLevel::Resuscitation
        );
        assert_eq!(clf.classify("vomiting blood", &r), EsiLevel::Resuscitation);
        assert_eq!(
            clf.classify("tarry stool and feeling faint", &r),
            EsiLevel::Resuscitation
        );
        assert_eq!(clf.classify("she is unresponsive", &r), EsiLevel::Resuscitation);
    }

    #[test]
    fn test_esi1_from_red_flag() {
        let clf = EsiClassifier::new();
        let r = with_red_flag("Life-threatening GI bleeding suspected");
        assert_eq!(clf.classify("dark stools", &r), EsiLevel::Resuscitation);
    }

    #[test]
    fn test_esi2_criteria() {
        let clf = EsiClassifier::new();
        let r = no_reasoning();
        assert_eq!(clf.classify("fever of 102.5", &r), EsiLevel::Emergent);
        assert_eq!(clf.classify("chest tightness all morning", &r), EsiLevel::Emergent);
        assert_eq!(
            clf.classify("headache lasting five days", &r),
            EsiLevel::Emergent
        );
        assert_eq!(clf.classify("severe abdominal pain", &r), EsiLevel::Emergent);
    }

    #[test]
    fn test_esi2_from_red_flag() {
        let clf = EsiClassifier::new();
        let r = with_red_flag("urgent escalation advised");
        assert_eq!(clf.classify("stomach upset", &r), EsiLevel::Emergent);
    }

    #[test]
    fn test_esi5_allowlist_only_without_red_flags() {
        let clf = EsiClassifier::new();
        assert_eq!(
            clf.classify("stuffy nose", &no_reasoning()),
            EsiLevel::NonUrgent
        );
        // Minor-only flags are tolerated.
        assert_eq!(
            clf.classify("runny nose", &with_red_flag("minor congestion")),
            EsiLevel::NonUrgent
        );
        // Any non-minor red flag blocks self-care.
        assert_eq!(
            clf.classify("stuffy nose", &with_red_flag("possible pneumonia")),
            EsiLevel::LessUrgent
        );
        // Non-allowlisted text never reaches ESI-5.
        assert_eq!(
            clf.classify("stuffy nose and fatigue", &no_reasoning()),
            EsiLevel::LessUrgent
        );
    }

    #[test]
    fn test_resource_score_splits_esi3_and_esi4() {
        let clf = EsiClassifier::new();
        let r = no_reasoning();
        assert_eq!(
            clf.classify("my knee needs imaging after a fall", &r),
            EsiLevel::Urgent
        );
        assert_eq!(
            clf.classify("need a medication review", &r),
            EsiLevel::LessUrgent
        );
        assert_eq!(clf.classify("mild headache", &r), EsiLevel::LessUrgent);
    }
}
