//! Deterministic safety cascade: ordered first-match-wins rule groups.
//!
//! The cascade is the safety floor of the whole system. Specific, severe
//! patterns are listed before generic keyword checks so that "worst headache
//! of my life" is never shadowed by a plain "headache" rule. Each rule is a
//! (predicate, verdict-builder) pair; one generic driver walks the table and
//! stops at the first hit.
//!
//! Rules flagged `danger_override` form the subset the orchestrator consults
//! before any oracle involvement; the full table is the fallback engine's
//! classifier. SelfCare is reachable only through the allow-list rule, never
//! as a fallthrough default.

use chrono::Utc;

use crate::extract::ExtractedSignals;
use crate::model::{CodedTerm, EsiLevel, ReasoningStep, TriageVerdict, UrgencyLevel};
use crate::patterns;

/// The verdict template produced by a matched rule.
#[derive(Debug, Clone)]
pub struct CascadeVerdict {
    pub urgency: UrgencyLevel,
    pub esi: EsiLevel,
    pub confidence: f64,
    pub explanation: String,
    /// Name of the rule that fired, for the reasoning trace.
    pub rule: &'static str,
}

impl CascadeVerdict {
    /// Build a full triage verdict from this template.
    pub fn into_verdict(self, coded_terms: Vec<CodedTerm>, analysis: &str) -> TriageVerdict {
        TriageVerdict {
            urgency_level: self.urgency,
            explanation: self.explanation,
            confidence: self.confidence,
            esi_level: self.esi,
            coded_terms,
            reasoning_trace: vec![ReasoningStep::new(
                1,
                analysis,
                format!("Rule '{}' matched", self.rule),
            )],
            next_steps: None,
            assessed_at: Utc::now(),
        }
    }
}

/// Input to cascade evaluation. `text` must already be lowercased.
#[derive(Debug, Clone, Copy)]
pub struct CascadeInput<'a> {
    pub text: &'a str,
    pub signals: &'a ExtractedSignals,
}

struct CascadeRule {
    name: &'static str,
    /// Whether this rule may override AI-derived judgment up front.
    danger_override: bool,
    matches: fn(&CascadeInput) -> bool,
    build: fn(&CascadeInput) -> CascadeVerdict,
}

fn fever_at_least(input: &CascadeInput, threshold: f64) -> bool {
    input
        .signals
        .temperature_f
        .map_or(false, |t| t >= threshold)
}

fn stated_temperature(input: &CascadeInput) -> f64 {
    // Only called from rules gated on a present temperature.
    input.signals.temperature_f.unwrap_or(0.0)
}

fn match_extreme_fever(input: &CascadeInput) -> bool {
    fever_at_least(input, 104.0)
}

fn build_extreme_fever(input: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Emergency,
        esi: EsiLevel::Resuscitation,
        confidence: 0.95,
        explanation: format!(
            "A fever of {:.1}°F is extremely dangerous and potentially life-threatening. \
             Call emergency services or go to the nearest emergency room immediately.",
            stated_temperature(input)
        ),
        rule: "extreme_fever",
    }
}

fn match_chest_pain_with_breathing(input: &CascadeInput) -> bool {
    patterns::has_chest_pain(input.text) && patterns::has_breathing_difficulty(input.text)
}

fn build_chest_pain_with_breathing(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Emergency,
        esi: EsiLevel::Resuscitation,
        confidence: 0.98,
        explanation: "Chest discomfort combined with shortness of breath is a medical emergency \
                      that could indicate a heart attack, pulmonary embolism, or another \
                      life-threatening condition. Call emergency services immediately; do not \
                      drive yourself."
            .to_string(),
        rule: "chest_pain_with_breathing",
    }
}

fn match_blood_emergency(input: &CascadeInput) -> bool {
    patterns::has_blood_emergency(input.text)
}

fn build_blood_emergency(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Emergency,
        esi: EsiLevel::Resuscitation,
        confidence: 0.95,
        explanation: "Blood in cough, vomit, or stool can indicate serious internal bleeding. \
                      This is a medical emergency requiring immediate evaluation; call emergency \
                      services or go to the nearest emergency room now."
            .to_string(),
        rule: "blood_emergency",
    }
}

fn match_gi_bleed_instability(input: &CascadeInput) -> bool {
    patterns::has_gi_bleed_instability(input.text)
}

fn build_gi_bleed_instability(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Emergency,
        esi: EsiLevel::Resuscitation,
        confidence: 0.98,
        explanation: "Coffee-ground or tarry stool together with dizziness or weakness strongly \
                      suggests upper gastrointestinal bleeding with significant blood loss. This \
                      is life-threatening; call emergency services immediately."
            .to_string(),
        rule: "gi_bleed_instability",
    }
}

fn match_danger_phrase(input: &CascadeInput) -> bool {
    patterns::has_danger_phrase(input.text)
}

fn build_danger_phrase(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Emergency,
        esi: EsiLevel::Resuscitation,
        confidence: 0.95,
        explanation: "Your description matches a recognized medical emergency. Call emergency \
                      services or go to the nearest emergency room immediately; do not delay \
                      seeking care."
            .to_string(),
        rule: "danger_phrase",
    }
}

fn match_high_fever(input: &CascadeInput) -> bool {
    fever_at_least(input, 102.0)
}

fn build_high_fever(input: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Urgent,
        esi: EsiLevel::Emergent,
        confidence: 0.9,
        explanation: format!(
            "A fever of {:.1}°F is concerning and needs prompt medical attention. Contact your \
             doctor immediately or visit an urgent care center today.",
            stated_temperature(input)
        ),
        rule: "high_fever",
    }
}

fn match_isolated_cardiopulmonary(input: &CascadeInput) -> bool {
    patterns::has_chest_pain(input.text) || patterns::has_breathing_difficulty(input.text)
}

fn build_isolated_cardiopulmonary(input: &CascadeInput) -> CascadeVerdict {
    let explanation = if patterns::has_chest_pain(input.text) {
        "Chest pain or discomfort requires immediate evaluation to rule out a heart attack or \
         other serious cardiac condition. Call emergency services or go to the nearest \
         emergency room."
    } else {
        "Difficulty breathing requires immediate medical attention as it can indicate serious \
         respiratory or cardiac problems. Call emergency services or go to the nearest \
         emergency room."
    };
    CascadeVerdict {
        urgency: UrgencyLevel::Emergency,
        esi: EsiLevel::Emergent,
        confidence: 0.95,
        explanation: explanation.to_string(),
        rule: "isolated_cardiopulmonary",
    }
}

fn match_persistent_headache(input: &CascadeInput) -> bool {
    patterns::has_persistent_headache(input.text)
}

fn build_persistent_headache(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Urgent,
        esi: EsiLevel::Emergent,
        confidence: 0.85,
        explanation: "A headache persisting for days needs medical evaluation to rule out \
                      serious conditions. Contact your doctor today or visit an urgent care \
                      center."
            .to_string(),
        rule: "persistent_headache",
    }
}

fn match_moderate_fever(input: &CascadeInput) -> bool {
    fever_at_least(input, 100.4)
}

fn build_moderate_fever(input: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::PrimaryCare,
        esi: EsiLevel::LessUrgent,
        confidence: 0.8,
        explanation: format!(
            "A fever of {:.1}°F should be evaluated by a healthcare provider, especially if \
             accompanied by other symptoms.",
            stated_temperature(input)
        ),
        rule: "moderate_fever",
    }
}

fn match_emergency_keywords(input: &CascadeInput) -> bool {
    patterns::contains_any(input.text, patterns::EMERGENCY_KEYWORDS)
}

fn build_emergency_keywords(input: &CascadeInput) -> CascadeVerdict {
    let keyword = patterns::first_keyword(input.text, patterns::EMERGENCY_KEYWORDS)
        .unwrap_or("emergency symptoms");
    CascadeVerdict {
        urgency: UrgencyLevel::Emergency,
        esi: EsiLevel::Emergent,
        confidence: 0.9,
        explanation: format!(
            "Your symptoms (including '{keyword}') indicate a potential medical emergency. Call \
             emergency services or go to the nearest emergency room immediately."
        ),
        rule: "emergency_keywords",
    }
}

fn match_urgent_keywords(input: &CascadeInput) -> bool {
    patterns::contains_any(input.text, patterns::URGENT_KEYWORDS)
}

fn build_urgent_keywords(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::Urgent,
        esi: EsiLevel::Urgent,
        confidence: 0.8,
        explanation: "Your symptoms suggest you need medical attention today. Contact your \
                      doctor, visit an urgent care center, or go to the emergency room if \
                      symptoms worsen."
            .to_string(),
        rule: "urgent_keywords",
    }
}

fn match_primary_care_keywords(input: &CascadeInput) -> bool {
    patterns::contains_any(input.text, patterns::PRIMARY_CARE_KEYWORDS)
}

fn build_primary_care_keywords(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::PrimaryCare,
        esi: EsiLevel::LessUrgent,
        confidence: 0.7,
        explanation: "Consider scheduling an appointment with your primary care provider for \
                      evaluation within the next few days."
            .to_string(),
        rule: "primary_care_keywords",
    }
}

fn match_minor_allowlist(input: &CascadeInput) -> bool {
    patterns::matches_minor_allowlist(input.text)
}

fn build_minor_allowlist(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::SelfCare,
        esi: EsiLevel::NonUrgent,
        confidence: 0.8,
        explanation: "This appears to be a minor cold symptom that can typically be managed \
                      with self-care: rest, fluids, and over-the-counter remedies. If symptoms \
                      worsen or persist beyond a week, see a healthcare provider."
            .to_string(),
        rule: "minor_allowlist",
    }
}

fn match_always(_: &CascadeInput) -> bool {
    true
}

fn build_default(_: &CascadeInput) -> CascadeVerdict {
    CascadeVerdict {
        urgency: UrgencyLevel::PrimaryCare,
        esi: EsiLevel::LessUrgent,
        confidence: 0.6,
        explanation: "We recommend scheduling an appointment with your primary care provider \
                      for proper evaluation. If symptoms worsen or you develop concerning \
                      signs, seek immediate medical attention."
            .to_string(),
        rule: "default_primary_care",
    }
}

/// The ordered rule table. Priority matters: specific and severe patterns
/// precede the generic keyword tiers, and the catch-all default is last.
static RULES: &[CascadeRule] = &[
    CascadeRule {
        name: "extreme_fever",
        danger_override: true,
        matches: match_extreme_fever,
        build: build_extreme_fever,
    },
    CascadeRule {
        name: "chest_pain_with_breathing",
        danger_override: true,
        matches: match_chest_pain_with_breathing,
        build: build_chest_pain_with_breathing,
    },
    CascadeRule {
        name: "blood_emergency",
        danger_override: true,
        matches: match_blood_emergency,
        build: build_blood_emergency,
    },
    CascadeRule {
        name: "gi_bleed_instability",
        danger_override: true,
        matches: match_gi_bleed_instability,
        build: build_gi_bleed_instability,
    },
    CascadeRule {
        name: "danger_phrase",
        danger_override: true,
        matches: match_danger_phrase,
        build: build_danger_phrase,
    },
    CascadeRule {
        name: "high_fever",
        danger_override: true,
        matches: match_high_fever,
        build: build_high_fever,
    },
    CascadeRule {
        name: "isolated_cardiopulmonary",
        danger_override: true,
        matches: match_isolated_cardiopulmonary,
        build: build_isolated_cardiopulmonary,
    },
    CascadeRule {
        name: "persistent_headache",
        danger_override: true,
        matches: match_persistent_headache,
        build: build_persistent_headache,
    },
    CascadeRule {
        name: "moderate_fever",
        danger_override: false,
        matches: match_moderate_fever,
        build: build_moderate_fever,
    },
    CascadeRule {
        name: "emergency_keywords",
        danger_override: false,
        matches: match_emergency_keywords,
        build: build_emergency_keywords,
    },
    CascadeRule {
        name: "urgent_keywords",
        danger_override: false,
        matches: match_urgent_keywords,
        build: build_urgent_keywords,
    },
    CascadeRule {
        name: "primary_care_keywords",
        danger_override: false,
        matches: match_primary_care_keywords,
        build: build_primary_care_keywords,
    },
    CascadeRule {
        name: "minor_allowlist",
        danger_override: false,
        matches: match_minor_allowlist,
        build: build_minor_allowlist,
    },
    CascadeRule {
        name: "default_primary_care",
        danger_override: false,
        matches: match_always,
        build: build_default,
    },
];

/// First-match-wins driver over the ordered rule table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyCascade;

impl SafetyCascade {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the full cascade. Always yields a verdict: the table ends in
    /// an unconditional PrimaryCare rule.
    pub fn evaluate(&self, text: &str, signals: &ExtractedSignals) -> CascadeVerdict {
        let input = CascadeInput { text, signals };
        let rule = RULES
            .iter()
            .find(|r| (r.matches)(&input))
            .expect("cascade rule table ends in a catch-all rule");
        tracing::debug!(rule = rule.name, "safety cascade matched");
        (rule.build)(&input)
    }

    /// Evaluate only the danger-override subset: the specific Emergency and
    /// Urgent rules that may preempt AI-derived judgment. Generic keyword
    /// tiers and the default do not participate.
    pub fn danger_override(&self, text: &str, signals: &ExtractedSignals) -> Option<CascadeVerdict> {
        let input = CascadeInput { text, signals };
        RULES
            .iter()
            .filter(|r| r.danger_override)
            .find(|r| (r.matches)(&input))
            .map(|rule| {
                tracing::info!(rule = rule.name, "safety cascade override");
                (rule.build)(&input)
            })
    }
}
