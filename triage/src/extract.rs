//! Structured signal extraction from raw symptom text.
//!
//! Pure functions: the same text always yields the same coded terms and the
//! same normalized temperature.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::CodedTerm;

/// SNOMED CT vocabulary for coded-term lookup. Matched case-insensitively as
/// substrings, in table order.
const SNOMED_VOCABULARY: &[(&str, &str)] = &[
    // Cardiovascular
    ("chest pain", "29857009"),
    ("shortness of breath", "267036007"),
    ("palpitations", "80313002"),
    ("dizziness", "404640003"),
    // Respiratory
    ("cough", "49727002"),
    ("wheezing", "56018004"),
    ("difficulty breathing", "267036007"),
    // Neurological
    ("headache", "25064002"),
    ("confusion", "40917007"),
    ("seizure", "91175000"),
    ("weakness", "13791008"),
    // Gastrointestinal
    ("nausea", "422587007"),
    ("vomiting", "422400008"),
    ("abdominal pain", "21522001"),
    ("diarrhea", "62315008"),
    // General
    ("fever", "386661006"),
    ("fatigue", "84229001"),
    ("pain", "22253000"),
];

/// Temperature patterns in fixed priority order; the first pattern that
/// yields a plausible reading wins. Unit-suffixed forms precede the looser
/// "fever of" / "temperature" phrasings.
const TEMPERATURE_PATTERNS: &[&str] = &[
    r"(\d+(?:\.\d+)?)\s*(?:degrees?\s*)?(?:fahrenheit|f)\b",
    r"(\d+(?:\.\d+)?)\s*°\s*f\b",
    r"(\d+(?:\.\d+)?)\s*f\b",
    r"(\d+(?:\.\d+)?)\s*°\s*c\b",
    r"(\d+(?:\.\d+)?)\s*(?:degrees?\s*)?(?:celsius|c)\b",
    r"fever\s+of\s+(\d+(?:\.\d+)?)",
    r"temperature\s+(?:of\s+)?(\d+(?:\.\d+)?)",
    r"(\d+(?:\.\d+)?)\s*degrees?",
];

static TEMPERATURE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TEMPERATURE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("temperature pattern should compile"))
        .collect()
});

/// Structured signals pulled from a symptom description.
#[derive(Debug, Clone, Default)]
pub struct ExtractedSignals {
    pub coded_terms: Vec<CodedTerm>,
    /// Normalized body temperature in Fahrenheit, when one was stated.
    pub temperature_f: Option<f64>,
}

/// Extract all structured signals from raw text.
pub fn extract_signals(text: &str) -> ExtractedSignals {
    ExtractedSignals {
        coded_terms: extract_coded_terms(text),
        temperature_f: extract_temperature(text),
    }
}

/// Coded terms recognized in the text, in vocabulary order.
pub fn extract_coded_terms(text: &str) -> Vec<CodedTerm> {
    let lower = text.to_lowercase();
    SNOMED_VOCABULARY
        .iter()
        .filter(|(term, _)| lower.contains(term))
        .map(|(term, code)| CodedTerm::new(*term, *code))
        .collect()
}

/// Extract a stated body temperature, normalized to Fahrenheit.
///
/// Values above 80 are taken as Fahrenheit as-is; values strictly between 35
/// and 45 are taken as Celsius and converted; anything else is implausible
/// as a body temperature and the next pattern is tried.
pub fn extract_temperature(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    for re in TEMPERATURE_RES.iter() {
        let Some(raw) = re
            .captures(&lower)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
        else {
            continue;
        };
        if raw > 80.0 {
            return Some(raw);
        }
        if raw > 35.0 && raw < 45.0 {
            return Some(raw * 9.0 / 5.0 + 32.0);
        }
    }
    None
}
