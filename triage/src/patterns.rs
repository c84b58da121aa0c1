//! Shared clinical pattern lexicon: regex tables and keyword vocabularies.
//!
//! Every deterministic component (safety cascade, ESI classifier, fallback
//! reasoning) reads these tables. They are compiled once and immutable for
//! the life of the process, so concurrent requests can share them freely.
//!
//! All predicates expect lowercased input text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("clinical pattern should compile"))
        .collect()
}

/// Cardiac chest symptom patterns, including angina-adjacent phrasing.
const CHEST_PAIN_PATTERNS: &[&str] = &[
    r"chest.*pain",
    r"chest.*discomfort",
    r"chest.*pressure",
    r"chest.*tightness",
    r"chest.*ache",
    r"chest.*burning",
    r"heart.*pain",
    r"cardiac.*pain",
    r"angina",
    r"myocardial",
];

/// Breathing-difficulty patterns. The "breat" variants catch a common typo
/// for "breath" seen in real submissions.
const BREATHING_PATTERNS: &[&str] = &[
    r"shortness.*breath",
    r"short.*breath",
    r"difficulty.*breathing",
    r"trouble.*breathing",
    r"hard.*breathe",
    r"can'?t.*breathe",
    r"cannot.*breathe",
    r"breathless",
    r"dyspnea",
    r"respiratory.*distress",
    r"shortness.*breat",
    r"short.*breat",
];

/// Blood-loss emergency patterns: hemoptysis, hematemesis, and upper-GI
/// bleeding indicators (coffee-ground or tarry stool, melena), including the
/// combined forms with dizziness or weakness.
const BLOOD_EMERGENCY_PATTERNS: &[&str] = &[
    r"cough.*blood",
    r"blood.*cough",
    r"coughing.*blood",
    r"vomit.*blood",
    r"blood.*vomit",
    r"vomiting.*blood",
    r"spit.*blood",
    r"blood.*spit",
    r"spitting.*blood",
    r"hematemesis",
    r"hemoptysis",
    r"bloody.*cough",
    r"blood.*phlegm",
    r"phlegm.*blood",
    r"coffee.*ground.*stool",
    r"stool.*coffee.*ground",
    r"coffee.*ground.*bowel",
    r"black.*tarry.*stool",
    r"tarry.*stool",
    r"melena",
    r"dark.*stool.*dizzy",
    r"black.*stool.*weak",
    r"coffee.*ground.*dizzy",
    r"coffee.*ground.*weak",
    r"bloody.*stool.*dizzy",
    r"bloody.*stool.*weak",
];

/// Danger phrases that force the highest urgency tier on sight. The most
/// specific phrasings come first so they are never shadowed by generic
/// keyword rules downstream.
const DANGER_PHRASE_PATTERNS: &[&str] = &[
    r"worst.*headache.*(?:of.*)?(?:my.*)?life",
    r"worst.*headache.*ever",
    r"headache.*worst.*(?:of.*)?(?:my.*)?life",
    r"thunderclap.*headache",
    r"sudden.*(?:severe|worst).*headache",
    r"crushing.*chest.*pain",
    r"severe.*chest.*pain",
    r"chest.*pain.*radiating",
    r"elephant.*(?:on.*)?chest",
    r"unable.*(?:to.*)?breathe",
    r"gasping.*(?:for.*)?air",
    r"severe.*shortness.*(?:of.*)?breath",
    r"severe.*bleeding",
    r"massive.*bleeding",
    r"loss.*(?:of.*)?consciousness",
    r"unconscious",
    r"seizure",
    r"convulsion",
];

/// Headaches that have persisted for days need same-day evaluation.
const PERSISTENT_HEADACHE_PATTERNS: &[&str] = &[
    r"headache.*(?:for|lasting).*(?:days|weeks)",
    r"(?:persistent|chronic|ongoing).*headache",
    r"headache.*(?:five|5|six|6|seven|7).*days",
    r"throbbing.*headache.*(?:days|weeks)",
    r"severe.*headache.*(?:days|weeks)",
];

/// Strict self-care allow-list. Anchored: the whole trimmed description must
/// be one of these phrases for SelfCare to be reachable at all.
const MINOR_SYMPTOM_PATTERNS: &[&str] = &[
    r"^stuffy nose$",
    r"^runny nose$",
    r"^mild congestion$",
    r"^minor cold symptoms$",
    r"^slight congestion$",
    r"^blocked nose$",
    r"^nasal congestion$",
];

static CHEST_PAIN_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(CHEST_PAIN_PATTERNS));
static BREATHING_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(BREATHING_PATTERNS));
static BLOOD_EMERGENCY_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(BLOOD_EMERGENCY_PATTERNS));
static DANGER_PHRASE_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(DANGER_PHRASE_PATTERNS));
static PERSISTENT_HEADACHE_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(PERSISTENT_HEADACHE_PATTERNS));
static MINOR_SYMPTOM_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(MINOR_SYMPTOM_PATTERNS));

/// Upper-GI bleed indicators, checked in combination with hemodynamic signs.
pub const GI_BLEED_INDICATORS: &[&str] = &["coffee ground", "tarry stool", "black stool", "melena"];

/// Hemodynamic-instability indicators.
pub const HEMODYNAMIC_INDICATORS: &[&str] = &[
    "dizzy",
    "dizziness",
    "weak",
    "weakness",
    "lightheaded",
    "faint",
];

/// Keywords indicating immediate life threat (ESI-1 criteria).
pub const ESI1_KEYWORDS: &[&str] = &[
    "cardiac arrest",
    "not breathing",
    "unresponsive",
    "severe trauma",
    "anaphylaxis",
    "severe allergic reaction",
    "respiratory failure",
    "unconscious",
    "choking",
    "major bleeding",
    "severe burns",
];

/// Keywords indicating a high-risk presentation (ESI-2 criteria).
pub const ESI2_KEYWORDS: &[&str] = &[
    "chest pain",
    "difficulty breathing",
    "severe pain",
    "altered mental status",
    "high fever",
    "severe headache",
    "stroke symptoms",
    "vomiting blood",
    "hematemesis",
    "coughing up blood",
    "hemoptysis",
    "severe bleeding",
    "severe abdominal pain",
    "severe burns",
    "head trauma",
    "seizure",
    "severe allergic reaction",
    "overdose",
    "suicide",
    "severe dehydration",
];

/// Generic emergency vocabulary for the cascade keyword tier.
pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "chest pain",
    "heart attack",
    "stroke",
    "difficulty breathing",
    "can't breathe",
    "severe bleeding",
    "unconscious",
    "unresponsive",
    "severe allergic reaction",
    "suicide",
    "overdose",
    "severe trauma",
    "cannot breathe",
    "choking",
    "vomiting blood",
    "hematemesis",
    "coughing up blood",
    "hemoptysis",
    "severe head injury",
    "seizure",
    "anaphylaxis",
    "cardiac arrest",
    "respiratory failure",
    "severe burns",
    "major trauma",
];

/// Same-day care vocabulary for the cascade keyword tier.
pub const URGENT_KEYWORDS: &[&str] = &[
    "high fever",
    "severe pain",
    "severe headache",
    "broken bone",
    "severe abdominal pain",
    "severe nausea",
    "persistent vomiting",
    "signs of infection",
    "severe diarrhea",
    "dehydration",
    "moderate bleeding",
    "eye injury",
    "severe allergic reaction",
    "mental health crisis",
    "severe depression",
    "panic attack",
];

/// Routine-visit vocabulary for the cascade keyword tier. Deliberately broad
/// ("pain" alone matches): over-triage is the accepted failure direction.
pub const PRIMARY_CARE_KEYWORDS: &[&str] = &[
    "fever",
    "headache",
    "pain",
    "nausea",
    "vomiting",
    "diarrhea",
    "cough",
    "cold symptoms",
    "minor injury",
    "rash",
    "fatigue",
    "mild infection",
    "routine check",
    "medication refill",
];

/// Exact minor-symptom phrases accepted for self-care.
pub const MINOR_SYMPTOMS: &[&str] = &[
    "stuffy nose",
    "runny nose",
    "mild congestion",
    "nasal congestion",
    "blocked nose",
    "minor cold symptoms",
    "slight congestion",
];

/// Terms suggesting two or more ED resources will be needed.
pub const HIGH_RESOURCE_TERMS: &[&str] = &["imaging", "lab work", "specialist", "procedure"];

/// Terms suggesting a single ED resource will be needed.
pub const MEDIUM_RESOURCE_TERMS: &[&str] = &["examination", "medication", "monitoring"];

/// Word-level vocabulary used for keyword-overlap relatedness between a new
/// report and historical records.
pub const MEDICAL_KEYWORDS: &[&str] = &[
    "pain",
    "ache",
    "fever",
    "headache",
    "nausea",
    "vomiting",
    "dizziness",
    "weakness",
    "fatigue",
    "cough",
    "breathing",
    "chest",
    "stomach",
    "abdominal",
    "blood",
    "stool",
    "urine",
    "rash",
    "swelling",
    "joint",
    "muscle",
    "back",
    "neck",
    "throat",
    "ear",
    "eye",
    "nose",
    "mouth",
    "heart",
    "lung",
];

fn any_match(regexes: &[Regex], text: &str) -> bool {
    regexes.iter().any(|re| re.is_match(text))
}

pub fn has_chest_pain(text: &str) -> bool {
    any_match(&CHEST_PAIN_RES, text)
}

pub fn has_breathing_difficulty(text: &str) -> bool {
    any_match(&BREATHING_RES, text)
}

pub fn has_blood_emergency(text: &str) -> bool {
    any_match(&BLOOD_EMERGENCY_RES, text)
}

pub fn has_danger_phrase(text: &str) -> bool {
    any_match(&DANGER_PHRASE_RES, text)
}

pub fn has_persistent_headache(text: &str) -> bool {
    any_match(&PERSISTENT_HEADACHE_RES, text)
}

/// GI-bleed markers together with hemodynamic instability. Neither set alone
/// is enough; the intersection is what signals active blood loss.
pub fn has_gi_bleed_instability(text: &str) -> bool {
    let gi = GI_BLEED_INDICATORS.iter().any(|k| text.contains(k));
    let hemo = HEMODYNAMIC_INDICATORS.iter().any(|k| text.contains(k));
    gi && hemo
}

/// Whether the whole trimmed description is on the minor-symptom allow-list.
pub fn matches_minor_allowlist(text: &str) -> bool {
    let trimmed = text.trim();
    any_match(&MINOR_SYMPTOM_RES, trimmed) || MINOR_SYMPTOMS.contains(&trimmed)
}

/// First keyword from `keywords` found as a substring of `text`.
pub fn first_keyword<'k>(text: &str, keywords: &[&'k str]) -> Option<&'k str> {
    keywords.iter().find(|k| text.contains(*k)).copied()
}

pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    first_keyword(text, keywords).is_some()
}

/// Medical vocabulary words present in the text (exact word match, with
/// surrounding punctuation stripped).
pub fn medical_keywords(text: &str) -> HashSet<&'static str> {
    MEDICAL_KEYWORDS
        .iter()
        .copied()
        .filter(|k| {
            text.split_whitespace()
                .any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *k)
        })
        .collect()
}

/// Whether two symptom texts share at least one medical keyword.
pub fn keyword_overlap(a: &str, b: &str) -> bool {
    let a_words = medical_keywords(a);
    if a_words.is_empty() {
        return false;
    }
    medical_keywords(b).iter().any(|k| a_words.contains(k))
}
