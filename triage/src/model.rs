//! Core triage data model: urgency tiers, ESI acuity levels, reports,
//! verdicts, and reasoning traces.
//!
//! The five urgency tiers and five ESI levels are closed sets. Every ESI
//! level maps to exactly one urgency tier, and no code path may produce a
//! verdict without an urgency level.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Where the system directs the patient. Totally ordered by severity:
/// `SelfCare < Telehealth < PrimaryCare < Urgent < Emergency`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum UrgencyLevel {
    #[serde(rename = "Self-Care")]
    SelfCare,
    #[serde(rename = "Telehealth")]
    Telehealth,
    #[serde(rename = "Primary Care")]
    PrimaryCare,
    #[serde(rename = "Urgent")]
    Urgent,
    #[serde(rename = "Emergency")]
    Emergency,
}

impl UrgencyLevel {
    /// The wire label for this tier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Urgent => "Urgent",
            Self::PrimaryCare => "Primary Care",
            Self::Telehealth => "Telehealth",
            Self::SelfCare => "Self-Care",
        }
    }

    /// Parse an urgency label leniently (case and separator insensitive),
    /// as oracle output does not always match the wire form exactly.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "emergency" => Some(Self::Emergency),
            "urgent" => Some(Self::Urgent),
            "primarycare" => Some(Self::PrimaryCare),
            "telehealth" => Some(Self::Telehealth),
            "selfcare" => Some(Self::SelfCare),
            _ => None,
        }
    }

    /// All tiers, most severe first.
    pub fn all() -> &'static [UrgencyLevel] {
        &[
            Self::Emergency,
            Self::Urgent,
            Self::PrimaryCare,
            Self::Telehealth,
            Self::SelfCare,
        ]
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Emergency Severity Index acuity level, 1 = most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EsiLevel {
    /// ESI-1: Resuscitation.
    #[serde(rename = "ESI-1")]
    Resuscitation,
    /// ESI-2: Emergent.
    #[serde(rename = "ESI-2")]
    Emergent,
    /// ESI-3: Urgent.
    #[serde(rename = "ESI-3")]
    Urgent,
    /// ESI-4: Less urgent.
    #[serde(rename = "ESI-4")]
    LessUrgent,
    /// ESI-5: Non-urgent.
    #[serde(rename = "ESI-5")]
    NonUrgent,
}

impl EsiLevel {
    /// The wire label ("ESI-1" .. "ESI-5").
    pub fn label(self) -> &'static str {
        match self {
            Self::Resuscitation => "ESI-1",
            Self::Emergent => "ESI-2",
            Self::Urgent => "ESI-3",
            Self::LessUrgent => "ESI-4",
            Self::NonUrgent => "ESI-5",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Resuscitation => {
                "Resuscitation - Life-threatening conditions requiring immediate intervention"
            }
            Self::Emergent => "Emergent - High-risk situations requiring rapid assessment",
            Self::Urgent => "Urgent - Stable but requiring multiple resources",
            Self::LessUrgent => {
                "Less urgent - Stable, requiring one resource or primary care evaluation"
            }
            Self::NonUrgent => "Non-urgent - Minor symptoms manageable with self-care",
        }
    }

    /// The single urgency tier this acuity level maps to.
    pub fn urgency(self) -> UrgencyLevel {
        match self {
            Self::Resuscitation | Self::Emergent => UrgencyLevel::Emergency,
            Self::Urgent => UrgencyLevel::Urgent,
            Self::LessUrgent => UrgencyLevel::PrimaryCare,
            Self::NonUrgent => UrgencyLevel::SelfCare,
        }
    }

    /// Service timeframe guidance for this level.
    pub fn timeframe(self) -> &'static str {
        match self {
            Self::Resuscitation => "Immediate (0 minutes)",
            Self::Emergent => "Immediate (within 10 minutes)",
            Self::Urgent => "Within 30 minutes",
            Self::LessUrgent => "Within 1-2 hours or primary care appointment",
            Self::NonUrgent => "Self-care appropriate, monitor symptoms",
        }
    }

    /// Example conditions typically triaged at this level.
    pub fn example_conditions(self) -> &'static [&'static str] {
        match self {
            Self::Resuscitation => &[
                "cardiac arrest",
                "respiratory failure",
                "severe trauma",
                "anaphylaxis",
            ],
            Self::Emergent => &[
                "chest pain with cardiac risk",
                "severe difficulty breathing",
                "altered mental status",
                "severe pain",
            ],
            Self::Urgent => &[
                "moderate pain",
                "fever with concerning symptoms",
                "minor trauma requiring imaging",
            ],
            Self::LessUrgent => &[
                "minor injuries",
                "simple infections",
                "routine follow-up",
                "persistent symptoms",
            ],
            Self::NonUrgent => &[
                "stuffy nose",
                "minor cold symptoms",
                "mild congestion",
                "minor skin irritation",
            ],
        }
    }

    /// All five levels, most severe first.
    pub fn all() -> &'static [EsiLevel] {
        &[
            Self::Resuscitation,
            Self::Emergent,
            Self::Urgent,
            Self::LessUrgent,
            Self::NonUrgent,
        ]
    }

    /// Whether pairing this acuity level with `urgency` is a valid verdict.
    ///
    /// The urgency may never fall below the level's mapped tier, with one
    /// exception: deterministic ESI-2 rules (high fever, persistent
    /// headache) direct to Urgent rather than Emergency.
    pub fn permits(self, urgency: UrgencyLevel) -> bool {
        urgency >= self.urgency() || (self == Self::Emergent && urgency == UrgencyLevel::Urgent)
    }
}

impl std::fmt::Display for EsiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A free-text symptom report. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomReport {
    pub reporter_id: String,
    pub free_text: String,
    pub submitted_at: DateTime<Utc>,
}

impl SymptomReport {
    pub fn new(reporter_id: impl Into<String>, free_text: impl Into<String>) -> Self {
        Self {
            reporter_id: reporter_id.into(),
            free_text: free_text.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// A controlled-vocabulary code attached to a recognized clinical term.
/// Serializes on the wire as `"term:code"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodedTerm {
    pub term: String,
    pub code: String,
}

impl CodedTerm {
    pub fn new(term: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            code: code.into(),
        }
    }
}

impl std::fmt::Display for CodedTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.term, self.code)
    }
}

impl Serialize for CodedTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CodedTerm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let (term, code) = raw
            .split_once(':')
            .ok_or_else(|| D::Error::custom("coded term must be \"term:code\""))?;
        Ok(CodedTerm::new(term, code))
    }
}

/// One ordered entry in the reasoning trace carried into the final verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub step: u32,
    pub analysis: String,
    pub findings: String,
}

impl ReasoningStep {
    pub fn new(step: u32, analysis: impl Into<String>, findings: impl Into<String>) -> Self {
        Self {
            step,
            analysis: analysis.into(),
            findings: findings.into(),
        }
    }
}

/// Concrete follow-up guidance, present only when the oracle supplies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextSteps {
    pub action: String,
    pub timeframe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
}

/// The final triage verdict. Created once per request and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageVerdict {
    pub urgency_level: UrgencyLevel,
    pub explanation: String,
    /// Confidence in the verdict, clamped to `[0.0, 1.0]`.
    pub confidence: f64,
    #[serde(rename = "esi_classification")]
    pub esi_level: EsiLevel,
    pub coded_terms: Vec<CodedTerm>,
    #[serde(rename = "reasoning_chain")]
    pub reasoning_trace: Vec<ReasoningStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<NextSteps>,
    pub assessed_at: DateTime<Utc>,
}

/// Resolution state of a historical symptom record. Ongoing, Worsened, and
/// Unknown count as open for unresolved-history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionStatus {
    Ongoing,
    Worsened,
    Resolved,
    Unknown,
}

impl ResolutionStatus {
    pub fn open_statuses() -> &'static [ResolutionStatus] {
        &[Self::Ongoing, Self::Worsened, Self::Unknown]
    }

    pub fn is_open(self) -> bool {
        self != Self::Resolved
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ongoing => write!(f, "Ongoing"),
            Self::Worsened => write!(f, "Worsened"),
            Self::Resolved => write!(f, "Resolved"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A persisted historical assessment, as returned by the storage
/// collaborator (newest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub id: String,
    pub reporter_id: String,
    pub free_text: String,
    pub urgency_level: UrgencyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esi_level: Option<EsiLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub explanation: String,
    pub resolution_status: ResolutionStatus,
    pub recorded_at: DateTime<Utc>,
}

/// A snippet returned by the retrieval collaborator. Lower distance means
/// more similar; there is no absolute numeric contract across backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_total_order() {
        assert!(UrgencyLevel::Emergency > UrgencyLevel::Urgent);
        assert!(UrgencyLevel::Urgent > UrgencyLevel::PrimaryCare);
        assert!(UrgencyLevel::PrimaryCare > UrgencyLevel::Telehealth);
        assert!(UrgencyLevel::Telehealth > UrgencyLevel::SelfCare);
        assert_eq!(UrgencyLevel::all().len(), 5);
    }

    #[test]
    fn test_urgency_wire_strings() {
        let json = serde_json::to_string(&UrgencyLevel::PrimaryCare).unwrap();
        assert_eq!(json, "\"Primary Care\"");
        let parsed: UrgencyLevel = serde_json::from_str("\"Self-Care\"").unwrap();
        assert_eq!(parsed, UrgencyLevel::SelfCare);
    }

    #[test]
    fn test_urgency_from_label_lenient() {
        assert_eq!(
            UrgencyLevel::from_label("Primary Care"),
            Some(UrgencyLevel::PrimaryCare)
        );
        assert_eq!(
            UrgencyLevel::from_label("primary-care"),
            Some(UrgencyLevel::PrimaryCare)
        );
        assert_eq!(
            UrgencyLevel::from_label(" self care "),
            Some(UrgencyLevel::SelfCare)
        );
        assert_eq!(UrgencyLevel::from_label("EMERGENCY"), Some(UrgencyLevel::Emergency));
        assert_eq!(UrgencyLevel::from_label("routine"), None);
    }

    #[test]
    fn test_esi_maps_to_exactly_one_urgency() {
        assert_eq!(EsiLevel::all().len(), 5);
        for level in EsiLevel::all() {
            // Calling urgency() is total; every level has exactly one mapping.
            let urgency = level.urgency();
            assert!(level.permits(urgency));
        }
        assert_eq!(EsiLevel::Resuscitation.urgency(), UrgencyLevel::Emergency);
        assert_eq!(EsiLevel::Emergent.urgency(), UrgencyLevel::Emergency);
        assert_eq!(EsiLevel::Urgent.urgency(), UrgencyLevel::Urgent);
        assert_eq!(EsiLevel::LessUrgent.urgency(), UrgencyLevel::PrimaryCare);
        assert_eq!(EsiLevel::NonUrgent.urgency(), UrgencyLevel::SelfCare);
    }

    #[test]
    fn test_esi_wire_labels() {
        assert_eq!(EsiLevel::Resuscitation.label(), "ESI-1");
        assert_eq!(EsiLevel::NonUrgent.label(), "ESI-5");
        let json = serde_json::to_string(&EsiLevel::LessUrgent).unwrap();
        assert_eq!(json, "\"ESI-4\"");
        let parsed: EsiLevel = serde_json::from_str("\"ESI-2\"").unwrap();
        assert_eq!(parsed, EsiLevel::Emergent);
    }

    #[test]
    fn test_esi_permits_consistency_relation() {
        assert!(EsiLevel::Resuscitation.permits(UrgencyLevel::Emergency));
        assert!(!EsiLevel::Resuscitation.permits(UrgencyLevel::Urgent));
        // ESI-2 deterministic rules may direct to Urgent instead of Emergency.
        assert!(EsiLevel::Emergent.permits(UrgencyLevel::Urgent));
        assert!(!EsiLevel::Emergent.permits(UrgencyLevel::PrimaryCare));
        assert!(EsiLevel::LessUrgent.permits(UrgencyLevel::PrimaryCare));
        assert!(!EsiLevel::LessUrgent.permits(UrgencyLevel::SelfCare));
        assert!(EsiLevel::NonUrgent.permits(UrgencyLevel::SelfCare));
    }

    #[test]
    fn test_coded_term_wire_shape() {
        let term = CodedTerm::new("chest pain", "29857009");
        assert_eq!(term.to_string(), "chest pain:29857009");
        let json = serde_json::to_string(&term).unwrap();
        assert_eq!(json, "\"chest pain:29857009\"");
        let parsed: CodedTerm = serde_json::from_str("\"fever:386661006\"").unwrap();
        assert_eq!(parsed, CodedTerm::new("fever", "386661006"));
        assert!(serde_json::from_str::<CodedTerm>("\"no-separator\"").is_err());
    }

    #[test]
    fn test_verdict_wire_shape() {
        let verdict = TriageVerdict {
            urgency_level: UrgencyLevel::PrimaryCare,
            explanation: "See a provider".to_string(),
            confidence: 0.6,
            esi_level: EsiLevel::LessUrgent,
            coded_terms: vec![CodedTerm::new("headache", "25064002")],
            reasoning_trace: vec![ReasoningStep::new(1, "Keyword analysis", "headache")],
            next_steps: None,
            assessed_at: Utc::now(),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["urgency_level"], "Primary Care");
        assert_eq!(json["esi_classification"], "ESI-4");
        assert_eq!(json["coded_terms"][0], "headache:25064002");
        assert_eq!(json["reasoning_chain"][0]["step"], 1);
        assert!(json.get("next_steps").is_none());
    }

    #[test]
    fn test_open_statuses() {
        assert!(ResolutionStatus::Ongoing.is_open());
        assert!(ResolutionStatus::Worsened.is_open());
        assert!(ResolutionStatus::Unknown.is_open());
        assert!(!ResolutionStatus::Resolved.is_open());
        assert_eq!(ResolutionStatus::open_statuses().len(), 3);
    }
}
