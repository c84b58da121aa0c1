//! Safety-first symptom triage core.
//!
//! Classifies free-text symptom descriptions into one of five urgency tiers
//! with a justification, so a care-navigation assistant can direct a person
//! to emergency services, same-day care, a routine visit, or self-care.
//!
//! The pipeline runs one pass per request: gather context, reason with an
//! external oracle, classify on the 5-level ESI scale, synthesize the final
//! recommendation, then persist best-effort. Every stage degrades along a
//! typed ladder, and a deterministic safety cascade can override any
//! AI-derived judgment on sight of specific danger phrases. A fully-local
//! fallback engine guarantees a safe verdict for any non-empty input.
//!
//! Storage, retrieval, and the oracle are constructor-injected capability
//! traits owned by the composition root; the engine itself holds no mutable
//! shared state beyond immutable rule tables.

pub mod cascade;
pub mod collab;
pub mod config;
pub mod context;
pub mod error;
pub mod esi;
pub mod extract;
pub mod fallback;
pub mod model;
pub mod oracle;
pub mod orchestrator;
pub mod patterns;
pub mod prompts;
pub mod reasoning;

// Re-export the core data model.
pub use model::{
    CodedTerm, EsiLevel, NextSteps, ReasoningStep, ResolutionStatus, RetrievedSnippet,
    SymptomRecord, SymptomReport, TriageVerdict, UrgencyLevel,
};

// Re-export the engine surface.
pub use config::TriageConfig;
pub use error::TriageError;
pub use fallback::FallbackTriageEngine;
pub use orchestrator::{PipelineStage, TriageEngine};

// Re-export collaborator capabilities for composition roots.
pub use collab::{
    CollabError, NoopRetrieval, NoopStorage, RetrievalCollaborator, StorageCollaborator,
};
pub use oracle::{HttpOracle, OracleCollaborator, OracleError, OracleReply, UnavailableOracle};

// Re-export the deterministic components for direct use and testing.
pub use cascade::{CascadeVerdict, SafetyCascade};
pub use context::{ContextAggregator, ReasoningContext};
pub use esi::EsiClassifier;
pub use extract::{extract_signals, ExtractedSignals};
pub use reasoning::{fallback_reasoning, ReasoningOutcome, ReasoningProvenance};
