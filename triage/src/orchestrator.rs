//! Multi-stage triage orchestration.
//!
//! One pass per request: GatherContext, Reason, Classify, Synthesize, then a
//! best-effort PersistAndIndex. Before any oracle involvement the safety
//! cascade's danger-override subset is consulted; a hit yields its verdict
//! immediately. A panic anywhere in the staged pipeline is contained and
//! answered with the fallback engine's verdict, so the entry point never
//! fails for valid input.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::cascade::SafetyCascade;
use crate::collab::{RetrievalCollaborator, StorageCollaborator};
use crate::config::TriageConfig;
use crate::context::{ContextAggregator, ReasoningContext};
use crate::error::TriageError;
use crate::esi::EsiClassifier;
use crate::extract::{self, ExtractedSignals};
use crate::fallback::FallbackTriageEngine;
use crate::model::{EsiLevel, NextSteps, SymptomReport, TriageVerdict, UrgencyLevel};
use crate::oracle::{OracleCollaborator, OracleReply};
use crate::prompts;
use crate::reasoning::{self, ReasoningOutcome};

/// Pipeline stages, in execution order. Used for trace labels and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    GatherContext,
    Reason,
    Classify,
    Synthesize,
    PersistAndIndex,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GatherContext => write!(f, "gather_context"),
            Self::Reason => write!(f, "reason"),
            Self::Classify => write!(f, "classify"),
            Self::Synthesize => write!(f, "synthesize"),
            Self::PersistAndIndex => write!(f, "persist_and_index"),
        }
    }
}

/// Which rung of the synthesis ladder produced the final wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SynthesisSource {
    /// Structured oracle recommendation.
    Oracle,
    /// ESI-derived description (oracle output unusable).
    EsiDerived,
    /// Minimal ESI description (oracle call failed).
    Minimal,
}

/// The reasoning orchestrator. Cheap to clone; collaborators are shared
/// handles that must tolerate concurrent use.
#[derive(Clone)]
pub struct TriageEngine {
    storage: Arc<dyn StorageCollaborator>,
    retrieval: Arc<dyn RetrievalCollaborator>,
    oracle: Arc<dyn OracleCollaborator>,
    config: TriageConfig,
}

impl TriageEngine {
    pub fn new(
        storage: Arc<dyn StorageCollaborator>,
        retrieval: Arc<dyn RetrievalCollaborator>,
        oracle: Arc<dyn OracleCollaborator>,
        config: TriageConfig,
    ) -> Self {
        Self {
            storage,
            retrieval,
            oracle,
            config,
        }
    }

    /// Assess one symptom report. The only error is empty input; every other
    /// failure mode resolves to a valid verdict through the ladders.
    pub async fn assess(&self, report: &SymptomReport) -> Result<TriageVerdict, TriageError> {
        let text = report.free_text.trim();
        if text.is_empty() {
            return Err(TriageError::EmptySymptoms);
        }

        tracing::info!(reporter_id = %report.reporter_id, "starting triage assessment");
        let signals = extract::extract_signals(text);
        let lower = text.to_lowercase();

        // Danger phrases override any AI-derived judgment on sight.
        if let Some(hit) = SafetyCascade::new().danger_override(&lower, &signals) {
            let verdict = hit.into_verdict(signals.coded_terms, "Deterministic safety cascade");
            self.persist_and_index(report, &verdict).await;
            return Ok(verdict);
        }

        // Run the staged pipeline in its own task so a panicking collaborator
        // degrades to the fallback verdict instead of unwinding the caller.
        let engine = self.clone();
        let owned_report = report.clone();
        let joined =
            tokio::spawn(async move { engine.run_pipeline(&owned_report, signals).await }).await;

        match joined {
            Ok(verdict) => {
                self.persist_and_index(report, &verdict).await;
                Ok(verdict)
            }
            Err(e) => {
                tracing::error!(error = %e, "pipeline aborted; serving deterministic fallback verdict");
                Ok(FallbackTriageEngine::new().triage(text))
            }
        }
    }

    /// Stages 1 through 4. Infallible by construction: every stage degrades
    /// internally rather than erroring.
    async fn run_pipeline(
        &self,
        report: &SymptomReport,
        signals: ExtractedSignals,
    ) -> TriageVerdict {
        tracing::debug!(stage = %PipelineStage::GatherContext, "pipeline stage");
        let aggregator = ContextAggregator::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.retrieval),
            self.config.clone(),
        );
        let ctx = aggregator.gather(report, signals).await;

        tracing::debug!(stage = %PipelineStage::Reason, "pipeline stage");
        let reasoning = self.reason(&ctx).await;

        tracing::debug!(stage = %PipelineStage::Classify, "pipeline stage");
        let esi = EsiClassifier::new().classify(&ctx.current_symptoms, &reasoning);

        tracing::debug!(stage = %PipelineStage::Synthesize, "pipeline stage");
        self.synthesize(&ctx, esi, reasoning).await
    }

    /// Reason stage: first oracle call, degrading to local rules on failure.
    async fn reason(&self, ctx: &ReasoningContext) -> ReasoningOutcome {
        let prompt = prompts::reasoning_prompt(ctx);
        match self.oracle.generate(&prompt).await {
            Ok(reply) => ReasoningOutcome::from_reply(reply),
            Err(e) => {
                tracing::warn!(error = %e, "oracle reasoning unavailable; using local rules");
                reasoning::fallback_reasoning(&ctx.current_symptoms)
            }
        }
    }

    /// Synthesize stage: second oracle call with a three-rung degradation
    /// ladder. The final urgency never falls below the ESI-mapped tier.
    async fn synthesize(
        &self,
        ctx: &ReasoningContext,
        esi: EsiLevel,
        reasoning: ReasoningOutcome,
    ) -> TriageVerdict {
        let prompt = prompts::synthesis_prompt(&ctx.current_symptoms, esi, &reasoning);
        let reply = self.oracle.generate(&prompt).await;

        let (source, urgency, explanation, confidence, next_steps) = match reply {
            Ok(OracleReply::Structured(value)) => {
                match value
                    .get("urgency_level")
                    .and_then(|u| u.as_str())
                    .and_then(UrgencyLevel::from_label)
                {
                    Some(oracle_urgency) => {
                        let explanation = value
                            .get("explanation")
                            .and_then(|e| e.as_str())
                            .unwrap_or_default()
                            .to_string();
                        let confidence = value
                            .get("confidence")
                            .and_then(|c| c.as_f64())
                            .unwrap_or(0.8);
                        let next_steps = value
                            .get("next_steps")
                            .cloned()
                            .and_then(|v| serde_json::from_value::<NextSteps>(v).ok());
                        (
                            SynthesisSource::Oracle,
                            // Safety floor: never below the ESI-mapped tier.
                            oracle_urgency.max(esi.urgency()),
                            explanation,
                            confidence,
                            next_steps,
                        )
                    }
                    None => esi_derived(esi),
                }
            }
            Ok(OracleReply::Text(_)) => esi_derived(esi),
            Err(e) => {
                tracing::warn!(error = %e, "oracle synthesis unavailable; using minimal ESI description");
                (
                    SynthesisSource::Minimal,
                    esi.urgency(),
                    format!("{}: {}. {}", esi.label(), esi.description(), esi.timeframe()),
                    0.6,
                    None,
                )
            }
        };

        tracing::info!(
            urgency = %urgency,
            esi = %esi,
            source = ?source,
            "triage verdict synthesized"
        );

        TriageVerdict {
            urgency_level: urgency,
            explanation,
            confidence: confidence.clamp(0.0, 1.0),
            esi_level: esi,
            coded_terms: ctx.signals.coded_terms.clone(),
            reasoning_trace: reasoning.steps,
            next_steps,
            assessed_at: Utc::now(),
        }
    }

    /// Best-effort persistence and indexing. Failures are logged, never
    /// propagated.
    async fn persist_and_index(&self, report: &SymptomReport, verdict: &TriageVerdict) {
        tracing::debug!(stage = %PipelineStage::PersistAndIndex, "pipeline stage");
        if let Err(e) = self.storage.save(report, verdict).await {
            tracing::warn!(error = %e, "verdict save failed");
        }
        let metadata = json!({
            "urgency_level": verdict.urgency_level,
            "esi_classification": verdict.esi_level,
            "confidence": verdict.confidence,
            "assessed_at": verdict.assessed_at,
        });
        if let Err(e) = self
            .retrieval
            .add_document(Some(&report.reporter_id), &report.free_text, metadata)
            .await
        {
            tracing::warn!(error = %e, "verdict indexing failed");
        }
    }
}

fn esi_derived(
    esi: EsiLevel,
) -> (
    SynthesisSource,
    UrgencyLevel,
    String,
    f64,
    Option<NextSteps>,
) {
    (
        SynthesisSource::EsiDerived,
        esi.urgency(),
        format!(
            "Based on ESI classification {}: {}",
            esi.label(),
            esi.description()
        ),
        0.7,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{NoopRetrieval, NoopStorage};
    use crate::oracle::UnavailableOracle;

    fn offline_engine() -> TriageEngine {
        TriageEngine::new(
            Arc::new(NoopStorage),
            Arc::new(NoopRetrieval),
            Arc::new(UnavailableOracle),
            TriageConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_pipeline() {
        let engine = offline_engine();
        let report = SymptomReport::new("r1", "   ");
        assert_eq!(
            engine.assess(&report).await.unwrap_err(),
            TriageError::EmptySymptoms
        );
    }

    #[tokio::test]
    async fn test_danger_override_bypasses_oracle() {
        let engine = offline_engine();
        let report = SymptomReport::new("r1", "I have chest pain and shortness of breath");
        let verdict = engine.assess(&report).await.unwrap();
        assert_eq!(verdict.urgency_level, UrgencyLevel::Emergency);
        assert_eq!(verdict.esi_level, EsiLevel::Resuscitation);
        assert!(verdict.confidence >= 0.95);
        assert!(verdict.reasoning_trace[0]
            .analysis
            .contains("Deterministic safety cascade"));
    }

    #[tokio::test]
    async fn test_offline_minimal_ladder() {
        let engine = offline_engine();
        let report = SymptomReport::new("r1", "I have a mild headache");
        let verdict = engine.assess(&report).await.unwrap();
        assert_eq!(verdict.urgency_level, UrgencyLevel::PrimaryCare);
        assert_eq!(verdict.esi_level, EsiLevel::LessUrgent);
        assert!((verdict.confidence - 0.6).abs() < 1e-9);
        assert!(verdict.explanation.contains("ESI-4"));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(PipelineStage::GatherContext.to_string(), "gather_context");
        assert_eq!(PipelineStage::PersistAndIndex.to_string(), "persist_and_index");
    }
}
