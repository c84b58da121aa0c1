//! Context aggregation: merge current symptoms with history and reference
//! material into a single reasoning bundle.
//!
//! Sub-fetches run concurrently and fail independently. A collaborator
//! outage degrades its slice to empty; the stage itself never fails, so
//! partial context is always usable downstream.

use std::sync::Arc;

use crate::collab::{RetrievalCollaborator, StorageCollaborator};
use crate::config::TriageConfig;
use crate::extract::ExtractedSignals;
use crate::model::{ResolutionStatus, RetrievedSnippet, SymptomRecord, SymptomReport};
use crate::patterns;

/// Everything the reasoning stage sees for one request. Built fresh per
/// request, never persisted.
#[derive(Debug, Clone)]
pub struct ReasoningContext {
    pub current_symptoms: String,
    pub recent_history: Vec<SymptomRecord>,
    pub unresolved_history: Vec<SymptomRecord>,
    pub related_history: Vec<SymptomRecord>,
    pub reference_snippets: Vec<RetrievedSnippet>,
    pub similar_case_snippets: Vec<RetrievedSnippet>,
    pub signals: ExtractedSignals,
}

/// Gathers context from the storage and retrieval collaborators.
pub struct ContextAggregator {
    storage: Arc<dyn StorageCollaborator>,
    retrieval: Arc<dyn RetrievalCollaborator>,
    config: TriageConfig,
}

impl ContextAggregator {
    pub fn new(
        storage: Arc<dyn StorageCollaborator>,
        retrieval: Arc<dyn RetrievalCollaborator>,
        config: TriageConfig,
    ) -> Self {
        Self {
            storage,
            retrieval,
            config,
        }
    }

    /// Build the reasoning bundle for one report. Each sub-fetch failure is
    /// logged and degrades to an empty slice.
    pub async fn gather(&self, report: &SymptomReport, signals: ExtractedSignals) -> ReasoningContext {
        let reporter = report.reporter_id.as_str();
        let text = report.free_text.as_str();

        let (recent, unresolved, related, reference) = tokio::join!(
            self.storage.recent_history(reporter, self.config.history_limit),
            self.storage.unresolved(
                reporter,
                self.config.unresolved_limit,
                ResolutionStatus::open_statuses(),
            ),
            self.storage
                .find_related(reporter, text, self.config.related_days_back),
            self.retrieval
                .search_reference(text, self.config.reference_top_n),
        );

        let recent_history = or_empty(recent, "recent history");
        let unresolved_history = or_empty(unresolved, "unresolved history");
        let related_history = filter_related(text, or_empty(related, "related history"));
        let reference_snippets = or_empty(reference, "reference snippets");

        // Similar-case lookup is only meaningful for reporters with history.
        let similar_case_snippets = if recent_history.is_empty() {
            Vec::new()
        } else {
            or_empty(
                self.retrieval
                    .search_similar_history(reporter, text, self.config.similar_cases_top_n)
                    .await,
                "similar cases",
            )
        };

        ReasoningContext {
            current_symptoms: text.to_string(),
            recent_history,
            unresolved_history,
            related_history,
            reference_snippets,
            similar_case_snippets,
            signals,
        }
    }
}

fn or_empty<T, E: std::fmt::Display>(result: Result<Vec<T>, E>, slice: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(slice, error = %e, "context sub-fetch failed; continuing with empty slice");
            Vec::new()
        }
    }
}

/// Keep only candidates sharing at least one medical keyword with the
/// current report, capped at five.
fn filter_related(text: &str, candidates: Vec<SymptomRecord>) -> Vec<SymptomRecord> {
    let lower = text.to_lowercase();
    candidates
        .into_iter()
        .filter(|r| patterns::keyword_overlap(&lower, &r.free_text.to_lowercase()))
        .take(5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{CollabError, NoopRetrieval, NoopStorage};
    use crate::extract::extract_signals;
    use crate::model::{EsiLevel, TriageVerdict, UrgencyLevel};
    use async_trait::async_trait;
    use chrono::Utc;

    fn record(id: &str, text: &str) -> SymptomRecord {
        SymptomRecord {
            id: id.to_string(),
            reporter_id: "r1".to_string(),
            free_text: text.to_string(),
            urgency_level: UrgencyLevel::PrimaryCare,
            esi_level: Some(EsiLevel::LessUrgent),
            confidence: Some(0.7),
            explanation: "previous assessment".to_string(),
            resolution_status: crate::model::ResolutionStatus::Ongoing,
            recorded_at: Utc::now(),
        }
    }

    struct FailingStorage;

    #[async_trait]
    impl StorageCollaborator for FailingStorage {
        async fn recent_history(
            &self,
            _: &str,
            _: usize,
        ) -> Result<Vec<SymptomRecord>, CollabError> {
            Err(CollabError::Unavailable("db down".into()))
        }
        async fn unresolved(
            &self,
            _: &str,
            _: usize,
            _: &[ResolutionStatus],
        ) -> Result<Vec<SymptomRecord>, CollabError> {
            Err(CollabError::Timeout)
        }
        async fn find_related(
            &self,
            _: &str,
            _: &str,
            _: i64,
        ) -> Result<Vec<SymptomRecord>, CollabError> {
            Err(CollabError::Backend("query failed".into()))
        }
        async fn save(&self, _: &SymptomReport, _: &TriageVerdict) -> Result<(), CollabError> {
            Err(CollabError::Unavailable("db down".into()))
        }
    }

    struct RelatedStorage;

    #[async_trait]
    impl StorageCollaborator for RelatedStorage {
        async fn recent_history(
            &self,
            _: &str,
            _: usize,
        ) -> Result<Vec<SymptomRecord>, CollabError> {
            Ok(vec![record("h1", "chest tightness last month")])
        }
        async fn unresolved(
            &self,
            _: &str,
            _: usize,
            _: &[ResolutionStatus],
        ) -> Result<Vec<SymptomRecord>, CollabError> {
            Ok(Vec::new())
        }
        async fn find_related(
            &self,
            _: &str,
            _: &str,
            _: i64,
        ) -> Result<Vec<SymptomRecord>, CollabError> {
            Ok(vec![
                record("rel1", "chest pressure during exercise"),
                record("rel2", "sprained ankle"),
            ])
        }
        async fn save(&self, _: &SymptomReport, _: &TriageVerdict) -> Result<(), CollabError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_gather_degrades_to_empty_slices() {
        let aggregator = ContextAggregator::new(
            Arc::new(FailingStorage),
            Arc::new(NoopRetrieval),
            TriageConfig::default(),
        );
        let report = SymptomReport::new("r1", "mild headache");
        let ctx = aggregator
            .gather(&report, extract_signals(&report.free_text))
            .await;
        assert!(ctx.recent_history.is_empty());
        assert!(ctx.unresolved_history.is_empty());
        assert!(ctx.related_history.is_empty());
        assert!(ctx.reference_snippets.is_empty());
        assert!(ctx.similar_case_snippets.is_empty());
        assert_eq!(ctx.current_symptoms, "mild headache");
    }

    #[tokio::test]
    async fn test_related_filtered_by_keyword_overlap() {
        let aggregator = ContextAggregator::new(
            Arc::new(RelatedStorage),
            Arc::new(NoopRetrieval),
            TriageConfig::default(),
        );
        let report = SymptomReport::new("r1", "sharp chest pain");
        let ctx = aggregator
            .gather(&report, extract_signals(&report.free_text))
            .await;
        // Only the chest-related record shares a medical keyword.
        assert_eq!(ctx.related_history.len(), 1);
        assert_eq!(ctx.related_history[0].id, "rel1");
    }

    #[tokio::test]
    async fn test_similar_cases_skipped_without_history() {
        let aggregator = ContextAggregator::new(
            Arc::new(NoopStorage),
            Arc::new(NoopRetrieval),
            TriageConfig::default(),
        );
        let report = SymptomReport::new("r1", "mild headache");
        let ctx = aggregator
            .gather(&report, extract_signals(&report.free_text))
            .await;
        assert!(ctx.similar_case_snippets.is_empty());
    }
}
