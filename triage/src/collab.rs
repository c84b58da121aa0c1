//! Collaborator capability traits for storage and retrieval backends.
//!
//! The engine owns no persistence. Both capabilities are constructor-injected
//! trait objects so composition roots can wire real backends and tests can
//! wire doubles. Every failure is a typed error the pipeline recovers from;
//! nothing here ever aborts a triage request.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    ResolutionStatus, RetrievedSnippet, SymptomRecord, SymptomReport, TriageVerdict,
};

/// Errors surfaced by storage or retrieval collaborators. The pipeline
/// treats all of them as "degrade to empty", never as request failures.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator backend error: {0}")]
    Backend(String),

    #[error("collaborator request timed out")]
    Timeout,
}

/// Historical symptom storage. Lists are ordered newest first.
#[async_trait]
pub trait StorageCollaborator: Send + Sync {
    /// Most recent assessments for a reporter.
    async fn recent_history(
        &self,
        reporter_id: &str,
        limit: usize,
    ) -> Result<Vec<SymptomRecord>, CollabError>;

    /// Assessments whose resolution status is one of `statuses`.
    async fn unresolved(
        &self,
        reporter_id: &str,
        limit: usize,
        statuses: &[ResolutionStatus],
    ) -> Result<Vec<SymptomRecord>, CollabError>;

    /// Candidate related assessments within the recency window. The engine
    /// applies keyword-overlap filtering on top of what is returned.
    async fn find_related(
        &self,
        reporter_id: &str,
        text: &str,
        days_back: i64,
    ) -> Result<Vec<SymptomRecord>, CollabError>;

    /// Persist a completed verdict. Best-effort from the engine's side.
    async fn save(
        &self,
        report: &SymptomReport,
        verdict: &TriageVerdict,
    ) -> Result<(), CollabError>;
}

/// Vector-similarity retrieval over reference material and case history.
#[async_trait]
pub trait RetrievalCollaborator: Send + Sync {
    /// Reference snippets relevant to the query, most similar first.
    async fn search_reference(
        &self,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<RetrievedSnippet>, CollabError>;

    /// Similar historical cases for this reporter, most similar first.
    async fn search_similar_history(
        &self,
        reporter_id: &str,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<RetrievedSnippet>, CollabError>;

    /// Index a document for future similarity search; returns its id.
    async fn add_document(
        &self,
        reporter_id: Option<&str>,
        text: &str,
        metadata: serde_json::Value,
    ) -> Result<String, CollabError>;
}

/// Storage double that remembers nothing. Useful for composition roots
/// without a database and for exercising the degraded-context paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorage;

#[async_trait]
impl StorageCollaborator for NoopStorage {
    async fn recent_history(
        &self,
        _reporter_id: &str,
        _limit: usize,
    ) -> Result<Vec<SymptomRecord>, CollabError> {
        Ok(Vec::new())
    }

    async fn unresolved(
        &self,
        _reporter_id: &str,
        _limit: usize,
        _statuses: &[ResolutionStatus],
    ) -> Result<Vec<SymptomRecord>, CollabError> {
        Ok(Vec::new())
    }

    async fn find_related(
        &self,
        _reporter_id: &str,
        _text: &str,
        _days_back: i64,
    ) -> Result<Vec<SymptomRecord>, CollabError> {
        Ok(Vec::new())
    }

    async fn save(
        &self,
        _report: &SymptomReport,
        _verdict: &TriageVerdict,
    ) -> Result<(), CollabError> {
        Ok(())
    }
}

/// Retrieval double that finds nothing and acknowledges writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRetrieval;

#[async_trait]
impl RetrievalCollaborator for NoopRetrieval {
    async fn search_reference(
        &self,
        _query: &str,
        _top_n: usize,
    ) -> Result<Vec<RetrievedSnippet>, CollabError> {
        Ok(Vec::new())
    }

    async fn search_similar_history(
        &self,
        _reporter_id: &str,
        _query: &str,
        _top_n: usize,
    ) -> Result<Vec<RetrievedSnippet>, CollabError> {
        Ok(Vec::new())
    }

    async fn add_document(
        &self,
        _reporter_id: Option<&str>,
        _text: &str,
        _metadata: serde_json::Value,
    ) -> Result<String, CollabError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_storage_is_empty_and_acks() {
        let storage = NoopStorage;
        assert!(storage.recent_history("r1", 10).await.unwrap().is_empty());
        assert!(storage
            .unresolved("r1", 5, ResolutionStatus::open_statuses())
            .await
            .unwrap()
            .is_empty());
        assert!(storage
            .find_related("r1", "chest pain", 30)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_noop_retrieval_returns_ids() {
        let retrieval = NoopRetrieval;
        assert!(retrieval
            .search_reference("fever", 5)
            .await
            .unwrap()
            .is_empty());
        let id = retrieval
            .add_document(Some("r1"), "fever", serde_json::json!({}))
            .await
            .unwrap();
        assert!(!id.is_empty());
    }

    #[test]
    fn test_collab_error_display() {
        assert_eq!(
            CollabError::Unavailable("no socket".into()).to_string(),
            "collaborator unavailable: no socket"
        );
        assert_eq!(
            CollabError::Timeout.to_string(),
            "collaborator request timed out"
        );
    }
}
