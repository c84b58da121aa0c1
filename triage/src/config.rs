//! Engine configuration: context-gathering limits and oracle settings.

/// Tunables for a triage engine instance. Immutable after construction.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// How many recent assessments to pull into context.
    pub history_limit: usize,
    /// How many unresolved assessments to pull into context.
    pub unresolved_limit: usize,
    /// Recency window for related-history lookups, in days.
    pub related_days_back: i64,
    /// How many reference snippets to retrieve.
    pub reference_top_n: usize,
    /// How many similar historical cases to retrieve.
    pub similar_cases_top_n: usize,
    /// Oracle chat-completions endpoint.
    pub oracle_base_url: String,
    /// Oracle model identifier.
    pub oracle_model: String,
    /// Token cap per oracle call.
    pub oracle_max_tokens: u32,
    /// Hard timeout per oracle call, in seconds.
    pub oracle_timeout_secs: u64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            unresolved_limit: 5,
            related_days_back: 30,
            reference_top_n: 5,
            similar_cases_top_n: 3,
            oracle_base_url: "https://api.together.xyz/v1/chat/completions".to_string(),
            oracle_model: "mistralai/Mistral-7B-Instruct-v0.1".to_string(),
            oracle_max_tokens: 1000,
            oracle_timeout_secs: 30,
        }
    }
}

impl TriageConfig {
    /// Read overrides from `TRIAGE_ORACLE_URL`, `TRIAGE_ORACLE_MODEL`, and
    /// `TRIAGE_ORACLE_TIMEOUT_SECS` on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("TRIAGE_ORACLE_URL") {
            if !url.trim().is_empty() {
                config.oracle_base_url = url;
            }
        }
        if let Ok(model) = std::env::var("TRIAGE_ORACLE_MODEL") {
            if !model.trim().is_empty() {
                config.oracle_model = model;
            }
        }
        if let Ok(secs) = std::env::var("TRIAGE_ORACLE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.oracle_timeout_secs = secs;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.unresolved_limit, 5);
        assert_eq!(config.related_days_back, 30);
        assert_eq!(config.reference_top_n, 5);
        assert_eq!(config.similar_cases_top_n, 3);
        assert_eq!(config.oracle_timeout_secs, 30);
    }
}
