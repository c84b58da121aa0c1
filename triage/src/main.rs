//! Command-line composition root for one-off triage assessments.
//!
//! Wires the engine with no-op storage/retrieval collaborators and, when
//! credentials are present, the HTTP oracle. Useful for demos and smoke
//! checks; the production request surface lives elsewhere.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use triage::{
    HttpOracle, NoopRetrieval, NoopStorage, OracleCollaborator, SymptomReport, TriageConfig,
    TriageEngine, UnavailableOracle,
};

/// Assess a free-text symptom description.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The symptom description to triage.
    text: String,

    /// Reporter identifier used for history and indexing.
    #[arg(long, default_value = "anonymous")]
    reporter_id: String,

    /// Skip the oracle entirely and rely on the deterministic ladders.
    #[arg(long, default_value_t = false)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = TriageConfig::from_env();

    let oracle: Arc<dyn OracleCollaborator> = if args.offline {
        Arc::new(UnavailableOracle)
    } else {
        match std::env::var("TRIAGE_ORACLE_API_KEY") {
            Ok(key) => match HttpOracle::new(&config, key) {
                Ok(oracle) => Arc::new(oracle),
                Err(e) => {
                    tracing::warn!(error = %e, "oracle unavailable; running offline");
                    Arc::new(UnavailableOracle)
                }
            },
            Err(_) => {
                tracing::warn!("TRIAGE_ORACLE_API_KEY not set; running offline");
                Arc::new(UnavailableOracle)
            }
        }
    };

    let engine = TriageEngine::new(
        Arc::new(NoopStorage),
        Arc::new(NoopRetrieval),
        oracle,
        config,
    );

    let report = SymptomReport::new(args.reporter_id, args.text);
    let verdict = engine.assess(&report).await?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}
