//! nexrec driver - load artifacts, stream sessions, print recommendations
//!
//! Reads every path from the environment (see `config::print_env_help`),
//! builds the validated recommendation context, then runs each session
//! from the JSONL input through the pipeline and prints the three
//! space-separated lists.

use std::time::Instant;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nexrec::config::{ArtifactConfig, PipelineConfig};
use nexrec::session::{read_sessions_jsonl, EventType};
use nexrec::{
    metrics, CoVisitationIndex, FallbackList, ModelSet, PopularityTable, RecommendationContext,
    ScoringModel,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = metrics::register_metrics() {
        warn!(error = %err, "Metrics registration failed; continuing without metrics export");
    }

    let pipeline_config = PipelineConfig::from_env();
    pipeline_config.log();
    let paths = ArtifactConfig::from_env();

    // Load everything up front; any missing or invalid artifact aborts
    // before the first session is touched
    let start = Instant::now();
    let covisit = CoVisitationIndex::from_json_file(&paths.co_visitation_path)?;
    let popularity = PopularityTable::from_json_file(&paths.popularity_path)?;
    let fallback = FallbackList::from_json_file(&paths.fallback_path)?;
    let models = ModelSet {
        clicks: ScoringModel::load("clicks", &paths.clicks_model_path)?,
        carts: ScoringModel::load("carts", &paths.carts_model_path)?,
        orders: ScoringModel::load("orders", &paths.orders_model_path)?,
    };
    info!(elapsed = ?start.elapsed(), "Artifacts loaded");

    let context =
        RecommendationContext::new(covisit, popularity, fallback, models, pipeline_config)?;

    let sessions = read_sessions_jsonl(&paths.sessions_path)?;
    info!(sessions = sessions.len(), "Processing sessions");

    let run_start = Instant::now();
    for session in &sessions {
        let result = context.recommend(session);

        println!("session {}", result.session_id);
        for event_type in EventType::ALL {
            let outcome = result.get(event_type);
            match &outcome.error {
                None => println!("  {}: {}", event_type, outcome.space_separated()),
                Some(reason) => {
                    error!(session = result.session_id, event_type = %event_type, %reason,
                        "Event type degraded");
                    println!("  {}: (unavailable)", event_type);
                }
            }
        }
    }

    info!(
        sessions = sessions.len(),
        elapsed = ?run_start.elapsed(),
        "Done"
    );

    Ok(())
}
