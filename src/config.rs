//! Configuration for the recommendation pipeline
//!
//! All tunable parameters in one place with environment variable overrides.
//! Sensible defaults come from `constants.rs`; production deployments
//! override via `NEXREC_*` variables.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{
    DEFAULT_CANDIDATES_PER_SESSION, DEFAULT_CO_VISITS_PER_ITEM, DEFAULT_ITEMS_FROM_HISTORY,
    DEFAULT_RECOMMENDATIONS,
};

/// Tunable pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Recent history items used as co-visitation seeds (default: 5)
    #[serde(default = "default_items_from_history")]
    pub n_items_from_history: usize,

    /// Co-visited neighbors consulted per seed (default: 40)
    #[serde(default = "default_co_visits_per_item")]
    pub n_co_visits_per_item: usize,

    /// Candidate pool cap per session (default: 200)
    #[serde(default = "default_candidates_per_session")]
    pub n_candidates_per_session: usize,

    /// Items emitted per event type (default: 20)
    #[serde(default = "default_recommendations")]
    pub n_recommendations: usize,

    /// Whether to attach the per-candidate feature/score table to results
    #[serde(default)]
    pub emit_diagnostics: bool,
}

fn default_items_from_history() -> usize {
    DEFAULT_ITEMS_FROM_HISTORY
}

fn default_co_visits_per_item() -> usize {
    DEFAULT_CO_VISITS_PER_ITEM
}

fn default_candidates_per_session() -> usize {
    DEFAULT_CANDIDATES_PER_SESSION
}

fn default_recommendations() -> usize {
    DEFAULT_RECOMMENDATIONS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_items_from_history: default_items_from_history(),
            n_co_visits_per_item: default_co_visits_per_item(),
            n_candidates_per_session: default_candidates_per_session(),
            n_recommendations: default_recommendations(),
            emit_diagnostics: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("NEXREC_ITEMS_FROM_HISTORY") {
            if let Ok(n) = val.parse() {
                config.n_items_from_history = n;
            }
        }

        if let Ok(val) = env::var("NEXREC_CO_VISITS_PER_ITEM") {
            if let Ok(n) = val.parse() {
                config.n_co_visits_per_item = n;
            }
        }

        if let Ok(val) = env::var("NEXREC_CANDIDATES_PER_SESSION") {
            if let Ok(n) = val.parse() {
                config.n_candidates_per_session = n;
            }
        }

        if let Ok(val) = env::var("NEXREC_RECOMMENDATIONS") {
            if let Ok(n) = val.parse() {
                config.n_recommendations = n;
            }
        }

        if let Ok(val) = env::var("NEXREC_EMIT_DIAGNOSTICS") {
            config.emit_diagnostics = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Log the current configuration
    pub fn log(&self) {
        info!("Pipeline configuration:");
        info!("   History seeds: {}", self.n_items_from_history);
        info!("   Co-visits per seed: {}", self.n_co_visits_per_item);
        info!("   Candidate pool cap: {}", self.n_candidates_per_session);
        info!("   Output length: {}", self.n_recommendations);
        info!(
            "   Diagnostics: {}",
            if self.emit_diagnostics { "on" } else { "off" }
        );
    }
}

/// Artifact locations for the driver binary
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    /// Co-visitation index JSON (default: ./artifacts/co_visitation.json)
    pub co_visitation_path: PathBuf,

    /// Popularity table JSON (default: ./artifacts/global_popularity.json)
    pub popularity_path: PathBuf,

    /// Fallback list JSON (default: ./artifacts/fallback.json)
    pub fallback_path: PathBuf,

    /// Per-event-type ranker dumps (default: ./models/ranker_<type>.json)
    pub clicks_model_path: PathBuf,
    pub carts_model_path: PathBuf,
    pub orders_model_path: PathBuf,

    /// Session records, one JSON object per line
    pub sessions_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            co_visitation_path: PathBuf::from("./artifacts/co_visitation.json"),
            popularity_path: PathBuf::from("./artifacts/global_popularity.json"),
            fallback_path: PathBuf::from("./artifacts/fallback.json"),
            clicks_model_path: PathBuf::from("./models/ranker_clicks.json"),
            carts_model_path: PathBuf::from("./models/ranker_carts.json"),
            orders_model_path: PathBuf::from("./models/ranker_orders.json"),
            sessions_path: PathBuf::from("./test_trimmed.jsonl"),
        }
    }
}

impl ArtifactConfig {
    /// Load artifact paths from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("NEXREC_CO_VISITATION") {
            config.co_visitation_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("NEXREC_POPULARITY") {
            config.popularity_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("NEXREC_FALLBACK") {
            config.fallback_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("NEXREC_MODEL_CLICKS") {
            config.clicks_model_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("NEXREC_MODEL_CARTS") {
            config.carts_model_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("NEXREC_MODEL_ORDERS") {
            config.orders_model_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("NEXREC_SESSIONS") {
            config.sessions_path = PathBuf::from(val);
        }

        config
    }
}

/// Environment variable documentation
#[allow(unused)] // Public API - available for CLI help output
pub fn print_env_help() {
    println!("nexrec configuration environment variables:");
    println!();
    println!("  NEXREC_ITEMS_FROM_HISTORY     - History seeds for candidates (default: 5)");
    println!("  NEXREC_CO_VISITS_PER_ITEM     - Neighbors consulted per seed (default: 40)");
    println!("  NEXREC_CANDIDATES_PER_SESSION - Candidate pool cap (default: 200)");
    println!("  NEXREC_RECOMMENDATIONS        - Items per event type (default: 20)");
    println!("  NEXREC_EMIT_DIAGNOSTICS       - Attach feature/score table true/false");
    println!();
    println!("  NEXREC_CO_VISITATION          - Co-visitation index JSON path");
    println!("  NEXREC_POPULARITY             - Popularity table JSON path");
    println!("  NEXREC_FALLBACK               - Fallback list JSON path");
    println!("  NEXREC_MODEL_CLICKS           - Clicks ranker dump path");
    println!("  NEXREC_MODEL_CARTS            - Carts ranker dump path");
    println!("  NEXREC_MODEL_ORDERS           - Orders ranker dump path");
    println!("  NEXREC_SESSIONS               - Session JSONL path");
    println!();
    println!("  RUST_LOG                      - Log level (e.g., info, debug, trace)");
    println!();
}
