//! nexrec - session-based next-event recommender
//!
//! Two-stage inference pipeline over precomputed artifacts: generate a
//! bounded candidate pool from co-visitation statistics, then rank it with
//! three frozen gradient-boosted models, one per event type (clicks, carts,
//! orders).
//!
//! # Pipeline
//! - Stage 1 (`candidates`): recent-history seeds → co-visited neighbors,
//!   weight accumulation, fallback padding, bounded deduplicated pool
//! - Features (`features`): fixed 4-column contract per candidate
//! - Scoring (`model`): wrapped/native ranker dumps behind one capability
//! - Stage 2 (`ranker`): score-descending lists of 20 with fallback padding
//!
//! # Guarantees
//! - Deterministic output for identical inputs (explicit tie-breaks)
//! - Per-event-type failure isolation: one bad model never empties the
//!   other two lists
//! - Fail-fast setup: artifact and feature-contract errors abort before
//!   any session is processed

pub mod artifacts;
pub mod candidates;
pub mod config;
pub mod constants;
pub mod errors;
pub mod features;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod ranker;
pub mod session;

pub use artifacts::{CoVisitationIndex, FallbackList, PopularityTable};
pub use config::{ArtifactConfig, PipelineConfig};
pub use errors::{RecError, Result};
pub use model::ScoringModel;
pub use pipeline::{ModelSet, RecommendationContext, SessionRecommendations};
pub use session::{Aid, Event, EventType, Session};

// Re-export dependencies to ensure tests/benchmarks use the same version
pub use chrono;
pub use serde_json;
