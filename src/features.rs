//! Per-candidate feature vectors for the scoring models
//!
//! Every candidate gets a fixed-width row of 4 non-negative values in the
//! published column order. The order is a contract: each scoring model is
//! validated against `FEATURE_COLUMNS` once at context construction, and
//! rows are built in exactly this order every time. Raw counts and weights
//! go in as-is; no normalization or scaling.

use serde::Serialize;

use crate::artifacts::{CoVisitationIndex, PopularityTable};
use crate::constants::FEATURE_COUNT;
use crate::session::{Aid, Session};

/// Feature column names, in the order rows are built
///
/// - `co_visitation_score`: summed association weight from every distinct
///   history item to this candidate
/// - `global_popularity`: global frequency count of the candidate
/// - `session_length`: total event count (constant within a session)
/// - `aid_frequency`: occurrences of this candidate in the session history
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "co_visitation_score",
    "global_popularity",
    "session_length",
    "aid_frequency",
];

/// One candidate's feature values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub aid: Aid,
    pub co_visitation_score: f64,
    pub global_popularity: f64,
    pub session_length: f64,
    pub aid_frequency: f64,
}

impl FeatureRow {
    /// Values in `FEATURE_COLUMNS` order
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.co_visitation_score,
            self.global_popularity,
            self.session_length,
            self.aid_frequency,
        ]
    }
}

/// Feature rows for a candidate pool, in pool order
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain numeric matrix view, row-major, in `FEATURE_COLUMNS` order
    pub fn matrix(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.rows.iter().map(FeatureRow::values).collect()
    }
}

/// Build one feature row per candidate, in pool order
///
/// The co-visitation score is recomputed here over the *full* distinct
/// history, not reused from Stage 1: the Stage 1 accumulation is seed-
/// limited and excludes history items before scoring, while this scan is
/// unfiltered. Fallback-sourced candidates can therefore carry non-zero
/// `aid_frequency`; they may legitimately have occurred in the session.
pub fn build(
    pool: &[Aid],
    session: &Session,
    popularity: &PopularityTable,
    covisit: &CoVisitationIndex,
) -> FeatureTable {
    let history_set = session.history_set();
    let aid_counts = session.aid_counts();
    let session_length = session.len() as f64;

    let rows = pool
        .iter()
        .map(|&candidate| {
            let co_visitation_score: f64 = history_set
                .iter()
                .filter_map(|&hist| covisit.weight(hist, candidate))
                .map(f64::from)
                .sum();

            FeatureRow {
                aid: candidate,
                co_visitation_score,
                global_popularity: popularity.count(candidate) as f64,
                session_length,
                aid_frequency: aid_counts.get(&candidate).copied().unwrap_or(0) as f64,
            }
        })
        .collect();

    FeatureTable { rows }
}
