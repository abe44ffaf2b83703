//! Pipeline entry point: one shared context, one call per session
//!
//! `RecommendationContext` owns every read-only collaborator: the
//! co-visitation index, popularity table, fallback list, and the three
//! scoring models. It is constructed exactly once. Construction runs the
//! feature-contract validation for every model and fails fast on mismatch,
//! so no per-request branching or re-detection happens later. The context
//! is immutable afterwards and safe to share across threads.
//!
//! A `recommend` call runs the two stages in order: candidate generation,
//! feature building, then per-event-type scoring and ranking. Event types
//! are isolated from each other: a scoring failure empties that one list
//! and records the error; the other two complete normally.

use std::time::Instant;

use ordered_float::OrderedFloat;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::artifacts::{CoVisitationIndex, FallbackList, PopularityTable};
use crate::candidates;
use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::features::{self, FeatureRow, FeatureTable};
use crate::metrics;
use crate::model::ScoringModel;
use crate::ranker;
use crate::session::{Aid, EventType, Session};

/// The three frozen rankers, one per event type
#[derive(Debug)]
pub struct ModelSet {
    pub clicks: ScoringModel,
    pub carts: ScoringModel,
    pub orders: ScoringModel,
}

impl ModelSet {
    pub fn get(&self, event_type: EventType) -> &ScoringModel {
        match event_type {
            EventType::Clicks => &self.clicks,
            EventType::Carts => &self.carts,
            EventType::Orders => &self.orders,
        }
    }
}

/// Result for a single event type
///
/// `items` is empty when scoring failed; the failure is recorded in
/// `error` and never propagates to the other event types.
#[derive(Debug, Clone, Serialize)]
pub struct EventTypeResult {
    pub items: Vec<Aid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventTypeResult {
    fn ok(items: Vec<Aid>) -> Self {
        Self { items, error: None }
    }

    fn failed(error: String) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error),
        }
    }

    /// Conventional space-separated serialization of the item list
    pub fn space_separated(&self) -> String {
        self.items
            .iter()
            .map(|aid| aid.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One candidate's diagnostic record: features plus all three scores
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDiagnostics {
    #[serde(flatten)]
    pub features: FeatureRow,
    pub clicks_score: Option<f64>,
    pub carts_score: Option<f64>,
    pub orders_score: Option<f64>,
}

/// Terminal output of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecommendations {
    pub session_id: u64,
    pub clicks: EventTypeResult,
    pub carts: EventTypeResult,
    pub orders: EventTypeResult,

    /// Per-candidate feature/score table, orders score descending;
    /// present only when diagnostics are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<CandidateDiagnostics>>,
}

impl SessionRecommendations {
    pub fn get(&self, event_type: EventType) -> &EventTypeResult {
        match event_type {
            EventType::Clicks => &self.clicks,
            EventType::Carts => &self.carts,
            EventType::Orders => &self.orders,
        }
    }
}

/// Shared, read-only state for the lifetime of the process
#[derive(Debug)]
pub struct RecommendationContext {
    covisit: CoVisitationIndex,
    popularity: PopularityTable,
    fallback: FallbackList,
    models: ModelSet,
    config: PipelineConfig,
}

impl RecommendationContext {
    /// Build the context, validating every model's feature contract
    ///
    /// A contract mismatch is a configuration error and aborts here,
    /// before any session is processed.
    pub fn new(
        covisit: CoVisitationIndex,
        popularity: PopularityTable,
        fallback: FallbackList,
        models: ModelSet,
        config: PipelineConfig,
    ) -> Result<Self> {
        for event_type in EventType::ALL {
            models.get(event_type).validate_feature_contract(event_type)?;
            debug!(
                event_type = %event_type,
                shape = models.get(event_type).shape(),
                "Feature contract validated"
            );
        }

        info!(
            covisit_items = covisit.len(),
            popularity_items = popularity.len(),
            fallback_items = fallback.len(),
            "Recommendation context ready"
        );

        Ok(Self {
            covisit,
            popularity,
            fallback,
            models,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full pipeline for one session
    ///
    /// Never fails: degenerate inputs take the fallback-only path and
    /// per-model scoring errors degrade only their own event type.
    pub fn recommend(&self, session: &Session) -> SessionRecommendations {
        let start = Instant::now();
        let n = self.config.n_recommendations;

        let pool = candidates::generate(session, &self.covisit, &self.fallback, &self.config);
        metrics::CANDIDATE_POOL_SIZE.observe(pool.len() as f64);

        // Degenerate path: nothing to score, the fallback head is the
        // answer for all three event types
        if pool.is_empty() {
            let head = ranker::fallback_only(&self.fallback, n);
            let result = SessionRecommendations {
                session_id: session.session,
                clicks: EventTypeResult::ok(head.clone()),
                carts: EventTypeResult::ok(head.clone()),
                orders: EventTypeResult::ok(head),
                diagnostics: None,
            };
            self.observe(&result, "fallback_only", start);
            return result;
        }

        let table = features::build(&pool, session, &self.popularity, &self.covisit);

        // Score each event type in its fixed order, isolating failures
        let (clicks, clicks_scores) = self.score_one(EventType::Clicks, session, &pool, &table, n);
        let (carts, carts_scores) = self.score_one(EventType::Carts, session, &pool, &table, n);
        let (orders, orders_scores) = self.score_one(EventType::Orders, session, &pool, &table, n);

        let diagnostics = if self.config.emit_diagnostics {
            Some(build_diagnostics(
                &table,
                &[clicks_scores, carts_scores, orders_scores],
            ))
        } else {
            None
        };

        let result = SessionRecommendations {
            session_id: session.session,
            clicks,
            carts,
            orders,
            diagnostics,
        };
        self.observe(&result, "scored", start);
        result
    }

    /// Score and rank one event type, degrading to an empty recorded-error
    /// result on scoring failure
    fn score_one(
        &self,
        event_type: EventType,
        session: &Session,
        pool: &[Aid],
        table: &FeatureTable,
        n: usize,
    ) -> (EventTypeResult, Option<Vec<f64>>) {
        match self.models.get(event_type).score(table, event_type) {
            Ok(scores) => {
                let list = ranker::rank(pool, &scores, &self.fallback, n);
                (EventTypeResult::ok(list), Some(scores))
            }
            Err(err) => {
                error!(
                    session = session.session,
                    event_type = %event_type,
                    error = %err,
                    "Scoring failed; emitting empty list for this event type"
                );
                metrics::SCORING_FAILURES_TOTAL
                    .with_label_values(&[event_type.as_str()])
                    .inc();
                (EventTypeResult::failed(err.message()), None)
            }
        }
    }

    fn observe(&self, result: &SessionRecommendations, path: &str, start: Instant) {
        metrics::SESSIONS_PROCESSED_TOTAL
            .with_label_values(&[path])
            .inc();
        metrics::PIPELINE_DURATION.observe(start.elapsed().as_secs_f64());
        for event_type in EventType::ALL {
            metrics::RECOMMENDATION_LIST_LENGTH
                .with_label_values(&[event_type.as_str()])
                .observe(result.get(event_type).items.len() as f64);
        }
    }
}

/// Pair every candidate's features with its three scores, orders score
/// descending (unscored rows sink to the bottom, ordered by aid)
fn build_diagnostics(
    table: &FeatureTable,
    scores_by_type: &[Option<Vec<f64>>],
) -> Vec<CandidateDiagnostics> {
    let score_of = |type_idx: usize, row_idx: usize| -> Option<f64> {
        scores_by_type
            .get(type_idx)
            .and_then(|s| s.as_ref())
            .map(|s| s[row_idx])
    };

    let mut rows: Vec<CandidateDiagnostics> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, features)| CandidateDiagnostics {
            features: features.clone(),
            clicks_score: score_of(0, idx),
            carts_score: score_of(1, idx),
            orders_score: score_of(2, idx),
        })
        .collect();

    rows.sort_by_key(|row| {
        (
            std::cmp::Reverse(OrderedFloat(
                row.orders_score.unwrap_or(f64::NEG_INFINITY),
            )),
            row.features.aid,
        )
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoringModel;
    use std::collections::HashMap;

    fn stump_model(name: &str) -> ScoringModel {
        // co_visitation_score <= 2.0 → 0.1, else 0.9
        let json = r#"{
            "feature_names": ["co_visitation_score", "global_popularity",
                              "session_length", "aid_frequency"],
            "num_features": 4,
            "trees": [{"split_feature": [0], "threshold": [2.0],
                       "left_child": [-1], "right_child": [-2],
                       "leaf_value": [0.1, 0.9]}]
        }"#;
        ScoringModel::from_json(name, json).unwrap()
    }

    fn context() -> RecommendationContext {
        let mut table = HashMap::new();
        table.insert(10, vec![(20, 5.0), (30, 3.0)]);
        table.insert(20, vec![(10, 2.0), (40, 1.0)]);
        let covisit = CoVisitationIndex::new(table).unwrap();

        let popularity =
            PopularityTable::new(HashMap::from([(10, 100), (20, 50), (30, 10), (40, 5)]));

        let fallback = FallbackList::new((1..=25).map(|i| i * 1000).collect()).unwrap();

        let models = ModelSet {
            clicks: stump_model("clicks"),
            carts: stump_model("carts"),
            orders: stump_model("orders"),
        };

        RecommendationContext::new(
            covisit,
            popularity,
            fallback,
            models,
            PipelineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_context_is_shareable_across_threads() {
        // The context is read-only after construction; concurrent sessions
        // may share it without locking
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecommendationContext>();
    }

    #[test]
    fn test_scored_path_produces_full_lists() {
        let ctx = context();
        let session = Session::from_aids(1, &[10, 20, 10]);
        let result = ctx.recommend(&session);

        for event_type in EventType::ALL {
            let list = &result.get(event_type).items;
            assert_eq!(list.len(), 20);
            assert!(result.get(event_type).error.is_none());
            // Candidate 30 (score 0.9) leads; 40 (0.1) follows
            assert_eq!(list[0], 30);
            assert_eq!(list[1], 40);
        }
    }

    #[test]
    fn test_empty_session_takes_fallback_path() {
        let ctx = context();
        let result = ctx.recommend(&Session::new(9, Vec::new()));

        let expected: Vec<Aid> = (1..=20).map(|i| i * 1000).collect();
        for event_type in EventType::ALL {
            assert_eq!(result.get(event_type).items, expected);
        }
    }

    #[test]
    fn test_contract_mismatch_aborts_construction() {
        let bad_model = ScoringModel::from_json(
            "carts",
            r#"{"best_iteration": 0, "num_features": 7, "trees": []}"#,
        )
        .unwrap();

        let models = ModelSet {
            clicks: stump_model("clicks"),
            carts: bad_model,
            orders: stump_model("orders"),
        };
        let err = RecommendationContext::new(
            CoVisitationIndex::new(HashMap::new()).unwrap(),
            PopularityTable::default(),
            FallbackList::new(vec![1]).unwrap(),
            models,
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "FEATURE_WIDTH_MISMATCH");
    }

    #[test]
    fn test_space_separated_output() {
        let result = EventTypeResult::ok(vec![5, 10, 15]);
        assert_eq!(result.space_separated(), "5 10 15");
    }

    #[test]
    fn test_diagnostics_sorted_by_orders_score() {
        let mut table = HashMap::new();
        table.insert(10, vec![(20, 5.0), (30, 3.0)]);
        table.insert(20, vec![(10, 2.0), (40, 1.0)]);
        let covisit = CoVisitationIndex::new(table).unwrap();
        let popularity = PopularityTable::default();
        let fallback = FallbackList::new(vec![]).unwrap();
        let models = ModelSet {
            clicks: stump_model("clicks"),
            carts: stump_model("carts"),
            orders: stump_model("orders"),
        };
        let config = PipelineConfig {
            emit_diagnostics: true,
            ..Default::default()
        };
        let ctx =
            RecommendationContext::new(covisit, popularity, fallback, models, config).unwrap();

        let result = ctx.recommend(&Session::from_aids(1, &[10, 20, 10]));
        let diag = result.diagnostics.expect("diagnostics enabled");
        assert_eq!(diag.len(), 2);
        // 30 scores 0.9 on orders, 40 scores 0.1
        assert_eq!(diag[0].features.aid, 30);
        assert_eq!(diag[0].orders_score, Some(0.9));
        assert_eq!(diag[1].features.aid, 40);
    }
}
