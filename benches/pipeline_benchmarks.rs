//! Pipeline benchmarks - candidate generation and end-to-end scoring
//!
//! Measures the two stages separately and combined on a synthetic context
//! sized like production: a co-visitation table with 40 neighbors per item,
//! a full 200-candidate pool, and three 100-tree rankers.
//!
//! Run with: cargo bench --bench pipeline_benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use nexrec::pipeline::ModelSet;
use nexrec::session::Aid;
use nexrec::{
    candidates, features, CoVisitationIndex, FallbackList, PipelineConfig, PopularityTable,
    RecommendationContext, ScoringModel, Session,
};

// ==============================================================================
// Synthetic Fixtures
// ==============================================================================

/// Co-visitation table over `n_items` items, 40 neighbors each
fn synthetic_covisit(n_items: u64) -> CoVisitationIndex {
    let mut table = HashMap::new();
    for aid in 0..n_items {
        let neighbors: Vec<(Aid, f32)> = (1..=40)
            .map(|k| ((aid + k * 7) % n_items, 1.0 + (k % 5) as f32))
            .collect();
        table.insert(aid, neighbors);
    }
    CoVisitationIndex::new(table).expect("synthetic covisit is valid")
}

fn synthetic_popularity(n_items: u64) -> PopularityTable {
    PopularityTable::new((0..n_items).map(|aid| (aid, aid % 997)).collect())
}

fn synthetic_fallback() -> FallbackList {
    FallbackList::new((1_000_000..1_000_040).collect()).expect("synthetic fallback is valid")
}

/// 100-tree wrapped ranker splitting across all four features
fn synthetic_model(name: &str) -> ScoringModel {
    let trees: Vec<String> = (0..100)
        .map(|i| {
            format!(
                r#"{{"split_feature": [{}], "threshold": [{}.0],
                     "left_child": [-1], "right_child": [-2],
                     "leaf_value": [{}.0e-2, {}.0e-2]}}"#,
                i % 4,
                (i % 10) + 1,
                i % 7,
                (i % 7) + 3
            )
        })
        .collect();
    let json = format!(
        r#"{{"feature_names": ["co_visitation_score", "global_popularity",
                               "session_length", "aid_frequency"],
             "num_features": 4,
             "trees": [{}]}}"#,
        trees.join(",")
    );
    ScoringModel::from_json(name, &json).expect("synthetic model parses")
}

fn synthetic_context(n_items: u64) -> RecommendationContext {
    RecommendationContext::new(
        synthetic_covisit(n_items),
        synthetic_popularity(n_items),
        synthetic_fallback(),
        ModelSet {
            clicks: synthetic_model("clicks"),
            carts: synthetic_model("carts"),
            orders: synthetic_model("orders"),
        },
        PipelineConfig::default(),
    )
    .expect("synthetic context builds")
}

fn synthetic_session(len: usize) -> Session {
    let aids: Vec<Aid> = (0..len as u64).map(|i| i * 13 % 5000).collect();
    Session::from_aids(1, &aids)
}

// ==============================================================================
// Benchmarks
// ==============================================================================

fn bench_candidate_generation(c: &mut Criterion) {
    let covisit = synthetic_covisit(5000);
    let fallback = synthetic_fallback();
    let config = PipelineConfig::default();

    let mut group = c.benchmark_group("candidate_generation");
    for session_len in [5, 50, 500] {
        let session = synthetic_session(session_len);
        group.bench_with_input(
            BenchmarkId::from_parameter(session_len),
            &session,
            |b, session| b.iter(|| candidates::generate(session, &covisit, &fallback, &config)),
        );
    }
    group.finish();
}

fn bench_feature_build(c: &mut Criterion) {
    let covisit = synthetic_covisit(5000);
    let popularity = synthetic_popularity(5000);
    let fallback = synthetic_fallback();
    let config = PipelineConfig::default();
    let session = synthetic_session(50);
    let pool = candidates::generate(&session, &covisit, &fallback, &config);

    c.bench_function("feature_build_full_pool", |b| {
        b.iter(|| features::build(&pool, &session, &popularity, &covisit))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let context = synthetic_context(5000);
    let session = synthetic_session(50);

    c.bench_function("full_pipeline_three_models", |b| {
        b.iter(|| context.recommend(&session))
    });
}

// ==============================================================================
// CRITERION CONFIGURATION
// ==============================================================================

criterion_group!(
    name = pipeline_benches;
    config = Criterion::default().sample_size(50);
    targets =
        bench_candidate_generation,
        bench_feature_build,
        bench_full_pipeline
);

criterion_main!(pipeline_benches);
