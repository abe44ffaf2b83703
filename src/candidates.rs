//! Stage 1: candidate generation
//!
//! Turns a session's recent history into a bounded, deduplicated pool of
//! plausible next items. Co-visitation weights from the most recent seeds
//! are accumulated per candidate, items the user already touched in this
//! session are excluded, and the pool is padded from the fallback list up
//! to the configured cap.
//!
//! Ordering is fully deterministic: accumulated weight descending, ties in
//! first-seen accumulation order (the seeds walk newest-to-oldest and each
//! seed's neighbors arrive weight-descending).

use std::collections::HashMap;

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::artifacts::{CoVisitationIndex, FallbackList};
use crate::config::PipelineConfig;
use crate::session::{Aid, Session};

/// Generate the candidate pool for one session
///
/// Returns an ordered, duplicate-free pool of at most
/// `config.n_candidates_per_session` items. An empty session yields an
/// empty pool; the caller short-circuits that to fallback-only output.
/// Fallback-sourced entries may include items from the session history;
/// the history exclusion applies to co-visitation-derived candidates only.
pub fn generate(
    session: &Session,
    covisit: &CoVisitationIndex,
    fallback: &FallbackList,
    config: &PipelineConfig,
) -> Vec<Aid> {
    if session.is_empty() {
        return Vec::new();
    }

    let history_set = session.history_set();
    let seeds = session.recent_distinct(config.n_items_from_history);

    // Accumulate co-visitation weight per candidate, keeping first-seen
    // order for the deterministic tie-break.
    let mut scores: HashMap<Aid, f32> = HashMap::new();
    let mut first_seen: Vec<Aid> = Vec::new();

    for &seed in &seeds {
        for &(other, weight) in covisit.top_neighbors(seed, config.n_co_visits_per_item) {
            if history_set.contains(&other) {
                continue;
            }
            scores
                .entry(other)
                .and_modify(|w| *w += weight)
                .or_insert_with(|| {
                    first_seen.push(other);
                    weight
                });
        }
    }

    // Weight descending; stable sort preserves first-seen order on ties
    let mut dynamic = first_seen;
    dynamic.sort_by_key(|aid| std::cmp::Reverse(OrderedFloat(scores[aid])));
    dynamic.truncate(config.n_candidates_per_session);

    // Pad from the fallback list, deduplicating while preserving first
    // occurrence, then truncate to the pool cap.
    let mut pool = Vec::with_capacity(config.n_candidates_per_session);
    let mut seen = std::collections::HashSet::with_capacity(config.n_candidates_per_session);
    for aid in dynamic.into_iter().chain(fallback.items().iter().copied()) {
        if pool.len() >= config.n_candidates_per_session {
            break;
        }
        if seen.insert(aid) {
            pool.push(aid);
        }
    }

    debug!(
        session = session.session,
        seeds = seeds.len(),
        pool = pool.len(),
        "Generated candidate pool"
    );

    pool
}
