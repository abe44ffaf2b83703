//! Documented constants for the recommendation pipeline
//!
//! All tunable parameters live here with the reasoning behind their values.
//! Centralizing constants prevents magic numbers and makes tuning easier.
//! Runtime overrides are applied in `config.rs`.

// =============================================================================
// STAGE 1: CANDIDATE GENERATION
// =============================================================================

/// Number of most recent history items used as co-visitation seeds
///
/// Only the tail of the session seeds candidate generation. Older events
/// still contribute through the feature builder's full-history rescan, but
/// the candidate pool follows what the user is doing *now*.
///
/// - Short sessions (1-3 events) use everything they have
/// - Long sessions stay bounded: 5 seeds × 40 neighbors = at most 200 lookups
pub const DEFAULT_ITEMS_FROM_HISTORY: usize = 5;

/// Co-visited neighbors consulted per seed item
///
/// The exported co-visitation table is truncated to its strongest entries
/// per item; 40 matches that export depth. Reading past it returns nothing.
pub const DEFAULT_CO_VISITS_PER_ITEM: usize = 40;

/// Upper bound on the candidate pool per session
///
/// Caps Stage 2 work: 200 candidates × 4 features × 3 models is the fixed
/// per-session scoring budget. The pool is padded from the fallback list up
/// to this bound so the rankers always see a reasonably full slate.
pub const DEFAULT_CANDIDATES_PER_SESSION: usize = 200;

// =============================================================================
// STAGE 2: RANKING OUTPUT
// =============================================================================

/// Items emitted per event type
///
/// The evaluation protocol for this task scores the top 20 predictions per
/// event type; everything downstream consumes exactly this length. Lists
/// may come out shorter only when the fallback list itself is exhausted.
pub const DEFAULT_RECOMMENDATIONS: usize = 20;

// =============================================================================
// FEATURE CONTRACT
// =============================================================================

/// Width of the per-candidate feature vector
///
/// Must agree with `features::FEATURE_COLUMNS`. Scoring models are checked
/// against this width (and, for wrapped models, the exact column names)
/// once at context construction.
pub const FEATURE_COUNT: usize = 4;
