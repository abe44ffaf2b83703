//! Read-only lookup artifacts consumed at inference time
//!
//! Three precomputed collaborators feed the pipeline:
//! - `CoVisitationIndex`: per-item "associated items" table with weights
//! - `PopularityTable`: global per-item frequency counts
//! - `FallbackList`: globally popular items used for padding and tie-order
//!
//! How these were computed is out of scope; they arrive as JSON exports,
//! are validated once at load, and are never mutated afterwards. All three
//! are safe to share across threads for the lifetime of the process.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ordered_float::OrderedFloat;
use serde::Deserialize;
use tracing::{info, warn};

use crate::constants::DEFAULT_RECOMMENDATIONS;
use crate::errors::{RecError, Result};
use crate::session::Aid;

fn open_artifact(name: &str, path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| RecError::ArtifactUnreadable {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

fn invalid(name: &str, reason: impl Into<String>) -> RecError {
    RecError::ArtifactInvalid {
        name: name.to_string(),
        reason: reason.into(),
    }
}

// =============================================================================
// CO-VISITATION INDEX
// =============================================================================

/// Per-item table of co-visited items with association weights
///
/// Weight scale is opaque to the pipeline; only relative ordering and
/// summation matter. Neighbor lists are sorted by weight descending at
/// construction so `top_neighbors` is a prefix slice.
#[derive(Debug, Clone, Default)]
pub struct CoVisitationIndex {
    table: HashMap<Aid, Vec<(Aid, f32)>>,
}

impl CoVisitationIndex {
    /// Build from raw per-item neighbor lists, sorting each by weight
    ///
    /// Negative weights are rejected: the accumulation and feature contract
    /// assume non-negative scores throughout.
    pub fn new(table: HashMap<Aid, Vec<(Aid, f32)>>) -> Result<Self> {
        let mut sorted = table;
        for (aid, neighbors) in sorted.iter_mut() {
            if let Some((other, w)) = neighbors.iter().find(|(_, w)| *w < 0.0 || !w.is_finite()) {
                return Err(invalid(
                    "co_visitation",
                    format!("item {aid} → {other} has invalid weight {w}"),
                ));
            }
            // Weight descending; equal weights keep export order
            neighbors.sort_by_key(|(_, w)| std::cmp::Reverse(OrderedFloat(*w)));
        }
        Ok(Self { table: sorted })
    }

    /// Load from a JSON export of shape `{aid: [[aid, weight], ...], ...}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = open_artifact("co_visitation", path)?;
        let raw: HashMap<Aid, Vec<(Aid, f32)>> = serde_json::from_reader(reader)
            .map_err(|e| invalid("co_visitation", e.to_string()))?;
        let index = Self::new(raw)?;
        info!(items = index.table.len(), "Loaded co-visitation index");
        Ok(index)
    }

    /// Strongest `limit` co-visited items for `aid`, weight descending
    ///
    /// Unknown items yield an empty slice, never an error.
    pub fn top_neighbors(&self, aid: Aid, limit: usize) -> &[(Aid, f32)] {
        match self.table.get(&aid) {
            Some(neighbors) => &neighbors[..neighbors.len().min(limit)],
            None => &[],
        }
    }

    /// Association weight from `from` to `to`, if present
    pub fn weight(&self, from: Aid, to: Aid) -> Option<f32> {
        self.table
            .get(&from)?
            .iter()
            .find(|(aid, _)| *aid == to)
            .map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

// =============================================================================
// POPULARITY TABLE
// =============================================================================

/// Global per-item frequency counts
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PopularityTable {
    counts: HashMap<Aid, u64>,
}

impl PopularityTable {
    pub fn new(counts: HashMap<Aid, u64>) -> Self {
        Self { counts }
    }

    /// Load from a JSON export of shape `{aid: count, ...}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = open_artifact("popularity", path)?;
        let table: PopularityTable =
            serde_json::from_reader(reader).map_err(|e| invalid("popularity", e.to_string()))?;
        info!(items = table.counts.len(), "Loaded popularity table");
        Ok(table)
    }

    /// Global count for `aid`; absent items count 0, never an error
    pub fn count(&self, aid: Aid) -> u64 {
        self.counts.get(&aid).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

// =============================================================================
// FALLBACK LIST
// =============================================================================

/// Fixed ordered list of globally popular items
///
/// Pads under-filled candidate pools and recommendation lists, and serves
/// as the entire output when a session produced no candidates. Duplicate
/// entries are a fatal artifact error; a list shorter than the output
/// length is accepted (short final lists are the documented consequence).
#[derive(Debug, Clone)]
pub struct FallbackList {
    items: Vec<Aid>,
}

impl FallbackList {
    pub fn new(items: Vec<Aid>) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(items.len());
        for &aid in &items {
            if !seen.insert(aid) {
                return Err(invalid("fallback", format!("duplicate item {aid}")));
            }
        }
        if items.len() < DEFAULT_RECOMMENDATIONS {
            warn!(
                len = items.len(),
                wanted = DEFAULT_RECOMMENDATIONS,
                "Fallback list is shorter than the output length; lists may come out short"
            );
        }
        Ok(Self { items })
    }

    /// Load from a JSON export of shape `[aid, ...]`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = open_artifact("fallback", path)?;
        let items: Vec<Aid> =
            serde_json::from_reader(reader).map_err(|e| invalid("fallback", e.to_string()))?;
        let list = Self::new(items)?;
        info!(items = list.items.len(), "Loaded fallback list");
        Ok(list)
    }

    pub fn items(&self) -> &[Aid] {
        &self.items
    }

    /// First `n` fallback items (or all of them, if fewer)
    pub fn head(&self, n: usize) -> &[Aid] {
        &self.items[..self.items.len().min(n)]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
