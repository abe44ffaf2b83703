//! Stage 2 tail: ordering candidates and assembling final lists
//!
//! Pairs each candidate with its model score, orders by score descending
//! with an explicit tie-break (ascending aid, deterministic regardless of
//! sort internals), cuts to the output length, and pads short lists from
//! the fallback, skipping items already chosen.

use ordered_float::OrderedFloat;

use crate::artifacts::FallbackList;
use crate::session::Aid;

/// Order candidates by score and assemble one recommendation list
///
/// `scores` must be in pool order (the feature/score pipeline guarantees
/// this). The result has exactly `n` items whenever the fallback holds
/// enough unused entries, fewer only when it is exhausted.
pub fn rank(pool: &[Aid], scores: &[f64], fallback: &FallbackList, n: usize) -> Vec<Aid> {
    debug_assert_eq!(pool.len(), scores.len());

    let mut ranked: Vec<(Aid, f64)> = pool
        .iter()
        .copied()
        .zip(scores.iter().copied())
        .collect();
    // Score descending; equal scores order by ascending aid
    ranked.sort_by_key(|&(aid, score)| (std::cmp::Reverse(OrderedFloat(score)), aid));

    let mut list: Vec<Aid> = ranked.into_iter().take(n).map(|(aid, _)| aid).collect();
    pad_from_fallback(&mut list, fallback, n);
    list
}

/// The degenerate path: no candidates, the fallback head is the answer
pub fn fallback_only(fallback: &FallbackList, n: usize) -> Vec<Aid> {
    fallback.head(n).to_vec()
}

/// Append fallback items not already present, in fallback order, until the
/// list reaches `n` or the fallback is exhausted
fn pad_from_fallback(list: &mut Vec<Aid>, fallback: &FallbackList, n: usize) {
    if list.len() >= n {
        return;
    }
    let chosen: std::collections::HashSet<Aid> = list.iter().copied().collect();
    for &aid in fallback.items() {
        if list.len() >= n {
            break;
        }
        if !chosen.contains(&aid) {
            list.push(aid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback(items: Vec<Aid>) -> FallbackList {
        FallbackList::new(items).unwrap()
    }

    #[test]
    fn test_orders_by_score_descending() {
        let pool = vec![1, 2, 3];
        let scores = vec![0.2, 0.9, 0.5];
        let list = rank(&pool, &scores, &fallback(vec![]), 3);
        assert_eq!(list, vec![2, 3, 1]);
    }

    #[test]
    fn test_equal_scores_break_by_ascending_aid() {
        let pool = vec![30, 10, 20];
        let scores = vec![0.5, 0.5, 0.5];
        let list = rank(&pool, &scores, &fallback(vec![]), 3);
        assert_eq!(list, vec![10, 20, 30]);
    }

    #[test]
    fn test_truncates_to_output_length() {
        let pool: Vec<Aid> = (1..=30).collect();
        let scores: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let list = rank(&pool, &scores, &fallback(vec![]), 20);
        assert_eq!(list.len(), 20);
        assert_eq!(list[0], 30);
        assert_eq!(list[19], 11);
    }

    #[test]
    fn test_pads_short_lists_from_fallback() {
        let pool = vec![5, 6];
        let scores = vec![1.0, 2.0];
        // 6 is also in the fallback and must not be duplicated
        let list = rank(&pool, &scores, &fallback(vec![6, 7, 8, 9]), 5);
        assert_eq!(list, vec![6, 5, 7, 8, 9]);
    }

    #[test]
    fn test_short_fallback_yields_short_list() {
        let pool = vec![];
        let scores = vec![];
        let list = rank(&pool, &scores, &fallback(vec![1, 2, 3]), 20);
        assert_eq!(list, vec![1, 2, 3]);
    }

    #[test]
    fn test_fallback_only_head() {
        let fb = fallback((1..=25).collect());
        let list = fallback_only(&fb, 20);
        assert_eq!(list.len(), 20);
        assert_eq!(list[0], 1);
        assert_eq!(list[19], 20);

        let fb_short = fallback(vec![1, 2]);
        assert_eq!(fallback_only(&fb_short, 20), vec![1, 2]);
    }

    #[test]
    fn test_exact_output_length_with_sufficient_fallback() {
        let pool = vec![100];
        let scores = vec![1.0];
        let fb = fallback((1..=40).collect());
        let list = rank(&pool, &scores, &fb, 20);
        assert_eq!(list.len(), 20);
        // The scored candidate leads, the rest is fallback order
        assert_eq!(list[0], 100);
        assert_eq!(&list[1..], &(1..=19).collect::<Vec<Aid>>()[..]);
    }
}
