//! Batched purchase requests and their shared validation.
//!
//! Level-ups, upgrade and perk purchases all take parallel `ids` and
//! `amounts` lists. Validation is pure: it produces the list of
//! `(id, amount)` deltas or the first failure, and the engines apply the
//! deltas only after every check (including affordability) has passed.

use cryptolygon_core::error::{CallError, CallResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub ids: Vec<u32>,
    pub amounts: Vec<u32>,
}

impl Batch {
    pub fn new(ids: Vec<u32>, amounts: Vec<u32>) -> Self {
        Self { ids, amounts }
    }

    pub fn single(id: u32, amount: u32) -> Self {
        Self::new(vec![id], vec![amount])
    }
}

/// One validated purchase line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub id: u32,
    pub amount: u32,
}

/// Check shape and ranges of `batch` against a tier list of `tier_count`
/// entries.
///
/// A tier may appear only once: every line is priced from the pre-call
/// level, so `[0, 0] × [1, 1]` would otherwise buy two levels at the
/// price of the first one twice.
pub fn validate(batch: &Batch, tier_count: u32) -> CallResult<Vec<Delta>> {
    if batch.ids.is_empty() {
        return Err(CallError::invalid("empty batch"));
    }
    if batch.ids.len() != batch.amounts.len() {
        return Err(CallError::invalid(format!(
            "{} ids but {} amounts",
            batch.ids.len(),
            batch.amounts.len()
        )));
    }

    let mut seen = BTreeSet::new();
    let mut deltas = Vec::with_capacity(batch.ids.len());
    for (&id, &amount) in batch.ids.iter().zip(&batch.amounts) {
        if amount == 0 {
            return Err(CallError::invalid(format!("zero amount for tier {id}")));
        }
        if id >= tier_count {
            return Err(CallError::invalid(format!(
                "tier {id} out of range ({tier_count} tiers)"
            )));
        }
        if !seen.insert(id) {
            return Err(CallError::invalid(format!("tier {id} repeated in batch")));
        }
        deltas.push(Delta { id, amount });
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(result: CallResult<Vec<Delta>>) -> String {
        match result {
            Err(CallError::InvalidArguments(reason)) => reason,
            other => panic!("expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn valid_batch_yields_deltas_in_order() {
        let deltas = validate(&Batch::new(vec![2, 0], vec![1, 5]), 3).unwrap();
        assert_eq!(
            deltas,
            vec![Delta { id: 2, amount: 1 }, Delta { id: 0, amount: 5 }]
        );
    }

    // -----------------------------------------------------------------------
    // Error paths
    // -----------------------------------------------------------------------

    #[test]
    fn empty_batch() {
        assert!(invalid(validate(&Batch::new(vec![], vec![]), 3)).contains("empty"));
    }

    #[test]
    fn mismatched_lengths() {
        let reason = invalid(validate(&Batch::new(vec![0, 1], vec![1]), 3));
        assert!(reason.contains("2 ids but 1 amounts"), "got: {reason}");
    }

    #[test]
    fn zero_amount() {
        assert!(invalid(validate(&Batch::single(0, 0), 3)).contains("zero"));
    }

    #[test]
    fn out_of_range_tier() {
        assert!(invalid(validate(&Batch::single(3, 1), 3)).contains("out of range"));
    }

    #[test]
    fn repeated_tier() {
        assert!(invalid(validate(&Batch::new(vec![1, 1], vec![1, 1]), 3)).contains("repeated"));
    }
}
