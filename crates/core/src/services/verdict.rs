//! Dominance verdict engine.
//!
//! Given category counts and the set of acceptable categories, decide whether
//! an expected category dominates the instruction mix:
//! - `pass`: the dominant category is expected and holds at least `threshold`
//!   of the counted instructions
//! - `fail`: the dominant category is not expected and strictly out-counts
//!   every expected category
//! - `ambiguous`: everything else, including an empty mix

use serde::{Deserialize, Serialize};

use crate::model::{Category, CategoryCounts, Judgement, VerdictResult};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Thresholds and filters applied when judging counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictPolicy {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Categories removed from the counts before judging.
    #[serde(default)]
    pub ignore: Vec<Category>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD, ignore: Vec::new() }
    }
}

impl VerdictPolicy {
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold, ..Self::default() }
    }
}

/// Highest-count category, ties resolved by `Category::PRIORITY`.
pub fn dominant(counts: &CategoryCounts) -> Option<Category> {
    let mut best: Option<(Category, u64)> = None;
    for (category, count) in counts.iter() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((category, count)),
        }
    }
    best.map(|(c, _)| c)
}

/// Judge `counts` against `expected`. Stateless and idempotent.
pub fn verdict(
    counts: &CategoryCounts,
    expected: &[Category],
    policy: &VerdictPolicy,
) -> Judgement {
    let counts = counts.without(&policy.ignore);
    let total = counts.total();
    let Some(observed) = dominant(&counts) else {
        return Judgement {
            observed: None,
            ratio: 0.0,
            margin: 0.0,
            result: VerdictResult::Ambiguous,
        };
    };

    let top = counts.get(observed);
    let runner_up =
        counts.iter().filter(|(c, _)| *c != observed).map(|(_, n)| n).max().unwrap_or(0);
    let ratio = top as f64 / total as f64;
    let margin = (top - runner_up) as f64 / total as f64;

    let result = if expected.contains(&observed) {
        if ratio >= policy.threshold {
            VerdictResult::Pass
        } else {
            VerdictResult::Ambiguous
        }
    } else {
        let best_expected = expected.iter().map(|c| counts.get(*c)).max().unwrap_or(0);
        if top > best_expected {
            VerdictResult::Fail
        } else {
            VerdictResult::Ambiguous
        }
    };

    Judgement { observed: Some(observed), ratio, margin, result }
}
