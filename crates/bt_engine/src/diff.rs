//! Point-set diffing.
//!
//! Equality is by content signature, not position. Signature misses on both
//! sides go through a greedy similarity pass that reclassifies close
//! deletion/addition pairs as updates.

use std::collections::HashSet;

use bt_core::signature;
use bt_core::types::{ChangeDetails, ChangeLabel, DiffResult, DiffStats, Point, UpdatePair};

/// A deletion/addition pair becomes an update only above this score.
const SIMILARITY_THRESHOLD: f64 = 0.5;
/// Label thresholds, descriptive metadata only.
const UPDATED_THRESHOLD: f64 = 0.7;
const REPLACED_THRESHOLD: f64 = 0.3;

/// Ceiling on `|deletions| x |additions|` similarity computations. Past it
/// the reconciliation pass is skipped and candidates stay raw adds/deletes.
const RECONCILE_CELL_BUDGET: usize = 100_000;

#[derive(Debug, Clone)]
pub struct StateDiffEngine {
    cell_budget: usize,
}

impl Default for StateDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateDiffEngine {
    pub fn new() -> Self {
        Self {
            cell_budget: RECONCILE_CELL_BUDGET,
        }
    }

    pub fn with_cell_budget(cell_budget: usize) -> Self {
        Self { cell_budget }
    }

    /// Classifies every current point as unchanged, added, or updated and
    /// every vanished previous point as deleted.
    pub fn diff(&self, previous: &[Point], current: &[Point]) -> DiffResult {
        let prev_sigs: HashSet<&str> = previous
            .iter()
            .map(|p| p.content_signature.as_str())
            .collect();
        let curr_sigs: HashSet<&str> = current
            .iter()
            .map(|p| p.content_signature.as_str())
            .collect();

        let unchanged = current
            .iter()
            .filter(|p| prev_sigs.contains(p.content_signature.as_str()))
            .count();

        let deletion_candidates: Vec<&Point> = previous
            .iter()
            .filter(|p| !curr_sigs.contains(p.content_signature.as_str()))
            .collect();
        let addition_candidates: Vec<&Point> = current
            .iter()
            .filter(|p| !prev_sigs.contains(p.content_signature.as_str()))
            .collect();

        let (updated, added, deleted) =
            self.reconcile(deletion_candidates, addition_candidates);

        let stats = DiffStats {
            unchanged,
            added: added.len(),
            updated: updated.len(),
            deleted: deleted.len(),
        };

        DiffResult {
            added,
            updated,
            deleted,
            stats,
        }
    }

    /// Greedy pairing of deletions against unconsumed additions: each deletion
    /// takes its best-scoring available addition when the score clears the
    /// threshold. Ties break toward the first-seen addition; the matching is
    /// not globally optimal.
    fn reconcile(
        &self,
        deletions: Vec<&Point>,
        additions: Vec<&Point>,
    ) -> (Vec<UpdatePair>, Vec<Point>, Vec<Point>) {
        if deletions.len() * additions.len() > self.cell_budget {
            tracing::warn!(
                "skipping update reconciliation: {} deletions x {} additions exceeds the cell budget",
                deletions.len(),
                additions.len()
            );
            return (
                Vec::new(),
                additions.into_iter().cloned().collect(),
                deletions.into_iter().cloned().collect(),
            );
        }

        let mut consumed = vec![false; additions.len()];
        let mut updated = Vec::new();
        let mut deleted = Vec::new();

        for prev in deletions {
            let prev_text = prev.combined_content();
            let mut best: Option<(usize, f64)> = None;
            for (idx, candidate) in additions.iter().enumerate() {
                if consumed[idx] {
                    continue;
                }
                let score = signature::similarity(&prev_text, &candidate.combined_content());
                let better = match best {
                    Some((_, best_score)) => score > best_score,
                    None => true,
                };
                if better {
                    best = Some((idx, score));
                }
            }

            match best {
                Some((idx, score)) if score > SIMILARITY_THRESHOLD => {
                    consumed[idx] = true;
                    let current = additions[idx].clone();
                    let change_details = change_details(prev, &current, score);
                    updated.push(UpdatePair {
                        previous: prev.clone(),
                        current,
                        similarity_score: score,
                        change_details,
                    });
                }
                _ => deleted.push(prev.clone()),
            }
        }

        let added = additions
            .into_iter()
            .zip(consumed)
            .filter(|(_, taken)| !taken)
            .map(|(p, _)| p.clone())
            .collect();

        (updated, added, deleted)
    }
}

/// Labels how far apart an update pair drifted. Separate from the pairing
/// decision, which only uses the threshold above.
pub fn classify_change_label(score: f64) -> ChangeLabel {
    if score >= UPDATED_THRESHOLD {
        ChangeLabel::Updated
    } else if score < REPLACED_THRESHOLD {
        ChangeLabel::Replaced
    } else {
        ChangeLabel::Modified
    }
}

fn change_details(previous: &Point, current: &Point, score: f64) -> ChangeDetails {
    let counts = signature::change_counts(
        &previous.combined_content(),
        &current.combined_content(),
    );
    ChangeDetails {
        label: classify_change_label(score),
        additions: counts.additions,
        deletions: counts.deletions,
        unchanged: counts.unchanged,
    }
}
