//! Manual override pass
//!
//! Applies parsed reviewer decisions to a merged set. Records are never
//! mutated in place: each override constructs a replacement record
//! carrying a `manual_screening` block and the AI decision it displaced,
//! so re-running the pass cannot lose the original verdict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use reviewforge_common::models::{Decision, ManualScreening, MergedPaper};

use crate::decisions::ScreeningDecisions;

/// Post-override decision counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTally {
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
}

/// Apply reviewer decisions to a merged set, by displayed position.
///
/// Indices beyond the set are ignored. When a position appears in both
/// selections the rejection wins. Returns the updated set plus the
/// resulting decision tally.
pub fn apply_decisions(
    papers: &[MergedPaper],
    decisions: &ScreeningDecisions,
    timestamp: DateTime<Utc>,
) -> (Vec<MergedPaper>, OverrideTally) {
    let mut updated = Vec::with_capacity(papers.len());
    let mut overridden = 0usize;

    for (index, paper) in papers.iter().enumerate() {
        let manual = if decisions.reject.contains(index) {
            Some(Decision::Exclude)
        } else if decisions.approve.contains(index) {
            Some(Decision::Include)
        } else {
            None
        };

        match manual {
            Some(decision) => {
                overridden += 1;
                updated.push(with_override(paper, decision, timestamp));
            }
            None => updated.push(paper.clone()),
        }
    }

    let tally = tally(&updated);
    debug!(
        overridden,
        approved = tally.approved,
        rejected = tally.rejected,
        pending = tally.pending,
        "Manual override pass applied"
    );
    (updated, tally)
}

/// Count effective decisions across a merged set
pub fn tally(papers: &[MergedPaper]) -> OverrideTally {
    let mut counts = OverrideTally {
        approved: 0,
        rejected: 0,
        pending: 0,
    };
    for paper in papers {
        match paper.effective_decision() {
            Decision::Include => counts.approved += 1,
            Decision::Exclude => counts.rejected += 1,
            Decision::Unknown => counts.pending += 1,
        }
    }
    counts
}

fn with_override(paper: &MergedPaper, decision: Decision, timestamp: DateTime<Utc>) -> MergedPaper {
    let mut replacement = paper.clone();
    // Keep the first displaced AI decision across repeated passes
    replacement.original_ai_decision = paper
        .original_ai_decision
        .or(Some(paper.paper.decision));
    replacement.manual_screening = Some(ManualScreening {
        decision,
        timestamp,
    });
    replacement
}
