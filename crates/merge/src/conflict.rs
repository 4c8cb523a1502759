//! Conflict detection
//!
//! Pure classification of an identity group by the set of distinct
//! screening decisions it carries. `Unknown` counts as a distinct value,
//! so an unscreened record among INCLUDE/EXCLUDE siblings is itself a
//! conflict.

use std::collections::HashSet;

use reviewforge_common::models::{Decision, ScreenedPaper};

/// Verdict over one identity group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupVerdict {
    /// All members carry the same decision
    Unanimous,
    /// At least two distinct decisions are present
    Conflicting,
}

/// Classify a group by its distinct decision values
pub fn classify(papers: &[ScreenedPaper]) -> GroupVerdict {
    let distinct: HashSet<Decision> = papers.iter().map(|p| p.decision).collect();
    if distinct.len() > 1 {
        GroupVerdict::Conflicting
    } else {
        GroupVerdict::Unanimous
    }
}
