//! PRISMA flow numbers
//!
//! Computes the numeric flow-diagram figures the documentation
//! generator consumes. Prose generation lives outside this workspace;
//! only the numbers and run metadata are produced here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reviewforge_common::config::ReviewConfig;
use reviewforge_common::models::{MergeSummary, MergedPaper};

use crate::overrides;

/// PRISMA flow-diagram counts for one merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrismaFlow {
    /// Records identified across all queries, duplicates included
    pub records_identified: usize,
    pub duplicates_removed: usize,
    /// Unique records carrying a screening decision
    pub records_screened: usize,
    pub included: usize,
    pub excluded: usize,
    /// Records awaiting a decision (unknown or unresolved conflict)
    pub pending: usize,
    pub unresolved_conflicts: usize,
}

/// Report envelope for the PRISMA documentation generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismaReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub search_version: String,
    pub screening_version: String,
    pub search_timeframe: String,
    pub flow: PrismaFlow,
    pub conflicts_resolved: usize,
    pub deduplication_rate: String,
}

/// Assemble the PRISMA report from a merge run
pub fn generate(
    config: &ReviewConfig,
    summary: &MergeSummary,
    merged: &[MergedPaper],
) -> PrismaReport {
    let tally = overrides::tally(merged);

    let deduplication_rate = if summary.original_count > 0 {
        format!(
            "{:.1}%",
            summary.duplicates_removed as f64 / summary.original_count as f64 * 100.0
        )
    } else {
        "0%".to_string()
    };

    PrismaReport {
        run_id: summary.run_id,
        generated_at: summary.generated_at,
        search_version: config.review.search_version.clone(),
        screening_version: config.review.screening_version.clone(),
        search_timeframe: config.timeframe(),
        flow: PrismaFlow {
            records_identified: summary.original_count,
            duplicates_removed: summary.duplicates_removed,
            records_screened: summary.unique_count,
            included: tally.approved,
            excluded: tally.rejected,
            pending: tally.pending,
            unresolved_conflicts: summary.unresolved_conflicts,
        },
        conflicts_resolved: summary.conflicts_resolved,
        deduplication_rate,
    }
}
