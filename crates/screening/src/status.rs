//! Screening status aggregation
//!
//! Per-query summaries over the raw screened records and an overall
//! status over the merged set, as displayed between pipeline stages.

use serde::{Deserialize, Serialize};

use reviewforge_common::models::{Decision, MergedPaper, ScreenedPaper};

/// Screening outcome counts for one source query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySummary {
    pub source_query_id: i64,
    pub description: String,
    pub papers_found: usize,
    pub included: usize,
    pub excluded: usize,
    pub unknown: usize,
}

/// Overall status of a merged set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningStatus {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
}

/// Summarize raw screened records per source query, in first-appearance
/// order of the queries.
pub fn query_summaries(papers: &[ScreenedPaper]) -> Vec<QuerySummary> {
    let mut summaries: Vec<QuerySummary> = Vec::new();

    for paper in papers {
        let slot = match summaries
            .iter()
            .position(|s| s.source_query_id == paper.source_query_id)
        {
            Some(slot) => slot,
            None => {
                summaries.push(QuerySummary {
                    source_query_id: paper.source_query_id,
                    description: paper.source_query_description.clone(),
                    papers_found: 0,
                    included: 0,
                    excluded: 0,
                    unknown: 0,
                });
                summaries.len() - 1
            }
        };

        let summary = &mut summaries[slot];
        summary.papers_found += 1;
        match paper.decision {
            Decision::Include => summary.included += 1,
            Decision::Exclude => summary.excluded += 1,
            Decision::Unknown => summary.unknown += 1,
        }
    }

    summaries
}

/// Overall status of a merged set, honoring manual overrides
pub fn screening_status(merged: &[MergedPaper]) -> ScreeningStatus {
    let mut status = ScreeningStatus {
        total: merged.len(),
        approved: 0,
        rejected: 0,
        pending: 0,
    };
    for paper in merged {
        match paper.effective_decision() {
            Decision::Include => status.approved += 1,
            Decision::Exclude => status.rejected += 1,
            Decision::Unknown => status.pending += 1,
        }
    }
    status
}
