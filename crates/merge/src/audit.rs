//! Audit trail construction
//!
//! Every merged record carries one provenance entry per originating
//! group member, in original group order, regardless of which member or
//! strategy won. The merge engine calls this on every group before
//! emission; nothing is dropped or reordered.

use reviewforge_common::models::{DecisionRecord, ScreenedPaper};

/// Build the provenance list for a group, in group order
pub fn decision_records(papers: &[ScreenedPaper]) -> Vec<DecisionRecord> {
    papers.iter().map(DecisionRecord::from).collect()
}
