//! Merge engine
//!
//! Orchestrates grouping, conflict detection, and resolution across a
//! full snapshot of screened records. The pass is pure, synchronous
//! computation; for a fixed input order and a deterministic policy the
//! merged content and counters are fully reproducible.

use tracing::{info, warn};

use chrono::Utc;
use uuid::Uuid;

use reviewforge_common::errors::Result;
use reviewforge_common::models::{MergeSummary, MergedPaper, ScreenedPaper};

use crate::audit;
use crate::conflict::{self, GroupVerdict};
use crate::grouping;
use crate::resolver::{self, HumanArbiter, Resolved, ResolutionPolicy, UnresolvedConflict};

/// Result of one merge run
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Deduplicated records with audit trails, one per surviving group
    pub merged: Vec<MergedPaper>,

    /// Conflicting groups the run could not settle; retry later with an
    /// arbiter attached
    pub unresolved: Vec<UnresolvedConflict>,

    pub summary: MergeSummary,
}

/// Cross-query deduplication with conflict resolution
#[derive(Debug, Clone)]
pub struct MergeEngine {
    policy: ResolutionPolicy,
}

impl MergeEngine {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Merge without a human collaborator. Conflicting groups under the
    /// manual policy are reported as unresolved.
    pub fn merge(&self, papers: Vec<ScreenedPaper>) -> Result<MergeOutcome> {
        self.run(papers, None)
    }

    /// Merge with a human collaborator attached for the manual policy
    pub fn merge_with_arbiter(
        &self,
        papers: Vec<ScreenedPaper>,
        arbiter: &mut dyn HumanArbiter,
    ) -> Result<MergeOutcome> {
        self.run(papers, Some(arbiter))
    }

    fn run(
        &self,
        papers: Vec<ScreenedPaper>,
        mut arbiter: Option<&mut dyn HumanArbiter>,
    ) -> Result<MergeOutcome> {
        let original_count = papers.len();
        let grouped = grouping::group_by_identity(papers);

        let mut merged: Vec<MergedPaper> = Vec::new();
        let mut unresolved: Vec<UnresolvedConflict> = Vec::new();
        let mut duplicates_removed = 0usize;
        let mut conflicts_resolved = 0usize;

        for group in grouped.groups {
            let trail = audit::decision_records(&group.papers);
            let size = group.papers.len();

            if size == 1 {
                if let Some(paper) = group.papers.into_iter().next() {
                    merged.push(MergedPaper::from_paper(paper, trail));
                }
                continue;
            }

            match conflict::classify(&group.papers) {
                GroupVerdict::Unanimous => {
                    duplicates_removed += size - 1;
                    if let Some(representative) = group.papers.into_iter().next() {
                        merged.push(MergedPaper::from_paper(representative, trail));
                    }
                }
                GroupVerdict::Conflicting => {
                    let reborrowed: Option<&mut dyn HumanArbiter> = match &mut arbiter {
                        Some(a) => Some(&mut **a),
                        None => None,
                    };
                    match resolver::resolve_group(
                        &group.key,
                        &group.papers,
                        self.policy,
                        reborrowed,
                    )? {
                        Resolved::Merged(mut paper) => {
                            duplicates_removed += size - 1;
                            conflicts_resolved += 1;
                            paper.duplicate_sources = trail;
                            merged.push(*paper);
                        }
                        Resolved::Unresolved(conflict) => {
                            warn!(key = %conflict.key, members = size, "Group left unresolved");
                            unresolved.push(conflict);
                        }
                    }
                }
            }
        }

        // No-identity records flow straight through as unique, keeping
        // input order, each with its own single-entry trail.
        for paper in grouped.no_identity {
            let trail = audit::decision_records(std::slice::from_ref(&paper));
            merged.push(MergedPaper::from_paper(paper, trail));
        }

        let summary = MergeSummary {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            original_count,
            duplicates_removed,
            conflicts_resolved,
            unresolved_conflicts: unresolved.len(),
            unique_count: merged.len(),
        };

        info!(
            run_id = %summary.run_id,
            original = summary.original_count,
            duplicates_removed = summary.duplicates_removed,
            conflicts_resolved = summary.conflicts_resolved,
            unresolved = summary.unresolved_conflicts,
            unique = summary.unique_count,
            "Merge run complete"
        );

        Ok(MergeOutcome {
            merged,
            unresolved,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ArbiterChoice;
    use reviewforge_common::identity::IdentityKey;
    use reviewforge_common::models::{Bibliography, Decision, ExternalId, ResolutionMethod};

    fn paper(
        title: &str,
        doi: Option<&str>,
        decision: Decision,
        confidence: f64,
        query_id: i64,
    ) -> ScreenedPaper {
        ScreenedPaper {
            title: title.into(),
            external_ids: doi.map(|d| vec![ExternalId::doi(d)]).unwrap_or_default(),
            decision,
            confidence,
            reason: format!("reason {query_id}"),
            source_query_id: query_id,
            source_query_description: format!("Query {query_id}"),
            screening_timestamp: None,
            bibliography: Bibliography::default(),
        }
    }

    #[test]
    fn test_unanimous_group_passes_through_with_trail() {
        // Scenario: three records share one DOI, all INCLUDE
        let engine = MergeEngine::new(ResolutionPolicy::HighestConfidence);
        let outcome = engine
            .merge(vec![
                paper("A", Some("10.1/x"), Decision::Include, 0.9, 1),
                paper("A", Some("10.1/x"), Decision::Include, 0.6, 2),
                paper("A", Some("10.1/x"), Decision::Include, 0.95, 3),
            ])
            .unwrap();

        assert_eq!(outcome.merged.len(), 1);
        let survivor = &outcome.merged[0];
        assert_eq!(survivor.duplicate_sources.len(), 3);
        assert!(survivor.conflict_resolution.is_none());
        // Representative is the first member
        assert_eq!(survivor.paper.source_query_id, 1);

        assert_eq!(outcome.summary.original_count, 3);
        assert_eq!(outcome.summary.duplicates_removed, 2);
        assert_eq!(outcome.summary.conflicts_resolved, 0);
        assert_eq!(outcome.summary.unique_count, 1);
    }

    #[test]
    fn test_conflicting_group_is_resolved_and_counted() {
        let engine = MergeEngine::new(ResolutionPolicy::HighestConfidence);
        let outcome = engine
            .merge(vec![
                paper("B", Some("10.1/y"), Decision::Include, 0.9, 1),
                paper("B", Some("10.1/y"), Decision::Exclude, 0.8, 2),
            ])
            .unwrap();

        assert_eq!(outcome.merged.len(), 1);
        let survivor = &outcome.merged[0];
        assert_eq!(survivor.paper.decision, Decision::Include);
        assert_eq!(survivor.paper.confidence, 0.9);
        assert_eq!(survivor.duplicate_sources.len(), 2);
        let resolution = survivor.conflict_resolution.as_ref().unwrap();
        assert_eq!(resolution.method, ResolutionMethod::HighestConfidence);
        assert_eq!(resolution.original_decisions.len(), 2);

        assert_eq!(outcome.summary.duplicates_removed, 1);
        assert_eq!(outcome.summary.conflicts_resolved, 1);
    }

    #[test]
    fn test_no_identity_papers_stay_unique() {
        // Scenario: one record without identifiers next to one with a DOI
        let engine = MergeEngine::new(ResolutionPolicy::HighestConfidence);
        let outcome = engine
            .merge(vec![
                paper("unidentified", None, Decision::Include, 0.7, 1),
                paper("identified", Some("10.1/z"), Decision::Include, 0.8, 2),
            ])
            .unwrap();

        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.summary.duplicates_removed, 0);
        assert_eq!(outcome.summary.unique_count, 2);
        // Uniform trail: even singletons carry their own entry
        assert!(outcome.merged.iter().all(|m| m.duplicate_sources.len() == 1));
    }

    #[test]
    fn test_identical_no_identity_papers_never_grouped() {
        let engine = MergeEngine::new(ResolutionPolicy::HighestConfidence);
        let outcome = engine
            .merge(vec![
                paper("same", None, Decision::Include, 0.5, 1),
                paper("same", None, Decision::Include, 0.5, 1),
            ])
            .unwrap();
        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.summary.duplicates_removed, 0);
    }

    #[test]
    fn test_manual_without_arbiter_reports_unresolved_and_continues() {
        // Scenario: manual strategy, no collaborator attached
        let engine = MergeEngine::new(ResolutionPolicy::Manual);
        let outcome = engine
            .merge(vec![
                paper("conflicted", Some("10.1/c"), Decision::Include, 0.9, 1),
                paper("conflicted", Some("10.1/c"), Decision::Exclude, 0.8, 2),
                paper("clean", Some("10.1/d"), Decision::Include, 0.7, 1),
            ])
            .unwrap();

        assert_eq!(outcome.unresolved.len(), 1);
        assert_eq!(outcome.unresolved[0].papers.len(), 2);
        // The clean group still merges
        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].paper.title, "clean");

        assert_eq!(outcome.summary.unresolved_conflicts, 1);
        assert_eq!(outcome.summary.conflicts_resolved, 0);
        assert_eq!(outcome.summary.duplicates_removed, 0);
        assert_eq!(outcome.summary.unique_count, 1);
    }

    #[test]
    fn test_arbiter_quit_aborts_run() {
        struct Quitter;
        impl HumanArbiter for Quitter {
            fn decide(&mut self, _: &IdentityKey, _: &[ScreenedPaper]) -> ArbiterChoice {
                ArbiterChoice::Quit
            }
        }

        let engine = MergeEngine::new(ResolutionPolicy::Manual);
        let mut arbiter = Quitter;
        let err = engine
            .merge_with_arbiter(
                vec![
                    paper("conflicted", Some("10.1/c"), Decision::Include, 0.9, 1),
                    paper("conflicted", Some("10.1/c"), Decision::Exclude, 0.8, 2),
                ],
                &mut arbiter,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            reviewforge_common::errors::AppError::MergeAborted { .. }
        ));
    }

    #[test]
    fn test_empty_input_yields_zero_summary() {
        let engine = MergeEngine::new(ResolutionPolicy::HighestConfidence);
        let outcome = engine.merge(Vec::new()).unwrap();
        assert!(outcome.merged.is_empty());
        assert!(outcome.unresolved.is_empty());
        assert_eq!(outcome.summary.original_count, 0);
        assert_eq!(outcome.summary.unique_count, 0);
        assert_eq!(outcome.summary.duplicates_removed, 0);
    }

    #[test]
    fn test_merge_is_idempotent_on_deduplicated_unanimous_set() {
        let engine = MergeEngine::new(ResolutionPolicy::HighestConfidence);
        let input = vec![
            paper("A", Some("10.1/a"), Decision::Include, 0.9, 1),
            paper("B", Some("10.1/b"), Decision::Exclude, 0.8, 2),
            paper("C", None, Decision::Include, 0.7, 3),
        ];

        let first = engine.merge(input).unwrap();
        let papers_again: Vec<ScreenedPaper> =
            first.merged.iter().map(|m| m.paper.clone()).collect();
        let second = engine.merge(papers_again).unwrap();

        let titles: Vec<&str> = second.merged.iter().map(|m| m.paper.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(second.summary.duplicates_removed, 0);
        assert_eq!(second.summary.conflicts_resolved, 0);
        for (a, b) in first.merged.iter().zip(second.merged.iter()) {
            assert_eq!(a.paper, b.paper);
        }
    }

    #[test]
    fn test_deterministic_for_fixed_input_and_policy() {
        let input = || {
            vec![
                paper("B", Some("10.1/y"), Decision::Include, 0.9, 1),
                paper("B", Some("10.1/y"), Decision::Exclude, 0.8, 2),
                paper("A", Some("10.1/x"), Decision::Include, 0.6, 1),
                paper("loose", None, Decision::Unknown, 0.0, 3),
            ]
        };

        let engine = MergeEngine::new(ResolutionPolicy::MostRecent);
        let one = engine.merge(input()).unwrap();
        let two = engine.merge(input()).unwrap();

        assert_eq!(one.merged.len(), two.merged.len());
        for (a, b) in one.merged.iter().zip(two.merged.iter()) {
            assert_eq!(a.paper, b.paper);
            assert_eq!(a.duplicate_sources, b.duplicate_sources);
        }
        assert_eq!(one.summary.duplicates_removed, two.summary.duplicates_removed);
        assert_eq!(one.summary.conflicts_resolved, two.summary.conflicts_resolved);
    }

    #[test]
    fn test_conflict_accounting_across_mixed_groups() {
        let engine = MergeEngine::new(ResolutionPolicy::ForceInclude);
        let outcome = engine
            .merge(vec![
                // Unanimous triple
                paper("A", Some("10.1/a"), Decision::Include, 0.9, 1),
                paper("A", Some("10.1/a"), Decision::Include, 0.6, 2),
                paper("A", Some("10.1/a"), Decision::Include, 0.95, 3),
                // Conflicting pair
                paper("B", Some("10.1/b"), Decision::Include, 0.9, 1),
                paper("B", Some("10.1/b"), Decision::Exclude, 0.8, 2),
                // Conflicting pair via Unknown
                paper("C", Some("10.1/c"), Decision::Include, 0.7, 1),
                paper("C", Some("10.1/c"), Decision::Unknown, 0.0, 3),
                // Singleton
                paper("D", Some("10.1/d"), Decision::Exclude, 0.5, 2),
            ])
            .unwrap();

        assert_eq!(outcome.summary.original_count, 8);
        // sum(size - 1) over multi-member groups: 2 + 1 + 1
        assert_eq!(outcome.summary.duplicates_removed, 4);
        // exactly the groups whose decisions are not all equal
        assert_eq!(outcome.summary.conflicts_resolved, 2);
        assert_eq!(outcome.summary.unique_count, outcome.merged.len());
        assert_eq!(outcome.merged.len(), 4);

        // Audit completeness: trail length equals originating group size
        let by_title = |t: &str| {
            outcome
                .merged
                .iter()
                .find(|m| m.paper.title == t)
                .unwrap()
        };
        assert_eq!(by_title("A").duplicate_sources.len(), 3);
        assert_eq!(by_title("B").duplicate_sources.len(), 2);
        assert_eq!(by_title("C").duplicate_sources.len(), 2);
        assert_eq!(by_title("D").duplicate_sources.len(), 1);
    }
}
