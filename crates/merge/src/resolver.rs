//! Conflict resolution strategies
//!
//! Given an identity group whose screening decisions disagree, produce
//! one merged record. Deterministic strategies run unattended; the
//! manual strategy asks an injected [`HumanArbiter`] and fails closed
//! when none is attached, reporting the group as unresolved instead of
//! guessing.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use reviewforge_common::errors::{AppError, Result};
use reviewforge_common::identity::IdentityKey;
use reviewforge_common::models::{
    ConflictResolution, Decision, MergedPaper, ResolutionMethod, ScreenedPaper,
};

use crate::audit;

/// Conflict resolution strategy selected for a merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Include the paper, overriding any rejections
    ForceInclude,
    /// Exclude the paper, overriding any inclusions
    ForceExclude,
    /// Adopt the decision with the highest confidence
    HighestConfidence,
    /// Adopt the most recently produced decision
    MostRecent,
    /// Ask the attached human arbiter per conflict
    Manual,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::ForceInclude => "force_include",
            ResolutionPolicy::ForceExclude => "force_exclude",
            ResolutionPolicy::HighestConfidence => "highest_confidence",
            ResolutionPolicy::MostRecent => "most_recent",
            ResolutionPolicy::Manual => "manual",
        }
    }
}

impl std::str::FromStr for ResolutionPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "force_include" => Ok(ResolutionPolicy::ForceInclude),
            "force_exclude" => Ok(ResolutionPolicy::ForceExclude),
            "highest_confidence" => Ok(ResolutionPolicy::HighestConfidence),
            "most_recent" => Ok(ResolutionPolicy::MostRecent),
            "manual" => Ok(ResolutionPolicy::Manual),
            other => Err(AppError::Configuration {
                message: format!("unknown resolution strategy: {other}"),
            }),
        }
    }
}

/// One command from the human arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterChoice {
    ForceInclude,
    ForceExclude,
    HighestConfidence,
    MostRecent,
    /// Re-prompt after the arbiter has inspected more detail
    ShowMoreDetail,
    /// Abort the whole merge run
    Quit,
}

/// Synchronous human-decision collaborator for the manual strategy.
///
/// `decide` is called with the full group detail and may be called
/// repeatedly for the same group when it answers `ShowMoreDetail`.
/// There is no timeout; the wait is an intentional human-in-the-loop
/// suspension.
pub trait HumanArbiter {
    fn decide(&mut self, key: &IdentityKey, papers: &[ScreenedPaper]) -> ArbiterChoice;
}

/// A conflicting group the run could not settle (manual strategy with no
/// arbiter attached). Reported to the caller so the run can be retried
/// later for just these groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedConflict {
    pub key: IdentityKey,
    pub papers: Vec<ScreenedPaper>,
}

/// Outcome of resolving one conflicting group
#[derive(Debug, Clone)]
pub enum Resolved {
    Merged(Box<MergedPaper>),
    Unresolved(UnresolvedConflict),
}

/// Resolve one conflicting group. `papers` must be a non-empty identity
/// group in original group order.
pub fn resolve_group(
    key: &IdentityKey,
    papers: &[ScreenedPaper],
    policy: ResolutionPolicy,
    mut arbiter: Option<&mut dyn HumanArbiter>,
) -> Result<Resolved> {
    let merged = match policy {
        ResolutionPolicy::ForceInclude => {
            forced(papers, Decision::Include, ResolutionMethod::ForceInclude)
        }
        ResolutionPolicy::ForceExclude => {
            forced(papers, Decision::Exclude, ResolutionMethod::ForceExclude)
        }
        ResolutionPolicy::HighestConfidence => select_highest_confidence(papers),
        ResolutionPolicy::MostRecent => select_most_recent(papers),
        ResolutionPolicy::Manual => {
            let Some(arbiter) = arbiter.as_deref_mut() else {
                warn!(key = %key, "Manual resolution requested with no arbiter attached");
                return Ok(Resolved::Unresolved(UnresolvedConflict {
                    key: key.clone(),
                    papers: papers.to_vec(),
                }));
            };
            loop {
                match arbiter.decide(key, papers) {
                    ArbiterChoice::ForceInclude => {
                        break forced(papers, Decision::Include, ResolutionMethod::ManualInclude)
                    }
                    ArbiterChoice::ForceExclude => {
                        break forced(papers, Decision::Exclude, ResolutionMethod::ManualExclude)
                    }
                    ArbiterChoice::HighestConfidence => break select_highest_confidence(papers),
                    ArbiterChoice::MostRecent => break select_most_recent(papers),
                    ArbiterChoice::ShowMoreDetail => {
                        debug!(key = %key, "Arbiter requested more detail, re-prompting");
                    }
                    ArbiterChoice::Quit => {
                        return Err(AppError::MergeAborted {
                            reason: format!("reviewer quit while resolving {key}"),
                        });
                    }
                }
            }
        }
    };

    debug!(
        key = %key,
        method = merged
            .conflict_resolution
            .as_ref()
            .map(|r| r.method.as_str())
            .unwrap_or(""),
        decision = %merged.paper.decision,
        "Conflict resolved"
    );
    Ok(Resolved::Merged(Box::new(merged)))
}

/// Override the group with a fixed decision at full confidence
fn forced(papers: &[ScreenedPaper], decision: Decision, method: ResolutionMethod) -> MergedPaper {
    let had: Vec<&str> = papers.iter().map(|p| p.decision.as_str()).collect();
    let chooser = match method {
        ResolutionMethod::ManualInclude | ResolutionMethod::ManualExclude => "reviewer chose",
        _ => "policy forced",
    };

    let mut paper = papers[0].clone();
    paper.decision = decision;
    paper.confidence = 1.0;
    paper.reason = format!(
        "Conflict resolution: {chooser} {decision} (had conflicts: [{}])",
        had.join(", ")
    );

    MergedPaper {
        paper,
        duplicate_sources: Vec::new(),
        conflict_resolution: Some(ConflictResolution {
            method,
            timestamp: Utc::now(),
            selected_confidence: None,
            selected_from_query: None,
            original_decisions: audit::decision_records(papers),
        }),
        manual_screening: None,
        original_ai_decision: None,
    }
}

/// Adopt the member with the maximum confidence verbatim. Ties keep the
/// first occurrence in group order.
fn select_highest_confidence(papers: &[ScreenedPaper]) -> MergedPaper {
    let mut best = 0;
    for i in 1..papers.len() {
        if papers[i].confidence > papers[best].confidence {
            best = i;
        }
    }
    adopt(papers, best, ResolutionMethod::HighestConfidence)
}

/// Adopt the most recently screened member verbatim. Missing timestamps
/// rank oldest; ties (and the all-missing case) fall back to the last
/// member in group order.
fn select_most_recent(papers: &[ScreenedPaper]) -> MergedPaper {
    let mut best = 0;
    for i in 1..papers.len() {
        if papers[i].screening_timestamp >= papers[best].screening_timestamp {
            best = i;
        }
    }
    adopt(papers, best, ResolutionMethod::MostRecent)
}

fn adopt(papers: &[ScreenedPaper], winner: usize, method: ResolutionMethod) -> MergedPaper {
    let selected = papers[winner].clone();
    MergedPaper {
        duplicate_sources: Vec::new(),
        conflict_resolution: Some(ConflictResolution {
            method,
            timestamp: Utc::now(),
            selected_confidence: Some(selected.confidence),
            selected_from_query: Some(selected.source_query_description.clone()),
            original_decisions: audit::decision_records(papers),
        }),
        manual_screening: None,
        original_ai_decision: None,
        paper: selected,
    }
}
