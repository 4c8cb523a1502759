//! Screening record models
//!
//! Typed records for the screening pipeline. Untyped snapshot JSON is
//! converted through [`normalize`] exactly once at the boundary; inside
//! the workspace every record is one of these types and is never
//! mutated after construction.

pub mod normalize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screening decision for one paper under one query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Include,
    Exclude,
    #[default]
    Unknown,
}

impl Decision {
    /// Lenient parse used at the snapshot boundary. Anything that is not
    /// recognizably INCLUDE or EXCLUDE normalizes to Unknown.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INCLUDE" | "INCLUDED" | "APPROVED" => Decision::Include,
            "EXCLUDE" | "EXCLUDED" | "REJECTED" => Decision::Exclude,
            _ => Decision::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Include => "INCLUDE",
            Decision::Exclude => "EXCLUDE",
            Decision::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier scheme for an external paper id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierKind {
    Doi,
    OpenalexId,
}

/// One typed external identifier attached to a paper record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalId {
    #[serde(rename = "type")]
    pub kind: IdentifierKind,
    pub value: String,
}

impl ExternalId {
    pub fn doi(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Doi,
            value: value.into(),
        }
    }

    pub fn openalex(value: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::OpenalexId,
            value: value.into(),
        }
    }
}

/// Bibliographic metadata carried through the pipeline unmodified.
///
/// Only the fields the reporting layer displays are typed; everything
/// else rides along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bibliography {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,

    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<i64>,

    /// Unrecognized bibliographic fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One paper as seen through one query's screening pass.
///
/// Created once per (paper, query) pair and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenedPaper {
    pub title: String,

    /// Typed external identifiers in priority order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<ExternalId>,

    #[serde(default)]
    pub decision: Decision,

    /// Classifier confidence in [0.0, 1.0]
    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub reason: String,

    pub source_query_id: i64,

    #[serde(default)]
    pub source_query_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screening_timestamp: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub bibliography: Bibliography,
}

/// Provenance entry for one original screening decision.
///
/// Attached to the audit trail of whichever merged record survives;
/// immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub source_query_id: i64,
    pub source_query_description: String,
    pub decision: Decision,
    pub confidence: f64,
    pub reason: String,
}

impl From<&ScreenedPaper> for DecisionRecord {
    fn from(paper: &ScreenedPaper) -> Self {
        Self {
            source_query_id: paper.source_query_id,
            source_query_description: paper.source_query_description.clone(),
            decision: paper.decision,
            confidence: paper.confidence,
            reason: paper.reason.clone(),
        }
    }
}

/// How a decision conflict was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    ManualInclude,
    ManualExclude,
    ForceInclude,
    ForceExclude,
    HighestConfidence,
    MostRecent,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::ManualInclude => "manual_include",
            ResolutionMethod::ManualExclude => "manual_exclude",
            ResolutionMethod::ForceInclude => "force_include",
            ResolutionMethod::ForceExclude => "force_exclude",
            ResolutionMethod::HighestConfidence => "highest_confidence",
            ResolutionMethod::MostRecent => "most_recent",
        }
    }
}

/// Audit block recorded on a merged paper whose group disagreed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub method: ResolutionMethod,

    pub timestamp: DateTime<Utc>,

    /// Confidence of the adopted member (selection strategies only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_confidence: Option<f64>,

    /// Query the adopted member came from (selection strategies only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_from_query: Option<String>,

    /// Every original decision considered, in group order
    pub original_decisions: Vec<DecisionRecord>,
}

/// A human override applied after merging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualScreening {
    pub decision: Decision,
    pub timestamp: DateTime<Utc>,
}

/// Final output unit of a merge run.
///
/// Carries the surviving paper record plus the full audit trail of the
/// group it came from. Never mutated after creation; the manual override
/// pass constructs replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPaper {
    #[serde(flatten)]
    pub paper: ScreenedPaper,

    /// One provenance entry per originating group member, in group order
    #[serde(default)]
    pub duplicate_sources: Vec<DecisionRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_resolution: Option<ConflictResolution>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_screening: Option<ManualScreening>,

    /// AI decision as it stood before a manual override replaced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_ai_decision: Option<Decision>,
}

impl MergedPaper {
    /// Wrap a single surviving paper with its audit trail
    pub fn from_paper(paper: ScreenedPaper, duplicate_sources: Vec<DecisionRecord>) -> Self {
        Self {
            paper,
            duplicate_sources,
            conflict_resolution: None,
            manual_screening: None,
            original_ai_decision: None,
        }
    }

    /// The decision in force: manual override when present, else the
    /// merged screening decision
    pub fn effective_decision(&self) -> Decision {
        self.manual_screening
            .map(|m| m.decision)
            .unwrap_or(self.paper.decision)
    }
}

/// Aggregate counters for one merge run.
///
/// `original_count`, `duplicates_removed`, `conflicts_resolved` and
/// `unique_count` are the stable contract the reporting layer depends
/// on. Recomputed on every run, never persisted independently of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub original_count: usize,
    pub duplicates_removed: usize,
    pub conflicts_resolved: usize,
    pub unresolved_conflicts: usize,
    pub unique_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_normalize() {
        assert_eq!(Decision::normalize("INCLUDE"), Decision::Include);
        assert_eq!(Decision::normalize(" include "), Decision::Include);
        assert_eq!(Decision::normalize("rejected"), Decision::Exclude);
        assert_eq!(Decision::normalize("maybe"), Decision::Unknown);
        assert_eq!(Decision::normalize(""), Decision::Unknown);
    }

    #[test]
    fn test_decision_serializes_screaming() {
        let json = serde_json::to_string(&Decision::Include).unwrap();
        assert_eq!(json, "\"INCLUDE\"");
        let back: Decision = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(back, Decision::Unknown);
    }

    #[test]
    fn test_effective_decision_prefers_override() {
        let paper = ScreenedPaper {
            title: "A survey".into(),
            external_ids: vec![ExternalId::doi("10.1/x")],
            decision: Decision::Exclude,
            confidence: 0.4,
            reason: "off topic".into(),
            source_query_id: 1,
            source_query_description: "Query 1".into(),
            screening_timestamp: None,
            bibliography: Bibliography::default(),
        };
        let mut merged = MergedPaper::from_paper(paper, Vec::new());
        assert_eq!(merged.effective_decision(), Decision::Exclude);

        merged.manual_screening = Some(ManualScreening {
            decision: Decision::Include,
            timestamp: Utc::now(),
        });
        assert_eq!(merged.effective_decision(), Decision::Include);
    }

    #[test]
    fn test_merged_paper_round_trip_keeps_extra_metadata() {
        let mut bibliography = Bibliography {
            authors: vec!["A. Researcher".into()],
            venue: Some("NeurIPS".into()),
            publication_year: Some(2024),
            abstract_text: Some("We study...".into()),
            citation_count: Some(17),
            extra: serde_json::Map::new(),
        };
        bibliography
            .extra
            .insert("concepts".into(), serde_json::json!(["security"]));

        let paper = ScreenedPaper {
            title: "Prompt injection in the wild".into(),
            external_ids: vec![ExternalId::doi("10.1/y")],
            decision: Decision::Include,
            confidence: 0.92,
            reason: "directly relevant".into(),
            source_query_id: 2,
            source_query_description: "Query 2".into(),
            screening_timestamp: None,
            bibliography,
        };
        let merged = MergedPaper::from_paper(paper, Vec::new());

        let json = serde_json::to_value(&merged).unwrap();
        assert_eq!(json["decision"], "INCLUDE");
        assert_eq!(json["concepts"][0], "security");

        let back: MergedPaper = serde_json::from_value(json).unwrap();
        assert_eq!(back, merged);
    }
}
