//! Identity resolution for cross-query deduplication
//!
//! Two records collected under different queries refer to the same
//! publication exactly when they share an [`IdentityKey`]. DOI equality
//! is authoritative: metadata mismatches between records with the same
//! DOI are never second-guessed against title text. Records with no
//! stable identifier resolve to `None` and are treated as intrinsically
//! unique.

use serde::{Deserialize, Serialize};

use crate::models::{IdentifierKind, ScreenedPaper};

/// URL and scheme prefixes stripped from raw DOI strings
const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Canonical identity of a paper record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    fn doi(normalized: &str) -> Self {
        Self(format!("doi:{normalized}"))
    }

    fn external(id: &str) -> Self {
        Self(format!("ext:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the canonical identity key for a paper record.
///
/// Priority order: first non-empty DOI (case-normalized, scheme
/// stripped), then first non-empty external-database id, else `None`.
/// Absent fields are treated as empty strings; this never fails.
pub fn resolve(paper: &ScreenedPaper) -> Option<IdentityKey> {
    for id in &paper.external_ids {
        if id.kind == IdentifierKind::Doi {
            let doi = normalize_doi(&id.value);
            if !doi.is_empty() {
                return Some(IdentityKey::doi(&doi));
            }
        }
    }

    for id in &paper.external_ids {
        if id.kind == IdentifierKind::OpenalexId {
            let ext = id.value.trim();
            if !ext.is_empty() {
                return Some(IdentityKey::external(ext));
            }
        }
    }

    None
}

/// Trim, lowercase, and strip any URL scheme/host or `doi:` prefix
pub fn normalize_doi(raw: &str) -> String {
    let mut doi = raw.trim().to_ascii_lowercase();
    for prefix in DOI_PREFIXES {
        if let Some(stripped) = doi.strip_prefix(prefix) {
            doi = stripped.trim().to_string();
            break;
        }
    }
    doi
}
