//! Identity grouping
//!
//! Partitions screened records into identity groups in a single pass.
//! Group order is the order of first appearance, members keep input
//! order, and records with no stable identifier bypass grouping
//! entirely, preserving their relative input order.

use std::collections::HashMap;

use tracing::debug;

use reviewforge_common::identity::{self, IdentityKey};
use reviewforge_common::models::ScreenedPaper;

/// All records sharing one identity key, in input order
#[derive(Debug, Clone)]
pub struct IdentityGroup {
    pub key: IdentityKey,
    pub papers: Vec<ScreenedPaper>,
}

/// Result of one grouping pass
#[derive(Debug, Clone)]
pub struct GroupedPapers {
    /// Identity groups in first-appearance order
    pub groups: Vec<IdentityGroup>,

    /// Records with no stable identifier, in input order
    pub no_identity: Vec<ScreenedPaper>,
}

/// Partition records by identity key
pub fn group_by_identity(papers: Vec<ScreenedPaper>) -> GroupedPapers {
    let mut index: HashMap<IdentityKey, usize> = HashMap::new();
    let mut groups: Vec<IdentityGroup> = Vec::new();
    let mut no_identity: Vec<ScreenedPaper> = Vec::new();

    for paper in papers {
        match identity::resolve(&paper) {
            Some(key) => match index.get(&key) {
                Some(&slot) => groups[slot].papers.push(paper),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(IdentityGroup {
                        key,
                        papers: vec![paper],
                    });
                }
            },
            None => no_identity.push(paper),
        }
    }

    debug!(
        groups = groups.len(),
        no_identity = no_identity.len(),
        duplicates = groups.iter().filter(|g| g.papers.len() > 1).count(),
        "Grouped records by identity"
    );

    GroupedPapers { groups, no_identity }
}
