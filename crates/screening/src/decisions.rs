//! Reviewer decision text parsing
//!
//! Reviewers answer a displayed paper list with compact decision text
//! such as `approve: 1,3,5-8 reject: 2,4`, `approve all`, or
//! `reject all`. Numbers are 1-based as displayed; parsed selections are
//! 0-based indices into the displayed list.

use regex_lite::Regex;

use reviewforge_common::errors::{AppError, Result};

/// A set of paper positions selected by the reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every displayed paper
    All,
    /// Specific 0-based indices
    Indices(Vec<usize>),
}

impl Selection {
    pub fn contains(&self, index: usize) -> bool {
        match self {
            Selection::All => true,
            Selection::Indices(indices) => indices.contains(&index),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Indices(indices) if indices.is_empty())
    }

    fn none() -> Self {
        Selection::Indices(Vec::new())
    }
}

/// Parsed reviewer decisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningDecisions {
    pub approve: Selection,
    pub reject: Selection,
}

impl ScreeningDecisions {
    pub fn is_empty(&self) -> bool {
        self.approve.is_empty() && self.reject.is_empty()
    }
}

/// Parse reviewer decision text.
///
/// `approve all` / `reject all` short-circuit; otherwise `approve:` and
/// `reject:` number lists are parsed independently and either may be
/// absent. Text containing neither parses as an empty decision set.
pub fn parse_decision_text(text: &str) -> Result<ScreeningDecisions> {
    let lower = text.to_lowercase();
    if lower.contains("approve all") {
        return Ok(ScreeningDecisions {
            approve: Selection::All,
            reject: Selection::none(),
        });
    }
    if lower.contains("reject all") {
        return Ok(ScreeningDecisions {
            approve: Selection::none(),
            reject: Selection::All,
        });
    }

    Ok(ScreeningDecisions {
        approve: capture_number_list(text, "approve")?,
        reject: capture_number_list(text, "reject")?,
    })
}

fn capture_number_list(text: &str, verb: &str) -> Result<Selection> {
    // regex_lite::Regex::new only fails on an invalid pattern
    let pattern = Regex::new(&format!(r"(?i){verb}:\s*([0-9,\-\s]+)")).map_err(|e| {
        AppError::Internal {
            message: format!("bad decision pattern: {e}"),
        }
    })?;

    match pattern.captures(text).and_then(|c| c.get(1)) {
        Some(m) => Ok(Selection::Indices(parse_number_list(m.as_str())?)),
        None => Ok(Selection::none()),
    }
}

/// Expand comma-separated numbers and ranges ("1,3,5-8") into 0-based
/// indices. Non-positive numbers are dropped; an empty range like `8-5`
/// expands to nothing.
pub fn parse_number_list(text: &str) -> Result<Vec<usize>> {
    let mut numbers: Vec<usize> = Vec::new();
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    for part in compact.split(',') {
        if part.is_empty() {
            continue;
        }
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_position(start)?;
                let end = parse_position(end)?;
                numbers.extend(start..=end);
            }
            None => numbers.push(parse_position(part)?),
        }
    }

    // 1-based display positions to 0-based indices
    Ok(numbers.into_iter().filter(|&n| n > 0).map(|n| n - 1).collect())
}

fn parse_position(raw: &str) -> Result<usize> {
    raw.parse::<usize>().map_err(|_| AppError::InvalidFormat {
        message: format!("invalid paper number: {raw:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranges_and_singles() {
        let parsed = parse_decision_text("approve: 1,3,5-8,12 reject: 2,4").unwrap();
        assert_eq!(
            parsed.approve,
            Selection::Indices(vec![0, 2, 4, 5, 6, 7, 11])
        );
        assert_eq!(parsed.reject, Selection::Indices(vec![1, 3]));
    }

    #[test]
    fn test_approve_all_short_circuits() {
        let parsed = parse_decision_text("please Approve All of these").unwrap();
        assert_eq!(parsed.approve, Selection::All);
        assert!(parsed.reject.is_empty());
        assert!(parsed.approve.contains(999));
    }

    #[test]
    fn test_reject_all() {
        let parsed = parse_decision_text("reject all").unwrap();
        assert_eq!(parsed.reject, Selection::All);
        assert!(parsed.approve.is_empty());
    }

    #[test]
    fn test_missing_verbs_parse_empty() {
        let parsed = parse_decision_text("looks good to me").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_whitespace_and_zero_tolerated() {
        let indices = parse_number_list(" 0, 1 , 3 - 4 ").unwrap();
        // 0 has no displayed position and is dropped
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn test_empty_range_expands_to_nothing() {
        assert_eq!(parse_number_list("8-5").unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn test_malformed_number_rejected() {
        let err = parse_number_list("1,two,3").unwrap_err();
        assert!(matches!(
            err,
            reviewforge_common::errors::AppError::InvalidFormat { .. }
        ));
    }
}
