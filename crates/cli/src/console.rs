//! Interactive console arbiter
//!
//! Presents each conflicting group to the reviewer and collects one
//! resolution command. Implements the synchronous human-decision
//! collaborator the merge engine blocks on for the manual strategy;
//! there is deliberately no timeout on the prompt.

use std::io::{self, BufRead, Write};

use reviewforge_common::identity::IdentityKey;
use reviewforge_common::models::ScreenedPaper;
use reviewforge_merge::{ArbiterChoice, HumanArbiter};

pub struct ConsoleArbiter;

impl ConsoleArbiter {
    pub fn new() -> Self {
        Self
    }

    fn show_group(key: &IdentityKey, papers: &[ScreenedPaper]) {
        let paper = &papers[0];
        println!("\nCONFLICT DETECTED for paper: {key}");
        println!("{}", "=".repeat(72));
        println!("Title: {}", paper.title);

        if !paper.bibliography.authors.is_empty() {
            let mut authors = paper.bibliography.authors[..paper.bibliography.authors.len().min(3)]
                .join(", ");
            if paper.bibliography.authors.len() > 3 {
                authors.push_str(" et al.");
            }
            println!("Authors: {authors}");
        }
        if let Some(venue) = &paper.bibliography.venue {
            match paper.bibliography.publication_year {
                Some(year) => println!("Venue: {venue} ({year})"),
                None => println!("Venue: {venue}"),
            }
        }
        if let Some(abstract_text) = &paper.bibliography.abstract_text {
            println!("Abstract: {}", truncate(abstract_text, 300));
        }

        println!("\nConflicting decisions:");
        for (i, p) in papers.iter().enumerate() {
            println!(
                "  {}. {} (confidence: {:.2}) - {}",
                i + 1,
                p.decision,
                p.confidence,
                p.source_query_description
            );
            println!("     Reason: {}", p.reason);
        }

        println!("\nHow would you like to resolve this conflict?");
        println!("1. INCLUDE the paper (override any rejections)");
        println!("2. EXCLUDE the paper (override any inclusions)");
        println!("3. Use HIGHEST confidence decision");
        println!("4. Use MOST RECENT decision");
        println!("5. Show MORE DETAILS before deciding");
        println!("q. Quit and abort the merge run");
    }

    fn show_detail(papers: &[ScreenedPaper]) {
        println!("\nDetailed conflict analysis:");
        for (i, p) in papers.iter().enumerate() {
            println!("\n--- Decision {} ---", i + 1);
            println!("Query: {}", p.source_query_description);
            println!("Decision: {} (confidence: {:.2})", p.decision, p.confidence);
            println!("Reason: {}", p.reason);
            if let Some(ts) = p.screening_timestamp {
                println!("Screened at: {}", ts.to_rfc3339());
            }
        }
    }
}

impl HumanArbiter for ConsoleArbiter {
    fn decide(&mut self, key: &IdentityKey, papers: &[ScreenedPaper]) -> ArbiterChoice {
        Self::show_group(key, papers);

        let stdin = io::stdin();
        loop {
            print!("\nSelect option (1-5, q): ");
            let _ = io::stdout().flush();

            let mut line = String::new();
            if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
                // Input closed under the manual strategy: abort rather
                // than guess a decision
                return ArbiterChoice::Quit;
            }

            match line.trim() {
                "1" => return ArbiterChoice::ForceInclude,
                "2" => return ArbiterChoice::ForceExclude,
                "3" => return ArbiterChoice::HighestConfidence,
                "4" => return ArbiterChoice::MostRecent,
                "5" => {
                    Self::show_detail(papers);
                    return ArbiterChoice::ShowMoreDetail;
                }
                "q" | "Q" => return ArbiterChoice::Quit,
                other => println!("Please enter 1, 2, 3, 4, 5, or q (got {other:?})"),
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
