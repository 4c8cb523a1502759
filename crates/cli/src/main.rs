//! ReviewForge batch merge binary
//!
//! Runs the late-stage deduplication pass over a screened snapshot:
//! 1. Loads the snapshot of per-query screened records
//! 2. Merges duplicates with the configured conflict resolution policy
//! 3. Optionally applies reviewer override decisions
//! 4. Writes the merged set, merge summary, and PRISMA numbers
//!
//! Usage:
//!     reviewforge <screened.json> <output-dir> [--decisions "approve: 1,3-5"]

mod console;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reviewforge_common::models::normalize;
use reviewforge_common::{MergedPaper, ReviewConfig, VERSION};
use reviewforge_merge::{MergeEngine, MergeOutcome, ResolutionPolicy};
use reviewforge_screening::{
    apply_decisions, parse_decision_text, prisma, query_summaries, screening_status,
};

use console::ConsoleArbiter;

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ReviewConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.observability.log_level.clone())),
        )
        .with_target(true)
        .init();

    info!("Starting ReviewForge merge v{}", VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input_path, output_dir, decision_text) = match parse_args(&args) {
        Some(parsed) => parsed,
        None => {
            eprintln!("Usage: reviewforge <screened.json> <output-dir> [--decisions \"approve: 1,3-5\"]");
            std::process::exit(2);
        }
    };

    // Load and normalize the snapshot
    let raw = fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read snapshot {input_path}"))?;
    let snapshot: serde_json::Value = serde_json::from_str(&raw)?;
    let papers = normalize::screened_papers_from_json(&snapshot)?;
    info!(papers = papers.len(), "Snapshot loaded");

    for summary in query_summaries(&papers) {
        info!(
            query = summary.source_query_id,
            description = %summary.description,
            found = summary.papers_found,
            included = summary.included,
            excluded = summary.excluded,
            "Query screening summary"
        );
    }

    // Merge with the configured policy
    let policy = if config.merge.interactive {
        ResolutionPolicy::Manual
    } else {
        ResolutionPolicy::from_str(&config.merge.strategy)?
    };
    let engine = MergeEngine::new(policy);
    info!(policy = policy.as_str(), "Running merge");

    let outcome = if policy == ResolutionPolicy::Manual {
        let mut arbiter = ConsoleArbiter::new();
        engine.merge_with_arbiter(papers, &mut arbiter)?
    } else {
        engine.merge(papers)?
    };

    // Optional reviewer override pass
    let merged = match decision_text {
        Some(text) => {
            let decisions = parse_decision_text(text)?;
            if decisions.is_empty() {
                warn!("Decision text contained no approve/reject selections");
            }
            let (updated, tally) = apply_decisions(&outcome.merged, &decisions, Utc::now());
            info!(
                approved = tally.approved,
                rejected = tally.rejected,
                pending = tally.pending,
                "Override pass applied"
            );
            updated
        }
        None => outcome.merged.clone(),
    };

    write_outputs(Path::new(output_dir), &config, &outcome, &merged)?;

    let status = screening_status(&merged);
    info!(
        total = status.total,
        approved = status.approved,
        rejected = status.rejected,
        pending = status.pending,
        unresolved = outcome.unresolved.len(),
        "Merge run finished"
    );

    Ok(())
}

fn parse_args(args: &[String]) -> Option<(&str, &str, Option<&str>)> {
    let input = args.first()?;
    let output = args.get(1)?;
    let decisions = match args.iter().position(|a| a == "--decisions") {
        Some(flag) => Some(args.get(flag + 1)?.as_str()),
        None => None,
    };
    Some((input, output, decisions))
}

fn write_outputs(
    output_dir: &Path,
    config: &ReviewConfig,
    outcome: &MergeOutcome,
    merged: &[MergedPaper],
) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let merged_path = output_dir.join("merged_papers.json");
    fs::write(&merged_path, serde_json::to_string_pretty(merged)?)?;
    info!(path = %merged_path.display(), "Wrote merged papers");

    let summary_path = output_dir.join("merge_summary.json");
    fs::write(
        &summary_path,
        serde_json::to_string_pretty(&outcome.summary)?,
    )?;

    let report = prisma::generate(config, &outcome.summary, merged);
    let report_path = output_dir.join("prisma_report.json");
    fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
    info!(path = %report_path.display(), "Wrote PRISMA report");

    if !outcome.unresolved.is_empty() {
        let unresolved_path = output_dir.join("unresolved_conflicts.json");
        fs::write(
            &unresolved_path,
            serde_json::to_string_pretty(&outcome.unresolved)?,
        )?;
        warn!(
            count = outcome.unresolved.len(),
            path = %unresolved_path.display(),
            "Some conflicts were left unresolved; re-run with an arbiter"
        );
    }

    Ok(())
}
