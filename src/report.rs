//! Report generation for simulation batches.
//!
//! Generates both JSON and human-readable text reports.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::RoundStep;
use crate::simulator::{SimulationBatch, SimulationRun};

/// Complete report of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub metadata: ReportMetadata,
    pub runs: Vec<RunSummary>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// RFC 3339 creation time
    pub generated_at: String,
    pub proposer_side_name: String,
    pub responder_side_name: String,
    pub preference_type: String,
    pub number_of_proposers: usize,
    pub number_of_responders: usize,
    pub simulations: usize,
    pub base_seed: u64,
    #[serde(with = "humantime_serde")]
    pub total_elapsed: Duration,
}

/// One simulation's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 1-based simulation number
    pub simulation: usize,
    pub seed: u64,
    pub rounds: usize,
    pub matches: BTreeMap<String, String>,
    pub self_matches: Vec<String>,
    pub unmatched: Vec<String>,
    pub all_matched: bool,
    pub is_stable: bool,
    pub blocking_pairs: Vec<(String, String)>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<RoundStep>>,
}

/// Aggregate statistics over all runs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub stable_runs: usize,
    pub all_matched_runs: usize,
    pub min_rounds: usize,
    pub max_rounds: usize,
    pub average_rounds: f64,
    pub average_matched_pairs: f64,
    pub average_self_matches: f64,
}

impl RunSummary {
    pub fn from_run(run: &SimulationRun, include_steps: bool) -> Self {
        Self {
            simulation: run.index + 1,
            seed: run.seed,
            rounds: run.result.rounds,
            matches: run.result.matches.clone(),
            self_matches: run.result.self_matches.clone(),
            unmatched: run.result.unmatched.clone(),
            all_matched: run.result.all_matched,
            is_stable: run.stability.is_stable,
            blocking_pairs: run.stability.blocking_pairs.clone(),
            elapsed: run.elapsed,
            steps: include_steps.then(|| run.steps.clone()),
        }
    }
}

impl ReportSummary {
    pub fn from_runs(runs: &[RunSummary]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let count = runs.len() as f64;
        let total = |f: fn(&RunSummary) -> usize| runs.iter().map(f).sum::<usize>() as f64;

        Self {
            stable_runs: runs.iter().filter(|run| run.is_stable).count(),
            all_matched_runs: runs.iter().filter(|run| run.all_matched).count(),
            min_rounds: runs.iter().map(|run| run.rounds).min().unwrap_or(0),
            max_rounds: runs.iter().map(|run| run.rounds).max().unwrap_or(0),
            average_rounds: total(|run| run.rounds) / count,
            average_matched_pairs: total(|run| run.matches.len()) / count,
            average_self_matches: total(|run| run.self_matches.len()) / count,
        }
    }
}

/// Assemble the report of a finished batch
pub fn build_report(config: &Config, batch: &SimulationBatch, include_steps: bool) -> SimulationReport {
    let runs: Vec<RunSummary> = batch
        .runs
        .iter()
        .map(|run| RunSummary::from_run(run, include_steps))
        .collect();
    let summary = ReportSummary::from_runs(&runs);

    SimulationReport {
        metadata: ReportMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            proposer_side_name: config.proposer_side_name.clone(),
            responder_side_name: config.responder_side_name.clone(),
            preference_type: config.preference_type.to_string(),
            number_of_proposers: config.proposer_count(),
            number_of_responders: config.responder_count(),
            simulations: runs.len(),
            base_seed: batch.base_seed,
            total_elapsed: batch.elapsed,
        },
        runs,
        summary,
    }
}

/// Generate JSON report
pub fn generate_json_report(report: &SimulationReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn generate_text_report(report: &SimulationReport, output_path: &Path) -> Result<()> {
    let content = render_text_report(report);
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Write `report.json` and `report.txt` into `output_dir`
pub fn write_reports(report: &SimulationReport, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    generate_json_report(report, &output_dir.join("report.json"))?;
    generate_text_report(report, &output_dir.join("report.txt"))
}

fn render_text_report(report: &SimulationReport) -> String {
    let meta = &report.metadata;
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                        STABLE MATCHING SIMULATION REPORT".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!("Generated: {}", meta.generated_at));
    lines.push(format!(
        "Proposers: {} {} ({} preferences)",
        meta.number_of_proposers, meta.proposer_side_name, meta.preference_type
    ));
    lines.push(format!("Responders: {} {}", meta.number_of_responders, meta.responder_side_name));
    lines.push(format!("Simulations: {} (base seed {})", meta.simulations, meta.base_seed));
    lines.push(format!("Total time: {:.3?}", meta.total_elapsed));
    lines.push(String::new());

    lines.push("=".repeat(80));
    lines.push("                                   SUMMARY".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    let summary = &report.summary;
    lines.push(format!("Stable runs: {} / {}", summary.stable_runs, meta.simulations));
    lines.push(format!("Runs with everyone matched: {}", summary.all_matched_runs));
    lines.push(format!(
        "Rounds: min {}, max {}, average {:.2}",
        summary.min_rounds, summary.max_rounds, summary.average_rounds
    ));
    lines.push(format!("Average matched pairs: {:.2}", summary.average_matched_pairs));
    lines.push(format!("Average self-matches: {:.2}", summary.average_self_matches));
    lines.push(String::new());

    for run in &report.runs {
        lines.push("-".repeat(80));
        lines.push(format!(
            "Simulation {} (seed {}): {} rounds, {}",
            run.simulation,
            run.seed,
            run.rounds,
            if run.is_stable { "stable" } else { "NOT stable" }
        ));
        for (proposer, responder) in &run.matches {
            lines.push(format!("  {} - {}", proposer, responder));
        }
        if !run.self_matches.is_empty() {
            lines.push(format!("  self-matched: {}", run.self_matches.join(", ")));
        }
        for (proposer, responder) in &run.blocking_pairs {
            lines.push(format!("  blocking pair: {} - {}", proposer, responder));
        }
    }

    // Footer
    lines.push("=".repeat(80));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreferenceType;
    use crate::matching::PreferenceMap;
    use crate::simulator::{SimulationOptions, Simulator};
    use tempfile::TempDir;

    fn batch() -> (Config, SimulationBatch) {
        let config = Config {
            proposer_side_name: "students".to_string(),
            responder_side_name: "schools".to_string(),
            preference_type: PreferenceType::Random,
            number_of_proposers: 3,
            number_of_responders: 2,
            log_file_name: None,
            seed: Some(1),
            proposers: PreferenceMap::new(),
            responders: PreferenceMap::new(),
        };
        let options = SimulationOptions {
            simulations: 3,
            show_preferences: false,
            show_matches: false,
            ..SimulationOptions::default()
        };
        let batch = Simulator::new(config.clone()).unwrap().simulate(&options).unwrap();
        (config, batch)
    }

    #[test]
    fn test_build_report_summary() {
        let (config, batch) = batch();
        let report = build_report(&config, &batch, false);

        assert_eq!(report.metadata.simulations, 3);
        assert_eq!(report.metadata.preference_type, "random");
        assert_eq!(report.summary.stable_runs, 3);
        assert!(report.summary.min_rounds <= report.summary.max_rounds);
        assert!(report.runs.iter().all(|run| run.steps.is_none()));
        assert_eq!(report.runs[2].simulation, 3);
    }

    #[test]
    fn test_summary_of_no_runs() {
        assert_eq!(ReportSummary::from_runs(&[]), ReportSummary::default());
    }

    #[test]
    fn test_write_reports() {
        let (config, batch) = batch();
        let report = build_report(&config, &batch, true);
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");

        write_reports(&report, &out).unwrap();

        let json = fs::read_to_string(out.join("report.json")).unwrap();
        let parsed: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.runs.len(), 3);
        assert!(parsed.runs[0].steps.is_some());

        let text = fs::read_to_string(out.join("report.txt")).unwrap();
        assert!(text.contains("STABLE MATCHING SIMULATION REPORT"));
        assert!(text.contains("Stable runs: 3 / 3"));
    }
}
