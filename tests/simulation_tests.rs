use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use gale_shapley::config::{load_config, PreferenceType};
use gale_shapley::report::{build_report, write_reports, SimulationReport};
use gale_shapley::simulator::{SimulationOptions, Simulator};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn quiet(simulations: usize) -> SimulationOptions {
    SimulationOptions {
        simulations,
        show_preferences: false,
        show_matches: false,
        ..SimulationOptions::default()
    }
}

/// Input configuration reproducing the rejection chain market
#[test]
fn test_input_config_end_to_end() {
    let file = write_config(
        r#"
proposer_side_name: Applicants
responder_side_name: Firms
preference_type: Input
number_of_proposers: 2
number_of_responders: 2
seed: 3
proposers:
  A: [X, Y]
  B: [X, Y]
responders:
  X: [A, B]
  Y: [B, A]
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.preference_type, PreferenceType::Input);

    let simulator = Simulator::new(config).unwrap();
    let batch = simulator.simulate(&quiet(3)).unwrap();

    for run in &batch.runs {
        assert_eq!(run.result.rounds, 2);
        assert_eq!(run.result.partner_of("A"), Some("X"));
        assert_eq!(run.result.partner_of("B"), Some("Y"));
        assert!(run.stability.is_stable);
    }
}

#[test]
fn test_swapped_sides_still_stable() {
    let file = write_config(
        r#"
proposer_side_name: men
responder_side_name: women
preference_type: input
number_of_proposers: 2
number_of_responders: 2
proposers:
  m1: [w1, w2]
  m2: [w1, w2]
responders:
  w1: [m2, m1]
  w2: [m2, m1]
"#,
    );

    let mut config = load_config(file.path()).unwrap();
    config.swap_sides().unwrap();

    let simulator = Simulator::new(config).unwrap();
    let run = simulator.run_once(0, 1).unwrap();
    assert_eq!(run.result.partner_of("w1"), Some("m2"));
    assert_eq!(run.result.partner_of("w2"), Some("m1"));
    assert!(run.stability.is_stable);
}

#[test]
fn test_random_config_with_reports() {
    let file = write_config(
        r#"
proposer_side_name: hospitals
responder_side_name: residents
preference_type: random
number_of_proposers: 5
number_of_responders: 6
seed: 10
"#,
    );

    let config = load_config(file.path()).unwrap();
    let simulator = Simulator::new(config).unwrap();
    assert_eq!(simulator.proposer_names()[0], "h_1");
    assert_eq!(simulator.responder_names()[5], "r_6");

    let options = SimulationOptions {
        jobs: 2,
        ..quiet(8)
    };
    let batch = simulator.simulate(&options).unwrap();
    assert_eq!(batch.runs.len(), 8);
    assert!(batch.runs.iter().all(|run| run.stability.is_stable));
    assert!(batch.runs.iter().all(|run| run.result.rounds <= 5 * 6 + 1));

    let report = build_report(simulator.config(), &batch, true);
    let dir = TempDir::new().unwrap();
    write_reports(&report, dir.path()).unwrap();

    let json = fs::read_to_string(dir.path().join("report.json")).unwrap();
    let parsed: SimulationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.metadata.base_seed, 10);
    assert_eq!(parsed.summary.stable_runs, 8);
    assert_eq!(parsed.runs[0].steps.as_ref().unwrap().len(), parsed.runs[0].rounds);
}

#[test]
fn test_invalid_config_is_rejected() {
    let file = write_config(
        r#"
proposer_side_name: men
responder_side_name: Men
preference_type: random
number_of_proposers: 2
number_of_responders: 2
"#,
    );
    assert!(load_config(file.path()).is_err());
}
