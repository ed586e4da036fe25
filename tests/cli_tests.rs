//! Smoke tests for the headless binary

use std::process::Command;

fn road_rules() -> Command {
    Command::new(env!("CARGO_BIN_EXE_road_rules"))
}

#[test]
fn test_headless_run_completes_demo() {
    let output = road_rules()
        .args(["--ticks", "300", "--delta", "0.1"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run road_rules");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Running road rules simulation in headless mode..."));
    assert!(stdout.contains("=== World Map ==="));
    assert!(stdout.contains("[GOAL 0] Cross the intersection"));
    assert!(stdout.contains("[LEVEL] Level complete!"));
    assert!(stdout.contains("Red light violations: 1"));
    assert!(stdout.contains("Level complete: yes"));
}

#[test]
fn test_short_run_stops_at_tick_limit() {
    let output = road_rules()
        .args(["--ticks", "50"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run road_rules");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- After tick 50 (5.0s simulated time) ---"));
    assert!(stdout.contains("Level complete: no"));
}

#[test]
fn test_dump_scenario_prints_loadable_json() {
    let output = road_rules()
        .arg("--dump-scenario")
        .output()
        .expect("failed to run road_rules");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let scenario = road_rules::simulation::Scenario::from_json(&stdout).unwrap();
    assert_eq!(scenario, road_rules::simulation::Scenario::demo());
}

#[test]
fn test_invalid_delta_fails() {
    let output = road_rules()
        .args(["--delta", "0"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run road_rules");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--delta must be a positive"));
}

#[test]
fn test_invalid_scenario_with_seed_fails_before_running() {
    let mut scenario = road_rules::simulation::Scenario::demo();
    scenario.progression.base_threshold = -1;
    let path = std::env::temp_dir().join(format!("road_rules_bad_{}.json", std::process::id()));
    std::fs::write(&path, scenario.to_json_pretty().unwrap()).unwrap();

    let output = road_rules()
        .arg("--scenario")
        .arg(&path)
        .args(["--seed", "5"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run road_rules");
    let _ = std::fs::remove_file(&path);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("base_threshold must be positive"));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Initial state:"));
}
