use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use road_rules::simulation::{GameNotice, Scenario, ScenarioRules, SimWorld};

#[derive(Parser)]
#[command(name = "road_rules")]
#[command(about = "Driving lesson simulation with optional UI")]
struct Cli {
    /// Run with the Bevy game engine UI
    #[arg(long)]
    ui: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "300")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Scenario file (JSON); the built-in demo is used when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Rule messages file (JSON); the bundled rules are used when omitted
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Seed for reproducible traffic light phases
    #[arg(long)]
    seed: Option<u64>,

    /// Print the scenario as JSON and exit
    #[arg(long)]
    dump_scenario: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let scenario = match &cli.scenario {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::demo(),
    };

    if cli.dump_scenario {
        println!("{}", scenario.to_json_pretty()?);
        return Ok(());
    }

    let rules = match &cli.rules {
        Some(path) => ScenarioRules::from_path(path)?,
        None => ScenarioRules::bundled()?,
    };

    if cli.ui {
        #[cfg(feature = "ui")]
        {
            run_with_ui(scenario, rules, cli.seed)
        }
        #[cfg(not(feature = "ui"))]
        {
            bail!("UI feature is not enabled. Rebuild with --features ui");
        }
    } else {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("warn,road_rules=info"),
        )
        .init();
        run_headless(scenario, rules, cli.seed, cli.ticks, cli.delta)
    }
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(
    scenario: Scenario,
    rules: ScenarioRules,
    seed: Option<u64>,
    ticks: u32,
    delta: f32,
) -> Result<()> {
    if !delta.is_finite() || delta <= 0.0 {
        bail!("--delta must be a positive number of seconds, got {}", delta);
    }

    println!("Running road rules simulation in headless mode...");
    println!("Ticks: {}, Delta: {}s", ticks, delta);

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = ((1.0 / delta).ceil() as u32).max(1);
    println!("Running {} ticks per second (simulated time)", ticks_per_second);
    println!();

    let mut world = SimWorld::with_seed(scenario, rules, seed)?;

    println!("Initial state:");
    world.print_summary();
    world.draw_map();
    println!();

    let mut violations = 0;
    let mut tick = 0;
    while tick < ticks && !world.is_level_complete() {
        // Run ticks_per_second ticks (or remaining ticks if fewer)
        let ticks_to_run = ticks_per_second.min(ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            let report = world.tick(delta)?;
            violations += report.violations.len();

            for notice in world.drain_notices() {
                print_notice(&notice);
            }
            // Nobody is at the keyboard to dismiss a rule popup
            if world.is_paused() && !world.is_level_complete() {
                world.resume();
            }
            if world.is_level_complete() {
                break;
            }
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            tick as f32 * delta
        );
        world.print_summary();
        world.draw_map();
        println!();
    }

    println!("=== Final State ===");
    world.print_summary();
    world.draw_map();
    println!("Red light violations: {}", violations);
    println!(
        "Level complete: {}",
        if world.is_level_complete() { "yes" } else { "no" }
    );
    Ok(())
}

fn print_notice(notice: &GameNotice) {
    match notice {
        GameNotice::Rule(rule) => {
            println!("[{:?}] {}: {}", rule.message_type, rule.title, rule.description)
        }
        GameNotice::GoalCompleted { index, text } => {
            println!("[GOAL {}] {}", index, text)
        }
        GameNotice::Experience(gain) => println!(
            "[XP] +{} ({} / {} at level {})",
            gain.experience_gained,
            gain.current_experience,
            gain.current_level_threshold,
            gain.current_level
        ),
        GameNotice::LevelComplete => println!("[LEVEL] Level complete!"),
    }
}

#[cfg(feature = "ui")]
fn run_with_ui(scenario: Scenario, rules: ScenarioRules, seed: Option<u64>) -> Result<()> {
    use bevy::log::LogPlugin;
    use bevy::prelude::*;

    // Scenario errors surface here, before a window opens
    let world = SimWorld::with_seed(scenario, rules, seed)?;

    println!("Starting Road Rules UI...");
    println!();
    println!("Controls:");
    println!("  P    - Pause / resume");
    println!("  R    - Restart scenario");
    println!("  ESC  - Exit");
    println!();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(LogPlugin {
                    filter: "warn,road_rules=info".to_string(),
                    level: bevy::log::Level::INFO,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Road Rules".into(),
                        resolution: (1280, 720).into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_non_send_resource(road_rules::ui::SimWorldResource(world))
        .add_plugins(road_rules::ui::RoadRulesUIPlugin)
        .run();
    Ok(())
}
