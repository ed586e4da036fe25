//! Whole-world runs of the demo scenario and its variations

use std::rc::Rc;

use road_rules::simulation::{
    EventBus, EventKind, GameNotice, Position, Scenario, ScenarioRules, SimWorld, ViolationSignal,
    ZoneSignal, MAP_MAX_COLS, MAP_MAX_ROWS,
};

const DT: f32 = 0.1;

/// Tick like the headless runner: rule popups are dismissed straight away
fn run_to_completion(world: &mut SimWorld, max_ticks: usize) -> (usize, Vec<GameNotice>) {
    let mut violations = 0;
    let mut notices = Vec::new();
    for _ in 0..max_ticks {
        let report = world.tick(DT).unwrap();
        violations += report.violations.len();
        notices.extend(world.drain_notices());
        if world.is_level_complete() {
            break;
        }
        if world.is_paused() {
            world.resume();
        }
    }
    (violations, notices)
}

fn vehicle_position(world: &SimWorld) -> Position {
    world.vehicles.values().next().unwrap().follower.position()
}

#[test]
fn test_demo_world_is_populated() {
    let world = SimWorld::demo().unwrap();
    assert_eq!(world.vehicles.len(), 1);
    assert_eq!(world.lights.len(), 1);
    assert_eq!(world.goal_zones.len(), 2);
    // Vehicle plus the wall
    assert_eq!(world.colliders.len(), 2);
    assert_eq!(vehicle_position(&world), Position::new(0.0, 0.0, -40.0));
    assert_eq!(world.goals().len(), 1);
    assert!(!world.is_paused());
    assert!(!world.is_level_complete());
}

#[test]
fn test_demo_runs_red_light_then_completes_level() {
    let mut world = SimWorld::demo().unwrap();
    let (violations, notices) = run_to_completion(&mut world, 400);

    assert_eq!(violations, 1);
    assert!(world.is_level_complete());
    assert!(world.is_paused());
    assert!(world.goals().is_goal_completed(0));
    assert_eq!(world.progress().level(), 1);
    assert_eq!(world.progress().experience(), 75);

    assert_eq!(notices.len(), 5, "unexpected notices: {:?}", notices);
    match &notices[0] {
        GameNotice::Rule(rule) => {
            assert_eq!(rule.id, "RED_LIGHT_VIOLATION");
            assert!(rule.pause_game);
        }
        other => panic!("expected a rule notice first, got {:?}", other),
    }
    assert_eq!(
        notices[1],
        GameNotice::GoalCompleted {
            index: 0,
            text: "Cross the intersection".to_string()
        }
    );
    match &notices[2] {
        GameNotice::Experience(gain) => {
            assert_eq!(gain.experience_gained, 25);
            assert_eq!(gain.current_experience, 0);
        }
        other => panic!("expected an experience notice, got {:?}", other),
    }
    assert_eq!(notices[3], GameNotice::LevelComplete);
    match &notices[4] {
        GameNotice::Experience(gain) => {
            assert_eq!(gain.experience_gained, 50);
            assert_eq!(gain.current_experience, 25);
            assert_eq!(gain.current_level_threshold, 100);
        }
        other => panic!("expected an experience notice, got {:?}", other),
    }
}

#[test]
fn test_red_light_pauses_until_resumed() {
    let mut world = SimWorld::demo().unwrap();
    let mut detected = false;
    for _ in 0..400 {
        if !world.tick(DT).unwrap().violations.is_empty() {
            detected = true;
            break;
        }
    }
    assert!(detected, "the car never ran the red light");
    assert!(world.is_paused());

    // Nothing moves while paused
    let frozen_at = vehicle_position(&world);
    let frozen_time = world.time;
    for _ in 0..20 {
        let report = world.tick(DT).unwrap();
        assert!(report.violations.is_empty());
        assert!(report.light_changes.is_empty());
    }
    assert_eq!(vehicle_position(&world), frozen_at);
    assert_eq!(world.time, frozen_time);

    world.resume();
    world.tick(DT).unwrap();
    assert!(vehicle_position(&world).z > frozen_at.z);
}

#[test]
fn test_missing_rule_does_not_pause() {
    let rules = ScenarioRules::from_json("[]").unwrap();
    let mut world = SimWorld::from_scenario(Scenario::demo(), rules).unwrap();

    let mut violations = 0;
    for _ in 0..400 {
        violations += world.tick(DT).unwrap().violations.len();
        if violations > 0 {
            break;
        }
    }
    assert_eq!(violations, 1);
    assert!(!world.is_paused());
    assert!(world
        .drain_notices()
        .iter()
        .all(|n| !matches!(n, GameNotice::Rule(_))));
}

#[test]
fn test_restart_keeps_progress() {
    let mut world = SimWorld::demo().unwrap();
    run_to_completion(&mut world, 400);
    assert!(world.is_level_complete());

    world.restart().unwrap();
    assert!(!world.is_level_complete());
    assert!(!world.is_paused());
    assert_eq!(world.time, 0.0);
    assert!(!world.goals().is_goal_completed(0));
    assert_eq!(world.progress().experience(), 75);
    assert_eq!(vehicle_position(&world), Position::new(0.0, 0.0, -40.0));
    assert_eq!(world.pending_notices(), 0);

    // The second run pays out again
    run_to_completion(&mut world, 400);
    assert!(world.is_level_complete());
    assert_eq!(world.progress().level(), 2);
    assert_eq!(world.progress().experience(), 50);
}

#[test]
fn test_seeded_worlds_are_reproducible() {
    let mut a =
        SimWorld::from_scenario_with_seed(Scenario::demo(), ScenarioRules::bundled().unwrap(), 7)
            .unwrap();
    let mut b =
        SimWorld::from_scenario_with_seed(Scenario::demo(), ScenarioRules::bundled().unwrap(), 7)
            .unwrap();

    for _ in 0..150 {
        let ra = a.tick(DT).unwrap();
        let rb = b.tick(DT).unwrap();
        assert_eq!(ra, rb);
        if a.is_paused() {
            a.resume();
        }
        if b.is_paused() {
            b.resume();
        }
    }
    assert_eq!(vehicle_position(&a), vehicle_position(&b));
    let light_a = a.lights.values().next().unwrap();
    let light_b = b.lights.values().next().unwrap();
    assert_eq!(light_a.state(), light_b.state());
    assert_eq!(light_a.remaining(), light_b.remaining());
}

#[test]
fn test_bad_goal_index_is_rejected() {
    let mut scenario = Scenario::demo();
    scenario.goal_zones[0].signal = ZoneSignal::Goal { goal_index: 3 };

    let err = SimWorld::from_scenario(scenario, ScenarioRules::bundled().unwrap())
        .err()
        .expect("scenario should be rejected");
    assert!(err
        .to_string()
        .contains("targets goal 3 but the scenario has 1 goals"));
}

#[test]
fn test_bad_progression_is_rejected() {
    let mut scenario = Scenario::demo();
    scenario.progression.base_threshold = 0;

    let err = SimWorld::from_scenario(scenario, ScenarioRules::bundled().unwrap())
        .err()
        .expect("scenario should be rejected");
    assert!(format!("{:#}", err).contains("base_threshold must be positive"));
}

#[test]
fn test_far_away_scenario_map_stays_bounded() {
    let json = r#"{
        "name": "far",
        "vehicles": [
            {"waypoints": [{"position": [0, 0, 0]}, {"position": [1e30, 0, 1e30]}]}
        ]
    }"#;
    let world =
        SimWorld::from_scenario(Scenario::from_json(json).unwrap(), ScenarioRules::default())
            .unwrap();

    let map = world.render_map();
    let rows: Vec<&str> = map
        .lines()
        .skip_while(|line| !line.starts_with("Legend"))
        .skip(2)
        .filter(|line| !line.is_empty())
        .collect();
    assert!(!rows.is_empty());
    assert!(rows.len() <= MAP_MAX_ROWS);
    assert!(rows.iter().all(|row| row.chars().count() <= MAP_MAX_COLS));
    assert!(map.contains('C'));

    world.draw_map();
}

#[test]
fn test_demo_map_shows_every_feature() {
    let world = SimWorld::demo().unwrap();
    let map = world.render_map();
    for symbol in ['C', 'o', 'S', 'G', '~'] {
        assert!(map.contains(symbol), "map is missing {:?}:\n{}", symbol, map);
    }
}

#[test]
fn test_light_can_complete_a_goal() {
    let mut scenario = Scenario::demo();
    scenario.traffic_lights[0].config.detector.signal =
        ViolationSignal::GoalCompleted { goal_index: 0 };
    let mut world = SimWorld::from_scenario(scenario, ScenarioRules::bundled().unwrap()).unwrap();

    let mut detected = false;
    for _ in 0..400 {
        if !world.tick(DT).unwrap().violations.is_empty() {
            detected = true;
            break;
        }
    }
    assert!(detected);
    assert!(world.goals().is_goal_completed(0));
    assert_eq!(world.progress().experience(), 25);
    // A goal signal is not a rule violation
    assert!(!world.is_paused());

    // The zone for the same goal no longer pays out
    run_to_completion(&mut world, 400);
    assert!(world.is_level_complete());
    assert_eq!(world.progress().experience(), 75);
}

#[test]
fn test_dropping_world_detaches_listeners() {
    let bus = Rc::new(EventBus::new());
    let world = SimWorld::with_bus(
        Scenario::demo(),
        ScenarioRules::bundled().unwrap(),
        None,
        Rc::clone(&bus),
    )
    .unwrap();

    let kinds = [
        EventKind::GoalCompleted,
        EventKind::GoalReached,
        EventKind::RedLightViolation,
        EventKind::ExperienceGained,
    ];
    for kind in kinds {
        assert_eq!(bus.listener_count(kind), 1);
    }

    drop(world);
    for kind in kinds {
        assert_eq!(bus.listener_count(kind), 0);
    }
    // Publishing with nobody listening is fine
    bus.publish(EventKind::GoalReached).unwrap();
}

#[test]
fn test_external_listeners_see_world_events() {
    let bus = Rc::new(EventBus::new());
    let reached = Rc::new(std::cell::Cell::new(0));
    let counter = Rc::clone(&reached);
    bus.subscribe(EventKind::GoalReached, move || counter.set(counter.get() + 1));

    let mut world = SimWorld::with_bus(
        Scenario::demo(),
        ScenarioRules::bundled().unwrap(),
        None,
        Rc::clone(&bus),
    )
    .unwrap();
    run_to_completion(&mut world, 400);

    assert!(world.is_level_complete());
    assert_eq!(reached.get(), 1);
}

#[test]
fn test_scenario_json_fills_defaults() {
    let json = r#"{
        "name": "Minimal",
        "vehicles": [
            {"waypoints": [{"position": [0, 0, 0]}, {"position": [0, 0, 5], "kind": "STOP"}]}
        ],
        "goal_zones": [
            {"center": [0, 0.5, 4], "size": [4, 2, 2]}
        ]
    }"#;
    let scenario = Scenario::from_json(json).unwrap();
    assert_eq!(scenario.vehicles[0].tag, "Player");
    assert_eq!(scenario.goal_zones[0].signal, ZoneSignal::LevelComplete);
    assert!(scenario.traffic_lights.is_empty());

    let world = SimWorld::from_scenario(scenario, ScenarioRules::bundled().unwrap()).unwrap();
    assert_eq!(world.vehicles.len(), 1);
    assert!(world.goals().is_empty());
}

#[test]
fn test_scene_bounds_cover_demo_features() {
    let world = SimWorld::demo().unwrap();
    let bounds = world.scene_bounds().unwrap();

    // Path runs z = -40..40; the finish zone reaches x = -4..4, the light sits at x = 4
    assert_eq!(bounds.min.z, -40.0);
    assert_eq!(bounds.max.z, 40.0);
    assert_eq!(bounds.min.x, -4.0);
    assert_eq!(bounds.max.x, 4.0);

    let empty = SimWorld::from_scenario(
        Scenario::from_json(r#"{"name": "empty"}"#).unwrap(),
        ScenarioRules::default(),
    )
    .unwrap();
    assert!(empty.scene_bounds().is_none());
    assert!(empty.render_map().contains("(empty)"));
}

#[test]
fn test_seeded_construction_validates_scenario() {
    let mut scenario = Scenario::demo();
    scenario.goal_zones[0].signal = ZoneSignal::Goal { goal_index: 9 };
    assert!(SimWorld::with_seed(scenario.clone(), ScenarioRules::default(), Some(3)).is_err());
    assert!(SimWorld::with_seed(scenario, ScenarioRules::default(), None).is_err());

    let world = SimWorld::with_seed(Scenario::demo(), ScenarioRules::default(), Some(3)).unwrap();
    assert_eq!(world.lights.len(), 1);
}
