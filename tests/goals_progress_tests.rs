//! Goal tracking, goal zones, experience and pause state

use road_rules::simulation::{
    Aabb, ColliderSet, GameSession, GoalData, GoalError, GoalTracker, GoalZone, Goals,
    PlayerProgress, Position, ProgressionConfig,
};

fn two_goals() -> GoalTracker {
    GoalTracker::new(Goals {
        title: "Lesson".to_string(),
        goals: vec![
            GoalData::new("Stop at the line", 20),
            GoalData::new("Wait for green", 30),
        ],
    })
}

#[test]
fn test_complete_goal_marks_it_done() {
    let mut goals = two_goals();
    assert_eq!(goals.next_uncompleted_goal(), Some(0));

    let goal = goals.complete_goal(0).unwrap();
    assert_eq!(goal.xp_to_give, 20);
    assert!(goals.is_goal_completed(0));
    assert!(!goals.is_goal_completed(1));
    assert_eq!(goals.next_uncompleted_goal(), Some(1));
    assert_eq!(goals.completed_count(), 1);
    assert!(!goals.all_completed());
}

#[test]
fn test_completing_twice_is_rejected() {
    let mut goals = two_goals();
    goals.complete_goal(1).unwrap();
    assert_eq!(goals.complete_goal(1), Err(GoalError::AlreadyCompleted(1)));
    assert_eq!(goals.completed_count(), 1);
}

#[test]
fn test_out_of_range_goal_is_rejected() {
    let mut goals = two_goals();
    assert_eq!(
        goals.complete_goal(7),
        Err(GoalError::OutOfRange {
            index: 7,
            available: 2
        })
    );
    assert!(!goals.is_goal_completed(7));
    assert_eq!(goals.completed_count(), 0);
}

#[test]
fn test_checklist_renders_checkboxes() {
    let mut goals = two_goals();
    goals.complete_goal(1).unwrap();
    assert_eq!(
        goals.checklist(),
        vec!["[ ] Stop at the line", "[X] Wait for green"]
    );

    goals.complete_goal(0).unwrap();
    assert!(goals.all_completed());
    assert_eq!(goals.next_uncompleted_goal(), None);
}

#[test]
fn test_goal_zone_fires_on_entry_only() {
    let mut colliders = ColliderSet::new();
    let car = colliders.insert(
        "Player",
        Aabb::from_center_size(Position::new(0.0, 0.5, -10.0), Position::new(2.0, 1.0, 4.0)),
    );
    let mut zone = GoalZone::new(
        Aabb::from_center_size(Position::ZERO, Position::new(4.0, 2.0, 4.0)),
        "Player",
    );

    assert!(zone.update(&colliders).is_empty());

    colliders.set_center(car, Position::new(0.0, 0.5, 0.0));
    assert_eq!(zone.update(&colliders), vec![car]);
    assert!(zone.update(&colliders).is_empty());

    // Leaving and coming back counts as a new entry
    colliders.set_center(car, Position::new(0.0, 0.5, 20.0));
    assert!(zone.update(&colliders).is_empty());
    colliders.set_center(car, Position::new(0.0, 0.5, 1.0));
    assert_eq!(zone.update(&colliders), vec![car]);
}

#[test]
fn test_goal_zone_ignores_other_tags() {
    let mut colliders = ColliderSet::new();
    colliders.insert(
        "Wall",
        Aabb::from_center_size(Position::ZERO, Position::new(1.0, 1.0, 1.0)),
    );
    let mut zone = GoalZone::new(
        Aabb::from_center_size(Position::ZERO, Position::new(4.0, 2.0, 4.0)),
        "Player",
    );
    assert!(zone.update(&colliders).is_empty());
}

#[test]
fn test_experience_levels_up_across_thresholds() {
    let mut progress = PlayerProgress::default();
    assert_eq!(progress.level(), 1);
    assert_eq!(progress.level_threshold(), 100);

    assert!(!progress.add_experience(60));
    assert_eq!(progress.experience(), 60);

    // 60 + 190 = 250: level 1 needs 100, level 2 needs 120
    assert!(progress.add_experience(190));
    assert_eq!(progress.level(), 3);
    assert_eq!(progress.experience(), 30);
    assert_eq!(progress.level_threshold(), 140);
    assert!((progress.progress() - 30.0 / 140.0).abs() < 1e-6);
}

#[test]
fn test_negative_experience_is_ignored() {
    let mut progress = PlayerProgress::default();
    progress.add_experience(40);
    assert!(!progress.add_experience(-25));
    assert_eq!(progress.experience(), 40);
}

#[test]
fn test_gain_snapshot_is_taken_before_award() {
    let mut progress = PlayerProgress::new(ProgressionConfig {
        base_threshold: 50,
        level_multiplier: 10,
        level_complete_xp: 15,
    });
    progress.add_experience(45);

    let gain = progress.gain_snapshot(progress.level_complete_xp());
    assert_eq!(gain.experience_gained, 15);
    assert_eq!(gain.current_experience, 45);
    assert_eq!(gain.current_level, 1);
    assert_eq!(gain.current_level_threshold, 50);

    progress.add_experience(gain.experience_gained);
    assert_eq!(progress.level(), 2);
    assert_eq!(progress.experience(), 10);
}

#[test]
fn test_progress_reset() {
    let mut progress = PlayerProgress::default();
    progress.add_experience(500);
    progress.reset();
    assert_eq!(progress.level(), 1);
    assert_eq!(progress.experience(), 0);
    assert_eq!(progress.summary(), "Level 1 | XP 0/100");
}

#[test]
fn test_session_pause_is_idempotent() {
    let session = GameSession::new();
    assert!(!session.is_paused());
    assert_eq!(session.time_scale(), 1.0);

    assert!(session.pause());
    assert!(!session.pause());
    assert!(session.is_paused());
    assert_eq!(session.time_scale(), 0.0);

    assert!(session.resume());
    assert!(!session.resume());
    assert_eq!(session.time_scale(), 1.0);
}

#[test]
fn test_huge_reward_saturates_instead_of_overflowing() {
    let mut progress = PlayerProgress::new(ProgressionConfig {
        base_threshold: 100,
        level_multiplier: 20,
        level_complete_xp: i32::MAX,
    });
    progress.add_experience(50);

    assert!(progress.add_experience(progress.level_complete_xp()));
    assert!(progress.level() > 1);
    assert!(progress.experience() >= 0);
    assert!(progress.experience() < progress.level_threshold());

    // And again on top of that
    progress.add_experience(i32::MAX);
    assert!(progress.experience() < progress.level_threshold());
}

#[test]
fn test_flat_thresholds_level_up_in_one_step() {
    let mut progress = PlayerProgress::new(ProgressionConfig {
        base_threshold: 1,
        level_multiplier: 0,
        level_complete_xp: 0,
    });
    assert!(progress.add_experience(i32::MAX));
    assert_eq!(progress.level(), i32::MAX);
    assert_eq!(progress.experience(), 0);
    assert_eq!(progress.level_threshold(), 1);
}

#[test]
fn test_progression_config_validation() {
    assert!(ProgressionConfig::default().validate().is_ok());

    let zero_base = ProgressionConfig {
        base_threshold: 0,
        ..ProgressionConfig::default()
    };
    assert!(zero_base.validate().is_err());

    let negative_multiplier = ProgressionConfig {
        level_multiplier: -5,
        ..ProgressionConfig::default()
    };
    assert!(negative_multiplier.validate().is_err());
}
