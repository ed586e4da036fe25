//! Main simulation world that ties everything together
//!
//! This is the entry point for running a driving scenario
//! without any Bevy dependencies.

use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::event_bus::{
    DispatchError, EventBus, EventKind, ExperienceGained, GoalCompleted, SubscriptionId,
};
use super::follower::{CarPathFollower, FollowerUpdate};
use super::game_state::{ExperienceGain, GameSession, PlayerProgress};
use super::goals::{GoalTracker, GoalZone};
use super::path::Path;
use super::physics::{Aabb, ColliderSet, RayHit};
use super::rules::{RuleId, ScenarioRule, ScenarioRules};
use super::scenario::{Scenario, ZoneSignal};
use super::traffic_light::{DetectionContext, LightState, TrafficLight, ViolationSignal};
use super::types::{ColliderId, LightId, Position, SimId, VehicleId};
use super::waypoint::WaypointKind;

/// Largest map drawn by [`SimWorld::render_map`]
pub const MAP_MAX_COLS: usize = 120;
pub const MAP_MAX_ROWS: usize = 60;
const MAP_CELLS_PER_UNIT: f32 = 0.5;

/// Something the player should be told about
#[derive(Debug, Clone, PartialEq)]
pub enum GameNotice {
    /// A rule of the road was broken
    Rule(ScenarioRule),
    GoalCompleted { index: usize, text: String },
    Experience(ExperienceGain),
    LevelComplete,
}

/// A vehicle in the world: its follower plus the collider that represents it
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub tag: String,
    pub collider: ColliderId,
    pub follower: CarPathFollower,
}

#[derive(Debug, Clone)]
pub struct SimGoalZone {
    pub zone: GoalZone,
    pub signal: ZoneSignal,
}

/// What happened during one world tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub vehicle_updates: Vec<(VehicleId, FollowerUpdate)>,
    pub light_changes: Vec<(LightId, LightState)>,
    pub violations: Vec<(LightId, RayHit)>,
    pub zones_entered: Vec<ColliderId>,
}

/// State the bus listeners share with the world
struct Shared {
    session: Rc<GameSession>,
    goals: Rc<RefCell<GoalTracker>>,
    progress: Rc<RefCell<PlayerProgress>>,
    rules: Rc<ScenarioRules>,
    notices: Rc<RefCell<Vec<GameNotice>>>,
    level_complete: Rc<Cell<bool>>,
}

/// The main simulation world
pub struct SimWorld {
    bus: Rc<EventBus>,
    session: Rc<GameSession>,
    goals: Rc<RefCell<GoalTracker>>,
    progress: Rc<RefCell<PlayerProgress>>,
    rules: Rc<ScenarioRules>,
    notices: Rc<RefCell<Vec<GameNotice>>>,
    level_complete: Rc<Cell<bool>>,

    /// Listeners this world registered, removed again on drop
    subscriptions: Vec<(EventKind, SubscriptionId)>,

    /// All vehicles
    pub vehicles: BTreeMap<VehicleId, SimVehicle>,

    /// All traffic lights
    pub lights: BTreeMap<LightId, TrafficLight>,

    /// Trigger volumes
    pub goal_zones: Vec<SimGoalZone>,

    /// Physics scene used for detection rays and zone overlaps
    pub colliders: ColliderSet,

    /// Simulation time
    pub time: f32,

    scenario: Scenario,

    /// Seed for reproducible light phases
    seed: Option<u64>,

    next_id: usize,
}

impl SimWorld {
    fn new_internal(
        scenario: Scenario,
        rules: ScenarioRules,
        seed: Option<u64>,
        bus: Rc<EventBus>,
    ) -> Result<Self> {
        validate_scenario(&scenario)?;

        let progress = PlayerProgress::new(scenario.progression);
        let mut world = Self {
            bus,
            session: Rc::new(GameSession::new()),
            goals: Rc::new(RefCell::new(GoalTracker::default())),
            progress: Rc::new(RefCell::new(progress)),
            rules: Rc::new(rules),
            notices: Rc::new(RefCell::new(Vec::new())),
            level_complete: Rc::new(Cell::new(false)),
            subscriptions: Vec::new(),
            vehicles: BTreeMap::new(),
            lights: BTreeMap::new(),
            goal_zones: Vec::new(),
            colliders: ColliderSet::new(),
            time: 0.0,
            scenario,
            seed,
            next_id: 0,
        };
        world.wire_listeners();
        world.populate()?;
        info!("Loaded scenario '{}'", world.scenario.name);
        Ok(world)
    }

    pub fn from_scenario(scenario: Scenario, rules: ScenarioRules) -> Result<Self> {
        Self::new_internal(scenario, rules, None, Rc::new(EventBus::new()))
    }

    /// Create a world whose light phases are randomised from `seed`
    pub fn from_scenario_with_seed(
        scenario: Scenario,
        rules: ScenarioRules,
        seed: u64,
    ) -> Result<Self> {
        Self::new_internal(scenario, rules, Some(seed), Rc::new(EventBus::new()))
    }

    /// Create a world, seeding light phases only when `seed` is given
    pub fn with_seed(scenario: Scenario, rules: ScenarioRules, seed: Option<u64>) -> Result<Self> {
        Self::new_internal(scenario, rules, seed, Rc::new(EventBus::new()))
    }

    /// Create a world that publishes on an existing bus
    pub fn with_bus(
        scenario: Scenario,
        rules: ScenarioRules,
        seed: Option<u64>,
        bus: Rc<EventBus>,
    ) -> Result<Self> {
        Self::new_internal(scenario, rules, seed, bus)
    }

    /// The bundled demo scenario with the bundled rules
    pub fn demo() -> Result<Self> {
        Self::from_scenario(Scenario::demo(), ScenarioRules::bundled()?)
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn rules(&self) -> &ScenarioRules {
        &self.rules
    }

    pub fn goals(&self) -> std::cell::Ref<'_, GoalTracker> {
        self.goals.borrow()
    }

    pub fn progress(&self) -> std::cell::Ref<'_, PlayerProgress> {
        self.progress.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.session.is_paused()
    }

    pub fn pause(&self) -> bool {
        self.session.pause()
    }

    pub fn resume(&self) -> bool {
        self.session.resume()
    }

    pub fn is_level_complete(&self) -> bool {
        self.level_complete.get()
    }

    /// Notices raised since the last drain, oldest first
    pub fn drain_notices(&self) -> Vec<GameNotice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }

    pub fn pending_notices(&self) -> usize {
        self.notices.borrow().len()
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    fn shared(&self) -> Shared {
        Shared {
            session: Rc::clone(&self.session),
            goals: Rc::clone(&self.goals),
            progress: Rc::clone(&self.progress),
            rules: Rc::clone(&self.rules),
            notices: Rc::clone(&self.notices),
            level_complete: Rc::clone(&self.level_complete),
        }
    }

    /// Hook the progression layer onto the bus. Listeners hold a weak
    /// reference to the bus so the world can be dropped cleanly.
    fn wire_listeners(&mut self) {
        let weak_bus = Rc::downgrade(&self.bus);

        let shared = self.shared();
        let bus = Weak::clone(&weak_bus);
        let id = self.bus.subscribe_event::<GoalCompleted>(move |index| {
            // Bind the result first so the tracker borrow ends before publishing
            let completed = shared.goals.borrow_mut().complete_goal(*index);
            let Ok(goal) = completed else {
                return;
            };
            info!("Goal completed: {}", goal.text);
            shared.notices.borrow_mut().push(GameNotice::GoalCompleted {
                index: *index,
                text: goal.text.clone(),
            });
            award_experience(&shared.progress, &bus, goal.xp_to_give);
        });
        self.subscriptions.push((EventKind::GoalCompleted, id));

        let shared = self.shared();
        let bus = Weak::clone(&weak_bus);
        let id = self.bus.subscribe(EventKind::GoalReached, move || {
            if shared.level_complete.replace(true) {
                return;
            }
            info!("Level complete!");
            shared.session.pause();
            shared.notices.borrow_mut().push(GameNotice::LevelComplete);
            let xp = shared.progress.borrow().level_complete_xp();
            award_experience(&shared.progress, &bus, xp);
        });
        self.subscriptions.push((EventKind::GoalReached, id));

        let shared = self.shared();
        let id = self.bus.subscribe(EventKind::RedLightViolation, move || {
            let Some(rule) = shared.rules.get(RuleId::RedLightViolation) else {
                error!("Message with ID '{}' not found!", RuleId::RedLightViolation);
                return;
            };
            if rule.pause_game {
                shared.session.pause();
            }
            shared.notices.borrow_mut().push(GameNotice::Rule(rule.clone()));
        });
        self.subscriptions.push((EventKind::RedLightViolation, id));

        let shared = self.shared();
        let id = self.bus.subscribe_event::<ExperienceGained>(move |gain| {
            shared
                .notices
                .borrow_mut()
                .push(GameNotice::Experience(*gain));
        });
        self.subscriptions.push((EventKind::ExperienceGained, id));
    }

    /// Build vehicles, lights, zones and obstacles from the scenario
    fn populate(&mut self) -> Result<()> {
        let scenario = self.scenario.clone();
        let mut rng = self.seed.map(StdRng::seed_from_u64);

        *self.goals.borrow_mut() = GoalTracker::new(scenario.goals.clone());

        for obstacle in &scenario.obstacles {
            self.colliders.insert(
                obstacle.tag.clone(),
                Aabb::from_center_size(obstacle.center, obstacle.size),
            );
        }

        for (i, def) in scenario.vehicles.iter().enumerate() {
            let path: Path = def.waypoints.iter().cloned().collect();
            let follower = CarPathFollower::new(def.follower, path)
                .with_context(|| format!("Invalid follower config for vehicle {}", i))?;
            let collider = self.colliders.insert(
                def.tag.clone(),
                Aabb::from_center_size(follower.position(), def.size),
            );
            let id = VehicleId(self.next_sim_id());
            self.vehicles.insert(
                id,
                SimVehicle {
                    id,
                    tag: def.tag.clone(),
                    collider,
                    follower,
                },
            );
        }

        for (i, def) in scenario.traffic_lights.iter().enumerate() {
            let id = LightId(self.next_sim_id());
            let mut light = TrafficLight::new(
                id,
                def.position,
                def.facing_deg.to_radians(),
                def.config.clone(),
            )
            .with_context(|| format!("Invalid config for traffic light {}", i))?;

            if let Some(rng) = rng.as_mut() {
                let state = LightState::ALL[rng.random_range(0..LightState::ALL.len())];
                let full = def.config.timings.duration(state);
                let remaining: f32 = rng.random_range(0.0..full);
                light = light.with_phase(state, remaining);
            }
            self.lights.insert(id, light);
        }

        for def in &scenario.goal_zones {
            self.goal_zones.push(SimGoalZone {
                zone: GoalZone::new(Aabb::from_center_size(def.center, def.size), def.tag.clone()),
                signal: def.signal,
            });
        }

        Ok(())
    }

    /// Rebuild the scene from the scenario. Player progress is kept.
    pub fn restart(&mut self) -> Result<()> {
        self.vehicles.clear();
        self.lights.clear();
        self.goal_zones.clear();
        self.colliders = ColliderSet::new();
        self.notices.borrow_mut().clear();
        self.level_complete.set(false);
        self.time = 0.0;
        self.next_id = 0;
        self.populate()?;
        self.session.resume();
        info!("Restarted scenario '{}'", self.scenario.name);
        Ok(())
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32) -> Result<TickReport, DispatchError> {
        let delta_secs = delta_secs * self.session.time_scale();
        self.time += delta_secs;
        let mut report = TickReport::default();

        // Move vehicles and drag their colliders along
        for vehicle in self.vehicles.values_mut() {
            let update = vehicle.follower.tick(delta_secs);
            self.colliders
                .set_center(vehicle.collider, vehicle.follower.position());
            report.vehicle_updates.push((vehicle.id, update));
        }

        if !self.session.is_paused() {
            for goal_zone in &mut self.goal_zones {
                for collider in goal_zone.zone.update(&self.colliders) {
                    match goal_zone.signal {
                        ZoneSignal::LevelComplete => {
                            self.bus.publish(EventKind::GoalReached)?;
                        }
                        ZoneSignal::Goal { goal_index } => {
                            self.bus.publish_event::<GoalCompleted>(goal_index)?;
                        }
                    }
                    report.zones_entered.push(collider);
                }
            }
        }

        let ctx = DetectionContext {
            session: &self.session,
            raycaster: &self.colliders,
            bus: &self.bus,
        };
        for light in self.lights.values_mut() {
            let result = light.tick(delta_secs, &ctx)?;
            if let Some(state) = result.changed_to {
                report.light_changes.push((light.id, state));
            }
            if let Some(hit) = result.violation {
                report.violations.push((light.id, hit));
            }
        }

        Ok(report)
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Road Rules Summary ===");
        println!("Scenario: {}", self.scenario.name);
        println!("Time: {:.2}s{}", self.time, if self.is_paused() { " (paused)" } else { "" });
        println!("{}", self.progress.borrow().summary());
        println!();

        println!("--- Vehicles ---");
        for vehicle in self.vehicles.values() {
            let follower = &vehicle.follower;
            let position = follower.position();
            println!(
                "  Vehicle {:?} [{}]: {:?}, speed={:.2}, position=({:.1}, {:.1}), waypoint={}/{}",
                vehicle.id.0 .0,
                vehicle.tag,
                follower.state(),
                follower.speed(),
                position.x,
                position.z,
                follower.current_waypoint_index(),
                follower.path().len()
            );
        }

        println!("--- Traffic Lights ---");
        for light in self.lights.values() {
            println!(
                "  Light {:?}: {} ({:.1}s left)",
                light.id.0 .0,
                light.state(),
                light.remaining()
            );
        }

        let goals = self.goals.borrow();
        println!("--- Goals: {} ({}/{}) ---", goals.title(), goals.completed_count(), goals.len());
        for line in goals.checklist() {
            println!("  {}", line);
        }
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        print!("{}", self.render_map());
    }

    /// Box around every waypoint, vehicle, light and goal zone
    pub fn scene_bounds(&self) -> Option<Aabb> {
        let mut points: Vec<Position> = Vec::new();
        for vehicle in self.vehicles.values() {
            points.push(vehicle.follower.position());
            points.extend(vehicle.follower.path().iter().map(|w| w.position));
        }
        points.extend(self.lights.values().map(|l| l.position));
        for goal_zone in &self.goal_zones {
            points.push(goal_zone.zone.bounds.min);
            points.push(goal_zone.zone.bounds.max);
        }

        let mut finite = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        let first = finite.next()?;
        let bounds = finite.fold(Aabb { min: first, max: first }, |b, p| Aabb {
            min: Position::new(b.min.x.min(p.x), b.min.y.min(p.y), b.min.z.min(p.z)),
            max: Position::new(b.max.x.max(p.x), b.max.y.max(p.y), b.max.z.max(p.z)),
        });
        Some(bounds)
    }

    /// Text map of the world, at most `MAP_MAX_COLS` by `MAP_MAX_ROWS` cells
    pub fn render_map(&self) -> String {
        let Some(bounds) = self.scene_bounds() else {
            return "\n=== World Map ===\n(empty)\n\n".to_string();
        };

        // Add padding
        let (min_x, max_x) = (bounds.min.x - 2.0, bounds.max.x + 2.0);
        let (min_z, max_z) = (bounds.min.z - 2.0, bounds.max.z + 2.0);

        // Half a character per world unit, shrunk to fit large scenes.
        // An extent that overflows f32 gives a scale of 0: one cell.
        let scale = MAP_CELLS_PER_UNIT
            .min(MAP_MAX_COLS as f32 / (max_x - min_x))
            .min(MAP_MAX_ROWS as f32 / (max_z - min_z));
        let width = (((max_x - min_x) * scale) as usize).clamp(1, MAP_MAX_COLS);
        let height = (((max_z - min_z) * scale) as usize).clamp(1, MAP_MAX_ROWS);
        let mut grid = vec![vec![' '; width]; height];

        let to_grid = |x: f32, z: f32| -> (usize, usize) {
            let col = ((max_x - x) * scale) as usize;
            // Flip the Z-axis so +Z is up
            let row = ((max_z - z) * scale) as usize;
            (row.min(height - 1), col.min(width - 1))
        };

        for goal_zone in &self.goal_zones {
            let bounds = &goal_zone.zone.bounds;
            let (r0, c0) = to_grid(bounds.max.x, bounds.max.z);
            let (r1, c1) = to_grid(bounds.min.x, bounds.min.z);
            for row in grid.iter_mut().take(r1 + 1).skip(r0) {
                for cell in row.iter_mut().take(c1 + 1).skip(c0) {
                    *cell = '~';
                }
            }
        }

        for vehicle in self.vehicles.values() {
            for waypoint in vehicle.follower.path().iter() {
                let (row, col) = to_grid(waypoint.position.x, waypoint.position.z);
                grid[row][col] = match waypoint.kind {
                    WaypointKind::Stop => 'S',
                    WaypointKind::Default => 'o',
                };
            }
        }

        for light in self.lights.values() {
            let (row, col) = to_grid(light.position.x, light.position.z);
            grid[row][col] = match light.state() {
                LightState::Green => 'G',
                LightState::Orange => 'O',
                LightState::Red => 'R',
            };
        }

        for vehicle in self.vehicles.values() {
            let position = vehicle.follower.position();
            let (row, col) = to_grid(position.x, position.z);
            grid[row][col] = 'C';
        }

        let mut map = String::from("\n=== World Map ===\n");
        map.push_str("Legend: C=Car, o=Waypoint, S=Stop, G/O/R=Light, ~=Goal zone\n\n");
        for row in &grid {
            map.extend(row.iter());
            map.push('\n');
        }
        map.push('\n');
        map
    }
}

impl Drop for SimWorld {
    fn drop(&mut self) {
        for (kind, id) in self.subscriptions.drain(..) {
            self.bus.unsubscribe(kind, id);
        }
    }
}

/// Award experience and announce it with the pre-award snapshot
fn award_experience(progress: &RefCell<PlayerProgress>, bus: &Weak<EventBus>, amount: i32) {
    let gain = {
        let mut progress = progress.borrow_mut();
        let gain = progress.gain_snapshot(amount);
        progress.add_experience(amount);
        gain
    };
    let Some(bus) = bus.upgrade() else {
        return;
    };
    if let Err(e) = bus.publish_event::<ExperienceGained>(gain) {
        warn!("Failed to publish experience gain: {}", e);
    }
}

fn validate_scenario(scenario: &Scenario) -> Result<()> {
    let goal_count = scenario.goals.goals.len();

    scenario
        .progression
        .validate()
        .context("Invalid progression config")?;

    for (i, vehicle) in scenario.vehicles.iter().enumerate() {
        if vehicle.tag.is_empty() {
            bail!("Vehicle {} has no tag", i);
        }
    }

    for (i, light) in scenario.traffic_lights.iter().enumerate() {
        if let ViolationSignal::GoalCompleted { goal_index } = light.config.detector.signal {
            if goal_index >= goal_count {
                bail!(
                    "Traffic light {} targets goal {} but the scenario has {} goals",
                    i,
                    goal_index,
                    goal_count
                );
            }
        }
    }

    for (i, zone) in scenario.goal_zones.iter().enumerate() {
        if zone.tag.is_empty() {
            bail!("Goal zone {} has no tag", i);
        }
        if let ZoneSignal::Goal { goal_index } = zone.signal {
            if goal_index >= goal_count {
                bail!(
                    "Goal zone {} targets goal {} but the scenario has {} goals",
                    i,
                    goal_index,
                    goal_count
                );
            }
        }
    }

    Ok(())
}
