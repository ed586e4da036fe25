//! Paths and the authoring utility that builds them

use log::info;

use super::types::{Position, DEFAULT_WAYPOINT_HEIGHT};
use super::waypoint::{Waypoint, WaypointKind};

/// An ordered sequence of waypoints; insertion order is traversal order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    waypoints: Vec<Waypoint>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
    }

    /// Remove every waypoint, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let count = self.waypoints.len();
        self.waypoints.clear();
        count
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Waypoint> {
        self.waypoints.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

impl FromIterator<Waypoint> for Path {
    fn from_iter<I: IntoIterator<Item = Waypoint>>(iter: I) -> Self {
        Self {
            waypoints: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Waypoint>> for Path {
    fn from(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }
}

/// Creates and destroys waypoints under a path container
#[derive(Debug, Clone)]
pub struct PathManager {
    path: Path,
    pub waypoint_height: f32,
}

impl Default for PathManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PathManager {
    pub fn new() -> Self {
        Self::with_path(Path::new())
    }

    /// Manage an existing container
    pub fn with_path(path: Path) -> Self {
        Self {
            path,
            waypoint_height: DEFAULT_WAYPOINT_HEIGHT,
        }
    }

    /// Create a waypoint at `position`, snapped to the authoring height
    pub fn create_waypoint_at(&mut self, position: Position, kind: WaypointKind) -> &Waypoint {
        let position = position.with_y(self.waypoint_height);
        let name = format!("Waypoint (({}) {})", kind, self.path.len() + 1);
        self.path.push(Waypoint::new(position, kind).with_name(name));
        &self.path.waypoints[self.path.len() - 1]
    }

    /// Destroy every waypoint in the container
    pub fn clear_all_waypoints(&mut self) -> usize {
        let removed = self.path.clear();
        info!("Cleared all waypoints");
        removed
    }

    pub fn all_waypoints(&self) -> &[Waypoint] {
        self.path.waypoints()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutable access, e.g. for setting a STOP waypoint's wait time
    pub fn path_mut(&mut self) -> &mut Path {
        &mut self.path
    }

    pub fn into_path(self) -> Path {
        self.path
    }
}
