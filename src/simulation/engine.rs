//! Boundary to the collision-avoidance engine
//!
//! The engine owns agent kinematics. The rest of the simulation only hands it
//! preferred velocities and reads positions back after each step.

use log::warn;

use super::types::{AgentId, Vector2};

/// Simulation-wide defaults applied to every newly added agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentDefaults {
    pub neighbor_dist: f64,
    pub max_neighbors: usize,
    pub time_horizon: f64,
    pub time_horizon_obst: f64,
    pub radius: f64,
    pub max_speed: f64,
}

/// Operations the simulation needs from a crowd engine
pub trait CrowdEngine {
    fn set_time_step(&mut self, time_step: f64);
    fn time_step(&self) -> f64;
    fn set_agent_defaults(&mut self, defaults: AgentDefaults);

    /// Add an agent at `position` using the current defaults
    fn add_agent(&mut self, position: Vector2) -> AgentId;

    /// Register a static obstacle polygon; returns its index
    fn add_obstacle(&mut self, vertices: &[Vector2]) -> usize;

    /// Finalize obstacles so they take part in avoidance
    fn process_obstacles(&mut self);

    fn num_agents(&self) -> usize;
    fn agent_position(&self, id: AgentId) -> Option<Vector2>;
    fn agent_max_speed(&self, id: AgentId) -> Option<f64>;
    fn set_agent_pref_velocity(&mut self, id: AgentId, velocity: Vector2);

    /// Simulated time elapsed so far
    fn global_time(&self) -> f64;

    /// Advance the simulation by one time step
    fn do_step(&mut self);
}

#[derive(Debug, Clone)]
struct KinematicAgent {
    position: Vector2,
    velocity: Vector2,
    pref_velocity: Vector2,
    radius: f64,
    max_speed: f64,
}

/// A crowd engine without avoidance
///
/// Each agent moves along its preferred velocity, clamped to its max speed.
/// Obstacles are kept but do not influence motion.
#[derive(Debug, Clone)]
pub struct KinematicEngine {
    agents: Vec<KinematicAgent>,
    obstacles: Vec<Vec<Vector2>>,
    obstacles_processed: bool,
    defaults: Option<AgentDefaults>,
    time_step: f64,
    global_time: f64,
}

impl Default for KinematicEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KinematicEngine {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            obstacles: Vec::new(),
            obstacles_processed: false,
            defaults: None,
            time_step: 0.0,
            global_time: 0.0,
        }
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    pub fn obstacles_processed(&self) -> bool {
        self.obstacles_processed
    }

    pub fn defaults(&self) -> Option<&AgentDefaults> {
        self.defaults.as_ref()
    }

    pub fn agent_radius(&self, id: AgentId) -> Option<f64> {
        self.agents.get(id.0).map(|a| a.radius)
    }

    pub fn agent_velocity(&self, id: AgentId) -> Option<Vector2> {
        self.agents.get(id.0).map(|a| a.velocity)
    }
}

impl CrowdEngine for KinematicEngine {
    fn set_time_step(&mut self, time_step: f64) {
        self.time_step = time_step;
    }

    fn time_step(&self) -> f64 {
        self.time_step
    }

    fn set_agent_defaults(&mut self, defaults: AgentDefaults) {
        self.defaults = Some(defaults);
    }

    fn add_agent(&mut self, position: Vector2) -> AgentId {
        if self.defaults.is_none() {
            warn!("Adding agent before agent defaults were set; radius and speed are 0");
        }
        let (radius, max_speed) = self
            .defaults
            .map(|d| (d.radius, d.max_speed))
            .unwrap_or((0.0, 0.0));

        let id = AgentId(self.agents.len());
        self.agents.push(KinematicAgent {
            position,
            velocity: Vector2::ZERO,
            pref_velocity: Vector2::ZERO,
            radius,
            max_speed,
        });
        id
    }

    fn add_obstacle(&mut self, vertices: &[Vector2]) -> usize {
        if self.obstacles_processed {
            warn!("Obstacle added after obstacles were processed; process_obstacles must run again");
            self.obstacles_processed = false;
        }
        self.obstacles.push(vertices.to_vec());
        self.obstacles.len() - 1
    }

    fn process_obstacles(&mut self) {
        self.obstacles_processed = true;
    }

    fn num_agents(&self) -> usize {
        self.agents.len()
    }

    fn agent_position(&self, id: AgentId) -> Option<Vector2> {
        self.agents.get(id.0).map(|a| a.position)
    }

    fn agent_max_speed(&self, id: AgentId) -> Option<f64> {
        self.agents.get(id.0).map(|a| a.max_speed)
    }

    fn set_agent_pref_velocity(&mut self, id: AgentId, velocity: Vector2) {
        if let Some(agent) = self.agents.get_mut(id.0) {
            agent.pref_velocity = velocity;
        }
    }

    fn global_time(&self) -> f64 {
        self.global_time
    }

    fn do_step(&mut self) {
        let dt = self.time_step;
        for agent in &mut self.agents {
            let speed = agent.pref_velocity.length();
            agent.velocity = if speed > agent.max_speed {
                agent.max_speed * agent.pref_velocity.normalize()
            } else {
                agent.pref_velocity
            };
            agent.position = agent.position + dt * agent.velocity;
        }
        self.global_time += dt;
    }
}
