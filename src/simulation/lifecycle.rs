//! Agent spawning, steering and retirement
//!
//! Keeps the number of walking agents at the scenario's target, picks each
//! new agent's route from the transition matrix, and steers agents through
//! their primary and secondary goals.

use anyhow::{Context, Result};
use log::debug;

use super::agent::{GoalState, SimAgent};
use super::engine::CrowdEngine;
use super::random::UniformSource;
use super::scenario::Scenario;
use super::track::TrackRecorder;
use super::types::{AgentId, Vector2};

/// Pick an entrance from a uniform draw
///
/// Rounds over the highest valid index so every draw in `[0, 1]` lands on a
/// gate; the clamp only matters for draws outside that range.
pub fn entrance_index(gate_count: usize, u: f64) -> usize {
    if gate_count == 0 {
        return 0;
    }
    let highest = gate_count - 1;
    let index = (highest as f64 * u + 0.5).floor().max(0.0) as usize;
    index.min(highest)
}

/// Roulette-wheel selection over one transition row
///
/// Returns the first index whose running sum reaches `u`, or 0 if the row
/// never gets there.
pub fn exit_index(row: &[f64], u: f64) -> usize {
    let mut sum = 0.0;
    for (index, weight) in row.iter().enumerate() {
        sum += weight;
        if sum >= u {
            return index;
        }
    }
    0
}

/// Owns the goal state of every spawned agent
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    target_agents: usize,
    active_agents: usize,
    total_retired: usize,
    agents: Vec<SimAgent>,
}

impl LifecycleManager {
    pub fn new(target_agents: usize) -> Self {
        Self {
            target_agents,
            active_agents: 0,
            total_retired: 0,
            agents: Vec::new(),
        }
    }

    pub fn agents(&self) -> &[SimAgent] {
        &self.agents
    }

    pub fn active_agents(&self) -> usize {
        self.active_agents
    }

    pub fn total_spawned(&self) -> usize {
        self.agents.len()
    }

    pub fn total_retired(&self) -> usize {
        self.total_retired
    }

    /// True when every spawned agent has reached its final goal
    pub fn all_retired(&self) -> bool {
        self.agents.iter().all(|a| a.is_retired())
    }

    /// Spawn agents until the active count reaches the target
    /// Returns the number of agents spawned
    pub fn spawn_agents<E: CrowdEngine, U: UniformSource>(
        &mut self,
        scenario: &Scenario,
        engine: &mut E,
        draws: &mut U,
        recorder: &mut TrackRecorder,
    ) -> Result<usize> {
        let mut spawned = 0;
        while self.active_agents < self.target_agents {
            self.spawn_agent(scenario, engine, draws, recorder)?;
            spawned += 1;
        }
        Ok(spawned)
    }

    /// Spawn a single agent at a random entrance with a random exit
    pub fn spawn_agent<E: CrowdEngine, U: UniformSource>(
        &mut self,
        scenario: &Scenario,
        engine: &mut E,
        draws: &mut U,
        recorder: &mut TrackRecorder,
    ) -> Result<AgentId> {
        if scenario.gates.is_empty() {
            anyhow::bail!("No gates to spawn agents at");
        }

        let entrance = entrance_index(scenario.gates.len(), draws.next_unit());
        let (start, end) = scenario
            .gates
            .get(entrance)
            .context("Entrance gate not found")?
            .spawn_segment();
        let spawn_point = start.lerp(&end, draws.next_unit());

        let row = scenario
            .transitions
            .row(entrance)
            .context("No transition row for entrance")?;
        let exit = exit_index(row, draws.next_unit());
        let exit_gate = scenario.gates.get(exit).context("Exit gate not found")?;

        let (start, end) = exit_gate.primary_segment();
        let primary_goal = start.lerp(&end, draws.next_unit());
        let (start, end) = exit_gate.secondary_segment();
        let secondary_goal = start.lerp(&end, draws.next_unit());

        let id = engine.add_agent(spawn_point);
        let track = recorder.open_track();
        self.agents.push(SimAgent::new(
            id,
            track,
            entrance,
            exit,
            primary_goal,
            secondary_goal,
        ));
        self.active_agents += 1;

        debug!(
            "Spawned agent {} (track {}) at ({:.2}, {:.2}): gate {} -> gate {}",
            id.0, track.0, spawn_point.x, spawn_point.y, entrance, exit
        );

        Ok(id)
    }

    /// Retire the agent at `index`
    /// Only the first retirement of an agent lowers the active count
    pub fn retire_agent(&mut self, index: usize) -> bool {
        let Some(agent) = self.agents.get_mut(index) else {
            return false;
        };
        if !agent.retire() {
            return false;
        }
        self.active_agents = self.active_agents.saturating_sub(1);
        self.total_retired += 1;
        debug!("Agent {} retired (track {})", agent.id.0, agent.track.0);
        true
    }

    /// Hand every agent's preferred velocity to the engine for the next step
    ///
    /// Agents within one step of their goal advance their goal state: a
    /// reached primary goal redirects to the secondary goal, a reached
    /// secondary goal stops and retires the agent.
    pub fn update_preferred_velocities<E: CrowdEngine>(&mut self, engine: &mut E) -> Result<()> {
        let time_step = engine.time_step();

        for index in 0..self.agents.len() {
            let SimAgent {
                id,
                primary_goal,
                secondary_goal,
                state,
                ..
            } = self.agents[index];
            let position = engine
                .agent_position(id)
                .context("Agent not registered with engine")?;
            let max_speed = engine
                .agent_max_speed(id)
                .context("Agent not registered with engine")?;
            let reach = time_step * max_speed;
            let threshold = reach * reach;
            let toward = |goal: Vector2| max_speed * (goal - position).normalize();

            let velocity = match state {
                GoalState::SeekingPrimary => {
                    if (primary_goal - position).abs_sq() < threshold {
                        self.agents[index].reach_primary();
                        toward(secondary_goal)
                    } else {
                        toward(primary_goal)
                    }
                }
                GoalState::SeekingSecondary => {
                    if (secondary_goal - position).abs_sq() < threshold {
                        self.retire_agent(index);
                        Vector2::ZERO
                    } else {
                        toward(secondary_goal)
                    }
                }
                GoalState::Retired => Vector2::ZERO,
            };

            engine.set_agent_pref_velocity(id, velocity);
        }

        Ok(())
    }
}
