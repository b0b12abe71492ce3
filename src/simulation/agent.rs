//! Per-agent goal state for the crowd simulation
//!
//! The engine owns where an agent is; this owns where it is going.

use super::types::{AgentId, TrackId, Vector2};

/// Which goal an agent is currently walking toward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalState {
    /// Walking to the intermediate goal near the middle of the scene
    SeekingPrimary,
    /// Walking to the final goal at the exit
    SeekingSecondary,
    /// Reached the final goal; no longer recorded or steered
    Retired,
}

/// An agent in the crowd simulation
#[derive(Debug, Clone)]
pub struct SimAgent {
    pub id: AgentId,
    pub track: TrackId,
    /// Gate the agent spawned at
    pub entrance: usize,
    /// Gate the agent is heading for
    pub exit: usize,
    pub primary_goal: Vector2,
    pub secondary_goal: Vector2,
    pub state: GoalState,
}

impl SimAgent {
    pub fn new(
        id: AgentId,
        track: TrackId,
        entrance: usize,
        exit: usize,
        primary_goal: Vector2,
        secondary_goal: Vector2,
    ) -> Self {
        Self {
            id,
            track,
            entrance,
            exit,
            primary_goal,
            secondary_goal,
            state: GoalState::SeekingPrimary,
        }
    }

    pub fn is_retired(&self) -> bool {
        self.state == GoalState::Retired
    }

    /// The goal the agent is steering toward, if any
    pub fn active_goal(&self) -> Option<Vector2> {
        match self.state {
            GoalState::SeekingPrimary => Some(self.primary_goal),
            GoalState::SeekingSecondary => Some(self.secondary_goal),
            GoalState::Retired => None,
        }
    }

    /// Switch from the primary to the secondary goal
    /// Returns true if the state changed
    pub fn reach_primary(&mut self) -> bool {
        if self.state == GoalState::SeekingPrimary {
            self.state = GoalState::SeekingSecondary;
            true
        } else {
            false
        }
    }

    /// Mark the agent as retired
    /// Returns true only on the first call, so callers can count retirements once
    pub fn retire(&mut self) -> bool {
        if self.state == GoalState::Retired {
            return false;
        }
        self.state = GoalState::Retired;
        true
    }
}
