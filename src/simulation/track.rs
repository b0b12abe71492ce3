//! Ground-truth trajectory recording

use anyhow::{Context, Result};

use super::agent::SimAgent;
use super::engine::CrowdEngine;
use super::types::{TrackId, Vector2};

/// One recorded position of an agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl TrackSample {
    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }
}

/// The full trajectory of one agent in world coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthTrack {
    /// Camera placeholder, always 0 for ground truth
    pub camera: u32,
    pub id: TrackId,
    pub samples: Vec<TrackSample>,
}

impl GroundTruthTrack {
    pub fn new(id: TrackId) -> Self {
        Self {
            camera: 0,
            id,
            samples: Vec::new(),
        }
    }

    /// Number of recorded samples
    pub fn valid_len(&self) -> usize {
        self.samples.len()
    }
}

/// Collects one ground-truth track per spawned agent
#[derive(Debug, Clone, Default)]
pub struct TrackRecorder {
    tracks: Vec<GroundTruthTrack>,
}

impl TrackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty track with the next sequential id
    pub fn open_track(&mut self) -> TrackId {
        let id = TrackId(self.tracks.len());
        self.tracks.push(GroundTruthTrack::new(id));
        id
    }

    /// Append the current position of every agent that has not retired
    /// Returns how many samples were recorded
    pub fn record<E: CrowdEngine>(&mut self, agents: &[SimAgent], engine: &E) -> Result<usize> {
        let t = engine.global_time();
        let mut recorded = 0;

        for agent in agents.iter().filter(|a| !a.is_retired()) {
            let position = engine
                .agent_position(agent.id)
                .context("Agent not registered with engine")?;
            let track = self
                .tracks
                .get_mut(agent.track.0)
                .context("Agent has no open track")?;
            track.samples.push(TrackSample {
                x: position.x,
                y: position.y,
                t,
            });
            recorded += 1;
        }

        Ok(recorded)
    }

    pub fn tracks(&self) -> &[GroundTruthTrack] {
        &self.tracks
    }

    pub fn into_tracks(self) -> Vec<GroundTruthTrack> {
        self.tracks
    }
}
