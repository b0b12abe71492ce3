//! Main simulation world that ties everything together
//!
//! A [`SimWorld`] is the context of a single run: it owns the scenario, the
//! crowd engine, every agent's goal state, the recorded tracks and the random
//! source. Nothing is shared between runs.

use anyhow::{Context, Result};
use log::{debug, info};

use super::camera::{project_tracks, CameraTracklets};
use super::engine::CrowdEngine;
use super::lifecycle::LifecycleManager;
use super::random::UniformSource;
use super::scenario::Scenario;
use super::track::{GroundTruthTrack, TrackRecorder};

/// Tracks and per-camera tracklets of a finished run
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub tracks: Vec<GroundTruthTrack>,
    pub cameras: Vec<CameraTracklets>,
    /// Agents that had not reached their final goal when time ran out
    pub active_agents: usize,
}

impl SimulationOutput {
    /// Log the end-of-run statistics
    pub fn log_summary(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Total tracks: {}", self.tracks.len());
        info!("Agents still active: {}", self.active_agents);
        let per_camera = self
            .cameras
            .iter()
            .map(|c| c.tracks_present.len().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        info!("Tracks by camera: {}", per_camera);
    }
}

/// The simulation world for one run
pub struct SimWorld<E: CrowdEngine, U: UniformSource> {
    pub scenario: Scenario,
    engine: E,
    lifecycle: LifecycleManager,
    recorder: TrackRecorder,
    draws: U,
    ticks: u64,
}

impl<E: CrowdEngine, U: UniformSource> SimWorld<E, U> {
    /// Configure `engine` from the scenario and set up an empty run
    pub fn new(scenario: Scenario, mut engine: E, draws: U) -> Self {
        scenario.apply_to(&mut engine);
        let lifecycle = LifecycleManager::new(scenario.config.target_agents);
        Self {
            scenario,
            engine,
            lifecycle,
            recorder: TrackRecorder::new(),
            draws,
            ticks: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn tracks(&self) -> &[GroundTruthTrack] {
        self.recorder.tracks()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Elapsed simulated time
    pub fn time(&self) -> f64 {
        self.engine.global_time()
    }

    /// Main simulation tick
    ///
    /// Spawn, record, steer, then step the engine. Preferred velocities are
    /// computed from the positions before the step.
    pub fn tick(&mut self) -> Result<()> {
        let spawned = self
            .lifecycle
            .spawn_agents(
                &self.scenario,
                &mut self.engine,
                &mut self.draws,
                &mut self.recorder,
            )
            .context("Failed to spawn agents")?;

        self.recorder
            .record(self.lifecycle.agents(), &self.engine)
            .context("Failed to record agent positions")?;

        self.lifecycle
            .update_preferred_velocities(&mut self.engine)
            .context("Failed to set preferred velocities")?;

        self.engine.do_step();
        self.ticks += 1;

        if spawned > 0 {
            debug!(
                "Tick {} (t={:.2}s): spawned {}, active {}",
                self.ticks,
                self.engine.global_time(),
                spawned,
                self.lifecycle.active_agents()
            );
        }

        Ok(())
    }

    /// Tick until the elapsed time exceeds the scenario duration
    ///
    /// Always runs at least one tick. Ends on time alone, even if every agent
    /// has already retired.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.tick()?;
            if self.engine.global_time() > self.scenario.config.duration {
                break;
            }
        }

        info!(
            "Simulated {:.2}s in {} ticks: {} agents spawned, {} retired",
            self.engine.global_time(),
            self.ticks,
            self.lifecycle.total_spawned(),
            self.lifecycle.total_retired()
        );
        if self.lifecycle.all_retired() {
            debug!("All agents reached their final goals before time ran out");
        }

        Ok(())
    }

    /// Project the recorded tracks into every camera
    pub fn finish(self) -> SimulationOutput {
        let active_agents = self.lifecycle.active_agents();
        let tracks = self.recorder.into_tracks();
        let cameras = project_tracks(&self.scenario.cameras, &tracks);
        SimulationOutput {
            tracks,
            cameras,
            active_agents,
        }
    }
}
