//! Standalone crowd simulation module
//!
//! This module contains the scenario parser, the agent lifecycle, track
//! recording, camera projection and output writing. The collision-avoidance
//! engine sits behind the [`CrowdEngine`] trait.

mod agent;
mod camera;
mod engine;
mod error;
mod lifecycle;
mod output;
mod parser;
mod random;
mod scenario;
mod track;
mod types;
mod world;

pub use agent::{GoalState, SimAgent};
pub use camera::{
    polygon_contains, project_tracks, CameraTracklets, CameraView, TrackletPoint, FOV_POLYGON,
};
pub use engine::{AgentDefaults, CrowdEngine, KinematicEngine};
pub use error::{OutputError, ScenarioError, ScenarioResult};
pub use lifecycle::{entrance_index, exit_index, LifecycleManager};
pub use output::{
    camera_output_path, format_value, ground_truth_output_path, pad_tracks,
    write_camera_tracklets, write_ground_truth, write_outputs, OutputReport, OUTPUT_DECIMALS,
    PAD_VALUE,
};
pub use parser::{
    parse_camera_pose, parse_float_list, parse_key_value_float, parse_vertex_list,
    split_sections,
};
pub use random::{ScriptedDraws, SeededUniform, UniformSource};
pub use scenario::{
    load_scenario, CameraPose, Gate, Obstacle, Scenario, ScenarioConfig, TransitionMatrix,
    GATE_POINTS, MAX_NEIGHBORS, MAX_TARGET_AGENTS, NEIGHBOR_DIST, SECTION_COUNT, TIME_HORIZON,
    TIME_HORIZON_OBST,
};
pub use track::{GroundTruthTrack, TrackRecorder, TrackSample};
pub use types::{AgentId, TrackId, Vector2};
pub use world::{SimWorld, SimulationOutput};
