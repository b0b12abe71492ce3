//! Scenario building
//!
//! Turns parsed sections into a validated [`Scenario`] and pushes its
//! defaults and obstacles into a crowd engine.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use super::engine::{AgentDefaults, CrowdEngine};
use super::error::{ScenarioError, ScenarioResult};
use super::parser::{
    parse_camera_pose, parse_float_list, parse_key_value_float, parse_vertex_list,
    split_sections,
};
use super::types::Vector2;

/// Number of marker-delimited sections in a scenario file
pub const SECTION_COUNT: usize = 6;

/// Points per gate: spawn segment, primary-goal segment, secondary-goal segment
pub const GATE_POINTS: usize = 6;

/// Engine defaults that are not configurable from the scenario file
pub const NEIGHBOR_DIST: f64 = 15.0;
pub const MAX_NEIGHBORS: usize = 10;
pub const TIME_HORIZON: f64 = 10.0;
pub const TIME_HORIZON_OBST: f64 = 5.0;

/// Largest agent count a scenario may request
pub const MAX_TARGET_AGENTS: usize = u32::MAX as usize;

const SECTION_SIM: usize = 0;
const SECTION_AGENTS: usize = 1;
const SECTION_OBSTACLES: usize = 2;
const SECTION_GATES: usize = 3;
const SECTION_TRANSITIONS: usize = 4;
const SECTION_CAMERAS: usize = 5;

/// Simulation-wide settings from sections 0 and 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioConfig {
    /// Seconds per simulation step
    pub time_step: f64,
    /// Total simulated seconds
    pub duration: f64,
    pub agent_radius: f64,
    pub max_speed: f64,
    /// Number of agents kept walking at once
    pub target_agents: usize,
}

impl ScenarioConfig {
    pub fn agent_defaults(&self) -> AgentDefaults {
        AgentDefaults {
            neighbor_dist: NEIGHBOR_DIST,
            max_neighbors: MAX_NEIGHBORS,
            time_horizon: TIME_HORIZON,
            time_horizon_obst: TIME_HORIZON_OBST,
            radius: self.agent_radius,
            max_speed: self.max_speed,
        }
    }
}

/// A static obstacle polygon
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub vertices: Vec<Vector2>,
}

/// An entrance/exit record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub points: [Vector2; GATE_POINTS],
}

impl Gate {
    /// Segment agents spawn on when entering here
    pub fn spawn_segment(&self) -> (Vector2, Vector2) {
        (self.points[0], self.points[1])
    }

    /// Segment holding the intermediate goal of agents leaving here
    pub fn primary_segment(&self) -> (Vector2, Vector2) {
        (self.points[2], self.points[3])
    }

    /// Segment holding the final goal of agents leaving here
    pub fn secondary_segment(&self) -> (Vector2, Vector2) {
        (self.points[4], self.points[5])
    }
}

/// Entrance-to-exit weights, one row per entrance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransitionMatrix {
    pub rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    pub fn row(&self, entrance: usize) -> Option<&[f64]> {
        self.rows.get(entrance).map(|r| r.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Camera position and heading in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub x: f64,
    pub y: f64,
    pub heading_degrees: f64,
}

impl CameraPose {
    pub fn center(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }

    pub fn heading_radians(&self) -> f64 {
        self.heading_degrees.to_radians()
    }
}

/// A fully validated scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub config: ScenarioConfig,
    pub obstacles: Vec<Obstacle>,
    pub gates: Vec<Gate>,
    pub transitions: TransitionMatrix,
    pub cameras: Vec<CameraPose>,
}

/// Line `index` of a section, or a WrongArity error naming how many were found
fn required_line(lines: &[String], index: usize, expected: usize) -> ScenarioResult<&str> {
    lines
        .get(index)
        .map(|l| l.as_str())
        .ok_or_else(|| ScenarioError::WrongArity {
            line: lines.join(" | "),
            expected,
            found: lines.len(),
        })
}

fn warn_extra_lines(section: usize, lines: &[String], expected: usize) {
    for line in lines.iter().skip(expected) {
        warn!("Section {}: ignoring extra line '{}'", section, line);
    }
}

fn non_negative(name: &str, value: f64) -> ScenarioResult<f64> {
    if value < 0.0 {
        return Err(ScenarioError::OutOfRange {
            name: name.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Section 0: time step and duration
fn parse_sim_section(lines: &[String]) -> ScenarioResult<(f64, f64)> {
    let time_step = parse_key_value_float(required_line(lines, 0, 2)?)?;
    let duration = parse_key_value_float(required_line(lines, 1, 2)?)?;
    warn_extra_lines(SECTION_SIM, lines, 2);

    if time_step <= 0.0 {
        return Err(ScenarioError::OutOfRange {
            name: "time step".to_string(),
            value: time_step,
        });
    }
    Ok((time_step, non_negative("duration", duration)?))
}

/// Section 1: agent radius, max speed and target agent count
fn parse_agent_section(lines: &[String]) -> ScenarioResult<(f64, f64, usize)> {
    let radius = parse_key_value_float(required_line(lines, 0, 3)?)?;
    let max_speed = parse_key_value_float(required_line(lines, 1, 3)?)?;
    let target = parse_key_value_float(required_line(lines, 2, 3)?)?;
    warn_extra_lines(SECTION_AGENTS, lines, 3);

    if target > MAX_TARGET_AGENTS as f64 {
        return Err(ScenarioError::OutOfRange {
            name: "agent count".to_string(),
            value: target,
        });
    }
    // Truncates toward zero; negative counts become 0
    let target_agents = target.trunc().max(0.0) as usize;

    Ok((
        non_negative("agent radius", radius)?,
        non_negative("max speed", max_speed)?,
        target_agents,
    ))
}

fn parse_gate(line: &str) -> ScenarioResult<Gate> {
    let vertices = parse_vertex_list(line)?;
    let points: [Vector2; GATE_POINTS] = vertices.try_into().map_err(|v: Vec<Vector2>| {
        ScenarioError::WrongArity {
            line: line.to_string(),
            expected: GATE_POINTS,
            found: v.len(),
        }
    })?;
    Ok(Gate { points })
}

fn parse_transition_row(line: &str) -> ScenarioResult<Vec<f64>> {
    let row = parse_float_list(line)?;
    for &weight in &row {
        non_negative("transition weight", weight)?;
    }
    Ok(row)
}

/// Parse each line of a section, tagging failures with the section index
fn parse_lines<T>(
    section: usize,
    lines: &[String],
    parse: impl Fn(&str) -> ScenarioResult<T>,
) -> ScenarioResult<Vec<T>> {
    lines
        .iter()
        .map(|line| parse(line.as_str()))
        .collect::<ScenarioResult<Vec<T>>>()
        .map_err(|e| e.in_section(section))
}

impl Scenario {
    /// Parse and validate a complete scenario file
    pub fn parse(text: &str) -> ScenarioResult<Scenario> {
        let sections = split_sections(text);
        Self::from_sections(&sections)
    }

    /// Validate already split sections
    pub fn from_sections(sections: &[Vec<String>]) -> ScenarioResult<Scenario> {
        if sections.len() != SECTION_COUNT {
            return Err(ScenarioError::StructuralMismatch {
                reason: format!(
                    "need {} sections, have {}",
                    SECTION_COUNT,
                    sections.len()
                ),
            });
        }

        let (time_step, duration) =
            parse_sim_section(&sections[SECTION_SIM]).map_err(|e| e.in_section(SECTION_SIM))?;
        let (agent_radius, max_speed, target_agents) =
            parse_agent_section(&sections[SECTION_AGENTS])
                .map_err(|e| e.in_section(SECTION_AGENTS))?;

        let obstacles = parse_lines(SECTION_OBSTACLES, &sections[SECTION_OBSTACLES], |line| {
            parse_vertex_list(line).map(|vertices| Obstacle { vertices })
        })?;
        let gates = parse_lines(SECTION_GATES, &sections[SECTION_GATES], parse_gate)?;
        let rows = parse_lines(
            SECTION_TRANSITIONS,
            &sections[SECTION_TRANSITIONS],
            parse_transition_row,
        )?;
        let cameras = parse_lines(SECTION_CAMERAS, &sections[SECTION_CAMERAS], parse_camera_pose)?;

        let transitions = TransitionMatrix { rows };
        validate_routing(&gates, &transitions, target_agents)
            .map_err(|e| e.in_section(SECTION_TRANSITIONS))?;

        let scenario = Scenario {
            config: ScenarioConfig {
                time_step,
                duration,
                agent_radius,
                max_speed,
                target_agents,
            },
            obstacles,
            gates,
            transitions,
            cameras,
        };

        debug!(
            "Scenario parsed: dt={} duration={} agents={} obstacles={} gates={} cameras={}",
            scenario.config.time_step,
            scenario.config.duration,
            scenario.config.target_agents,
            scenario.obstacles.len(),
            scenario.gates.len(),
            scenario.cameras.len()
        );

        Ok(scenario)
    }

    /// Push time step, agent defaults and obstacles into the engine
    ///
    /// Obstacles are finalized once, after the last one is registered.
    pub fn apply_to<E: CrowdEngine>(&self, engine: &mut E) {
        engine.set_time_step(self.config.time_step);
        engine.set_agent_defaults(self.config.agent_defaults());
        for obstacle in &self.obstacles {
            engine.add_obstacle(&obstacle.vertices);
        }
        engine.process_obstacles();
    }
}

/// Every gate needs a row, and no row may point past the last gate
fn validate_routing(
    gates: &[Gate],
    transitions: &TransitionMatrix,
    target_agents: usize,
) -> ScenarioResult<()> {
    if transitions.len() != gates.len() {
        return Err(ScenarioError::StructuralMismatch {
            reason: format!(
                "{} transition rows for {} gates",
                transitions.len(),
                gates.len()
            ),
        });
    }

    if let Some((entrance, row)) = transitions
        .rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() > gates.len())
    {
        return Err(ScenarioError::StructuralMismatch {
            reason: format!(
                "transition row {} has {} entries but there are only {} gates",
                entrance,
                row.len(),
                gates.len()
            ),
        });
    }

    if target_agents > 0 && gates.is_empty() {
        return Err(ScenarioError::StructuralMismatch {
            reason: format!("{} agents requested but no gates defined", target_agents),
        });
    }

    Ok(())
}

/// Read and parse a scenario file
pub fn load_scenario(path: impl AsRef<Path>) -> ScenarioResult<Scenario> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Scenario::parse(&text)
}
