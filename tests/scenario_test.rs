//! Scenario building validation tests
//!
//! Covers section structure, per-section validation and how a scenario is
//! pushed into a crowd engine.

use std::path::Path;

use tracklet_sim::simulation::{
    load_scenario, AgentDefaults, AgentId, CrowdEngine, KinematicEngine, Scenario, ScenarioError,
    Vector2, MAX_NEIGHBORS, MAX_TARGET_AGENTS, NEIGHBOR_DIST, TIME_HORIZON, TIME_HORIZON_OBST,
};

const ONE_GATE: &str = "\
# sim
timestep=0.5
duration=1.0
# agents
radius=0.25
maxSpeed=2
numAgents=1
# obstacles
# gates
(0,0);(0,2);(5,0);(5,2);(10,0);(10,2);
# transitions
1.0;
# cameras
-10,1,0;
";

/// Build scenario text from the six section bodies
fn scenario_text(sections: [&str; 6]) -> String {
    sections
        .iter()
        .enumerate()
        .map(|(i, body)| format!("# section {}\n{}\n", i, body))
        .collect()
}

fn valid_sections() -> [&'static str; 6] {
    [
        "timestep=0.25\nduration=10",
        "radius=0.5\nmaxSpeed=1.4\nnumAgents=3",
        "(5,5);(10,5);(10,10);(5,10);\n(30,30);(35,30);(35,35);(30,35);",
        "(0,15);(0,25);(15,15);(15,25);(-2,15);(-2,25);\n(40,15);(40,25);(25,15);(25,25);(42,15);(42,25);",
        "0,1;\n1,0;",
        "2,20,0;\n38,20,180;",
    ]
}

/// Assert that parsing fails inside `section` with an error matching `check`
fn assert_section_error(text: &str, section: usize, check: impl Fn(&ScenarioError) -> bool) {
    match Scenario::parse(text) {
        Err(ScenarioError::Section { index, source }) => {
            assert_eq!(index, section, "Wrong section reported: {}", source);
            assert!(check(source.root()), "Unexpected error: {:?}", source);
        }
        other => panic!("Expected a section {} error, got {:?}", section, other),
    }
}

/// Test parsing a scenario with a single gate and camera
#[test]
fn test_parse_minimal_scenario() {
    let scenario = Scenario::parse(ONE_GATE).unwrap();

    assert_eq!(scenario.config.time_step, 0.5);
    assert_eq!(scenario.config.duration, 1.0);
    assert_eq!(scenario.config.agent_radius, 0.25);
    assert_eq!(scenario.config.max_speed, 2.0);
    assert_eq!(scenario.config.target_agents, 1);
    assert!(scenario.obstacles.is_empty());
    assert_eq!(scenario.gates.len(), 1);
    assert_eq!(scenario.gates[0].points[4], Vector2::new(10.0, 0.0));
    assert_eq!(scenario.transitions.rows, vec![vec![1.0]]);
    assert_eq!(scenario.cameras.len(), 1);
    assert_eq!(scenario.cameras[0].x, -10.0);
}

/// Test parsing a scenario with every section populated
#[test]
fn test_parse_full_scenario() {
    let scenario = Scenario::parse(&scenario_text(valid_sections())).unwrap();

    assert_eq!(scenario.obstacles.len(), 2);
    assert_eq!(scenario.obstacles[1].vertices.len(), 4);
    assert_eq!(scenario.gates.len(), 2);
    let (start, end) = scenario.gates[1].spawn_segment();
    assert_eq!((start, end), (Vector2::new(40.0, 15.0), Vector2::new(40.0, 25.0)));
    assert_eq!(scenario.transitions.row(1), Some(&[1.0, 0.0][..]));
    assert_eq!(scenario.cameras[1].heading_degrees, 180.0);
}

/// Test that the section count must be exactly six
#[test]
fn test_requires_six_sections() {
    let five = "# a\n# b\n# c\n# d\n# e\n";
    assert!(matches!(
        Scenario::parse(five),
        Err(ScenarioError::StructuralMismatch { .. })
    ));

    let seven = format!("{}# extra\n", scenario_text(valid_sections()));
    assert!(matches!(
        Scenario::parse(&seven),
        Err(ScenarioError::StructuralMismatch { .. })
    ));

    assert!(matches!(
        Scenario::parse(""),
        Err(ScenarioError::StructuralMismatch { .. })
    ));
}

/// Test each way the simulation section can fail
#[test]
fn test_sim_section_errors() {
    let mut sections = valid_sections();
    sections[0] = "timestep0.25\nduration=10";
    assert_section_error(&scenario_text(sections), 0, |e| {
        matches!(e, ScenarioError::MalformedFormat { .. })
    });

    sections[0] = "timestep=0.25";
    assert_section_error(&scenario_text(sections), 0, |e| {
        matches!(e, ScenarioError::WrongArity { expected: 2, found: 1, .. })
    });

    sections[0] = "timestep=0\nduration=10";
    assert_section_error(&scenario_text(sections), 0, |e| {
        matches!(e, ScenarioError::OutOfRange { .. })
    });
}

/// Test how the agent count is converted and bounded
#[test]
fn test_agent_count_truncates_toward_zero() {
    let mut sections = valid_sections();
    sections[1] = "radius=0.5\nmaxSpeed=1.4\nnumAgents=3.9";
    let scenario = Scenario::parse(&scenario_text(sections)).unwrap();
    assert_eq!(scenario.config.target_agents, 3);

    sections[1] = "radius=0.5\nmaxSpeed=1.4\nnumAgents=-2";
    let scenario = Scenario::parse(&scenario_text(sections)).unwrap();
    assert_eq!(scenario.config.target_agents, 0);

    // A count the spawn loop could never reach is rejected up front
    sections[1] = "radius=0.5\nmaxSpeed=1.4\nnumAgents=1e30";
    assert_section_error(&scenario_text(sections), 1, |e| {
        matches!(e, ScenarioError::OutOfRange { name, .. } if name == "agent count")
    });

    sections[1] = "radius=0.5\nmaxSpeed=1.4\nnumAgents=4294967295";
    let scenario = Scenario::parse(&scenario_text(sections)).unwrap();
    assert_eq!(scenario.config.target_agents, MAX_TARGET_AGENTS);
}

#[test]
fn test_agent_section_needs_three_lines() {
    let mut sections = valid_sections();
    sections[1] = "radius=0.5\nmaxSpeed=1.4";
    assert_section_error(&scenario_text(sections), 1, |e| {
        matches!(e, ScenarioError::WrongArity { expected: 3, found: 2, .. })
    });
}

/// Test that one bad obstacle line fails the whole load
#[test]
fn test_malformed_obstacle_aborts() {
    let mut sections = valid_sections();
    sections[2] = "(5,5);(10,5);(10);";
    assert_section_error(&scenario_text(sections), 2, |e| {
        matches!(e, ScenarioError::MalformedFormat { .. })
    });
}

/// Test that a gate with five points is rejected
#[test]
fn test_gate_needs_six_points() {
    let mut sections = valid_sections();
    sections[3] = "(0,15);(0,25);(15,15);(15,25);(-2,15);\n(40,15);(40,25);(25,15);(25,25);(42,15);(42,25);";
    assert_section_error(&scenario_text(sections), 3, |e| {
        matches!(e, ScenarioError::WrongArity { expected: 6, found: 5, .. })
    });
}

#[test]
fn test_malformed_gate_and_row_abort() {
    let mut sections = valid_sections();
    sections[3] = "(0,15);(0,25);(15,15);(15,25);(-2,15);(-2,2x5);\n(40,15);(40,25);(25,15);(25,25);(42,15);(42,25);";
    assert_section_error(&scenario_text(sections), 3, |e| {
        matches!(e, ScenarioError::NumericConversion { .. })
    });

    let mut sections = valid_sections();
    sections[4] = "0,1;\n1 ,0;";
    assert_section_error(&scenario_text(sections), 4, |e| {
        matches!(e, ScenarioError::MalformedFormat { .. })
    });
}

/// Test transition matrix shape and weight checks
#[test]
fn test_transition_rows_must_match_gates() {
    let mut sections = valid_sections();
    sections[4] = "0,1;";
    assert_section_error(&scenario_text(sections), 4, |e| {
        matches!(e, ScenarioError::StructuralMismatch { .. })
    });

    sections[4] = "0,1;\n0.5,0.25,0.25;";
    assert_section_error(&scenario_text(sections), 4, |e| {
        matches!(e, ScenarioError::StructuralMismatch { .. })
    });

    sections[4] = "0,1;\n-1,2;";
    assert_section_error(&scenario_text(sections), 4, |e| {
        matches!(e, ScenarioError::OutOfRange { .. })
    });
}

/// Test that agents cannot be requested without gates
#[test]
fn test_agents_need_gates() {
    let mut sections = valid_sections();
    sections[3] = "";
    sections[4] = "";
    assert_section_error(&scenario_text(sections), 4, |e| {
        matches!(e, ScenarioError::StructuralMismatch { .. })
    });

    // No agents requested: an empty scene is fine
    sections[1] = "radius=0.5\nmaxSpeed=1.4\nnumAgents=0";
    let scenario = Scenario::parse(&scenario_text(sections)).unwrap();
    assert!(scenario.gates.is_empty());
}

#[test]
fn test_camera_with_wrong_arity_aborts() {
    let mut sections = valid_sections();
    sections[5] = "2,20,0;\n38,20;";
    assert_section_error(&scenario_text(sections), 5, |e| {
        matches!(e, ScenarioError::WrongArity { expected: 3, found: 2, .. })
    });
}

/// Test that a scenario configures the kinematic engine
#[test]
fn test_apply_to_kinematic_engine() {
    let scenario = Scenario::parse(&scenario_text(valid_sections())).unwrap();
    let mut engine = KinematicEngine::new();
    scenario.apply_to(&mut engine);

    assert_eq!(engine.time_step(), 0.25);
    assert_eq!(engine.obstacle_count(), 2);
    assert!(engine.obstacles_processed());

    let defaults = engine.defaults().unwrap();
    assert_eq!(defaults.neighbor_dist, NEIGHBOR_DIST);
    assert_eq!(defaults.max_neighbors, MAX_NEIGHBORS);
    assert_eq!(defaults.time_horizon, TIME_HORIZON);
    assert_eq!(defaults.time_horizon_obst, TIME_HORIZON_OBST);
    assert_eq!(defaults.radius, 0.5);
    assert_eq!(defaults.max_speed, 1.4);
}

/// Test that preferred velocities above max speed are scaled down
#[test]
fn test_kinematic_engine_clamps_speed() {
    let scenario = Scenario::parse(&scenario_text(valid_sections())).unwrap();
    let mut engine = KinematicEngine::new();
    scenario.apply_to(&mut engine);

    let fast = engine.add_agent(Vector2::new(0.0, 0.0));
    let slow = engine.add_agent(Vector2::new(0.0, 0.0));
    engine.set_agent_pref_velocity(fast, Vector2::new(3.0, 4.0));
    engine.set_agent_pref_velocity(slow, Vector2::new(0.4, 0.0));
    engine.do_step();

    // Max speed is 1.4, so the 5 m/s request is scaled down
    let velocity = engine.agent_velocity(fast).unwrap();
    assert!((velocity.length() - 1.4).abs() < 1e-9);
    assert!((velocity.x / velocity.y - 0.75).abs() < 1e-9);

    assert_eq!(engine.agent_velocity(slow), Some(Vector2::new(0.4, 0.0)));
    assert_eq!(engine.agent_position(slow), Some(Vector2::new(0.1, 0.0)));
    assert_eq!(engine.global_time(), 0.25);
}

/// Engine that only records which configuration calls it received
#[derive(Default)]
struct CallLog {
    calls: Vec<String>,
}

impl CrowdEngine for CallLog {
    fn set_time_step(&mut self, time_step: f64) {
        self.calls.push(format!("time_step {}", time_step));
    }

    fn time_step(&self) -> f64 {
        0.0
    }

    fn set_agent_defaults(&mut self, defaults: AgentDefaults) {
        self.calls.push(format!("defaults {}", defaults.radius));
    }

    fn add_agent(&mut self, _position: Vector2) -> AgentId {
        self.calls.push("add_agent".to_string());
        AgentId(0)
    }

    fn add_obstacle(&mut self, vertices: &[Vector2]) -> usize {
        self.calls.push(format!("obstacle {}", vertices.len()));
        0
    }

    fn process_obstacles(&mut self) {
        self.calls.push("process_obstacles".to_string());
    }

    fn num_agents(&self) -> usize {
        0
    }

    fn agent_position(&self, _id: AgentId) -> Option<Vector2> {
        None
    }

    fn agent_max_speed(&self, _id: AgentId) -> Option<f64> {
        None
    }

    fn set_agent_pref_velocity(&mut self, _id: AgentId, _velocity: Vector2) {}

    fn global_time(&self) -> f64 {
        0.0
    }

    fn do_step(&mut self) {}
}

/// Test the order of engine configuration calls
#[test]
fn test_obstacles_processed_once_after_registration() {
    let scenario = Scenario::parse(&scenario_text(valid_sections())).unwrap();
    let mut engine = CallLog::default();
    scenario.apply_to(&mut engine);

    assert_eq!(
        engine.calls,
        vec![
            "time_step 0.25".to_string(),
            "defaults 0.5".to_string(),
            "obstacle 4".to_string(),
            "obstacle 4".to_string(),
            "process_obstacles".to_string(),
        ]
    );
}

/// Test that a missing file is an I/O error
#[test]
fn test_load_scenario_missing_file() {
    assert!(matches!(
        load_scenario("does/not/exist.txt"),
        Err(ScenarioError::Io { .. })
    ));
}

/// Test that the bundled example scenario loads
#[test]
fn test_load_example_scenario() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/example.txt");
    let scenario = load_scenario(path).unwrap();

    assert_eq!(scenario.config.target_agents, 12);
    assert_eq!(scenario.obstacles.len(), 2);
    assert_eq!(scenario.gates.len(), 4);
    assert_eq!(scenario.transitions.len(), 4);
    assert_eq!(scenario.cameras.len(), 3);
}
