//! Scenario text parsing
//!
//! The scenario file is split into sections by marker lines, and each data
//! line is decoded by one of four small line grammars. None of these functions
//! know anything about simulation state.

use log::warn;

use super::error::{ScenarioError, ScenarioResult};
use super::scenario::CameraPose;
use super::types::Vector2;

/// Any line containing this character starts a new section
const SECTION_MARKER: char = '#';

/// Split raw scenario text into sections of non-blank data lines
///
/// Every marker line opens a new section. Lines before the first marker do
/// not belong to any section and are dropped.
pub fn split_sections(text: &str) -> Vec<Vec<String>> {
    let mut sections = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for (number, line) in text.lines().enumerate() {
        if line.contains(SECTION_MARKER) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(Vec::new());
        } else if line.trim().is_empty() {
            continue;
        } else {
            match current.as_mut() {
                Some(section) => section.push(line.to_string()),
                None => warn!(
                    "Ignoring line {} before the first section marker: '{}'",
                    number + 1,
                    line
                ),
            }
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }

    sections
}

/// Convert a substring to a finite float
fn parse_number(text: &str) -> ScenarioResult<f64> {
    let value = text
        .trim()
        .parse::<f64>()
        .map_err(|source| ScenarioError::NumericConversion {
            text: text.to_string(),
            source,
        })?;

    if !value.is_finite() {
        return Err(ScenarioError::OutOfRange {
            name: format!("'{}'", text),
            value,
        });
    }

    Ok(value)
}

/// Parse a `<name>=<value>` line and return the value
pub fn parse_key_value_float(line: &str) -> ScenarioResult<f64> {
    match line.matches('=').count() {
        0 => return Err(ScenarioError::malformed(line, "expected <name>=<value>")),
        1 => {}
        _ => return Err(ScenarioError::malformed(line, "more than one '='")),
    }

    let (_, value) = line
        .split_once('=')
        .ok_or_else(|| ScenarioError::malformed(line, "expected <name>=<value>"))?;

    parse_number(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexState {
    /// Between coordinates, waiting for '('
    Outside,
    ReadingX,
    ReadingY,
    /// Just read ')', waiting for ';'
    Complete,
}

impl VertexState {
    fn describe(self) -> &'static str {
        match self {
            VertexState::Outside => "outside a coordinate",
            VertexState::ReadingX => "reading x",
            VertexState::ReadingY => "reading y",
            VertexState::Complete => "after a complete coordinate",
        }
    }
}

fn is_vertex_delimiter(c: char) -> bool {
    matches!(c, '(' | ',' | ')' | ';')
}

/// Parse a `(x0,y0);(x1,y1);...` line into vertices
///
/// Winding order is not checked.
pub fn parse_vertex_list(line: &str) -> ScenarioResult<Vec<Vector2>> {
    let mut vertices = Vec::new();
    let mut state = VertexState::Outside;
    let mut x_text = String::new();
    let mut y_text = String::new();
    let mut x = 0.0;

    for c in line.chars() {
        state = match (state, c) {
            (VertexState::Outside, '(') => {
                x_text.clear();
                VertexState::ReadingX
            }
            (VertexState::Outside | VertexState::Complete, c) if c.is_whitespace() => state,
            (VertexState::ReadingX, ',') => {
                x = parse_number(&x_text)?;
                y_text.clear();
                VertexState::ReadingY
            }
            (VertexState::ReadingX, c) if !is_vertex_delimiter(c) => {
                x_text.push(c);
                state
            }
            (VertexState::ReadingY, ')') => {
                let y = parse_number(&y_text)?;
                vertices.push(Vector2::new(x, y));
                VertexState::Complete
            }
            (VertexState::ReadingY, c) if !is_vertex_delimiter(c) => {
                y_text.push(c);
                state
            }
            (VertexState::Complete, ';') => VertexState::Outside,
            (state, c) => {
                return Err(ScenarioError::malformed(
                    line,
                    format!("unexpected '{}' {}", c, state.describe()),
                ))
            }
        };
    }

    match state {
        VertexState::ReadingX | VertexState::ReadingY => {
            Err(ScenarioError::malformed(line, "incomplete coordinate"))
        }
        VertexState::Outside | VertexState::Complete => Ok(vertices),
    }
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-'
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_list_delimiter(c: char) -> bool {
    c == ',' || c == ';'
}

/// Parse a line of numbers separated by ',' or ';'
///
/// Characters between numbers are skipped; a number must run up to a
/// delimiter or the end of the line.
pub fn parse_float_list(line: &str) -> ScenarioResult<Vec<f64>> {
    let mut values = Vec::new();
    let mut number = String::new();
    let mut in_number = false;

    for c in line.chars() {
        if !in_number {
            if is_number_start(c) {
                number.clear();
                number.push(c);
                in_number = true;
            }
        } else if is_number_char(c) {
            number.push(c);
        } else if is_list_delimiter(c) {
            values.push(parse_number(&number)?);
            in_number = false;
        } else {
            return Err(ScenarioError::malformed(
                line,
                format!("unexpected '{}' after '{}'", c, number),
            ));
        }
    }

    if in_number {
        values.push(parse_number(&number)?);
    }

    Ok(values)
}

/// Parse an `x,y,theta` camera line
pub fn parse_camera_pose(line: &str) -> ScenarioResult<CameraPose> {
    let values = parse_float_list(line)?;
    match values.as_slice() {
        &[x, y, heading_degrees] => Ok(CameraPose {
            x,
            y,
            heading_degrees,
        }),
        _ => Err(ScenarioError::WrongArity {
            line: line.to_string(),
            expected: 3,
            found: values.len(),
        }),
    }
}
