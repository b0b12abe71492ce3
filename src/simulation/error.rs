use std::num::ParseFloatError;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading and validating a scenario file
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("malformed line '{line}': {reason}")]
    MalformedFormat { line: String, reason: String },

    #[error("could not convert '{text}' to a number: {source}")]
    NumericConversion {
        text: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("wrong number of values in '{line}': expected {expected}, found {found}")]
    WrongArity {
        line: String,
        expected: usize,
        found: usize,
    },

    #[error("scenario structure mismatch: {reason}")]
    StructuralMismatch { reason: String },

    #[error("{name} out of range: {value}")]
    OutOfRange { name: String, value: f64 },

    #[error("section {index}: {source}")]
    Section {
        index: usize,
        #[source]
        source: Box<ScenarioError>,
    },

    #[error("unable to read scenario file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScenarioError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        ScenarioError::MalformedFormat {
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn in_section(self, index: usize) -> Self {
        ScenarioError::Section {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through section wrappers
    pub fn root(&self) -> &ScenarioError {
        match self {
            ScenarioError::Section { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors raised while writing a single output file
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("unable to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
