//! Error types for the scheduler crate.

use thiserror::Error;

use crossbar_model::ModelError;
use crossbar_ops::OpError;

/// Errors that abort a scheduling run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedError {
    /// An operation's static preconditions failed at its start cycle.
    #[error("{source} at line {line}")]
    Static {
        /// The underlying conflict.
        #[source]
        source: OpError,
        /// Source line of the offending operation.
        line: u32,
    },

    /// An operation's physical effect failed mid-run.
    #[error("{source} at line {line}")]
    Apply {
        /// The underlying failure.
        #[source]
        source: OpError,
        /// Source line of the offending operation.
        line: u32,
    },

    /// The joint constraint solve for one cycle has no solution.
    #[error("Conflict between parallel operations at cycle {cycle}{}", format_lines(.lines))]
    ParallelConflict {
        /// The cycle whose solve failed.
        cycle: u32,
        /// Source lines of the operations active in that cycle.
        lines: Vec<u32>,
    },

    /// The chosen assignment would make two uninvolved qubits adjacent
    /// across an opened horizontal barrier.
    #[error("Two qubits vertically adjacent in line {0}")]
    VerticallyAdjacent(i32),

    /// The chosen assignment would make two uninvolved qubits adjacent
    /// across an opened vertical barrier.
    #[error("Two qubits horizontally adjacent in line {0}")]
    HorizontallyAdjacent(i32),

    /// A model-level failure while applying an assignment.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SchedError {
    /// The source line to attribute the failure to, where one exists.
    pub fn line(&self) -> Option<u32> {
        match self {
            SchedError::Static { line, .. } | SchedError::Apply { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Helper to format the offending source lines of a parallel conflict.
fn format_lines(lines: &[u32]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        let joined = lines
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!(" (lines {joined})")
    }
}

/// Result type for scheduling operations.
pub type SchedResult<T> = Result<T, SchedError>;
