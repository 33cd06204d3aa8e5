//! Error types for the model crate.

use thiserror::Error;

use crate::qubit::QubitId;

/// Errors that can occur while querying or mutating the physical model.
///
/// `Undecidable` is an expected outcome of a bad line configuration and is
/// reported before any transport happens; the bounds/consistency variants
/// indicate a caller contract violation and are not recoverable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A site coordinate lies outside the grid.
    #[error("site ({i}, {j}) is outside the {m}x{n} grid")]
    OutOfBounds {
        /// Row of the offending site.
        i: i32,
        /// Column of the offending site.
        j: i32,
        /// Grid rows.
        m: i32,
        /// Grid columns.
        n: i32,
    },

    /// A barrier index does not name an existing control line.
    #[error("no {axis} barrier with index {index}")]
    UnknownBarrier {
        /// `"horizontal"` or `"vertical"`.
        axis: &'static str,
        /// The offending line index.
        index: i32,
    },

    /// A diagonal index does not name an existing bias line.
    #[error("no bias line with diagonal index {0}")]
    UnknownDiagonal(i32),

    /// Qubit id not present in the registry.
    #[error("unknown qubit {0}")]
    UnknownQubit(QubitId),

    /// Destination site already holds a qubit.
    #[error("site ({i}, {j}) already holds a qubit")]
    SiteOccupied {
        /// Row of the occupied site.
        i: i32,
        /// Column of the occupied site.
        j: i32,
    },

    /// The barrier layout around an occupied site permits more than one
    /// transport direction, so the transport step has no defined outcome.
    #[error("Undecidable configuration in ({i}, {j})")]
    Undecidable {
        /// Row of the affected qubit.
        i: i32,
        /// Column of the affected qubit.
        j: i32,
    },

    /// The position index and a qubit's own position disagree.
    ///
    /// This can only happen through a bug in the model itself; both sides
    /// are updated exclusively by [`crate::CrossbarModel::move_qubit`].
    #[error("position index desynchronized for qubit {0}")]
    IndexDesync(QubitId),

    /// A bias voltage outside `0..=MAX_BIAS` was requested.
    #[error("bias value {value} outside 0..={max} on line {k}")]
    BiasOutOfRange {
        /// Diagonal index of the line.
        k: i32,
        /// The rejected value.
        value: i64,
        /// The maximum allowed voltage.
        max: i64,
    },

    /// Bias re-biasing was requested between two non-adjacent sites.
    #[error("bias drive requires adjacent sites, got ({0}, {1}) and ({2}, {3})", .origin.0, .origin.1, .dest.0, .dest.1)]
    NonAdjacentBiasDrive {
        /// Origin site as `(i, j)`.
        origin: (i32, i32),
        /// Destination site as `(i, j)`.
        dest: (i32, i32),
    },

    /// The requested topology cannot be realized on the grid.
    #[error("topology invalid: {0}")]
    InvalidTopology(String),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
