//! Error types for operation validation.

use thiserror::Error;

use crossbar_model::{ModelError, QubitId};

/// A geometric or static conflict raised by an operation.
///
/// The texts are what a user sees, prefixed with the issuing source line
/// by the scheduler. `Model` wraps bounds/consistency failures bubbling
/// up from the physical model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpError {
    /// Shuttle would leave the grid.
    #[error("Conflict: shuttling {qubit} {direction} out of bounds")]
    ShuttleOutOfBounds {
        /// The qubit being shuttled.
        qubit: QubitId,
        /// Direction name.
        direction: &'static str,
    },

    /// The adjacent destination site is occupied.
    #[error("Conflict: the {side} adjacent site to ({i}, {j}) is occupied")]
    DestinationOccupied {
        /// Direction name.
        side: &'static str,
        /// Origin row.
        i: i32,
        /// Origin column.
        j: i32,
    },

    /// A barrier that must stay raised is lowered.
    #[error("Conflict: the {axis} barrier {index} is lowered")]
    BarrierLowered {
        /// `"horizontal"` or `"vertical"`.
        axis: &'static str,
        /// Line index.
        index: i32,
    },

    /// Two-qubit phase operands are not on the same row.
    #[error("Conflict: two-qubit phase between qubits in different rows")]
    PhaseDifferentRows,

    /// Two-qubit phase operands are not adjacent.
    #[error("Conflict: two-qubit phase between qubits too far away")]
    PhaseTooFar,

    /// Swap operands are not in the same column.
    #[error("Conflict: swap between qubits in different columns")]
    SwapDifferentColumns,

    /// Swap operands are not adjacent.
    #[error("Conflict: swap between qubits too far away")]
    SwapTooFar,

    /// Measurement target has no ancilla on the requested side.
    #[error("Conflict: no ancilla qubit near target")]
    NoAncillaNearTarget,

    /// The qubit adjacent to the measurement target is not an ancilla.
    #[error("Conflict: qubit adjacent to target is not an ancilla qubit")]
    NotAncilla,

    /// The measurement ancilla is not in a known basis state.
    #[error("Conflict: ancilla qubit must be in |0> or |1> state")]
    AncillaNotBasis,

    /// The parking site for the measurement shuttle lies off-grid.
    #[error("Conflict: measurement has no parking site in that direction")]
    ParkOutOfBounds,

    /// The parking site for the measurement shuttle is occupied.
    #[error("Conflict: the site vertically adjacent to the measured qubit is not empty")]
    ParkSiteOccupied,

    /// A model-level failure (unknown qubit, out-of-grid access,
    /// undecidable configuration during `apply`).
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for operation protocol methods.
pub type OpResult<T> = Result<T, OpError>;
