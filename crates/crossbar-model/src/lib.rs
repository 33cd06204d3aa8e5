//! Physical model of a crossbar spin-qubit device.
//!
//! A crossbar addresses an `m × n` lattice of qubit sites through shared
//! control lines rather than per-site electrodes:
//!
//! - **Barrier lines** — one per adjacent row pair and per adjacent column
//!   pair. A lowered barrier permits qubit transit across that boundary.
//! - **Bias (diagonal) lines** — indexed by the diagonal offset `k = j - i`,
//!   carrying a non-negative voltage. The relative magnitude of two adjacent
//!   diagonals decides the transport direction.
//!
//! The model owns the grid geometry, the line states, the qubit registry
//! with its inverse position index, and a per-cycle [`Mirror`] of symbolic
//! constraint variables that the scheduler solves against. The discrete
//! transport rule lives in [`CrossbarModel::evolve`].
//!
//! # Example
//!
//! ```rust
//! use crossbar_model::{CrossbarModel, QubitId, Site, Topology};
//!
//! // 4×4 grid, checkerboard-filled with 4 data and 4 ancilla qubits.
//! let mut model = CrossbarModel::new(Topology::square(4, 4, 4)).unwrap();
//! assert_eq!(model.dimensions(), (4, 4));
//!
//! // With every barrier raised the transport step moves nothing, no
//! // matter what the bias lines say.
//! model.evolve_all().unwrap();
//! assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 0));
//! ```

pub mod error;
pub mod lines;
pub mod mirror;
pub mod model;
pub mod qubit;
pub mod topology;

pub use error::{ModelError, ModelResult};
pub use lines::{BarrierLine, BarrierState, DiagonalLines, MAX_BIAS, Wave};
pub use mirror::{Mirror, SiteClaim};
pub use model::{CrossbarModel, ModelObserver};
pub use qubit::{Qubit, QubitId, QubitState, RotationAxis, Site};
pub use topology::{PlacementEntry, QubitKind, Topology};
