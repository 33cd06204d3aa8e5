//! Qubit operations for the crossbar and their constraint contracts.
//!
//! Every operation follows the same three-phase protocol against the
//! physical model:
//!
//! 1. [`Operation::static_check`] — read-only validation against the
//!    *current* concrete line/occupancy state, run when the operation's
//!    interval starts. Never mutates the model.
//! 2. [`Operation::dynamic_constraints`] — records, per sub-cycle phase,
//!    what the *solved* line assignment must satisfy in the model's
//!    constraint mirror. Operations never see each other's requirements;
//!    contradictions surface in the scheduler's solve.
//! 3. [`Operation::apply`] — the physical effect, at the phase(s) where it
//!    occurs: a transport step restricted to the operation's own qubits,
//!    or a direct amplitude-bookkeeping update.
//!
//! [`Operation`] is a closed enum; each protocol method is an exhaustive
//! match, so a new variant cannot be added without implementing all three
//! phases.

pub mod error;
pub mod measure;
pub mod op;
pub mod program;
pub mod rotation;
pub mod shuttle;
pub mod two_qubit;

pub use error::{OpError, OpResult};
pub use measure::{AncillaSide, Measure, ParkSide};
pub use op::{Direction, Operation, Wait};
pub use program::{Program, Slot};
pub use rotation::Rotation;
pub use shuttle::Move;
pub use two_qubit::{Phase, Swap};
