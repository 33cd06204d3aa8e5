//! Program executor for the crossbar.
//!
//! The [`Executor`] drives the scheduler across a whole program,
//! strictly one cycle at a time, emitting a progress event after every
//! committed cycle and a terminal success or failure event at the end.
//! Failure events carry the human-readable reason and, where one exists,
//! the offending source line.
//!
//! Execution is single-threaded and cooperative: a host that must not
//! block can move the whole run (model included) onto a worker and feed
//! the events back; [`CancelFlag`] stops a run at the next cycle
//! boundary, the only safe cancellation point.
//!
//! ```rust
//! use crossbar_exec::{ExecConfig, ExecEvent, Executor, RunOutcome};
//! use crossbar_model::{CrossbarModel, QubitId, Topology};
//! use crossbar_ops::{Direction, Move, Operation, Program, Slot};
//!
//! let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
//! let program = Program::from_slots(vec![Slot::single(Operation::Move(
//!     Move::new(QubitId(0), Direction::Right, 1),
//! ))]);
//!
//! let executor = Executor::new(ExecConfig::default());
//! let outcome = executor
//!     .run(&mut model, &program, &mut |_event: ExecEvent| {})
//!     .unwrap();
//! assert!(matches!(outcome, RunOutcome::Completed { cycles: 2 }));
//! ```

pub mod error;
pub mod executor;

pub use error::{ExecError, ExecResult};
pub use executor::{CancelFlag, ExecConfig, ExecEvent, Executor, RunOutcome};
