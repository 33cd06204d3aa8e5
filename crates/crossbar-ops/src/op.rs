//! The closed operation family and its three-phase dispatch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crossbar_model::{CrossbarModel, QubitId};

use crate::error::OpResult;
use crate::measure::Measure;
use crate::rotation::Rotation;
use crate::shuttle::Move;
use crate::two_qubit::{Phase, Swap};

/// A cardinal shuttle direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Toward higher rows.
    Up,
    /// Toward lower rows.
    Down,
    /// Toward lower columns.
    Left,
    /// Toward higher columns.
    Right,
}

impl Direction {
    /// The `(di, dj)` step for this direction.
    pub fn step(self) -> (i32, i32) {
        match self {
            Direction::Up => (1, 0),
            Direction::Down => (-1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Lower-case name used in conflict messages.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Advance the schedule without occupying any physical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wait {
    /// Number of cycles to advance.
    pub cycles: u32,
    /// Source line of the instruction.
    pub line: u32,
}

impl Wait {
    /// Create a wait of `cycles` cycles.
    pub fn new(cycles: u32, line: u32) -> Self {
        Self { cycles, line }
    }
}

/// One abstract qubit operation.
///
/// The enum is deliberately closed: every protocol method below matches
/// exhaustively, so a new variant is forced to implement validation,
/// constraints, and effect at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Shuttle one qubit one site in a cardinal direction.
    Move(Move),
    /// Global-pulse single-qubit rotation.
    Rotation(Rotation),
    /// Two-qubit phase between row-adjacent qubits.
    Phase(Phase),
    /// Two-qubit swap between column-adjacent qubits.
    Swap(Swap),
    /// Ancilla-assisted measurement.
    Measure(Measure),
    /// Schedule-only delay.
    Wait(Wait),
}

impl Operation {
    /// Read-only validation against the current concrete model state.
    pub fn static_check(&self, model: &CrossbarModel) -> OpResult<()> {
        match self {
            Operation::Move(op) => op.static_check(model),
            Operation::Rotation(op) => op.static_check(model),
            Operation::Phase(op) => op.static_check(model),
            Operation::Swap(op) => op.static_check(model),
            Operation::Measure(op) => op.static_check(model),
            Operation::Wait(_) => Ok(()),
        }
    }

    /// Record this operation's requirements on the solved line assignment
    /// for the given sub-cycle phase.
    pub fn dynamic_constraints(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        match self {
            Operation::Move(op) => op.dynamic_constraints(model, phase),
            Operation::Rotation(op) => op.dynamic_constraints(model, phase),
            Operation::Phase(op) => op.dynamic_constraints(model, phase),
            Operation::Swap(op) => op.dynamic_constraints(model, phase),
            Operation::Measure(op) => op.dynamic_constraints(model, phase),
            Operation::Wait(_) => Ok(()),
        }
    }

    /// Apply the physical effect for the given sub-cycle phase.
    ///
    /// Phase 0 is a no-op for every variant: an operation has no effect
    /// before its first constraint solve has been applied.
    pub fn apply(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        match self {
            Operation::Move(op) => op.apply(model, phase),
            Operation::Rotation(op) => op.apply(model, phase),
            Operation::Phase(op) => op.apply(model, phase),
            Operation::Swap(op) => op.apply(model, phase),
            Operation::Measure(op) => op.apply(model, phase),
            Operation::Wait(_) => Ok(()),
        }
    }

    /// The qubits this operation owns for transport scoping and the
    /// scheduler's adjacency-safety pass.
    pub fn involved_qubits(&self) -> Vec<QubitId> {
        match self {
            Operation::Move(op) => vec![op.qubit],
            Operation::Rotation(op) => vec![op.qubit],
            Operation::Phase(op) => vec![op.a, op.b],
            Operation::Swap(op) => vec![op.a, op.b],
            Operation::Measure(op) => vec![op.qubit],
            Operation::Wait(_) => vec![],
        }
    }

    /// Fixed duration in cycles. Wait's duration is consumed as a time
    /// offset by the scheduler and produces no interval.
    pub fn cycle_duration(&self) -> u32 {
        match self {
            Operation::Move(_) => 1,
            Operation::Rotation(_) => 1,
            Operation::Phase(_) => 2,
            Operation::Swap(_) => 2,
            Operation::Measure(_) => 6,
            Operation::Wait(op) => op.cycles,
        }
    }

    /// Source line of the issuing instruction.
    pub fn line(&self) -> u32 {
        match self {
            Operation::Move(op) => op.line,
            Operation::Rotation(op) => op.line,
            Operation::Phase(op) => op.line,
            Operation::Swap(op) => op.line,
            Operation::Measure(op) => op.line,
            Operation::Wait(op) => op.line,
        }
    }

    /// Short instruction name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Move(_) => "move",
            Operation::Rotation(_) => "rotation",
            Operation::Phase(_) => "phase",
            Operation::Swap(_) => "swap",
            Operation::Measure(_) => "measure",
            Operation::Wait(_) => "wait",
        }
    }

    /// Whether this is a wait.
    pub fn is_wait(&self) -> bool {
        matches!(self, Operation::Wait(_))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Move(op) => write!(f, "move {} {}", op.qubit, op.direction),
            Operation::Rotation(op) => {
                write!(f, "r{}({}) {}", op.axis, op.angle, op.qubit)
            }
            Operation::Phase(op) => write!(f, "phase {}, {}", op.a, op.b),
            Operation::Swap(op) => write!(f, "swap {}, {}", op.a, op.b),
            Operation::Measure(op) => write!(f, "measure {}", op.qubit),
            Operation::Wait(op) => write!(f, "wait {}", op.cycles),
        }
    }
}
