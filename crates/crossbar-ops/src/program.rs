//! Program input: an ordered sequence of time-slots.

use serde::{Deserialize, Serialize};

use crate::op::Operation;

/// Operations issued concurrently in one time-slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Slot {
    /// The concurrently issued operations.
    pub ops: Vec<Operation>,
}

impl Slot {
    /// A slot with a single operation.
    pub fn single(op: Operation) -> Self {
        Self { ops: vec![op] }
    }

    /// A slot with several concurrent operations.
    pub fn parallel(ops: Vec<Operation>) -> Self {
        Self { ops }
    }
}

/// A compiled program: time-slots in issue order.
///
/// Produced by an external compiler front end; the core never parses
/// text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// The time-slots in order.
    pub slots: Vec<Slot>,
}

impl Program {
    /// An empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from slots.
    pub fn from_slots(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Append a slot.
    pub fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// Total number of operations across all slots.
    pub fn num_operations(&self) -> usize {
        self.slots.iter().map(|s| s.ops.len()).sum()
    }
}
