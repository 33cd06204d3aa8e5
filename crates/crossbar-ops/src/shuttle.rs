//! Single-qubit shuttling in a cardinal direction.

use serde::{Deserialize, Serialize};

use crossbar_model::{BarrierState, CrossbarModel, QubitId, Site, SiteClaim};

use crate::error::{OpError, OpResult};
use crate::op::Direction;

/// Relocate one qubit one site in a cardinal direction.
///
/// Statically the destination must be free and the flanking barriers
/// raised; dynamically the separating barrier is forced open, the
/// surrounding barriers closed, and the destination diagonal biased
/// above the origin so the transport step carries the qubit over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// The qubit to shuttle.
    pub qubit: QubitId,
    /// Shuttle direction.
    pub direction: Direction,
    /// Source line of the instruction.
    pub line: u32,
}

impl Move {
    /// Create a new shuttle.
    pub fn new(qubit: QubitId, direction: Direction, line: u32) -> Self {
        Self {
            qubit,
            direction,
            line,
        }
    }

    fn destination(&self, origin: Site) -> Site {
        let (di, dj) = self.direction.step();
        origin.shifted(di, dj)
    }

    /// The barrier separating origin and destination, as
    /// `(is_horizontal, index)`.
    fn mid_barrier(&self, origin: Site) -> (bool, i32) {
        match self.direction {
            Direction::Up => (true, origin.i),
            Direction::Down => (true, origin.i - 1),
            Direction::Left => (false, origin.j - 1),
            Direction::Right => (false, origin.j),
        }
    }

    pub(crate) fn static_check(&self, model: &CrossbarModel) -> OpResult<()> {
        let origin = model.qubit(self.qubit)?.site;
        let (m, n) = model.dimensions();
        let dest = self.destination(origin);
        if dest.i < 0 || dest.i >= m || dest.j < 0 || dest.j >= n {
            return Err(OpError::ShuttleOutOfBounds {
                qubit: self.qubit,
                direction: self.direction.name(),
            });
        }
        if !model.qubits_at(dest)?.is_empty() {
            return Err(OpError::DestinationOccupied {
                side: self.direction.name(),
                i: origin.i,
                j: origin.j,
            });
        }

        // The flanking barriers must be raised at issue time; the
        // separating barrier itself is the solver's to open.
        let Site { i, j } = origin;
        let flanks: [(bool, i32); 4] = match self.direction {
            Direction::Right => [(true, i), (true, i - 1), (false, j - 1), (false, j + 1)],
            Direction::Left => [(true, i), (true, i - 1), (false, j - 2), (false, j)],
            Direction::Up => [(false, j), (false, j - 1), (true, i - 1), (true, i + 1)],
            Direction::Down => [(false, j), (false, j - 1), (true, i - 2), (true, i)],
        };
        for (horizontal, index) in flanks {
            let down = if horizontal {
                model.is_h_barrier_down(index)
            } else {
                model.is_v_barrier_down(index)
            };
            if down {
                return Err(OpError::BarrierLowered {
                    axis: if horizontal { "horizontal" } else { "vertical" },
                    index,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn dynamic_constraints(&self, model: &mut CrossbarModel, _phase: u32) -> OpResult<()> {
        let origin = model.qubit(self.qubit)?.site;
        let dest = self.destination(origin);
        let (mid_horizontal, mid_index) = self.mid_barrier(origin);

        let mirror = model.mirror_mut();
        mirror.claim_site(origin, SiteClaim::Holds(self.qubit));
        mirror.claim_site(dest, SiteClaim::Holds(self.qubit));

        if mid_horizontal {
            mirror.require_h(mid_index, BarrierState::Lowered);
            mirror.require_h(mid_index - 1, BarrierState::Raised);
            mirror.require_h(mid_index + 1, BarrierState::Raised);
            mirror.require_v(origin.j, BarrierState::Raised);
            mirror.require_v(origin.j - 1, BarrierState::Raised);
        } else {
            mirror.require_v(mid_index, BarrierState::Lowered);
            mirror.require_v(mid_index - 1, BarrierState::Raised);
            mirror.require_v(mid_index + 1, BarrierState::Raised);
            mirror.require_h(origin.i, BarrierState::Raised);
            mirror.require_h(origin.i - 1, BarrierState::Raised);
        }

        mirror.order_bias(origin.diagonal(), dest.diagonal());
        Ok(())
    }

    pub(crate) fn apply(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        if phase == 1 {
            model.evolve(&[self.qubit])?;
        }
        Ok(())
    }
}
