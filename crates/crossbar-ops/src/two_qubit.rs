//! Two-qubit interactions between adjacent qubits.

use serde::{Deserialize, Serialize};

use crossbar_model::{BarrierState, CrossbarModel, QubitId, Site, SiteClaim};

use crate::error::{OpError, OpResult};

/// Two-qubit phase between row-adjacent qubits.
///
/// Both qubits stay where they are: the vertical barrier separating them
/// opens while their bias lines are held equal, so neither feels a pull.
/// The surrounding barriers stay closed for the whole interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// First operand (control for the coarse bookkeeping).
    pub a: QubitId,
    /// Second operand.
    pub b: QubitId,
    /// Source line of the instruction.
    pub line: u32,
}

impl Phase {
    /// Create a new two-qubit phase.
    pub fn new(a: QubitId, b: QubitId, line: u32) -> Self {
        Self { a, b, line }
    }

    fn sites(&self, model: &CrossbarModel) -> OpResult<(Site, Site)> {
        Ok((model.qubit(self.a)?.site, model.qubit(self.b)?.site))
    }

    pub(crate) fn static_check(&self, model: &CrossbarModel) -> OpResult<()> {
        let (pos_a, pos_b) = self.sites(model)?;
        if pos_a.i != pos_b.i {
            return Err(OpError::PhaseDifferentRows);
        }
        if (pos_a.j - pos_b.j).abs() != 1 {
            return Err(OpError::PhaseTooFar);
        }
        let i = pos_a.i;
        let left_j = pos_a.j.min(pos_b.j);
        let right_j = pos_a.j.max(pos_b.j);
        for (horizontal, index) in [
            (true, i),
            (true, i - 1),
            (false, left_j - 1),
            (false, right_j),
        ] {
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
        let (pos_a, pos_b) = self.sites(model)?;
        let i = pos_a.i;
        let left_j = pos_a.j.min(pos_b.j);
        let right_j = pos_a.j.max(pos_b.j);

        let mirror = model.mirror_mut();
        mirror.claim_site(pos_a, SiteClaim::Holds(self.a));
        mirror.claim_site(pos_b, SiteClaim::Holds(self.b));

        mirror.require_v(left_j, BarrierState::Lowered);
        mirror.require_v(left_j - 1, BarrierState::Raised);
        mirror.require_v(right_j, BarrierState::Raised);
        mirror.require_h(i, BarrierState::Raised);
        mirror.require_h(i - 1, BarrierState::Raised);

        mirror.equal_bias(pos_a.diagonal(), pos_b.diagonal());
        Ok(())
    }

    pub(crate) fn apply(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        if phase == 2 {
            // Equal biases: the transport step is a no-op, but it still
            // enforces the global safety invariant.
            model.evolve(&[self.a, self.b])?;
            model.apply_controlled_phase(self.a, self.b)?;
        }
        Ok(())
    }
}

/// Two-qubit swap between column-adjacent qubits.
///
/// Same shape as [`Phase`], rotated a quarter turn: the horizontal
/// barrier between the pair opens, biases held equal, everything else
/// closed. The coarse bookkeeping exchanges the two amplitude pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    /// First operand.
    pub a: QubitId,
    /// Second operand.
    pub b: QubitId,
    /// Source line of the instruction.
    pub line: u32,
}

impl Swap {
    /// Create a new swap.
    pub fn new(a: QubitId, b: QubitId, line: u32) -> Self {
        Self { a, b, line }
    }

    fn sites(&self, model: &CrossbarModel) -> OpResult<(Site, Site)> {
        Ok((model.qubit(self.a)?.site, model.qubit(self.b)?.site))
    }

    pub(crate) fn static_check(&self, model: &CrossbarModel) -> OpResult<()> {
        let (pos_a, pos_b) = self.sites(model)?;
        if pos_a.j != pos_b.j {
            return Err(OpError::SwapDifferentColumns);
        }
        if (pos_a.i - pos_b.i).abs() != 1 {
            return Err(OpError::SwapTooFar);
        }
        let j = pos_a.j;
        let bottom_i = pos_a.i.min(pos_b.i);
        let top_i = pos_a.i.max(pos_b.i);
        for (horizontal, index) in [
            (false, j),
            (false, j - 1),
            (true, bottom_i - 1),
            (true, top_i),
        ] {
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
        let (pos_a, pos_b) = self.sites(model)?;
        let j = pos_a.j;
        let bottom_i = pos_a.i.min(pos_b.i);
        let top_i = pos_a.i.max(pos_b.i);

        let mirror = model.mirror_mut();
        mirror.claim_site(pos_a, SiteClaim::Holds(self.a));
        mirror.claim_site(pos_b, SiteClaim::Holds(self.b));

        mirror.require_h(bottom_i, BarrierState::Lowered);
        mirror.require_h(bottom_i - 1, BarrierState::Raised);
        mirror.require_h(top_i, BarrierState::Raised);
        mirror.require_v(j, BarrierState::Raised);
        mirror.require_v(j - 1, BarrierState::Raised);

        mirror.equal_bias(pos_a.diagonal(), pos_b.diagonal());
        Ok(())
    }

    pub(crate) fn apply(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        if phase == 2 {
            model.evolve(&[self.a, self.b])?;
            model.swap_states(self.a, self.b)?;
        }
        Ok(())
    }
}
