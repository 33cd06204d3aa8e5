//! Ancilla-assisted measurement.

use serde::{Deserialize, Serialize};
use tracing::info;

use crossbar_model::{BarrierState, CrossbarModel, QubitId, Site, SiteClaim};

use crate::error::{OpError, OpResult};

/// On which side of the target the readout ancilla sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AncillaSide {
    /// Ancilla in the column to the left.
    Left,
    /// Ancilla in the column to the right.
    Right,
}

/// Which vertically adjacent site the target parks in during the
/// shuttle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParkSide {
    /// The row above.
    Up,
    /// The row below.
    Down,
}

/// Measure one qubit against an adjacent ancilla.
///
/// The protocol spans six cycles. The first three pair the target with
/// its ancilla: the separating vertical barrier opens while the target's
/// diagonal is biased above the ancilla's, so nothing shuttles. The
/// remaining cycles alternate the target into and out of an empty
/// vertically adjacent site to complete the readout, after which the
/// target collapses to a basis state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// The qubit being measured.
    pub qubit: QubitId,
    /// Where the readout ancilla sits.
    pub ancilla_side: AncillaSide,
    /// Where the target parks during the shuttle phases.
    pub park_side: ParkSide,
    /// Source line of the instruction.
    pub line: u32,
}

impl Measure {
    /// Create a new measurement.
    pub fn new(qubit: QubitId, ancilla_side: AncillaSide, park_side: ParkSide, line: u32) -> Self {
        Self {
            qubit,
            ancilla_side,
            park_side,
            line,
        }
    }

    fn ancilla_site(&self, of: Site) -> Site {
        match self.ancilla_side {
            AncillaSide::Left => of.shifted(0, -1),
            AncillaSide::Right => of.shifted(0, 1),
        }
    }

    fn park_step(&self) -> i32 {
        match self.park_side {
            ParkSide::Up => 1,
            ParkSide::Down => -1,
        }
    }

    fn in_bounds(model: &CrossbarModel, site: Site) -> bool {
        let (m, n) = model.dimensions();
        site.i >= 0 && site.i < m && site.j >= 0 && site.j < n
    }

    pub(crate) fn static_check(&self, model: &CrossbarModel) -> OpResult<()> {
        let origin = model.qubit(self.qubit)?.site;

        // An ancilla must sit on the requested side, in a known state.
        let ancilla_site = self.ancilla_site(origin);
        if !Self::in_bounds(model, ancilla_site) {
            return Err(OpError::NoAncillaNearTarget);
        }
        let ids = model.qubits_at(ancilla_site)?;
        let Some(&ancilla_id) = ids.iter().next() else {
            return Err(OpError::NoAncillaNearTarget);
        };
        let ancilla = model.qubit(ancilla_id)?;
        if !ancilla.ancilla {
            return Err(OpError::NotAncilla);
        }
        if !ancilla.state.is_basis() {
            return Err(OpError::AncillaNotBasis);
        }

        // The shuttle phases need an empty vertically adjacent site.
        let park = origin.shifted(self.park_step(), 0);
        if !Self::in_bounds(model, park) {
            return Err(OpError::ParkOutOfBounds);
        }
        if !model.qubits_at(park)?.is_empty() {
            return Err(OpError::ParkSiteOccupied);
        }
        Ok(())
    }

    pub(crate) fn dynamic_constraints(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        let cur = model.qubit(self.qubit)?.site;
        match phase {
            0..=2 => {
                // Readout pairing: open the separating barrier but keep
                // the target's diagonal above the ancilla's, so neither
                // qubit shuttles. A missing ancilla is not reported
                // here — the static check at the start cycle owns that
                // failure and its line attribution.
                let ancilla_site = self.ancilla_site(cur);
                let ancilla_id = model
                    .qubits_at(ancilla_site)
                    .ok()
                    .and_then(|ids| ids.iter().next().copied());
                let mid = cur.j.min(ancilla_site.j);

                let mirror = model.mirror_mut();
                mirror.claim_site(cur, SiteClaim::Holds(self.qubit));
                if let Some(ancilla_id) = ancilla_id {
                    mirror.claim_site(ancilla_site, SiteClaim::Holds(ancilla_id));
                }
                mirror.require_v(mid, BarrierState::Lowered);
                mirror.require_v(mid - 1, BarrierState::Raised);
                mirror.require_v(mid + 1, BarrierState::Raised);
                mirror.require_h(cur.i, BarrierState::Raised);
                mirror.require_h(cur.i - 1, BarrierState::Raised);
                mirror.order_bias(ancilla_site.diagonal(), cur.diagonal());
            }
            3 | 4 => {
                // Alternate the target across the parking boundary: out
                // on phase 3's solve, back on phase 4's.
                let step = if phase == 3 {
                    self.park_step()
                } else {
                    -self.park_step()
                };
                let partner = cur.shifted(step, 0);
                let mid = cur.i.min(partner.i);

                let mirror = model.mirror_mut();
                mirror.claim_site(cur, SiteClaim::Holds(self.qubit));
                mirror.claim_site(partner, SiteClaim::Holds(self.qubit));
                mirror.require_h(mid, BarrierState::Lowered);
                mirror.require_h(mid - 1, BarrierState::Raised);
                mirror.require_h(mid + 1, BarrierState::Raised);
                mirror.require_v(cur.j, BarrierState::Raised);
                mirror.require_v(cur.j - 1, BarrierState::Raised);
                mirror.order_bias(cur.diagonal(), partner.diagonal());
            }
            5 => {
                // Settle: barrier closed again, bias holding the target
                // where it is.
                let park = cur.shifted(self.park_step(), 0);
                let mid = cur.i.min(park.i);

                let mirror = model.mirror_mut();
                mirror.claim_site(cur, SiteClaim::Holds(self.qubit));
                mirror.claim_site(park, SiteClaim::Holds(self.qubit));
                mirror.require_h(mid, BarrierState::Raised);
                mirror.require_v(cur.j, BarrierState::Raised);
                mirror.require_v(cur.j - 1, BarrierState::Raised);
                mirror.order_bias(park.diagonal(), cur.diagonal());
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn apply(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        if phase >= 1 {
            model.evolve(&[self.qubit])?;
        }
        if phase == 6 {
            let outcome = model.collapse_qubit(self.qubit)?;
            info!(qubit = %self.qubit, outcome, "measurement finished");
        }
        Ok(())
    }
}
