//! Global-pulse single-qubit rotation.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crossbar_model::{BarrierState, CrossbarModel, QubitId, RotationAxis, Wave};

use crate::error::{OpError, OpResult};

/// Rotate one qubit by a global pulse.
///
/// The crossbar has no per-site microwave line: a rotation is played on
/// every column of one parity at once. It therefore demands a quiet
/// device — no open barrier anywhere and all bias lines at zero — and
/// encodes which pulse is active in the wave constraint pair. Two
/// rotations issued in the same cycle are compatible only if they agree
/// on the pulse and the column parity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// The target qubit.
    pub qubit: QubitId,
    /// Rotation axis.
    pub axis: RotationAxis,
    /// Rotation angle in radians.
    pub angle: f64,
    /// Source line of the instruction.
    pub line: u32,
}

impl Rotation {
    /// Create a new rotation.
    pub fn new(qubit: QubitId, axis: RotationAxis, angle: f64, line: u32) -> Self {
        Self {
            qubit,
            axis,
            angle,
            line,
        }
    }

    /// Stable device-level pulse code for the wave constraint.
    pub fn pulse_code(&self) -> u32 {
        let axis = match self.axis {
            RotationAxis::X => 1u32,
            RotationAxis::Y => 2,
            RotationAxis::Z => 3,
        };
        // Milliradian resolution is plenty to separate distinct pulses.
        let angle = (self.angle.rem_euclid(TAU) * 1000.0).round() as u32;
        axis * 10_000 + angle
    }

    pub(crate) fn static_check(&self, model: &CrossbarModel) -> OpResult<()> {
        model.qubit(self.qubit)?;
        let (m, n) = model.dimensions();
        // A global pulse needs the whole device quiet: any open barrier
        // would let the pulse shuttle something.
        for i in 0..m - 1 {
            if model.is_h_barrier_down(i) {
                return Err(OpError::BarrierLowered {
                    axis: "horizontal",
                    index: i,
                });
            }
        }
        for j in 0..n - 1 {
            if model.is_v_barrier_down(j) {
                return Err(OpError::BarrierLowered {
                    axis: "vertical",
                    index: j,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn dynamic_constraints(&self, model: &mut CrossbarModel, _phase: u32) -> OpResult<()> {
        let site = model.qubit(self.qubit)?.site;
        let (m, n) = model.dimensions();
        let (d_low, d_high) = model.bias_lines().range();
        let even_columns = site.j % 2 == 0;
        let code = self.pulse_code();

        let mirror = model.mirror_mut();
        for i in 0..m - 1 {
            mirror.require_h(i, BarrierState::Raised);
        }
        for j in 0..n - 1 {
            mirror.require_v(j, BarrierState::Raised);
        }
        for k in d_low..=d_high {
            mirror.fix_bias(k, 0);
        }
        mirror.require_wave(Wave { code, even_columns });
        Ok(())
    }

    pub(crate) fn apply(&self, model: &mut CrossbarModel, phase: u32) -> OpResult<()> {
        if phase == 1 {
            model.rotate_qubit(self.qubit, self.axis, self.angle)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbar_model::Topology;
    use std::f64::consts::PI;

    #[test]
    fn test_pulse_code_distinguishes_pulses() {
        let rx = Rotation::new(QubitId(0), RotationAxis::X, PI, 1);
        let ry = Rotation::new(QubitId(0), RotationAxis::Y, PI, 1);
        let rx_half = Rotation::new(QubitId(0), RotationAxis::X, PI / 2.0, 1);
        assert_ne!(rx.pulse_code(), ry.pulse_code());
        assert_ne!(rx.pulse_code(), rx_half.pulse_code());
        // Same pulse, different qubit: identical code.
        let rx_other = Rotation::new(QubitId(3), RotationAxis::X, PI, 9);
        assert_eq!(rx.pulse_code(), rx_other.pulse_code());
    }

    #[test]
    fn test_static_rejects_open_barrier() {
        let mut model = CrossbarModel::new(Topology::square(4, 4, 4)).unwrap();
        model.toggle_h_line(2).unwrap();
        let op = Rotation::new(QubitId(0), RotationAxis::X, PI, 1);
        assert!(matches!(
            op.static_check(&model),
            Err(OpError::BarrierLowered {
                axis: "horizontal",
                index: 2
            })
        ));
    }

    #[test]
    fn test_dynamic_quiets_device() {
        let mut model = CrossbarModel::new(Topology::square(4, 4, 4)).unwrap();
        model.rebuild_mirror();
        let op = Rotation::new(QubitId(0), RotationAxis::Z, PI / 2.0, 1);
        op.dynamic_constraints(&mut model, 0).unwrap();

        let mirror = model.mirror();
        for i in 0..3 {
            assert!(mirror.h_req(i).raised);
            assert!(mirror.v_req(i).raised);
        }
        // All eight diagonals forced to zero, plus the wave pair.
        assert_eq!(mirror.bias_fixed().len(), 8);
        assert_eq!(mirror.waves().len(), 1);
        assert!(mirror.waves()[0].even_columns); // q0 sits in column 0
    }

    #[test]
    fn test_apply_rotates_at_final_phase() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        let before = model.qubit(QubitId(0)).unwrap().state;
        let op = Rotation::new(QubitId(0), RotationAxis::X, PI, 1);
        op.apply(&mut model, 0).unwrap();
        assert_eq!(model.qubit(QubitId(0)).unwrap().state, before);
        op.apply(&mut model, 1).unwrap();
        assert_ne!(model.qubit(QubitId(0)).unwrap().state, before);
    }
}
