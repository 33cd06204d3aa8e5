//! The crossbar model: grid, control lines, qubit registry, and the
//! discrete transport rule.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::lines::{BarrierLine, DiagonalLines, MAX_BIAS, Wave};
use crate::mirror::Mirror;
use crate::qubit::{Qubit, QubitId, QubitState, RotationAxis, Site};
use crate::topology::{QubitKind, Topology};

/// Observer of model mutations.
///
/// Callbacks are synchronous and run on the thread that mutated the
/// model. Observers must not mutate the model from inside a callback;
/// take a snapshot and act after the notification returns.
pub trait ModelObserver {
    /// Some line, bias, wave, or qubit position changed.
    fn state_changed(&self);

    /// The grid was re-derived with new dimensions or population.
    fn dimensions_changed(&self) {
        self.state_changed();
    }
}

/// Physical model of one crossbar device.
///
/// All mutation goes through the methods here; in particular the qubit
/// position field and the inverse `site → ids` index are only ever
/// updated together inside [`CrossbarModel::move_qubit`].
pub struct CrossbarModel {
    topology: Topology,
    m: i32,
    n: i32,
    h_lines: Vec<BarrierLine>,
    v_lines: Vec<BarrierLine>,
    d_lines: DiagonalLines,
    wave: Option<Wave>,
    qubits: BTreeMap<QubitId, Qubit>,
    positions: FxHashMap<Site, BTreeSet<QubitId>>,
    mirror: Mirror,
    observers: Vec<Box<dyn ModelObserver>>,
}

impl Clone for CrossbarModel {
    /// Deep copy of the physical state for speculative checking.
    ///
    /// Observers are not carried over and the mirror starts fresh; the
    /// copy is meant to be mutated freely without anyone watching.
    fn clone(&self) -> Self {
        Self {
            topology: self.topology.clone(),
            m: self.m,
            n: self.n,
            h_lines: self.h_lines.clone(),
            v_lines: self.v_lines.clone(),
            d_lines: self.d_lines.clone(),
            wave: self.wave,
            qubits: self.qubits.clone(),
            positions: self.positions.clone(),
            mirror: Mirror::new(),
            observers: Vec::new(),
        }
    }
}

impl fmt::Debug for CrossbarModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossbarModel")
            .field("m", &self.m)
            .field("n", &self.n)
            .field("qubits", &self.qubits.len())
            .field("wave", &self.wave)
            .finish_non_exhaustive()
    }
}

impl CrossbarModel {
    /// Build a model from a topology.
    pub fn new(topology: Topology) -> ModelResult<Self> {
        let mut model = Self {
            topology: topology.clone(),
            m: 0,
            n: 0,
            h_lines: Vec::new(),
            v_lines: Vec::new(),
            d_lines: DiagonalLines::new(2, 2),
            wave: None,
            qubits: BTreeMap::new(),
            positions: FxHashMap::default(),
            mirror: Mirror::new(),
            observers: Vec::new(),
        };
        model.rebuild(topology)?;
        Ok(model)
    }

    /// Re-derive the layout for a new topology.
    pub fn resize(&mut self, topology: Topology) -> ModelResult<()> {
        self.rebuild(topology)?;
        self.notify_resize_all();
        Ok(())
    }

    /// Reset to the construction-time layout (same topology).
    pub fn reset(&mut self) -> ModelResult<()> {
        self.resize(self.topology.clone())
    }

    fn rebuild(&mut self, topology: Topology) -> ModelResult<()> {
        topology.validate()?;
        self.m = topology.rows;
        self.n = topology.cols;
        self.h_lines = vec![BarrierLine::raised(); (self.m - 1) as usize];
        self.v_lines = vec![BarrierLine::raised(); (self.n - 1) as usize];
        self.d_lines = DiagonalLines::new(self.m, self.n);
        self.wave = None;
        self.qubits = BTreeMap::new();
        self.positions = FxHashMap::default();
        for i in 0..self.m {
            for j in 0..self.n {
                self.positions.insert(Site::new(i, j), BTreeSet::new());
            }
        }
        self.mirror = Mirror::new();

        if let Some(placement) = topology.placement.clone() {
            for entry in &placement {
                self.place_qubit(
                    entry.id,
                    entry.site,
                    entry.kind == QubitKind::Ancilla,
                )?;
            }
        } else if topology.fits_idle_fill() {
            self.idle_fill(&topology)?;
        } else {
            self.inline_fill(&topology)?;
        }
        self.topology = topology;
        Ok(())
    }

    /// Checkerboard fill: data qubits on the parity sites of even rows,
    /// ancillas preferentially on odd rows.
    fn idle_fill(&mut self, topology: &Topology) -> ModelResult<()> {
        let mut data_left = topology.data_qubits;
        let mut ancilla_left = topology.ancilla_qubits;
        let mut next_id = 0u32;
        for i in 0..self.m {
            for j in 0..self.n {
                if data_left == 0 && ancilla_left == 0 {
                    return Ok(());
                }
                let site = Site::new(i, j);
                if !site.qubit_parity() {
                    continue;
                }
                let ancilla =
                    (i % 2 != 0 && ancilla_left > 0) || (ancilla_left > 0 && data_left == 0);
                self.place_qubit(QubitId(next_id), site, ancilla)?;
                if ancilla {
                    ancilla_left -= 1;
                } else {
                    data_left -= 1;
                }
                next_id += 1;
            }
        }
        Ok(())
    }

    /// Dense row-major fill for populations that do not fit the
    /// checkerboard.
    fn inline_fill(&mut self, topology: &Topology) -> ModelResult<()> {
        let mut data_left = topology.data_qubits;
        let mut ancilla_left = topology.ancilla_qubits;
        let mut next_id = 0u32;
        for i in 0..self.m {
            for j in 0..self.n {
                if data_left == 0 && ancilla_left == 0 {
                    return Ok(());
                }
                let ancilla = data_left == 0;
                self.place_qubit(QubitId(next_id), Site::new(i, j), ancilla)?;
                if ancilla {
                    ancilla_left -= 1;
                } else {
                    data_left -= 1;
                }
                next_id += 1;
            }
        }
        Ok(())
    }

    fn place_qubit(&mut self, id: QubitId, site: Site, ancilla: bool) -> ModelResult<()> {
        self.check_bounds(site)?;
        let ids = self
            .positions
            .get_mut(&site)
            .ok_or(ModelError::IndexDesync(id))?;
        if !ids.is_empty() {
            return Err(ModelError::SiteOccupied {
                i: site.i,
                j: site.j,
            });
        }
        ids.insert(id);
        // Idle convention: even columns rest in |1⟩, odd columns in |0⟩.
        let state = if site.j % 2 == 0 {
            QubitState::one()
        } else {
            QubitState::zero()
        };
        self.qubits.insert(id, Qubit::new(id, state, site, ancilla));
        Ok(())
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Grid dimensions `(rows, cols)`.
    pub fn dimensions(&self) -> (i32, i32) {
        (self.m, self.n)
    }

    /// Control line counts `(horizontal, vertical, diagonal)`.
    pub fn control_line_dimensions(&self) -> (usize, usize, usize) {
        (self.h_lines.len(), self.v_lines.len(), self.d_lines.len())
    }

    /// The topology the model was last built from.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    fn check_bounds(&self, site: Site) -> ModelResult<()> {
        if site.i < 0 || site.i >= self.m || site.j < 0 || site.j >= self.n {
            return Err(ModelError::OutOfBounds {
                i: site.i,
                j: site.j,
                m: self.m,
                n: self.n,
            });
        }
        Ok(())
    }

    /// Whether horizontal barrier `i` is raised. Out-of-range indices
    /// read as raised: the grid edge is a permanent barrier.
    pub fn is_h_barrier_up(&self, i: i32) -> bool {
        !self.is_h_barrier_down(i)
    }

    /// Whether horizontal barrier `i` is lowered (open).
    pub fn is_h_barrier_down(&self, i: i32) -> bool {
        if i < 0 {
            return false;
        }
        self.h_lines
            .get(i as usize)
            .is_some_and(BarrierLine::is_down)
    }

    /// Whether vertical barrier `j` is raised.
    pub fn is_v_barrier_up(&self, j: i32) -> bool {
        !self.is_v_barrier_down(j)
    }

    /// Whether vertical barrier `j` is lowered (open).
    pub fn is_v_barrier_down(&self, j: i32) -> bool {
        if j < 0 {
            return false;
        }
        self.v_lines
            .get(j as usize)
            .is_some_and(BarrierLine::is_down)
    }

    /// The voltage on diagonal bias line `k`, if that line exists.
    pub fn bias(&self, k: i32) -> Option<i64> {
        self.d_lines.value(k)
    }

    /// The diagonal bias lines.
    pub fn bias_lines(&self) -> &DiagonalLines {
        &self.d_lines
    }

    /// The active global pulse, if any.
    pub fn wave(&self) -> Option<Wave> {
        self.wave
    }

    /// Ids of the qubits on `site` (at most one in any valid state).
    pub fn qubits_at(&self, site: Site) -> ModelResult<&BTreeSet<QubitId>> {
        self.check_bounds(site)?;
        self.positions
            .get(&site)
            .ok_or(ModelError::OutOfBounds {
                i: site.i,
                j: site.j,
                m: self.m,
                n: self.n,
            })
    }

    /// Look up a qubit by id.
    pub fn qubit(&self, id: QubitId) -> ModelResult<&Qubit> {
        self.qubits.get(&id).ok_or(ModelError::UnknownQubit(id))
    }

    /// Iterate over all qubits in id order.
    pub fn iter_qubits(&self) -> impl Iterator<Item = &Qubit> {
        self.qubits.values()
    }

    /// Total number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Number of data qubits.
    pub fn data_qubits(&self) -> usize {
        self.qubits.values().filter(|q| !q.ancilla).count()
    }

    /// Number of ancilla qubits.
    pub fn ancilla_qubits(&self) -> usize {
        self.qubits.values().filter(|q| q.ancilla).count()
    }

    // -----------------------------------------------------------------
    // Line mutators
    // -----------------------------------------------------------------

    fn h_line_mut(&mut self, i: i32) -> ModelResult<&mut BarrierLine> {
        if i < 0 {
            return Err(ModelError::UnknownBarrier {
                axis: "horizontal",
                index: i,
            });
        }
        self.h_lines
            .get_mut(i as usize)
            .ok_or(ModelError::UnknownBarrier {
                axis: "horizontal",
                index: i,
            })
    }

    fn v_line_mut(&mut self, j: i32) -> ModelResult<&mut BarrierLine> {
        if j < 0 {
            return Err(ModelError::UnknownBarrier {
                axis: "vertical",
                index: j,
            });
        }
        self.v_lines
            .get_mut(j as usize)
            .ok_or(ModelError::UnknownBarrier {
                axis: "vertical",
                index: j,
            })
    }

    /// Toggle horizontal barrier `i`.
    pub fn toggle_h_line(&mut self, i: i32) -> ModelResult<()> {
        let line = self.h_line_mut(i)?;
        line.toggle();
        debug!(line = i, down = line.is_down(), "RL toggled");
        self.notify_all();
        Ok(())
    }

    /// Toggle vertical barrier `j`.
    pub fn toggle_v_line(&mut self, j: i32) -> ModelResult<()> {
        let line = self.v_line_mut(j)?;
        line.toggle();
        debug!(line = j, down = line.is_down(), "CL toggled");
        self.notify_all();
        Ok(())
    }

    /// Lower horizontal barrier `i` if it is raised.
    pub fn lower_h_line(&mut self, i: i32) -> ModelResult<()> {
        if self.h_line_mut(i)?.is_up() {
            self.toggle_h_line(i)?;
        }
        Ok(())
    }

    /// Raise horizontal barrier `i` if it is lowered.
    pub fn raise_h_line(&mut self, i: i32) -> ModelResult<()> {
        if self.h_line_mut(i)?.is_down() {
            self.toggle_h_line(i)?;
        }
        Ok(())
    }

    /// Lower vertical barrier `j` if it is raised.
    pub fn lower_v_line(&mut self, j: i32) -> ModelResult<()> {
        if self.v_line_mut(j)?.is_up() {
            self.toggle_v_line(j)?;
        }
        Ok(())
    }

    /// Raise vertical barrier `j` if it is lowered.
    pub fn raise_v_line(&mut self, j: i32) -> ModelResult<()> {
        if self.v_line_mut(j)?.is_down() {
            self.toggle_v_line(j)?;
        }
        Ok(())
    }

    /// Set the voltage on bias line `k`.
    pub fn set_bias(&mut self, k: i32, value: i64) -> ModelResult<()> {
        if !(0..=MAX_BIAS).contains(&value) {
            return Err(ModelError::BiasOutOfRange {
                k,
                value,
                max: MAX_BIAS,
            });
        }
        if !self.d_lines.set(k, value) {
            return Err(ModelError::UnknownDiagonal(k));
        }
        debug!(line = k, value, "QL set");
        self.notify_all();
        Ok(())
    }

    /// Toggle the global pulse: activate `wave` if none is active,
    /// deactivate otherwise.
    pub fn toggle_wave(&mut self, wave: Wave) {
        self.wave = match self.wave {
            None => Some(wave),
            Some(_) => None,
        };
        debug!(wave = ?self.wave, "wave toggled");
        self.notify_all();
    }

    /// Force the global pulse state (scheduler sync).
    pub fn set_wave(&mut self, wave: Option<Wave>) {
        if self.wave != wave {
            self.wave = wave;
            debug!(wave = ?self.wave, "wave set");
            self.notify_all();
        }
    }

    // -----------------------------------------------------------------
    // Qubit mutators
    // -----------------------------------------------------------------

    /// Move a qubit to a new site, keeping its own position field and
    /// the inverse index in sync.
    pub fn move_qubit(&mut self, id: QubitId, dest: Site) -> ModelResult<()> {
        self.check_bounds(dest)?;
        let origin = self.qubit(id)?.site;
        let dest_ids = self
            .positions
            .get(&dest)
            .ok_or(ModelError::IndexDesync(id))?;
        if !dest_ids.is_empty() {
            return Err(ModelError::SiteOccupied {
                i: dest.i,
                j: dest.j,
            });
        }
        let origin_ids = self
            .positions
            .get_mut(&origin)
            .ok_or(ModelError::IndexDesync(id))?;
        if !origin_ids.remove(&id) {
            return Err(ModelError::IndexDesync(id));
        }
        self.positions
            .get_mut(&dest)
            .ok_or(ModelError::IndexDesync(id))?
            .insert(id);
        if let Some(qubit) = self.qubits.get_mut(&id) {
            qubit.site = dest;
        }
        debug!(qubit = %id, from = %origin, to = %dest, "qubit moved");
        self.notify_all();
        Ok(())
    }

    /// Rotate a qubit's coarse state about `axis` by `theta` radians.
    pub fn rotate_qubit(&mut self, id: QubitId, axis: RotationAxis, theta: f64) -> ModelResult<()> {
        let qubit = self.qubits.get_mut(&id).ok_or(ModelError::UnknownQubit(id))?;
        qubit.state.rotate(axis, theta);
        self.notify_all();
        Ok(())
    }

    /// Apply the coarse controlled-phase bookkeeping: if the control is
    /// exactly |1⟩, the target picks up a Z flip.
    pub fn apply_controlled_phase(&mut self, control: QubitId, target: QubitId) -> ModelResult<()> {
        let control_one = {
            let c = self.qubit(control)?;
            c.state.beta().norm_sqr() == 1.0
        };
        if control_one {
            let t = self
                .qubits
                .get_mut(&target)
                .ok_or(ModelError::UnknownQubit(target))?;
            t.state.rotate(RotationAxis::Z, std::f64::consts::PI);
        }
        self.notify_all();
        Ok(())
    }

    /// Exchange the coarse states of two qubits (swap bookkeeping).
    pub fn swap_states(&mut self, a: QubitId, b: QubitId) -> ModelResult<()> {
        let state_a = self.qubit(a)?.state;
        let state_b = self.qubit(b)?.state;
        if let Some(qa) = self.qubits.get_mut(&a) {
            qa.state = state_b;
        }
        if let Some(qb) = self.qubits.get_mut(&b) {
            qb.state = state_a;
        }
        self.notify_all();
        Ok(())
    }

    /// Collapse a qubit to the dominant basis state and return the
    /// outcome (`true` = |1⟩).
    pub fn collapse_qubit(&mut self, id: QubitId) -> ModelResult<bool> {
        let qubit = self.qubits.get_mut(&id).ok_or(ModelError::UnknownQubit(id))?;
        let outcome = qubit.state.collapse();
        debug!(qubit = %id, outcome, "qubit collapsed");
        self.notify_all();
        Ok(outcome)
    }

    // -----------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------

    /// Reject any configuration in which a site could shuttle in more
    /// than one direction: colinear adjacent open barriers, or more than
    /// one open boundary among a site's four barriers.
    pub fn check_valid_configuration(&self) -> ModelResult<()> {
        for qubit in self.qubits.values() {
            let Site { i, j } = qubit.site;
            if (self.is_h_barrier_down(i) && self.is_h_barrier_down(i + 1))
                || (self.is_h_barrier_down(i - 1) && self.is_h_barrier_down(i - 2))
            {
                return Err(ModelError::Undecidable { i, j });
            }
            if (self.is_v_barrier_down(j) && self.is_v_barrier_down(j + 1))
                || (self.is_v_barrier_down(j - 1) && self.is_v_barrier_down(j - 2))
            {
                return Err(ModelError::Undecidable { i, j });
            }
            let open = u32::from(self.is_h_barrier_down(i))
                + u32::from(self.is_h_barrier_down(i - 1))
                + u32::from(self.is_v_barrier_down(j))
                + u32::from(self.is_v_barrier_down(j - 1));
            if open > 1 {
                return Err(ModelError::Undecidable { i, j });
            }
        }
        Ok(())
    }

    /// One transport step restricted to `involved` qubits.
    ///
    /// Runs the global safety check first, then for every qubit compares
    /// the neighboring diagonals against its own: a strictly greater
    /// neighbor behind an open barrier pulls the qubit one site toward
    /// it. Qubits not named in `involved` feel no pull even if eligible.
    pub fn evolve(&mut self, involved: &[QubitId]) -> ModelResult<()> {
        self.check_valid_configuration()?;
        let involved: FxHashSet<QubitId> = involved.iter().copied().collect();
        let ids: Vec<QubitId> = self.qubits.keys().copied().collect();
        for id in ids {
            if !involved.contains(&id) {
                continue;
            }
            let site = self.qubit(id)?.site;
            let Site { i, j } = site;
            let k = site.diagonal();
            let Some(mid) = self.bias(k) else {
                continue;
            };
            let above = self.bias(k - 1);
            let below = self.bias(k + 1);

            if above.is_some_and(|v| v > mid) {
                // Shuttle up.
                if self.is_h_barrier_down(i) {
                    self.move_qubit(id, Site::new(i + 1, j))?;
                    continue;
                }
                // Shuttle left.
                if self.is_v_barrier_down(j - 1) {
                    self.move_qubit(id, Site::new(i, j - 1))?;
                    continue;
                }
            }
            if below.is_some_and(|v| v > mid) {
                // Shuttle down.
                if self.is_h_barrier_down(i - 1) {
                    self.move_qubit(id, Site::new(i - 1, j))?;
                    continue;
                }
                // Shuttle right.
                if self.is_v_barrier_down(j) {
                    self.move_qubit(id, Site::new(i, j + 1))?;
                }
            }
        }
        Ok(())
    }

    /// One transport step involving every qubit.
    pub fn evolve_all(&mut self) -> ModelResult<()> {
        let all: Vec<QubitId> = self.qubits.keys().copied().collect();
        self.evolve(&all)
    }

    /// Re-bias the diagonal lines crossing an adjacent site pair.
    ///
    /// Walks the perpendicular axis: each lane's occupied side ends one
    /// volt above its empty side (holding idle qubits in place), except
    /// the origin lane where the offset is `sign` — `-1` drives the
    /// origin qubit toward `dest`, `0` equalizes the pair. All touched
    /// lines are then renormalized so the minimum is zero.
    pub fn apply_bias_difference(
        &mut self,
        origin: Site,
        dest: Site,
        sign: i64,
    ) -> ModelResult<()> {
        self.check_bounds(origin)?;
        self.check_bounds(dest)?;
        let (di, dj) = (dest.i - origin.i, dest.j - origin.j);
        if di.abs() + dj.abs() != 1 {
            return Err(ModelError::NonAdjacentBiasDrive {
                origin: (origin.i, origin.j),
                dest: (dest.i, dest.j),
            });
        }

        let mut touched: Vec<i32> = Vec::new();
        let mut default_value = 0i64;

        if dj == 0 {
            // Vertical pair: walk the columns.
            let hi_i = origin.i.max(dest.i);
            let lo_i = origin.i.min(dest.i);
            for j in 0..self.n {
                let far_k = j - hi_i;
                let near_k = j - lo_i;
                if self.d_lines.value(far_k).is_none() || self.d_lines.value(near_k).is_none() {
                    continue;
                }
                self.d_lines.set(far_k, default_value);
                let flag = if j == origin.j { sign } else { 1 };
                let hi_occupied = !self.positions[&Site::new(hi_i, j)].is_empty();
                let lo_occupied = !self.positions[&Site::new(lo_i, j)].is_empty();
                let far = default_value;
                let near = if hi_occupied {
                    far - flag
                } else if lo_occupied {
                    far + flag
                } else {
                    far
                };
                self.d_lines.set(near_k, near);
                default_value = near;
                touched.push(far_k);
                touched.push(near_k);
            }
        } else {
            // Horizontal pair: walk the rows.
            let hi_j = origin.j.max(dest.j);
            let lo_j = origin.j.min(dest.j);
            for i in 0..self.m {
                let far_k = hi_j - i;
                let near_k = lo_j - i;
                if self.d_lines.value(far_k).is_none() || self.d_lines.value(near_k).is_none() {
                    continue;
                }
                self.d_lines.set(far_k, default_value);
                let flag = if i == origin.i { sign } else { 1 };
                let right_occupied = !self.positions[&Site::new(i, hi_j)].is_empty();
                let left_occupied = !self.positions[&Site::new(i, lo_j)].is_empty();
                let far = default_value;
                let near = if right_occupied {
                    far - flag
                } else if left_occupied {
                    far + flag
                } else {
                    far
                };
                self.d_lines.set(near_k, near);
                default_value = near;
                touched.push(far_k);
                touched.push(near_k);
            }
        }

        // Normalize the touched lines so the minimum voltage is zero.
        // Adjacent lanes share a diagonal, so the list has duplicates.
        touched.sort_unstable();
        touched.dedup();
        let min = touched
            .iter()
            .filter_map(|&k| self.d_lines.value(k))
            .min()
            .unwrap_or(0);
        if min != 0 {
            for &k in &touched {
                if let Some(v) = self.d_lines.value(k) {
                    self.d_lines.set(k, v - min);
                }
            }
        }
        debug!(origin = %origin, dest = %dest, sign, "bias difference applied");
        self.notify_all();
        Ok(())
    }

    // -----------------------------------------------------------------
    // Constraint mirror lifecycle
    // -----------------------------------------------------------------

    /// Discard the previous cycle's mirror and start a fresh one.
    pub fn rebuild_mirror(&mut self) {
        self.mirror = Mirror::new();
    }

    /// The current constraint mirror.
    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    /// Mutable access for operations recording requirements.
    pub fn mirror_mut(&mut self) -> &mut Mirror {
        &mut self.mirror
    }

    // -----------------------------------------------------------------
    // Notification
    // -----------------------------------------------------------------

    /// Register an observer. It is notified once immediately.
    pub fn subscribe(&mut self, observer: Box<dyn ModelObserver>) {
        observer.state_changed();
        self.observers.push(observer);
    }

    /// Drop all observers.
    pub fn unsubscribe_all(&mut self) {
        self.observers.clear();
    }

    fn notify_all(&self) {
        for observer in &self.observers {
            observer.state_changed();
        }
    }

    fn notify_resize_all(&self) {
        for observer in &self.observers {
            observer.dimensions_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn model_4x4() -> CrossbarModel {
        CrossbarModel::new(Topology::square(4, 4, 4)).unwrap()
    }

    #[test]
    fn test_idle_fill_is_checkerboard() {
        let model = model_4x4();
        assert_eq!(model.num_qubits(), 8);
        for qubit in model.iter_qubits() {
            assert!(qubit.site.qubit_parity(), "qubit off parity: {}", qubit.site);
        }
        // Ancillas end up on odd rows.
        for qubit in model.iter_qubits().filter(|q| q.ancilla) {
            assert_eq!(qubit.site.i % 2, 1);
        }
    }

    #[test]
    fn test_inline_fill_when_overfull() {
        let model = CrossbarModel::new(Topology::square(4, 8, 0)).unwrap();
        assert_eq!(model.num_qubits(), 8);
        // Dense fill occupies the first two rows completely.
        for j in 0..4 {
            assert!(!model.qubits_at(Site::new(0, j)).unwrap().is_empty());
            assert!(!model.qubits_at(Site::new(1, j)).unwrap().is_empty());
        }
    }

    #[test]
    fn test_move_updates_both_sides() {
        let mut model = model_4x4();
        let id = QubitId(0);
        let origin = model.qubit(id).unwrap().site;
        let dest = Site::new(origin.i, origin.j + 1);
        model.move_qubit(id, dest).unwrap();
        assert_eq!(model.qubit(id).unwrap().site, dest);
        assert!(model.qubits_at(origin).unwrap().is_empty());
        assert!(model.qubits_at(dest).unwrap().contains(&id));
    }

    #[test]
    fn test_move_to_occupied_site_rejected() {
        let mut model = model_4x4();
        // (0, 0) and (0, 2) are both occupied in the idle fill.
        let id = *model.qubits_at(Site::new(0, 0)).unwrap().iter().next().unwrap();
        assert!(matches!(
            model.move_qubit(id, Site::new(0, 2)),
            Err(ModelError::SiteOccupied { .. })
        ));
    }

    #[test]
    fn test_move_out_of_bounds_rejected() {
        let mut model = model_4x4();
        assert!(matches!(
            model.move_qubit(QubitId(0), Site::new(-1, 0)),
            Err(ModelError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_safe_barrier_getters_at_edges() {
        let model = model_4x4();
        assert!(model.is_h_barrier_up(-1));
        assert!(model.is_h_barrier_up(99));
        assert!(!model.is_h_barrier_down(-5));
    }

    #[test]
    fn test_evolve_flat_bias_is_identity() {
        let mut model = model_4x4();
        // Flatten every bias line, open a barrier: still no gradient.
        let keys: Vec<i32> = model.bias_lines().iter().map(|(k, _)| k).collect();
        for k in keys {
            model.set_bias(k, 3).unwrap();
        }
        model.toggle_v_line(0).unwrap();
        let before: Vec<Site> = model.iter_qubits().map(|q| q.site).collect();
        model.evolve_all().unwrap();
        let after: Vec<Site> = model.iter_qubits().map(|q| q.site).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_evolve_moves_toward_greater_bias() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        // Single qubit at (0, 0), diagonal 0. Raise the right neighbor
        // diagonal and open the barrier between columns 0 and 1.
        let keys: Vec<i32> = model.bias_lines().iter().map(|(k, _)| k).collect();
        for k in keys {
            model.set_bias(k, 0).unwrap();
        }
        model.set_bias(1, 1).unwrap();
        model.toggle_v_line(0).unwrap();
        model.evolve_all().unwrap();
        assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 1));
    }

    #[test]
    fn test_evolve_ignores_uninvolved() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        let keys: Vec<i32> = model.bias_lines().iter().map(|(k, _)| k).collect();
        for k in keys {
            model.set_bias(k, 0).unwrap();
        }
        model.set_bias(1, 1).unwrap();
        model.toggle_v_line(0).unwrap();
        model.evolve(&[]).unwrap();
        assert_eq!(model.qubit(QubitId(0)).unwrap().site, Site::new(0, 0));
    }

    #[test]
    fn test_undecidable_colinear_barriers() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        // Qubit at (0, 0): open the two colinear vertical barriers to its
        // right.
        model.toggle_v_line(0).unwrap();
        model.toggle_v_line(1).unwrap();
        let before = model.qubit(QubitId(0)).unwrap().site;
        let err = model.evolve_all().unwrap_err();
        assert!(matches!(err, ModelError::Undecidable { i: 0, j: 0 }));
        assert_eq!(model.qubit(QubitId(0)).unwrap().site, before);
    }

    #[test]
    fn test_undecidable_two_open_boundaries() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        // Qubit at (0, 0): open both its top and right boundary.
        model.toggle_h_line(0).unwrap();
        model.toggle_v_line(0).unwrap();
        assert!(matches!(
            model.check_valid_configuration(),
            Err(ModelError::Undecidable { .. })
        ));
    }

    #[test]
    fn test_bias_difference_drives_and_renormalizes() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        let origin = Site::new(0, 0);
        let dest = Site::new(0, 1);
        model.apply_bias_difference(origin, dest, -1).unwrap();
        let origin_bias = model.bias(origin.diagonal()).unwrap();
        let dest_bias = model.bias(dest.diagonal()).unwrap();
        assert_eq!(dest_bias, origin_bias + 1);
        // Renormalized: minimum touched voltage is zero.
        let min = model.bias_lines().iter().map(|(_, v)| v).min().unwrap();
        assert_eq!(min, 0);
    }

    #[test]
    fn test_bias_difference_round_trip_restores_lines() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        let origin = Site::new(0, 0);
        let dest = Site::new(0, 1);

        model.apply_bias_difference(origin, dest, -1).unwrap();
        model.toggle_v_line(0).unwrap();
        model.evolve_all().unwrap();
        model.toggle_v_line(0).unwrap();
        assert_eq!(model.qubit(QubitId(0)).unwrap().site, dest);
        let after_there: Vec<(i32, i64)> = model.bias_lines().iter().collect();

        // Drive back.
        model.apply_bias_difference(dest, origin, -1).unwrap();
        model.toggle_v_line(0).unwrap();
        model.evolve_all().unwrap();
        model.toggle_v_line(0).unwrap();
        assert_eq!(model.qubit(QubitId(0)).unwrap().site, origin);

        // Driving the mirrored move produces the mirrored bias pattern.
        model.apply_bias_difference(origin, dest, -1).unwrap();
        let again: Vec<(i32, i64)> = model.bias_lines().iter().collect();
        assert_eq!(after_there, again);
    }

    #[test]
    fn test_non_adjacent_bias_drive_rejected() {
        let mut model = model_4x4();
        assert!(matches!(
            model.apply_bias_difference(Site::new(0, 0), Site::new(0, 2), -1),
            Err(ModelError::NonAdjacentBiasDrive { .. })
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut model = model_4x4();
        let copy = model.clone();
        model.toggle_v_line(0).unwrap();
        model.move_qubit(QubitId(0), Site::new(0, 1)).unwrap();
        assert!(copy.is_v_barrier_up(0));
        assert_eq!(copy.qubit(QubitId(0)).unwrap().site, Site::new(0, 0));
    }

    #[test]
    fn test_observer_sees_mutations() {
        struct Counter(Rc<Cell<u32>>);
        impl ModelObserver for Counter {
            fn state_changed(&self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let mut model = model_4x4();
        let count = Rc::new(Cell::new(0));
        model.subscribe(Box::new(Counter(count.clone())));
        let initial = count.get();
        assert_eq!(initial, 1); // notified on subscribe
        model.toggle_h_line(0).unwrap();
        model.set_bias(0, 5).unwrap();
        assert_eq!(count.get(), initial + 2);

        model.unsubscribe_all();
        model.toggle_h_line(0).unwrap();
        assert_eq!(count.get(), initial + 2);
    }

    #[test]
    fn test_wave_toggle_and_sync() {
        let mut model = model_4x4();
        let wave = Wave {
            code: 42,
            even_columns: true,
        };
        assert!(model.wave().is_none());
        model.toggle_wave(wave);
        assert_eq!(model.wave(), Some(wave));
        model.toggle_wave(wave);
        assert!(model.wave().is_none());

        model.set_wave(Some(wave));
        assert_eq!(model.wave(), Some(wave));
        model.set_wave(None);
        assert!(model.wave().is_none());
    }

    #[test]
    fn test_bias_equalize_levels_the_pair() {
        let mut model = CrossbarModel::new(Topology::square(4, 1, 0)).unwrap();
        let origin = Site::new(0, 0);
        let dest = Site::new(0, 1);
        model.apply_bias_difference(origin, dest, 0).unwrap();
        assert_eq!(
            model.bias(origin.diagonal()).unwrap(),
            model.bias(dest.diagonal()).unwrap()
        );
    }

    #[test]
    fn test_resize_redraws_layout() {
        let mut model = model_4x4();
        model.move_qubit(QubitId(0), Site::new(0, 1)).unwrap();
        model.resize(Topology::square(6, 9, 9)).unwrap();
        assert_eq!(model.dimensions(), (6, 6));
        assert_eq!(model.num_qubits(), 18);
        assert_eq!(model.control_line_dimensions(), (5, 5, 12));
        for qubit in model.iter_qubits() {
            assert!(qubit.site.qubit_parity());
        }
    }

    #[test]
    fn test_explicit_placement() {
        use crate::topology::{PlacementEntry, QubitKind};
        let topology = Topology::grid(3, 3, 1, 1).with_placement(vec![
            PlacementEntry {
                id: QubitId(7),
                kind: QubitKind::Data,
                site: Site::new(2, 2),
            },
            PlacementEntry {
                id: QubitId(9),
                kind: QubitKind::Ancilla,
                site: Site::new(1, 1),
            },
        ]);
        let model = CrossbarModel::new(topology).unwrap();
        assert_eq!(model.qubit(QubitId(7)).unwrap().site, Site::new(2, 2));
        assert!(model.qubit(QubitId(9)).unwrap().ancilla);
        assert_eq!(model.data_qubits(), 1);
        assert_eq!(model.ancilla_qubits(), 1);
    }
}
