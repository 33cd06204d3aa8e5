//! The cycle-by-cycle constraint checker.

use rustc_hash::FxHashSet;
use tracing::debug;

use crossbar_model::{CrossbarModel, QubitId, Site, SiteClaim};
use crossbar_ops::{Operation, Program};

use crate::error::{SchedError, SchedResult};
use crate::interval::{Interval, IntervalIndex};
use crate::solver::{Assignment, solve};

/// Scheduler for one program: owns the flattened operations and their
/// intervals, and advances the physical model one cycle at a time.
///
/// The per-cycle granularity is deliberate — the executor drives the
/// loop so it can emit progress and honor cancellation at the only safe
/// boundary (between cycles).
#[derive(Debug)]
pub struct Scheduler {
    ops: Vec<Operation>,
    index: IntervalIndex,
}

impl Scheduler {
    /// Build the schedule for a program.
    pub fn new(program: &Program) -> Self {
        let (index, ops) = IntervalIndex::from_program(program);
        Self { ops, index }
    }

    /// The loop bound: one past the last cycle any interval touches.
    pub fn max_cycle(&self) -> u32 {
        self.index.max_cycle()
    }

    /// The flattened operations in schedule order.
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Run one cycle against the model.
    ///
    /// Applies active operations' effects, solves the joint constraints
    /// of the operations still running, drives the model to the chosen
    /// assignment, and statically validates operations starting at this
    /// cycle. Any failure aborts the run and leaves the model at the
    /// state the last successful step produced.
    pub fn run_cycle(&self, model: &mut CrossbarModel, cycle: u32) -> SchedResult<()> {
        let active: Vec<Interval> = self.index.containing(cycle).copied().collect();

        // Physical effects first: operations act on the assignment the
        // previous cycle committed.
        for interval in &active {
            let op = &self.ops[interval.op];
            op.apply(model, cycle - interval.low)
                .map_err(|source| SchedError::Apply {
                    source,
                    line: op.line(),
                })?;
        }

        // Collect constraints from operations still running. Intervals
        // ending exactly here are finishing and request nothing.
        let continuing: Vec<&Interval> =
            active.iter().filter(|iv| iv.high != cycle).collect();
        model.rebuild_mirror();
        let mut involved: FxHashSet<QubitId> = FxHashSet::default();
        let mut lines: Vec<u32> = Vec::new();
        for interval in &continuing {
            let op = &self.ops[interval.op];
            op.dynamic_constraints(model, cycle - interval.low)
                .map_err(|source| SchedError::Apply {
                    source,
                    line: op.line(),
                })?;
            involved.extend(op.involved_qubits());
            lines.push(op.line());
        }

        // Baseline occupancy: every qubit not owned by an active
        // operation keeps its site reserved.
        let idle: Vec<(QubitId, Site)> = model
            .iter_qubits()
            .filter(|q| !involved.contains(&q.id))
            .map(|q| (q.id, q.site))
            .collect();
        for (id, site) in idle {
            model.mirror_mut().claim_site(site, SiteClaim::Holds(id));
        }

        // Minimize-and-solve, then re-check against idle qubits and
        // solve again with any hold-in-place orderings added.
        let first = solve(model, &[]).map_err(|err| {
            debug!(cycle, %err, "joint solve failed");
            SchedError::ParallelConflict {
                cycle,
                lines: lines.clone(),
            }
        })?;
        let extra = adjacency_orders(model, &first, &involved)?;
        let solution = if extra.is_empty() {
            first
        } else {
            solve(model, &extra).map_err(|err| {
                debug!(cycle, %err, "re-solve with hold orderings failed");
                SchedError::ParallelConflict { cycle, lines }
            })?
        };

        apply_assignment(model, &solution)?;

        // Operations starting now validate against the updated model.
        for interval in &active {
            if interval.low == cycle {
                let op = &self.ops[interval.op];
                op.static_check(model).map_err(|source| SchedError::Static {
                    source,
                    line: op.line(),
                })?;
            }
        }

        debug!(cycle, active = active.len(), "cycle committed");
        Ok(())
    }

    /// Run the whole schedule. Returns the number of cycles executed.
    pub fn validate(&self, model: &mut CrossbarModel) -> SchedResult<u32> {
        let max_cycle = self.max_cycle();
        for cycle in 0..max_cycle {
            self.run_cycle(model, cycle)?;
        }
        Ok(max_cycle)
    }
}

/// Inspect every barrier the solution opens: two uninvolved qubits made
/// adjacent is an error, a lone uninvolved qubit next to the opening
/// gets a bias ordering that holds it in place.
fn adjacency_orders(
    model: &CrossbarModel,
    solution: &Assignment,
    involved: &FxHashSet<QubitId>,
) -> SchedResult<Vec<(i32, i32)>> {
    let (m, n) = model.dimensions();
    let mut extra: Vec<(i32, i32)> = Vec::new();

    let intersects = |ids: &std::collections::BTreeSet<QubitId>| {
        ids.iter().any(|id| involved.contains(id))
    };

    for k in 0..m - 1 {
        if !solution.h_down[k as usize] {
            continue;
        }
        for j in 0..n {
            let bottom = model.qubits_at(Site::new(k, j))?;
            let top = model.qubits_at(Site::new(k + 1, j))?;
            if intersects(bottom) || intersects(top) {
                continue;
            }
            if !bottom.is_empty() && !top.is_empty() {
                return Err(SchedError::VerticallyAdjacent(k));
            }
            if bottom.len() + top.len() == 1 {
                // Keep the occupied side strictly above the empty one.
                if !bottom.is_empty() {
                    extra.push((j - (k + 1), j - k));
                } else {
                    extra.push((j - k, j - (k + 1)));
                }
            }
        }
    }

    for k in 0..n - 1 {
        if !solution.v_down[k as usize] {
            continue;
        }
        for i in 0..m {
            let left = model.qubits_at(Site::new(i, k))?;
            let right = model.qubits_at(Site::new(i, k + 1))?;
            if intersects(left) || intersects(right) {
                continue;
            }
            if !left.is_empty() && !right.is_empty() {
                return Err(SchedError::HorizontallyAdjacent(k));
            }
            if left.len() + right.len() == 1 {
                if !left.is_empty() {
                    extra.push((k + 1 - i, k - i));
                } else {
                    extra.push((k - i, k + 1 - i));
                }
            }
        }
    }

    Ok(extra)
}

/// Drive the physical model to the solved assignment, toggling only the
/// lines that differ.
fn apply_assignment(model: &mut CrossbarModel, solution: &Assignment) -> SchedResult<()> {
    let (m, n) = model.dimensions();
    for i in 0..m - 1 {
        if solution.h_down[i as usize] {
            model.lower_h_line(i)?;
        } else {
            model.raise_h_line(i)?;
        }
    }
    for j in 0..n - 1 {
        if solution.v_down[j as usize] {
            model.lower_v_line(j)?;
        } else {
            model.raise_v_line(j)?;
        }
    }
    for &(k, value) in &solution.bias {
        if model.bias(k) != Some(value) {
            model.set_bias(k, value)?;
        }
    }
    model.set_wave(solution.wave);
    Ok(())
}
