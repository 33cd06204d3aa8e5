//! Deterministic bounded solver for one cycle's constraint mirror.
//!
//! The variables are small: one boolean per barrier, one bounded integer
//! per bias line, one reservation slot per touched site, and the wave
//! pair. All constraints are equalities, exact values, or strict
//! orderings between two bias lines, so no backtracking search is
//! needed:
//!
//! - barrier, site, and wave requirements fold directly, any
//!   contradiction is a conflict;
//! - bias equalities merge lines via union-find, strict orderings become
//!   edges of a difference graph, and a longest-path relaxation yields
//!   the least assignment satisfying every edge — which is also the
//!   minimum-sum assignment, the solver's preference. A positive cycle
//!   or a level beyond [`MAX_BIAS`] is a conflict, which also bounds the
//!   search explicitly.
//!
//! Unforced barriers stay raised and unconstrained bias lines settle at
//! zero, minimizing open-barrier count and total bias magnitude.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crossbar_model::{CrossbarModel, MAX_BIAS, QubitId, SiteClaim, Wave};

/// The solver found no assignment satisfying the mirror.
#[derive(Debug, Error)]
#[error("no consistent line assignment: {0}")]
pub struct SolveError(pub String);

/// One global line assignment for a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Whether each horizontal barrier ends the cycle lowered.
    pub h_down: Vec<bool>,
    /// Whether each vertical barrier ends the cycle lowered.
    pub v_down: Vec<bool>,
    /// Voltage per bias line, ascending in diagonal index.
    pub bias: Vec<(i32, i64)>,
    /// The global pulse state.
    pub wave: Option<Wave>,
}

/// Solve the model's current mirror, with optional extra strict
/// orderings from the scheduler's adjacency pass.
pub fn solve(model: &CrossbarModel, extra_orders: &[(i32, i32)]) -> Result<Assignment, SolveError> {
    let (m, n) = model.dimensions();
    let mirror = model.mirror();

    // Barriers: forced value or raised.
    let mut h_down = Vec::with_capacity((m - 1) as usize);
    for i in 0..m - 1 {
        let req = mirror.h_req(i);
        if req.lowered && req.raised {
            return Err(SolveError(format!(
                "horizontal barrier {i} required both raised and lowered"
            )));
        }
        h_down.push(req.lowered);
    }
    let mut v_down = Vec::with_capacity((n - 1) as usize);
    for j in 0..n - 1 {
        let req = mirror.v_req(j);
        if req.lowered && req.raised {
            return Err(SolveError(format!(
                "vertical barrier {j} required both raised and lowered"
            )));
        }
        v_down.push(req.lowered);
    }

    // Sites: reservations must not contradict.
    for (site, claims) in mirror.sites() {
        let mut requires_empty = false;
        let mut holder: Option<QubitId> = None;
        for claim in claims {
            match claim {
                SiteClaim::Empty => requires_empty = true,
                SiteClaim::Holds(id) => match holder {
                    None => holder = Some(*id),
                    Some(existing) if existing != *id => {
                        return Err(SolveError(format!(
                            "site {site} reserved for both {existing} and {id}"
                        )));
                    }
                    Some(_) => {}
                },
            }
        }
        if requires_empty && holder.is_some() {
            return Err(SolveError(format!(
                "site {site} required both empty and reserved"
            )));
        }
    }

    // Wave: all requirements must agree.
    let mut wave: Option<Wave> = None;
    for requirement in mirror.waves() {
        match wave {
            None => wave = Some(*requirement),
            Some(existing) if existing != *requirement => {
                return Err(SolveError(
                    "two different global pulses requested".to_string(),
                ));
            }
            Some(_) => {}
        }
    }

    // Bias lines: union equalities, then level the strict-order graph.
    let bias = solve_bias(model, extra_orders)?;

    Ok(Assignment {
        h_down,
        v_down,
        bias,
        wave,
    })
}

fn solve_bias(
    model: &CrossbarModel,
    extra_orders: &[(i32, i32)],
) -> Result<Vec<(i32, i64)>, SolveError> {
    let mirror = model.mirror();
    let (d_low, d_high) = model.bias_lines().range();

    // Dense variable ids over the line range plus any index a constraint
    // mentions (defensively; operations only touch existing lines).
    let mut ids: FxHashMap<i32, usize> = FxHashMap::default();
    let mut ks: Vec<i32> = (d_low..=d_high).collect();
    for &(a, b) in mirror
        .bias_less()
        .iter()
        .chain(mirror.bias_equal())
        .chain(extra_orders)
    {
        ks.push(a);
        ks.push(b);
    }
    for &k in mirror.bias_fixed().keys() {
        ks.push(k);
    }
    ks.sort_unstable();
    ks.dedup();
    for (idx, &k) in ks.iter().enumerate() {
        ids.insert(k, idx);
    }

    // Union-find over equalities.
    let mut parent: Vec<usize> = (0..ks.len()).collect();
    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        if parent[x] != x {
            let root = find(parent, parent[x]);
            parent[x] = root;
        }
        parent[x]
    }
    for &(a, b) in mirror.bias_equal() {
        let (ra, rb) = (find(&mut parent, ids[&a]), find(&mut parent, ids[&b]));
        if ra != rb {
            parent[ra] = rb;
        }
    }

    // Exact values per class.
    let mut fixed: FxHashMap<usize, i64> = FxHashMap::default();
    for (&k, values) in mirror.bias_fixed() {
        let root = find(&mut parent, ids[&k]);
        for &value in values {
            if !(0..=MAX_BIAS).contains(&value) {
                return Err(SolveError(format!(
                    "bias line {k} fixed outside its domain ({value})"
                )));
            }
            match fixed.get(&root) {
                None => {
                    fixed.insert(root, value);
                }
                Some(&existing) if existing != value => {
                    return Err(SolveError(format!(
                        "bias line {k} fixed to both {existing} and {value}"
                    )));
                }
                Some(_) => {}
            }
        }
    }

    // Strict orderings between classes.
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for &(lo, hi) in mirror.bias_less().iter().chain(extra_orders) {
        let (rl, rh) = (find(&mut parent, ids[&lo]), find(&mut parent, ids[&hi]));
        if rl == rh {
            return Err(SolveError(format!(
                "bias lines {lo} and {hi} required both equal and ordered"
            )));
        }
        edges.push((rl, rh));
    }

    // Longest-path relaxation: raise each class to the least level
    // satisfying every edge. The iteration count bounds the search; a
    // level still rising after |V| rounds means an ordering cycle.
    let mut level: FxHashMap<usize, i64> = FxHashMap::default();
    for idx in 0..ks.len() {
        let root = find(&mut parent, idx);
        let start = fixed.get(&root).copied().unwrap_or(0);
        level.entry(root).or_insert(start);
    }
    for round in 0..=ks.len() {
        let mut changed = false;
        for &(lo, hi) in &edges {
            let needed = level[&lo] + 1;
            if level[&hi] < needed {
                if fixed.contains_key(&hi) {
                    return Err(SolveError(
                        "bias ordering contradicts a fixed voltage".to_string(),
                    ));
                }
                if needed > MAX_BIAS {
                    return Err(SolveError(format!(
                        "bias ordering exceeds the maximum voltage {MAX_BIAS}"
                    )));
                }
                level.insert(hi, needed);
                changed = true;
            }
        }
        if !changed {
            break;
        }
        if round == ks.len() {
            return Err(SolveError("cyclic bias ordering".to_string()));
        }
    }

    Ok((d_low..=d_high)
        .map(|k| {
            let root = find(&mut parent, ids[&k]);
            (k, level[&root])
        })
        .collect())
}
