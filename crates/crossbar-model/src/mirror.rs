//! The per-cycle constraint mirror.
//!
//! Before each cycle's solve the scheduler rebuilds a symbolic mirror of
//! every physical quantity — one variable per barrier, per bias line, per
//! site occupancy, plus the global pulse pair. Operations record what the
//! *solved* assignment must satisfy; the mirror itself is a dumb recorder.
//! Contradictions are detected by the solver, never here, so an operation
//! cannot observe another operation's requirements.
//!
//! The mirror is owned by the model for the duration of one solve and is
//! rebuilt from scratch for the next cycle.

use rustc_hash::FxHashMap;

use crate::lines::{BarrierState, Wave};
use crate::qubit::{QubitId, Site};

/// A requirement on one site-occupancy variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteClaim {
    /// The solved assignment must leave this site empty.
    Empty,
    /// This site is reserved for the given qubit.
    Holds(QubitId),
}

/// Requirements accumulated against one barrier variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarrierReq {
    /// Some operation requires the barrier lowered.
    pub lowered: bool,
    /// Some operation requires the barrier raised.
    pub raised: bool,
}

/// Symbolic mirror of the physical quantities for one cycle.
#[derive(Debug, Clone, Default)]
pub struct Mirror {
    h: FxHashMap<i32, BarrierReq>,
    v: FxHashMap<i32, BarrierReq>,
    bias_fixed: FxHashMap<i32, Vec<i64>>,
    bias_less: Vec<(i32, i32)>,
    bias_equal: Vec<(i32, i32)>,
    sites: FxHashMap<Site, Vec<SiteClaim>>,
    waves: Vec<Wave>,
}

impl Mirror {
    /// A fresh, empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require horizontal barrier `i` to end the cycle in `state`.
    pub fn require_h(&mut self, i: i32, state: BarrierState) {
        let req = self.h.entry(i).or_default();
        match state {
            BarrierState::Lowered => req.lowered = true,
            BarrierState::Raised => req.raised = true,
        }
    }

    /// Require vertical barrier `j` to end the cycle in `state`.
    pub fn require_v(&mut self, j: i32, state: BarrierState) {
        let req = self.v.entry(j).or_default();
        match state {
            BarrierState::Lowered => req.lowered = true,
            BarrierState::Raised => req.raised = true,
        }
    }

    /// Force bias line `k` to an exact voltage.
    pub fn fix_bias(&mut self, k: i32, value: i64) {
        self.bias_fixed.entry(k).or_default().push(value);
    }

    /// Require `bias(lo) < bias(hi)` strictly.
    pub fn order_bias(&mut self, lo: i32, hi: i32) {
        self.bias_less.push((lo, hi));
    }

    /// Require `bias(a) == bias(b)`.
    pub fn equal_bias(&mut self, a: i32, b: i32) {
        self.bias_equal.push((a, b));
    }

    /// Record a claim on a site-occupancy variable.
    pub fn claim_site(&mut self, site: Site, claim: SiteClaim) {
        self.sites.entry(site).or_default().push(claim);
    }

    /// Require the global pulse pair to take the given value.
    pub fn require_wave(&mut self, wave: Wave) {
        self.waves.push(wave);
    }

    /// Accumulated requirements on horizontal barrier `i`.
    pub fn h_req(&self, i: i32) -> BarrierReq {
        self.h.get(&i).copied().unwrap_or_default()
    }

    /// Accumulated requirements on vertical barrier `j`.
    pub fn v_req(&self, j: i32) -> BarrierReq {
        self.v.get(&j).copied().unwrap_or_default()
    }

    /// All exact-voltage requirements, keyed by diagonal index.
    pub fn bias_fixed(&self) -> &FxHashMap<i32, Vec<i64>> {
        &self.bias_fixed
    }

    /// All strict `lo < hi` bias orderings.
    pub fn bias_less(&self) -> &[(i32, i32)] {
        &self.bias_less
    }

    /// All bias equalities.
    pub fn bias_equal(&self) -> &[(i32, i32)] {
        &self.bias_equal
    }

    /// All site claims.
    pub fn sites(&self) -> &FxHashMap<Site, Vec<SiteClaim>> {
        &self.sites
    }

    /// All pulse requirements.
    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrier_requirements_accumulate() {
        let mut m = Mirror::new();
        m.require_h(0, BarrierState::Lowered);
        m.require_h(0, BarrierState::Raised);
        let req = m.h_req(0);
        assert!(req.lowered && req.raised);
        assert_eq!(m.h_req(1), BarrierReq::default());
    }

    #[test]
    fn test_site_claims_are_recorded_not_judged() {
        let mut m = Mirror::new();
        let s = Site::new(0, 0);
        m.claim_site(s, SiteClaim::Empty);
        m.claim_site(s, SiteClaim::Holds(QubitId(1)));
        // Both claims survive; contradiction is the solver's call.
        assert_eq!(m.sites()[&s].len(), 2);
    }
}
