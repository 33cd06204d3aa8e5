//! Shared control lines: barriers, diagonal bias lines, and the global
//! pulse ("wave") pair.

use serde::{Deserialize, Serialize};

/// Maximum voltage a bias line can carry.
pub const MAX_BIAS: i64 = 100;

/// State of a barrier control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarrierState {
    /// Raised: qubit transit across the boundary is blocked.
    Raised,
    /// Lowered: the boundary is open for transit.
    Lowered,
}

/// A barrier line shared by one whole row pair or column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierLine {
    state: BarrierState,
}

impl BarrierLine {
    /// A new barrier, raised by default.
    pub fn raised() -> Self {
        Self {
            state: BarrierState::Raised,
        }
    }

    /// Current state.
    pub fn state(&self) -> BarrierState {
        self.state
    }

    /// Whether the barrier blocks transit.
    pub fn is_up(&self) -> bool {
        self.state == BarrierState::Raised
    }

    /// Whether the barrier permits transit.
    pub fn is_down(&self) -> bool {
        self.state == BarrierState::Lowered
    }

    /// Flip the state.
    pub fn toggle(&mut self) {
        self.state = match self.state {
            BarrierState::Raised => BarrierState::Lowered,
            BarrierState::Lowered => BarrierState::Raised,
        };
    }
}

/// The set of diagonal bias lines, indexed by `k = j - i` over
/// `-(n-1)..=m` for an `m × n` grid.
///
/// Stored as an offset vector; `k` indices outside the range read as
/// `None`, which the transport rule treats as "no pull".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagonalLines {
    /// Lowest valid diagonal index, `-(n-1)`.
    low: i32,
    values: Vec<i64>,
}

impl DiagonalLines {
    /// Build the lines for an `m × n` grid with the idle alternating
    /// pattern `1 + |k| % 2`.
    pub fn new(m: i32, n: i32) -> Self {
        let low = -(n - 1);
        let values = (low..=m).map(|k| 1 + (k.abs() % 2) as i64).collect();
        Self { low, values }
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no lines (grids are never empty, so this is
    /// only true for a default-constructed value).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The voltage on line `k`, if it exists.
    pub fn value(&self, k: i32) -> Option<i64> {
        let idx = k.checked_sub(self.low)?;
        if idx < 0 {
            return None;
        }
        self.values.get(idx as usize).copied()
    }

    /// Set the voltage on line `k`. Returns `false` if the line does not
    /// exist; range checks are the model's job.
    pub fn set(&mut self, k: i32, value: i64) -> bool {
        let Some(idx) = k.checked_sub(self.low) else {
            return false;
        };
        if idx < 0 {
            return false;
        }
        match self.values.get_mut(idx as usize) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Iterate over `(k, value)` pairs in ascending `k`.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, &v)| (self.low + idx as i32, v))
    }

    /// The valid diagonal index range as `(low, high)` inclusive.
    pub fn range(&self) -> (i32, i32) {
        (self.low, self.low + self.values.len() as i32 - 1)
    }
}

/// An active global pulse: which pulse is being played and on which
/// column parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Device-level pulse code (encodes axis and angle of the rotation).
    pub code: u32,
    /// Whether the pulse addresses even columns (`false` = odd columns).
    pub even_columns: bool,
}
