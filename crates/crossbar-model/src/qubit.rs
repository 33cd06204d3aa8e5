//! Qubit identity, grid sites, and coarse amplitude bookkeeping.

use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Unique identifier for a qubit within a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// A grid site `(i, j)`.
///
/// Row `i` counts from the bottom edge of the device, column `j` from the
/// left. Coordinates are signed so that neighbor arithmetic (`i - 1`,
/// `j - 1`) never wraps; out-of-grid sites are rejected by the model, not
/// by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Site {
    /// Row index (0 = bottom edge).
    pub i: i32,
    /// Column index (0 = left edge).
    pub j: i32,
}

impl Site {
    /// Create a site from row and column.
    pub fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// The diagonal offset `j - i` indexing this site's bias line.
    pub fn diagonal(&self) -> i32 {
        self.j - self.i
    }

    /// The site shifted by `(di, dj)`.
    pub fn shifted(&self, di: i32, dj: i32) -> Self {
        Self {
            i: self.i + di,
            j: self.j + dj,
        }
    }

    /// Whether this site lies on the checkerboard parity that may hold a
    /// qubit in the idle layout.
    pub fn qubit_parity(&self) -> bool {
        (self.i + self.j).rem_euclid(2) == 0
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// Rotation axis for a single-qubit pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationAxis {
    /// Rotation about X.
    X,
    /// Rotation about Y.
    Y,
    /// Rotation about Z.
    Z,
}

impl fmt::Display for RotationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationAxis::X => write!(f, "x"),
            RotationAxis::Y => write!(f, "y"),
            RotationAxis::Z => write!(f, "z"),
        }
    }
}

/// Coarse two-amplitude bookkeeping for a qubit.
///
/// This is *not* a physically accurate state: it tracks a single `(α, β)`
/// pair per qubit so that rotations, collapse, and the ancilla "known
/// basis state" precondition can be expressed. Entanglement is not
/// modeled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QubitState {
    alpha: Complex64,
    beta: Complex64,
}

impl QubitState {
    /// The |0⟩ state.
    pub fn zero() -> Self {
        Self {
            alpha: Complex64::new(1.0, 0.0),
            beta: Complex64::new(0.0, 0.0),
        }
    }

    /// The |1⟩ state.
    pub fn one() -> Self {
        Self {
            alpha: Complex64::new(0.0, 0.0),
            beta: Complex64::new(1.0, 0.0),
        }
    }

    /// An arbitrary amplitude pair. The caller is responsible for
    /// normalization; the model never renormalizes.
    pub fn new(alpha: Complex64, beta: Complex64) -> Self {
        Self { alpha, beta }
    }

    /// The |0⟩ amplitude.
    pub fn alpha(&self) -> Complex64 {
        self.alpha
    }

    /// The |1⟩ amplitude.
    pub fn beta(&self) -> Complex64 {
        self.beta
    }

    /// Whether the state is exactly |0⟩ or |1⟩.
    pub fn is_basis(&self) -> bool {
        let a = self.alpha.norm_sqr();
        let b = self.beta.norm_sqr();
        (a == 1.0 && b == 0.0) || (a == 0.0 && b == 1.0)
    }

    /// Apply a rotation of `theta` radians about `axis`.
    pub fn rotate(&mut self, axis: RotationAxis, theta: f64) {
        let half = theta / 2.0;
        let (c, s) = (half.cos(), half.sin());
        let i = Complex64::new(0.0, 1.0);
        let (alpha, beta) = (self.alpha, self.beta);
        match axis {
            RotationAxis::X => {
                self.alpha = c * alpha - i * s * beta;
                self.beta = -i * s * alpha + c * beta;
            }
            RotationAxis::Y => {
                self.alpha = c * alpha - s * beta;
                self.beta = s * alpha + c * beta;
            }
            RotationAxis::Z => {
                self.alpha = (-i * half).exp() * alpha;
                self.beta = (i * half).exp() * beta;
            }
        }
    }

    /// Collapse to the dominant basis state and return the outcome
    /// (`true` = |1⟩). Deterministic by design: runs stay reproducible.
    pub fn collapse(&mut self) -> bool {
        let one = self.beta.norm_sqr() >= self.alpha.norm_sqr();
        *self = if one { Self::one() } else { Self::zero() };
        one
    }
}

/// A qubit: identity, coarse state, current site, and the ancilla flag.
///
/// Ancilla qubits are disposable measurement partners; data qubits carry
/// program state. The position field is updated exclusively through
/// [`crate::CrossbarModel::move_qubit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qubit {
    /// The unique identifier.
    pub id: QubitId,
    /// Coarse amplitude bookkeeping.
    pub state: QubitState,
    /// Current site.
    pub site: Site,
    /// Whether this is an ancilla qubit.
    pub ancilla: bool,
}

impl Qubit {
    /// Create a new qubit.
    pub fn new(id: QubitId, state: QubitState, site: Site, ancilla: bool) -> Self {
        Self {
            id,
            state,
            site,
            ancilla,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_site_diagonal() {
        assert_eq!(Site::new(0, 0).diagonal(), 0);
        assert_eq!(Site::new(2, 0).diagonal(), -2);
        assert_eq!(Site::new(0, 3).diagonal(), 3);
    }

    #[test]
    fn test_site_parity() {
        assert!(Site::new(0, 0).qubit_parity());
        assert!(!Site::new(0, 1).qubit_parity());
        assert!(Site::new(1, 1).qubit_parity());
    }

    #[test]
    fn test_basis_detection() {
        assert!(QubitState::zero().is_basis());
        assert!(QubitState::one().is_basis());
        let mut s = QubitState::zero();
        s.rotate(RotationAxis::X, PI / 2.0);
        assert!(!s.is_basis());
    }

    #[test]
    fn test_x_pi_flips() {
        let mut s = QubitState::zero();
        s.rotate(RotationAxis::X, PI);
        // Up to global phase, X(π)|0⟩ = |1⟩.
        assert!(s.alpha().norm_sqr() < 1e-12);
        assert!((s.beta().norm_sqr() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collapse_is_deterministic() {
        let mut s = QubitState::one();
        s.rotate(RotationAxis::Z, PI / 3.0);
        assert!(s.collapse());
        assert_eq!(s, QubitState::one());

        let mut s = QubitState::zero();
        assert!(!s.collapse());
        assert_eq!(s, QubitState::zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", QubitId(3)), "q3");
        assert_eq!(format!("{}", Site::new(1, 2)), "(1, 2)");
    }
}
