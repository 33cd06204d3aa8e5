//! Device topology: grid dimensions, qubit counts, and optional explicit
//! placement.
//!
//! A `Topology` is consumed once at model construction (or on
//! `resize`/`reset`); the model never loads files itself. The struct
//! derives serde so hosts can read it from whatever configuration source
//! they use.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::qubit::{QubitId, Site};

/// Whether a placed qubit is a data qubit or an ancilla.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QubitKind {
    /// Carries program state.
    Data,
    /// Disposable measurement partner.
    Ancilla,
}

/// One entry of an explicit initial placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementEntry {
    /// The qubit id to create.
    pub id: QubitId,
    /// Data or ancilla.
    pub kind: QubitKind,
    /// Initial site.
    pub site: Site,
}

/// Grid dimensions and qubit population for a crossbar device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Number of rows.
    pub rows: i32,
    /// Number of columns.
    pub cols: i32,
    /// Number of data qubits to place.
    pub data_qubits: u32,
    /// Number of ancilla qubits to place.
    pub ancilla_qubits: u32,
    /// Explicit placement overriding the derived fill, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Vec<PlacementEntry>>,
}

impl Topology {
    /// A square grid with derived placement.
    pub fn square(size: i32, data_qubits: u32, ancilla_qubits: u32) -> Self {
        Self::grid(size, size, data_qubits, ancilla_qubits)
    }

    /// A rectangular grid with derived placement.
    pub fn grid(rows: i32, cols: i32, data_qubits: u32, ancilla_qubits: u32) -> Self {
        Self {
            rows,
            cols,
            data_qubits,
            ancilla_qubits,
            placement: None,
        }
    }

    /// Attach an explicit placement map.
    #[must_use]
    pub fn with_placement(mut self, placement: Vec<PlacementEntry>) -> Self {
        self.placement = Some(placement);
        self
    }

    /// Total number of qubits requested.
    pub fn num_qubits(&self) -> u32 {
        self.data_qubits + self.ancilla_qubits
    }

    /// Whether the derived checkerboard ("idle") fill can hold the
    /// requested population; otherwise the dense row-major fill is used.
    pub fn fits_idle_fill(&self) -> bool {
        let even_sites =
            (self.rows as u64).div_ceil(2) as i64 * (self.cols as u64).div_ceil(2) as i64;
        let odd_sites = (self.rows as i64 / 2) * (self.cols as i64 / 2);
        i64::from(self.data_qubits) <= even_sites && i64::from(self.ancilla_qubits) <= odd_sites
    }

    /// Validate dimensions, counts, and any explicit placement.
    pub fn validate(&self) -> ModelResult<()> {
        if self.rows < 2 || self.cols < 2 {
            return Err(ModelError::InvalidTopology(format!(
                "grid must be at least 2x2, got {}x{}",
                self.rows, self.cols
            )));
        }
        let sites = i64::from(self.rows as u32) * i64::from(self.cols as u32);
        if i64::from(self.num_qubits()) > sites {
            return Err(ModelError::InvalidTopology(format!(
                "{} qubits cannot fit on {} sites",
                self.num_qubits(),
                sites
            )));
        }
        if let Some(placement) = &self.placement {
            if placement.len() as u32 != self.num_qubits() {
                return Err(ModelError::InvalidTopology(format!(
                    "placement lists {} qubits but topology declares {}",
                    placement.len(),
                    self.num_qubits()
                )));
            }
            let mut seen_ids = rustc_hash::FxHashSet::default();
            let mut seen_sites = rustc_hash::FxHashSet::default();
            for entry in placement {
                if entry.site.i < 0
                    || entry.site.i >= self.rows
                    || entry.site.j < 0
                    || entry.site.j >= self.cols
                {
                    return Err(ModelError::InvalidTopology(format!(
                        "placement site {} outside the grid",
                        entry.site
                    )));
                }
                if !seen_ids.insert(entry.id) {
                    return Err(ModelError::InvalidTopology(format!(
                        "duplicate qubit id {} in placement",
                        entry.id
                    )));
                }
                if !seen_sites.insert(entry.site) {
                    return Err(ModelError::InvalidTopology(format!(
                        "two qubits placed on site {}",
                        entry.site
                    )));
                }
            }
        }
        Ok(())
    }
}
