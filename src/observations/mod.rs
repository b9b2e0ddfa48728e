//! Observed biochemical values and their addressing.

mod normalize;

pub use normalize::{BoundaryPolicy, InputNormalizer, NormalizedInput};

use serde::{Deserialize, Serialize};

use crate::catalog::QuantityKind;
use crate::network::NetworkIndex;

/// Deterministic key identifying one modeled quantity.
///
/// Species-attached kinds carry a species index, reaction-attached kinds a
/// reaction index, reaction-species kinds both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantityAddress {
    pub kind: QuantityKind,
    pub reaction: Option<usize>,
    pub species: Option<usize>,
}

impl QuantityAddress {
    pub fn species(kind: QuantityKind, species: usize) -> Self {
        Self { kind, reaction: None, species: Some(species) }
    }

    pub fn reaction(kind: QuantityKind, reaction: usize) -> Self {
        Self { kind, reaction: Some(reaction), species: None }
    }

    pub fn pair(kind: QuantityKind, reaction: usize, species: usize) -> Self {
        Self { kind, reaction: Some(reaction), species: Some(species) }
    }

    /// Total order key: global kind order, then reaction, then species.
    pub fn sort_key(&self) -> (usize, usize, usize) {
        (
            self.kind as usize,
            self.reaction.map_or(0, |r| r + 1),
            self.species.map_or(0, |s| s + 1),
        )
    }

    /// Human-readable label for logs.
    pub fn label(&self, network: &NetworkIndex) -> String {
        let mut label = self.kind.name().to_string();
        if let Some(r) = self.reaction {
            label.push_str(&format!(" [{}]", network.reaction_id(r)));
        }
        if let Some(s) = self.species {
            label.push_str(&format!(" [{}]", network.species_id(s)));
        }
        label
    }
}

/// One observation after normalization, on the natural scale.
#[derive(Debug, Clone)]
pub struct Observation {
    pub address: QuantityAddress,
    pub mean: f64,
    /// Always positive after normalization.
    pub std: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Raw observed-value row as read from the data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRow {
    pub kind: String,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    pub mean: f64,
    #[serde(default)]
    pub std: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
}
