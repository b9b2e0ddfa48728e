//! Serde-side representation of the reaction network document.

use serde::{Deserialize, Serialize};

/// One chemical species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    /// Stable string identifier.
    pub id: String,
    /// Human-readable name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
}

/// A species participation with a non-negative stoichiometric coefficient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesRef {
    pub species: String,
    #[serde(default = "one")]
    pub stoichiometry: f64,
}

fn one() -> f64 {
    1.0
}

/// A modifier species with an integer role tag (SBO-style).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    pub species: String,
    /// Role tag; recognized activator and inhibitor tag sets are fixed,
    /// anything else leaves the modifier unclassified.
    #[serde(default)]
    pub role_tag: u32,
}

/// One reaction with ordered participant lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reactants: Vec<SpeciesRef>,
    #[serde(default)]
    pub products: Vec<SpeciesRef>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

/// The reaction network as read from disk. Species and reaction order is
/// insertion order and determines all downstream numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkModel {
    #[serde(default)]
    pub id: Option<String>,
    pub species: Vec<Species>,
    pub reactions: Vec<Reaction>,
}
