//! Reaction-network model and its deterministic indexing.
//!
//! The model is read once from a JSON document (species, reactions with
//! stoichiometries, modifiers with integer role tags) and indexed into dense
//! per-reaction structures that the balancing stages consume read-only.

mod index;
mod model;
mod reader;

pub use index::{NetworkIndex, ACTIVATOR_TAGS, INHIBITOR_TAGS};
pub use model::{NetworkModel, Modifier, Reaction, Species, SpeciesRef};
pub use reader::read_network;
