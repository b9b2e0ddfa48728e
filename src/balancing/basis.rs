//! Layout of the independent basis θ and the extended quantity vector q.
//!
//! Both vectors concatenate kind blocks in the global catalog order. Basic
//! kinds span θ; q covers the basic entries (in the same order) followed by
//! one entry per derived-kind address. The layout owns the forward ordering
//! and the reverse map from address to row.

use std::collections::HashMap;

use crate::catalog::{Attachment, QuantityCatalog, QuantityKind, Role};
use crate::network::NetworkIndex;
use crate::observations::QuantityAddress;

/// Ordered address layout for one balancing run.
#[derive(Debug)]
pub struct BasisLayout {
    theta: Vec<QuantityAddress>,
    extended: Vec<QuantityAddress>,
    theta_offsets: HashMap<QuantityKind, usize>,
    row_index: HashMap<QuantityAddress, usize>,
    enabled_basic: Vec<QuantityKind>,
    enabled_derived: Vec<QuantityKind>,
}

impl BasisLayout {
    /// Build the layout for the enabled kinds.
    ///
    /// Enabled derived kinds pull the basic kinds their recipes depend on
    /// into θ even when those are not requested in the output.
    pub fn new(
        catalog: &QuantityCatalog,
        network: &NetworkIndex,
        requested: &[QuantityKind],
    ) -> Self {
        let mut basic_needed: Vec<QuantityKind> = Vec::new();
        let mut enabled_derived: Vec<QuantityKind> = Vec::new();

        for kind in QuantityKind::ALL {
            if !requested.contains(&kind) {
                continue;
            }
            match catalog.spec(kind).role {
                Role::Basic => {
                    if !basic_needed.contains(&kind) {
                        basic_needed.push(kind);
                    }
                }
                Role::Derived => {
                    enabled_derived.push(kind);
                    let recipe = catalog.recipe(kind).expect("derived kind has a recipe");
                    for dep in recipe.dependencies() {
                        if !basic_needed.contains(&dep) {
                            basic_needed.push(dep);
                        }
                    }
                }
            }
        }
        basic_needed.sort();

        let mut theta = Vec::new();
        let mut theta_offsets = HashMap::new();
        for &kind in &basic_needed {
            theta_offsets.insert(kind, theta.len());
            theta.extend(addresses_for(catalog, network, kind));
        }

        let mut extended = theta.clone();
        for &kind in &enabled_derived {
            extended.extend(addresses_for(catalog, network, kind));
        }

        let row_index = extended
            .iter()
            .enumerate()
            .map(|(i, addr)| (*addr, i))
            .collect();

        Self {
            theta,
            extended,
            theta_offsets,
            row_index,
            enabled_basic: basic_needed,
            enabled_derived,
        }
    }

    /// Number of independent basis entries.
    pub fn len_theta(&self) -> usize {
        self.theta.len()
    }

    /// Number of modeled quantities (basic + derived).
    pub fn len_extended(&self) -> usize {
        self.extended.len()
    }

    pub fn theta_addresses(&self) -> &[QuantityAddress] {
        &self.theta
    }

    pub fn extended_addresses(&self) -> &[QuantityAddress] {
        &self.extended
    }

    /// Row of `address` in q (and in the dependency matrix).
    pub fn row_of(&self, address: &QuantityAddress) -> Option<usize> {
        self.row_index.get(address).copied()
    }

    /// First column of the θ block of a basic kind.
    pub fn theta_offset(&self, kind: QuantityKind) -> Option<usize> {
        self.theta_offsets.get(&kind).copied()
    }

    pub fn enabled_basic(&self) -> &[QuantityKind] {
        &self.enabled_basic
    }

    pub fn enabled_derived(&self) -> &[QuantityKind] {
        &self.enabled_derived
    }
}

/// Attachment set of one kind, in deterministic order.
fn addresses_for(
    catalog: &QuantityCatalog,
    network: &NetworkIndex,
    kind: QuantityKind,
) -> Vec<QuantityAddress> {
    match catalog.attachment(kind) {
        Attachment::Species => (0..network.n_species())
            .map(|s| QuantityAddress::species(kind, s))
            .collect(),
        Attachment::Reaction => (0..network.n_reactions())
            .map(|r| QuantityAddress::reaction(kind, r))
            .collect(),
        Attachment::ReactionSpecies => {
            let pairs = match kind {
                QuantityKind::MichaelisConstant => network.michaelis_pairs(),
                QuantityKind::ActivationConstant => network.activation_pairs(),
                QuantityKind::InhibitoryConstant => network.inhibition_pairs(),
                _ => &[],
            };
            pairs
                .iter()
                .map(|&(r, s)| QuantityAddress::pair(kind, r, s))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkModel;

    fn setup() -> (QuantityCatalog, NetworkIndex) {
        let model: NetworkModel = serde_json::from_str(
            r#"{
                "species": [{"id": "A"}, {"id": "B"}],
                "reactions": [{
                    "id": "r1",
                    "reactants": [{"species": "A"}],
                    "products": [{"species": "B"}]
                }]
            }"#,
        )
        .unwrap();
        (QuantityCatalog::new(300.0), NetworkIndex::new(&model))
    }

    #[test]
    fn test_full_layout_dimensions() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);

        // θ: 2 μ° + 1 k^V + 2 k^M + 0 k^A + 0 k^I + 1 u + 2 c = 8.
        assert_eq!(layout.len_theta(), 8);
        // q adds K_eq, kcat±, vmax± (1 each), μ (2), A (1) = 8 + 8.
        assert_eq!(layout.len_extended(), 16);
    }

    #[test]
    fn test_basic_entries_lead_in_global_order(){
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);

        let kinds: Vec<QuantityKind> =
            layout.theta_addresses().iter().map(|a| a.kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted, "θ blocks must follow the global kind order");

        // q starts with θ verbatim.
        assert_eq!(
            layout.extended_addresses()[..layout.len_theta()],
            layout.theta_addresses()[..]
        );
    }

    #[test]
    fn test_derived_kind_pulls_dependencies() {
        let (catalog, network) = setup();
        // Request only the equilibrium constant: μ° must appear in θ.
        let layout =
            BasisLayout::new(&catalog, &network, &[QuantityKind::EquilibriumConstant]);
        assert_eq!(layout.enabled_basic(), &[QuantityKind::StandardChemicalPotential]);
        assert_eq!(layout.len_theta(), 2);
        assert_eq!(layout.len_extended(), 3);
    }

    #[test]
    fn test_row_lookup() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);

        for (i, addr) in layout.extended_addresses().iter().enumerate() {
            assert_eq!(layout.row_of(addr), Some(i));
        }
        let missing = QuantityAddress::reaction(QuantityKind::EquilibriumConstant, 7);
        assert_eq!(layout.row_of(&missing), None);
    }
}
