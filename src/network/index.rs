//! Deterministic numbering and per-reaction lookup structures.

use std::collections::HashMap;

use super::NetworkModel;

/// Role tags classifying a modifier as an activator.
pub const ACTIVATOR_TAGS: [u32; 5] = [13, 21, 459, 461, 462];

/// Role tags classifying a modifier as an inhibitor.
pub const INHIBITOR_TAGS: [u32; 5] = [20, 206, 207, 536, 537];

/// Dense index over a network model.
///
/// Species and reactions are numbered in insertion order. The Michaelis,
/// activation and inhibition pair lists enumerate the reaction-species pairs
/// that actually require a constant, reaction-first, with each reaction's
/// reactants preceding its products (participant order preserved).
#[derive(Debug)]
pub struct NetworkIndex {
    species_ids: Vec<String>,
    reaction_ids: Vec<String>,
    species_index: HashMap<String, usize>,
    reaction_index: HashMap<String, usize>,
    reactants_of: Vec<Vec<(usize, f64)>>,
    products_of: Vec<Vec<(usize, f64)>>,
    activators_of: Vec<Vec<usize>>,
    inhibitors_of: Vec<Vec<usize>>,
    michaelis_pairs: Vec<(usize, usize)>,
    activation_pairs: Vec<(usize, usize)>,
    inhibition_pairs: Vec<(usize, usize)>,
    warnings: Vec<String>,
}

impl NetworkIndex {
    /// Index a model. Structural oddities (modifier-only species, apparent
    /// biomass reactions) are recorded as warnings, not errors.
    pub fn new(model: &NetworkModel) -> Self {
        let species_ids: Vec<String> = model.species.iter().map(|s| s.id.clone()).collect();
        let reaction_ids: Vec<String> = model.reactions.iter().map(|r| r.id.clone()).collect();

        let species_index: HashMap<String, usize> = species_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let reaction_index: HashMap<String, usize> = reaction_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut reactants_of = Vec::with_capacity(model.reactions.len());
        let mut products_of = Vec::with_capacity(model.reactions.len());
        let mut activators_of = Vec::with_capacity(model.reactions.len());
        let mut inhibitors_of = Vec::with_capacity(model.reactions.len());
        let mut michaelis_pairs = Vec::new();
        let mut activation_pairs = Vec::new();
        let mut inhibition_pairs = Vec::new();
        let mut warnings = Vec::new();

        let mut appears_as_participant = vec![false; species_ids.len()];
        let mut appears_as_modifier = vec![false; species_ids.len()];

        for (r, reaction) in model.reactions.iter().enumerate() {
            let reactants: Vec<(usize, f64)> = reaction
                .reactants
                .iter()
                .map(|p| (species_index[&p.species], p.stoichiometry))
                .collect();
            let products: Vec<(usize, f64)> = reaction
                .products
                .iter()
                .map(|p| (species_index[&p.species], p.stoichiometry))
                .collect();

            // Reactants first, then products; a species on both sides gets
            // a single pair (its net stoichiometry is used downstream).
            let mut in_reaction: Vec<usize> = Vec::new();
            for &(s, _) in reactants.iter().chain(products.iter()) {
                appears_as_participant[s] = true;
                if !in_reaction.contains(&s) {
                    in_reaction.push(s);
                    michaelis_pairs.push((r, s));
                }
            }

            let mut activators = Vec::new();
            let mut inhibitors = Vec::new();
            for modifier in &reaction.modifiers {
                let s = species_index[&modifier.species];
                appears_as_modifier[s] = true;
                if ACTIVATOR_TAGS.contains(&modifier.role_tag) {
                    activators.push(s);
                    activation_pairs.push((r, s));
                } else if INHIBITOR_TAGS.contains(&modifier.role_tag) {
                    inhibitors.push(s);
                    inhibition_pairs.push((r, s));
                }
            }

            let label = reaction.name.as_deref().unwrap_or(&reaction.id);
            if label.to_lowercase().contains("biomass") {
                warnings.push(format!(
                    "reaction '{}' looks like a biomass reaction; kinetic constants for it are unlikely to be meaningful",
                    reaction.id
                ));
            }

            reactants_of.push(reactants);
            products_of.push(products);
            activators_of.push(activators);
            inhibitors_of.push(inhibitors);
        }

        for (s, id) in species_ids.iter().enumerate() {
            if appears_as_modifier[s] && !appears_as_participant[s] {
                warnings.push(format!(
                    "species '{}' appears only as a modifier; it may be a misclassified enzyme",
                    id
                ));
            }
        }

        Self {
            species_ids,
            reaction_ids,
            species_index,
            reaction_index,
            reactants_of,
            products_of,
            activators_of,
            inhibitors_of,
            michaelis_pairs,
            activation_pairs,
            inhibition_pairs,
            warnings,
        }
    }

    pub fn n_species(&self) -> usize {
        self.species_ids.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.reaction_ids.len()
    }

    pub fn species_id(&self, s: usize) -> &str {
        &self.species_ids[s]
    }

    pub fn reaction_id(&self, r: usize) -> &str {
        &self.reaction_ids[r]
    }

    pub fn species_by_id(&self, id: &str) -> Option<usize> {
        self.species_index.get(id).copied()
    }

    pub fn reaction_by_id(&self, id: &str) -> Option<usize> {
        self.reaction_index.get(id).copied()
    }

    /// Reactants of reaction `r` as (species index, stoichiometry).
    pub fn reactants_of(&self, r: usize) -> &[(usize, f64)] {
        &self.reactants_of[r]
    }

    /// Products of reaction `r` as (species index, stoichiometry).
    pub fn products_of(&self, r: usize) -> &[(usize, f64)] {
        &self.products_of[r]
    }

    pub fn activators_of(&self, r: usize) -> &[usize] {
        &self.activators_of[r]
    }

    pub fn inhibitors_of(&self, r: usize) -> &[usize] {
        &self.inhibitors_of[r]
    }

    /// Net signed stoichiometry of species `s` in reaction `r`
    /// (products positive, reactants negative). Species on both sides
    /// contribute their net balance.
    pub fn net_stoichiometry(&self, r: usize, s: usize) -> f64 {
        let consumed: f64 = self.reactants_of[r]
            .iter()
            .filter(|(idx, _)| *idx == s)
            .map(|(_, coeff)| coeff)
            .sum();
        let produced: f64 = self.products_of[r]
            .iter()
            .filter(|(idx, _)| *idx == s)
            .map(|(_, coeff)| coeff)
            .sum();
        produced - consumed
    }

    /// Reaction-species pairs requiring a Michaelis constant.
    pub fn michaelis_pairs(&self) -> &[(usize, usize)] {
        &self.michaelis_pairs
    }

    /// Reaction-species pairs requiring an activation constant.
    pub fn activation_pairs(&self) -> &[(usize, usize)] {
        &self.activation_pairs
    }

    /// Reaction-species pairs requiring an inhibitory constant.
    pub fn inhibition_pairs(&self) -> &[(usize, usize)] {
        &self.inhibition_pairs
    }

    /// Structural warnings gathered during indexing.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkModel;

    fn two_step_model() -> NetworkModel {
        serde_json::from_str(
            r#"{
                "species": [{"id": "A"}, {"id": "B"}, {"id": "C"}, {"id": "act"}, {"id": "inh"}, {"id": "lone"}],
                "reactions": [
                    {
                        "id": "r1",
                        "reactants": [{"species": "A"}],
                        "products": [{"species": "B"}],
                        "modifiers": [
                            {"species": "act", "role_tag": 459},
                            {"species": "inh", "role_tag": 206},
                            {"species": "lone", "role_tag": 999}
                        ]
                    },
                    {
                        "id": "r2",
                        "reactants": [{"species": "B"}, {"species": "act"}],
                        "products": [{"species": "C", "stoichiometry": 2.0}],
                        "modifiers": [{"species": "inh", "role_tag": 537}]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_michaelis_pairs_reaction_first_reactants_then_products() {
        let index = NetworkIndex::new(&two_step_model());
        let pairs: Vec<(usize, usize)> = index.michaelis_pairs().to_vec();
        // r1: A then B; r2: B, act, then C.
        assert_eq!(pairs, vec![(0, 0), (0, 1), (1, 1), (1, 3), (1, 2)]);
    }

    #[test]
    fn test_modifier_classification() {
        let index = NetworkIndex::new(&two_step_model());
        assert_eq!(index.activators_of(0), &[3]);
        assert_eq!(index.inhibitors_of(0), &[4]);
        assert_eq!(index.activation_pairs(), &[(0, 3)]);
        assert_eq!(index.inhibition_pairs(), &[(0, 4), (1, 4)]);
    }

    #[test]
    fn test_unrecognized_tag_is_unclassified() {
        let index = NetworkIndex::new(&two_step_model());
        // 'lone' carries tag 999: neither activator nor inhibitor.
        assert!(!index.activation_pairs().iter().any(|&(_, s)| s == 5));
        assert!(!index.inhibition_pairs().iter().any(|&(_, s)| s == 5));
    }

    #[test]
    fn test_modifier_only_species_warns() {
        let index = NetworkIndex::new(&two_step_model());
        assert!(index.warnings().iter().any(|w| w.contains("inh")));
        assert!(index.warnings().iter().any(|w| w.contains("lone")));
        // 'act' participates in r2, so it must not be flagged.
        assert!(!index.warnings().iter().any(|w| w.contains("'act'")));
    }

    #[test]
    fn test_net_stoichiometry() {
        let index = NetworkIndex::new(&two_step_model());
        assert_eq!(index.net_stoichiometry(0, 0), -1.0);
        assert_eq!(index.net_stoichiometry(0, 1), 1.0);
        assert_eq!(index.net_stoichiometry(1, 2), 2.0);
        assert_eq!(index.net_stoichiometry(1, 0), 0.0);
    }

    #[test]
    fn test_biomass_hint() {
        let model: NetworkModel = serde_json::from_str(
            r#"{
                "species": [{"id": "X"}],
                "reactions": [{"id": "Biomass_core", "reactants": [{"species": "X"}]}]
            }"#,
        )
        .unwrap();
        let index = NetworkIndex::new(&model);
        assert!(index.warnings().iter().any(|w| w.contains("biomass")));
    }
}
