//! JSON reader for the reaction network document.

use std::path::Path;

use super::NetworkModel;
use crate::error::BalanceError;

/// Read a network model from a JSON file.
///
/// Referential integrity is checked here so later stages can index blindly:
/// every reactant, product and modifier must name a declared species, and
/// species and reaction ids must be unique.
pub fn read_network<P: AsRef<Path>>(path: P) -> Result<NetworkModel, BalanceError> {
    let contents = std::fs::read_to_string(path.as_ref())
        .map_err(|e| BalanceError::InputShape(format!("{}: {}", path.as_ref().display(), e)))?;
    let model: NetworkModel = serde_json::from_str(&contents)
        .map_err(|e| BalanceError::InputShape(format!("{}: {}", path.as_ref().display(), e)))?;
    validate(&model)?;
    Ok(model)
}

fn validate(model: &NetworkModel) -> Result<(), BalanceError> {
    let mut seen = std::collections::HashSet::new();
    for species in &model.species {
        if !seen.insert(species.id.as_str()) {
            return Err(BalanceError::InputShape(format!(
                "duplicate species id '{}'",
                species.id
            )));
        }
    }

    let mut reaction_ids = std::collections::HashSet::new();
    for reaction in &model.reactions {
        if !reaction_ids.insert(reaction.id.as_str()) {
            return Err(BalanceError::InputShape(format!(
                "duplicate reaction id '{}'",
                reaction.id
            )));
        }
        let participants = reaction
            .reactants
            .iter()
            .chain(reaction.products.iter())
            .map(|r| r.species.as_str())
            .chain(reaction.modifiers.iter().map(|m| m.species.as_str()));
        for species in participants {
            if !seen.contains(species) {
                return Err(BalanceError::InputShape(format!(
                    "reaction '{}' references undeclared species '{}'",
                    reaction.id, species
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_undeclared_species() {
        let model: NetworkModel = serde_json::from_str(
            r#"{
                "species": [{"id": "A"}],
                "reactions": [{
                    "id": "r1",
                    "reactants": [{"species": "A"}],
                    "products": [{"species": "B"}]
                }]
            }"#,
        )
        .unwrap();
        assert!(matches!(validate(&model), Err(BalanceError::InputShape(_))));
    }

    #[test]
    fn test_accepts_well_formed_model() {
        let model: NetworkModel = serde_json::from_str(
            r#"{
                "species": [{"id": "A"}, {"id": "B"}, {"id": "E"}],
                "reactions": [{
                    "id": "r1",
                    "reactants": [{"species": "A", "stoichiometry": 1.0}],
                    "products": [{"species": "B"}],
                    "modifiers": [{"species": "E", "role_tag": 13}]
                }]
            }"#,
        )
        .unwrap();
        assert!(validate(&model).is_ok());
        assert_eq!(model.reactions[0].products[0].stoichiometry, 1.0);
    }
}
