//! Dependency recipes for derived quantity kinds.
//!
//! A recipe is an ordered 7-tuple, one slot per basic kind in global order.
//! Expanding a recipe over a derived kind's attachment set yields the rows of
//! the dependency matrix that express that kind as a linear combination of
//! the basis (log scale for multiplicative kinds, natural scale for
//! thermodynamic potentials).

use super::{QuantityKind, RT_INV};

/// How a stoichiometric slot populates its column block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoichVariant {
    /// Signed stoichiometry over species columns (products positive,
    /// reactants negative).
    A,
    /// Arithmetically identical to `A`; marks couplings through current
    /// chemical potentials rather than standard ones.
    Ab,
    /// Signed stoichiometry over Michaelis-pair columns of the current
    /// reaction (reactants negative, products positive, zero elsewhere).
    Z,
    /// Single entry on the diagonal of the attached element's block.
    One,
}

/// One slot of a recipe, covering the column block of one basic kind.
#[derive(Debug, Clone, Copy)]
pub enum RecipeSlot {
    /// No contribution from this basic kind.
    Zero,
    /// Row indicator selecting the attached element within the block.
    Identity,
    /// Stoichiometry-driven contribution scaled by a real factor.
    Stoich(f64, StoichVariant),
}

/// Ordered per-basic-kind contributions of one derived kind.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub slots: [RecipeSlot; 7],
}

impl Recipe {
    /// Slot covering the column block of `basic`, which must be one of the
    /// seven basic kinds.
    pub fn slot(&self, basic: QuantityKind) -> &RecipeSlot {
        &self.slots[basic as usize]
    }

    /// Basic kinds this recipe actually draws on.
    pub fn dependencies(&self) -> impl Iterator<Item = QuantityKind> + '_ {
        QuantityKind::BASIC
            .iter()
            .copied()
            .filter(|k| !matches!(self.slot(*k), RecipeSlot::Zero))
    }
}

/// The fixed recipe table.
///
/// `rt` is RT at the configured temperature in kJ/mol; it scales only the
/// couplings through current chemical potentials. The couplings through
/// standard chemical potentials use the frozen reference [`RT_INV`].
pub fn recipe_for(kind: QuantityKind, rt: f64) -> Option<Recipe> {
    use RecipeSlot::*;
    use StoichVariant::*;

    // Slot order: μ°, k^V, k^M, k^A, k^I, u, c
    let slots = match kind {
        QuantityKind::EquilibriumConstant => {
            [Stoich(-RT_INV, A), Zero, Zero, Zero, Zero, Zero, Zero]
        }
        QuantityKind::SubstrateCatalyticRate => [
            Stoich(-0.5 * RT_INV, A),
            Identity,
            Stoich(-0.5, Z),
            Zero,
            Zero,
            Zero,
            Zero,
        ],
        QuantityKind::ProductCatalyticRate => [
            Stoich(0.5 * RT_INV, A),
            Identity,
            Stoich(0.5, Z),
            Zero,
            Zero,
            Zero,
            Zero,
        ],
        QuantityKind::ForwardMaximalVelocity => [
            Stoich(-0.5 * RT_INV, A),
            Identity,
            Stoich(-0.5, Z),
            Zero,
            Zero,
            Identity,
            Zero,
        ],
        QuantityKind::ReverseMaximalVelocity => [
            Stoich(0.5 * RT_INV, A),
            Identity,
            Stoich(0.5, Z),
            Zero,
            Zero,
            Identity,
            Zero,
        ],
        QuantityKind::ChemicalPotential => {
            [Identity, Zero, Zero, Zero, Zero, Zero, Stoich(rt, One)]
        }
        QuantityKind::ReactionAffinity => {
            [Stoich(-1.0, A), Zero, Zero, Zero, Zero, Zero, Stoich(-rt, Ab)]
        }
        _ => return None,
    };

    Some(Recipe { slots })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalytic_rate_recipes_are_mirrored() {
        let fwd = recipe_for(QuantityKind::SubstrateCatalyticRate, 2.4943).unwrap();
        let rev = recipe_for(QuantityKind::ProductCatalyticRate, 2.4943).unwrap();

        let (ff, fr) = match (
            fwd.slot(QuantityKind::StandardChemicalPotential),
            rev.slot(QuantityKind::StandardChemicalPotential),
        ) {
            (RecipeSlot::Stoich(a, _), RecipeSlot::Stoich(b, _)) => (*a, *b),
            _ => panic!("expected stoichiometric potential slots"),
        };
        assert!((ff + fr).abs() < 1e-15);
        assert!((ff + 0.5 * RT_INV).abs() < 1e-15);

        // Michaelis slots carry the half factors with opposite signs.
        match (
            fwd.slot(QuantityKind::MichaelisConstant),
            rev.slot(QuantityKind::MichaelisConstant),
        ) {
            (RecipeSlot::Stoich(a, StoichVariant::Z), RecipeSlot::Stoich(b, StoichVariant::Z)) => {
                assert!((a + 0.5).abs() < 1e-15);
                assert!((b - 0.5).abs() < 1e-15);
            }
            _ => panic!("expected Z slots"),
        }
    }

    #[test]
    fn test_maximal_velocity_adds_enzyme_level() {
        let vmax = recipe_for(QuantityKind::ForwardMaximalVelocity, 2.4943).unwrap();
        assert!(matches!(
            vmax.slot(QuantityKind::EnzymeConcentration),
            RecipeSlot::Identity
        ));

        let deps: Vec<QuantityKind> = vmax.dependencies().collect();
        assert_eq!(
            deps,
            vec![
                QuantityKind::StandardChemicalPotential,
                QuantityKind::CatalyticRateGeometricMean,
                QuantityKind::MichaelisConstant,
                QuantityKind::EnzymeConcentration,
            ]
        );
    }

    #[test]
    fn test_affinity_couples_through_both_potentials() {
        let affinity = recipe_for(QuantityKind::ReactionAffinity, 2.4943).unwrap();
        match affinity.slot(QuantityKind::StandardChemicalPotential) {
            RecipeSlot::Stoich(f, StoichVariant::A) => assert!((f + 1.0).abs() < 1e-15),
            _ => panic!("expected A slot on standard potentials"),
        }
        match affinity.slot(QuantityKind::Concentration) {
            RecipeSlot::Stoich(f, StoichVariant::Ab) => assert!((f + 2.4943).abs() < 1e-12),
            _ => panic!("expected AB slot on concentrations"),
        }
    }
}
