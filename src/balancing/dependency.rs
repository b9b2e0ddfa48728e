//! Construction of the dependency matrix Q.
//!
//! Q expresses every modeled quantity as a linear combination of the basis:
//! the top |θ| rows are the identity, and each derived-kind address
//! contributes one further row obtained by expanding the kind's recipe over
//! the network. Q* is a row-selection of Q at the observed addresses.

use nalgebra::DMatrix;

use crate::catalog::{Attachment, QuantityCatalog, RecipeSlot, StoichVariant};
use crate::error::BalanceError;
use crate::network::NetworkIndex;
use crate::observations::QuantityAddress;

use super::basis::BasisLayout;

/// Build Q with one row per extended address and one column per θ entry.
pub fn build_dependency_matrix(
    catalog: &QuantityCatalog,
    network: &NetworkIndex,
    layout: &BasisLayout,
) -> DMatrix<f64> {
    let n_theta = layout.len_theta();
    let mut q = DMatrix::zeros(layout.len_extended(), n_theta);

    // Identity over the basis.
    for i in 0..n_theta {
        q[(i, i)] = 1.0;
    }

    for (row, address) in layout.extended_addresses().iter().enumerate().skip(n_theta) {
        let recipe = catalog
            .recipe(address.kind)
            .expect("extended rows beyond θ are derived kinds");

        for basic in crate::catalog::QuantityKind::BASIC {
            let slot = recipe.slot(basic);
            if matches!(slot, RecipeSlot::Zero) {
                continue;
            }
            let offset = layout
                .theta_offset(basic)
                .expect("recipe dependencies are enabled in θ");

            match slot {
                RecipeSlot::Zero => {}
                RecipeSlot::Identity => {
                    let position = match catalog.attachment(basic) {
                        Attachment::Reaction => address.reaction,
                        Attachment::Species => address.species,
                        Attachment::ReactionSpecies => None,
                    }
                    .expect("identity slot attachment matches the derived address");
                    q[(row, offset + position)] = 1.0;
                }
                RecipeSlot::Stoich(factor, variant) => {
                    expand_stoich(&mut q, row, offset, *factor, *variant, address, network);
                }
            }
        }
    }

    q
}

/// Fill one stoichiometric slot of a derived row.
fn expand_stoich(
    q: &mut DMatrix<f64>,
    row: usize,
    offset: usize,
    factor: f64,
    variant: StoichVariant,
    address: &QuantityAddress,
    network: &NetworkIndex,
) {
    match variant {
        // Signed stoichiometry over the species columns of this block.
        StoichVariant::A | StoichVariant::Ab => {
            let r = address.reaction.expect("stoichiometric slots attach to a reaction");
            for &(s, coeff) in network.reactants_of(r) {
                q[(row, offset + s)] -= factor * coeff;
            }
            for &(s, coeff) in network.products_of(r) {
                q[(row, offset + s)] += factor * coeff;
            }
        }
        // Signed stoichiometry over the Michaelis-pair columns of the
        // current reaction.
        StoichVariant::Z => {
            let r = address.reaction.expect("Z slots attach to a reaction");
            for (p, &(rp, sp)) in network.michaelis_pairs().iter().enumerate() {
                if rp == r {
                    q[(row, offset + p)] = factor * network.net_stoichiometry(r, sp);
                }
            }
        }
        // Single diagonal entry for the attached species.
        StoichVariant::One => {
            let s = address.species.expect("ONE slots attach to a species");
            q[(row, offset + s)] = factor;
        }
    }
}

/// Row-select Q at the given addresses to form Q*.
///
/// The caller guarantees every address is present in the layout; a miss is
/// an internal invariant violation.
pub fn select_rows(
    q: &DMatrix<f64>,
    layout: &BasisLayout,
    addresses: &[QuantityAddress],
) -> Result<DMatrix<f64>, BalanceError> {
    let mut selected = DMatrix::zeros(addresses.len(), q.ncols());
    for (i, address) in addresses.iter().enumerate() {
        let row = layout.row_of(address).ok_or_else(|| {
            BalanceError::DimensionMismatch(format!(
                "observed address {:?} has no dependency row",
                address
            ))
        })?;
        selected.set_row(i, &q.row(row));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{QuantityCatalog, QuantityKind, RT_INV};
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
        (QuantityCatalog::new(298.15), NetworkIndex::new(&model))
    }

    #[test]
    fn test_identity_block() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let q = build_dependency_matrix(&catalog, &network, &layout);

        for i in 0..layout.len_theta() {
            for j in 0..layout.len_theta() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(q[(i, j)], expected);
            }
        }
    }

    #[test]
    fn test_equilibrium_constant_row() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let q = build_dependency_matrix(&catalog, &network, &layout);

        let keq = QuantityAddress::reaction(QuantityKind::EquilibriumConstant, 0);
        let row = layout.row_of(&keq).unwrap();
        let mu0 = layout
            .theta_offset(QuantityKind::StandardChemicalPotential)
            .unwrap();

        // ln K_eq = -(μ°_B - μ°_A) / RT.
        assert!((q[(row, mu0)] - RT_INV).abs() < 1e-12);
        assert!((q[(row, mu0 + 1)] + RT_INV).abs() < 1e-12);
    }

    #[test]
    fn test_haldane_holds_row_wise() {
        // ln K_eq = ln kcat⁺ - ln kcat⁻ + Σ ν ln K_M must hold as an
        // identity between rows of Q, for any θ.
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let q = build_dependency_matrix(&catalog, &network, &layout);

        let row_of = |kind| layout.row_of(&QuantityAddress::reaction(kind, 0)).unwrap();
        let keq = q.row(row_of(QuantityKind::EquilibriumConstant));
        let fwd = q.row(row_of(QuantityKind::SubstrateCatalyticRate));
        let rev = q.row(row_of(QuantityKind::ProductCatalyticRate));

        let km_offset = layout.theta_offset(QuantityKind::MichaelisConstant).unwrap();
        let mut km_sum = nalgebra::RowDVector::zeros(layout.len_theta());
        for (p, &(rp, sp)) in network.michaelis_pairs().iter().enumerate() {
            assert_eq!(rp, 0);
            km_sum[km_offset + p] = network.net_stoichiometry(rp, sp);
        }

        let residual = keq - (fwd - rev + km_sum);
        assert!(residual.amax() < 1e-12, "Haldane residual {:?}", residual);
    }

    #[test]
    fn test_maximal_velocity_row_adds_enzyme() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let q = build_dependency_matrix(&catalog, &network, &layout);

        let fwd_rate = layout
            .row_of(&QuantityAddress::reaction(QuantityKind::SubstrateCatalyticRate, 0))
            .unwrap();
        let fwd_vmax = layout
            .row_of(&QuantityAddress::reaction(QuantityKind::ForwardMaximalVelocity, 0))
            .unwrap();
        let u_offset = layout.theta_offset(QuantityKind::EnzymeConcentration).unwrap();

        let mut expected = q.row(fwd_rate).clone_owned();
        expected[u_offset] += 1.0;
        let diff = q.row(fwd_vmax) - expected;
        assert!(diff.amax() < 1e-12);
    }

    #[test]
    fn test_affinity_row() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let q = build_dependency_matrix(&catalog, &network, &layout);

        let row = layout
            .row_of(&QuantityAddress::reaction(QuantityKind::ReactionAffinity, 0))
            .unwrap();
        let mu0 = layout.theta_offset(QuantityKind::StandardChemicalPotential).unwrap();
        let c = layout.theta_offset(QuantityKind::Concentration).unwrap();
        let rt = catalog.rt();

        // A = -Σ ν (μ° + RT ln c): A gets +1/-1 on potentials, ±RT on logs.
        assert!((q[(row, mu0)] - 1.0).abs() < 1e-12);
        assert!((q[(row, mu0 + 1)] + 1.0).abs() < 1e-12);
        assert!((q[(row, c)] - rt).abs() < 1e-12);
        assert!((q[(row, c + 1)] + rt).abs() < 1e-12);
    }

    #[test]
    fn test_chemical_potential_row() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let q = build_dependency_matrix(&catalog, &network, &layout);

        let row = layout
            .row_of(&QuantityAddress::species(QuantityKind::ChemicalPotential, 1))
            .unwrap();
        let mu0 = layout.theta_offset(QuantityKind::StandardChemicalPotential).unwrap();
        let c = layout.theta_offset(QuantityKind::Concentration).unwrap();

        // μ_B = μ°_B + RT ln c_B.
        assert_eq!(q[(row, mu0 + 1)], 1.0);
        assert!((q[(row, c + 1)] - catalog.rt()).abs() < 1e-12);
        assert_eq!(q[(row, mu0)], 0.0);
    }

    #[test]
    fn test_select_rows_matches_q() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let q = build_dependency_matrix(&catalog, &network, &layout);

        let addresses = vec![
            QuantityAddress::reaction(QuantityKind::EquilibriumConstant, 0),
            QuantityAddress::species(QuantityKind::Concentration, 0),
        ];
        let selected = select_rows(&q, &layout, &addresses).unwrap();
        assert_eq!(selected.nrows(), 2);
        for (i, addr) in addresses.iter().enumerate() {
            let row = layout.row_of(addr).unwrap();
            assert_eq!(selected.row(i), q.row(row));
        }
    }
}
