//! Kinetic-law emission from balanced parameters.
//!
//! Builds one modular rate law per reaction (reversible Michaelis-Menten in
//! convenience-kinetics form) with the balanced point estimates substituted
//! in. Activating and inhibiting modifiers contribute the usual hyperbolic
//! prefactors.
//!
//! Reference: Liebermeister W, Klipp E. Theor Biol Med Model. 2006;3:41

use std::collections::HashMap;

use crate::balancing::results::BalancedQuantity;
use crate::catalog::QuantityKind;
use crate::network::NetworkIndex;
use crate::observations::QuantityAddress;
use crate::tables::KineticLawRow;

/// Emit one convenience-kinetics law per reaction.
pub fn emit_kinetic_laws(
    network: &NetworkIndex,
    quantities: &[BalancedQuantity],
) -> Vec<KineticLawRow> {
    let modes: HashMap<QuantityAddress, f64> =
        quantities.iter().map(|q| (q.address, q.mode)).collect();

    (0..network.n_reactions())
        .map(|r| KineticLawRow {
            reaction: network.reaction_id(r).to_string(),
            law: "convenience kinetics".to_string(),
            expression: reaction_law(network, &modes, r),
        })
        .collect()
}

fn reaction_law(network: &NetworkIndex, modes: &HashMap<QuantityAddress, f64>, r: usize) -> String {
    let kcat_fwd = mode_of(modes, QuantityAddress::reaction(QuantityKind::SubstrateCatalyticRate, r));
    let kcat_rev = mode_of(modes, QuantityAddress::reaction(QuantityKind::ProductCatalyticRate, r));
    let enzyme = mode_of(modes, QuantityAddress::reaction(QuantityKind::EnzymeConcentration, r));

    let forward = saturation_product(network, modes, network.reactants_of(r), r);
    let reverse = saturation_product(network, modes, network.products_of(r), r);
    let denominator = denominator_terms(network, modes, r);

    let mut law = format!(
        "{:.6e} * ({:.6e} * {} - {:.6e} * {}) / ({})",
        enzyme, kcat_fwd, forward, kcat_rev, reverse, denominator
    );

    for &s in network.activators_of(r) {
        let ka = mode_of(modes, QuantityAddress::pair(QuantityKind::ActivationConstant, r, s));
        law = format!("({0} / ({0} + {1:.6e})) * {2}", network.species_id(s), ka, law);
    }
    for &s in network.inhibitors_of(r) {
        let ki = mode_of(modes, QuantityAddress::pair(QuantityKind::InhibitoryConstant, r, s));
        law = format!("({1:.6e} / ({1:.6e} + {0})) * {2}", network.species_id(s), ki, law);
    }
    law
}

/// Π (s / K_M)^ν over one side of the reaction.
fn saturation_product(
    network: &NetworkIndex,
    modes: &HashMap<QuantityAddress, f64>,
    side: &[(usize, f64)],
    r: usize,
) -> String {
    if side.is_empty() {
        return "1".to_string();
    }
    side.iter()
        .map(|&(s, coeff)| {
            let km = mode_of(modes, QuantityAddress::pair(QuantityKind::MichaelisConstant, r, s));
            let term = format!("({} / {:.6e})", network.species_id(s), km);
            if (coeff - 1.0).abs() < f64::EPSILON {
                term
            } else {
                format!("{}^{}", term, coeff)
            }
        })
        .collect::<Vec<_>>()
        .join(" * ")
}

/// Denominator of the convenience law: Π over participants of
/// (1 + s/K_M + ... + (s/K_M)^ν).
fn denominator_terms(
    network: &NetworkIndex,
    modes: &HashMap<QuantityAddress, f64>,
    r: usize,
) -> String {
    let mut factors = Vec::new();
    for &(s, coeff) in network.reactants_of(r).iter().chain(network.products_of(r)) {
        let km = mode_of(modes, QuantityAddress::pair(QuantityKind::MichaelisConstant, r, s));
        let ratio = format!("({} / {:.6e})", network.species_id(s), km);
        let order = coeff.round().max(1.0) as usize;
        let powers: Vec<String> = (1..=order)
            .map(|k| if k == 1 { ratio.clone() } else { format!("{}^{}", ratio, k) })
            .collect();
        factors.push(format!("(1 + {})", powers.join(" + ")));
    }
    if factors.is_empty() {
        "1".to_string()
    } else {
        factors.join(" * ")
    }
}

fn mode_of(modes: &HashMap<QuantityAddress, f64>, address: QuantityAddress) -> f64 {
    modes.get(&address).copied().unwrap_or(f64::NAN)
}
