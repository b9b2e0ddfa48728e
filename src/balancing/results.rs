//! Per-quantity output rows in both parameterizations.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::catalog::{QuantityCatalog, QuantityKind, Scale};
use crate::network::NetworkIndex;
use crate::observations::QuantityAddress;

use super::basis::BasisLayout;
use super::posterior::Posterior;
use super::transforms::lognormal_to_natural;

/// One balanced quantity with full internal precision.
#[derive(Debug, Clone)]
pub struct BalancedQuantity {
    pub address: QuantityAddress,
    /// Point estimate: log-scale mode mapped to the natural scale for
    /// multiplicative kinds, the posterior mean for additive ones.
    pub mode: f64,
    pub mean: f64,
    pub std: f64,
    pub log_mean: f64,
    pub log_std: f64,
}

/// Serialized output row; the mode is rounded for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub kind: String,
    pub reaction_ref: String,
    pub species_ref: String,
    pub mode: f64,
    pub unit: String,
    pub mean: f64,
    pub std: f64,
    pub log_mean: f64,
    pub log_std: f64,
}

/// Project the posterior onto output rows, one per requested address.
///
/// Basic kinds present in θ only as recipe dependencies of a requested
/// derived kind are skipped. When a refined mode is supplied, its projection
/// replaces the point estimate while the posterior moments stay untouched.
/// Rows whose point estimate escapes the catalog's plausibility range are
/// reported back as warnings.
pub fn emit_results(
    catalog: &QuantityCatalog,
    network: &NetworkIndex,
    layout: &BasisLayout,
    requested: &[QuantityKind],
    posterior: &Posterior,
    refined_mode_q: Option<&DVector<f64>>,
    warnings: &mut Vec<String>,
) -> Vec<BalancedQuantity> {
    let mut quantities = Vec::with_capacity(layout.len_extended());

    for (i, address) in layout.extended_addresses().iter().enumerate() {
        if !requested.contains(&address.kind) {
            continue;
        }
        let center = posterior.mean_q[i];
        let spread = posterior.std_q[i];
        let point_center = refined_mode_q.map_or(center, |m| m[i]);

        let quantity = match catalog.spec(address.kind).scale {
            Scale::Multiplicative => {
                let (mean, std) = lognormal_to_natural(center, spread);
                BalancedQuantity {
                    address: *address,
                    mode: point_center.exp(),
                    mean,
                    std,
                    log_mean: center,
                    log_std: spread,
                }
            }
            Scale::Additive => BalancedQuantity {
                address: *address,
                mode: point_center,
                mean: center,
                std: spread,
                log_mean: center,
                log_std: spread,
            },
        };

        let (lo, hi) = catalog.bounds(address.kind);
        if quantity.mode < lo || quantity.mode > hi {
            warnings.push(format!(
                "balanced {} = {:.4e} falls outside the plausible range [{:.4e}, {:.4e}]",
                address.label(network),
                quantity.mode,
                lo,
                hi
            ));
        }

        quantities.push(quantity);
    }

    quantities
}

impl BalancedQuantity {
    /// Output row with the point estimate rounded to four decimals.
    pub fn to_row(&self, catalog: &QuantityCatalog, network: &NetworkIndex) -> ResultRow {
        ResultRow {
            kind: self.address.kind.name().to_string(),
            reaction_ref: self
                .address
                .reaction
                .map(|r| network.reaction_id(r).to_string())
                .unwrap_or_default(),
            species_ref: self
                .address
                .species
                .map(|s| network.species_id(s).to_string())
                .unwrap_or_default(),
            mode: round4(self.mode),
            unit: catalog.unit(self.address.kind).to_string(),
            mean: self.mean,
            std: self.std,
            log_mean: self.log_mean,
            log_std: self.log_std,
        }
    }
}

#[inline]
fn round4(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}
