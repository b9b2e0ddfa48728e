//! Prior mean and covariance over the basis θ.

use nalgebra::DVector;

use crate::catalog::{QuantityCatalog, Scale};

use super::basis::BasisLayout;

/// Variance floor applied before any inversion.
pub const VARIANCE_FLOOR: f64 = 1e-10;

/// Diagonal Gaussian prior over θ.
#[derive(Debug)]
pub struct Prior {
    /// Prior mean; log scale for multiplicative kinds.
    pub mean: DVector<f64>,
    /// Diagonal prior variances, floored positive.
    pub variances: DVector<f64>,
}

/// Assemble m₀ and the diagonal of C₀ from the catalog priors.
///
/// Multiplicative kinds enter in log scale: the prior median maps to
/// `ln(median)` and the geometric spread to `ln(spread)`. Additive kinds
/// enter unchanged.
pub fn assemble_prior(catalog: &QuantityCatalog, layout: &BasisLayout) -> Prior {
    let n = layout.len_theta();
    let mut mean = DVector::zeros(n);
    let mut variances = DVector::zeros(n);

    for (i, address) in layout.theta_addresses().iter().enumerate() {
        let (median, spread) = catalog.prior(address.kind);
        let (m, sd) = match catalog.spec(address.kind).scale {
            Scale::Multiplicative => (median.ln(), spread.ln()),
            Scale::Additive => (median, spread),
        };
        mean[i] = m;
        variances[i] = (sd * sd).max(VARIANCE_FLOOR);
    }

    Prior { mean, variances }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuantityKind;
    use crate::network::{NetworkIndex, NetworkModel};

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
    fn test_prior_scales() {
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let prior = assemble_prior(&catalog, &layout);

        for (i, address) in layout.theta_addresses().iter().enumerate() {
            match address.kind {
                QuantityKind::StandardChemicalPotential => {
                    assert!((prior.mean[i] + 880.0).abs() < 1e-12);
                    assert!((prior.variances[i] - 680.0 * 680.0).abs() < 1e-6);
                }
                QuantityKind::Concentration => {
                    assert!((prior.mean[i] - 0.1f64.ln()).abs() < 1e-12);
                    let expected = 1.5f64.ln().powi(2);
                    assert!((prior.variances[i] - expected).abs() < 1e-12);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_degenerate_spread_is_floored() {
        // Geometric spread 1 gives log-variance 0; the floor keeps C₀
        // invertible.
        let (catalog, network) = setup();
        let layout = BasisLayout::new(&catalog, &network, &QuantityKind::ALL);
        let prior = assemble_prior(&catalog, &layout);

        let kv = layout
            .theta_addresses()
            .iter()
            .position(|a| a.kind == QuantityKind::CatalyticRateGeometricMean)
            .unwrap();
        assert_eq!(prior.variances[kv], VARIANCE_FLOOR);
    }
}
