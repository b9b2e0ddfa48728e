//! Data vector and covariance over the observations.

use nalgebra::DVector;

use crate::catalog::{QuantityCatalog, Scale};
use crate::observations::{Observation, QuantityAddress};

use super::basis::BasisLayout;
use super::prior::VARIANCE_FLOOR;
use super::transforms::log_std_from_natural;

/// Scaled observation vector with its diagonal covariance.
///
/// `addresses` keeps the source address of every slot so the matching rows
/// of Q* can be selected.
#[derive(Debug)]
pub struct DataVector {
    pub addresses: Vec<QuantityAddress>,
    /// Observed values; log scale for multiplicative kinds.
    pub values: DVector<f64>,
    /// Diagonal variances, floored positive.
    pub variances: DVector<f64>,
}

impl DataVector {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Assemble x and the diagonal of Cₓ from the pooled observations.
///
/// Multiplicative observations map to `ln(mean)` with log-variance
/// `ln(1 + (std/mean)²)`; additive ones enter unchanged.
pub fn assemble_data(catalog: &QuantityCatalog, observations: &[Observation]) -> DataVector {
    let mut addresses = Vec::with_capacity(observations.len());
    let mut values = Vec::with_capacity(observations.len());
    let mut variances = Vec::with_capacity(observations.len());

    for obs in observations {
        let (value, variance) = match catalog.spec(obs.address.kind).scale {
            Scale::Multiplicative => {
                let log_std = log_std_from_natural(obs.mean, obs.std);
                (obs.mean.ln(), log_std * log_std)
            }
            Scale::Additive => (obs.mean, obs.std * obs.std),
        };
        addresses.push(obs.address);
        values.push(value);
        variances.push(variance.max(VARIANCE_FLOOR));
    }

    DataVector {
        addresses,
        values: DVector::from_vec(values),
        variances: DVector::from_vec(variances),
    }
}

/// Append one pseudo observation per enabled derived-kind address.
///
/// Each carries the catalog prior of its kind, expressed on the model scale
/// directly (the spread of a multiplicative kind is already geometric), and
/// pulls the posterior toward that prior through the kind's recipe row.
pub fn append_pseudo_values(
    catalog: &QuantityCatalog,
    layout: &BasisLayout,
    data: &mut DataVector,
) {
    let mut addresses = std::mem::take(&mut data.addresses);
    let mut values: Vec<f64> = data.values.iter().copied().collect();
    let mut variances: Vec<f64> = data.variances.iter().copied().collect();

    for address in &layout.extended_addresses()[layout.len_theta()..] {
        let (median, spread) = catalog.prior(address.kind);
        let (value, sd) = match catalog.spec(address.kind).scale {
            Scale::Multiplicative => (median.ln(), spread.ln()),
            Scale::Additive => (median, spread),
        };
        addresses.push(*address);
        values.push(value);
        variances.push((sd * sd).max(VARIANCE_FLOOR));
    }

    data.addresses = addresses;
    data.values = DVector::from_vec(values);
    data.variances = DVector::from_vec(variances);
}
