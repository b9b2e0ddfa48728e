//! Conversions between natural-scale and log-scale moments.
//!
//! Multiplicative quantities are modeled as lognormal variates; these two
//! bijections relate their (arithmetic mean, std) to the underlying Gaussian
//! (log-mean, log-std). Additive quantities pass through unchanged. Every
//! component that crosses between the two parameterizations goes through
//! this module, so the numeric conventions live in exactly one place.

/// (log-mean, log-std) → (mean, std) for a lognormal variate.
#[inline]
pub fn lognormal_to_natural(log_mean: f64, log_std: f64) -> (f64, f64) {
    let var = log_std * log_std;
    let mean = (log_mean + 0.5 * var).exp();
    let std = ((var.exp() - 1.0) * (2.0 * log_mean + var).exp()).sqrt();
    (mean, std)
}

/// (mean, std) → (log-mean, log-std) for a lognormal variate.
///
/// The mean must be positive; the relative error `std/mean` sets the
/// log-scale spread.
#[inline]
pub fn natural_to_lognormal(mean: f64, std: f64) -> (f64, f64) {
    let ratio = std / mean;
    let log_var = (1.0 + ratio * ratio).ln();
    let log_mean = mean.ln() - 0.5 * log_var;
    (log_mean, log_var.sqrt())
}

/// Log-scale standard deviation implied by a natural-scale (mean, std).
#[inline]
pub fn log_std_from_natural(mean: f64, std: f64) -> f64 {
    let ratio = std / mean;
    (1.0 + ratio * ratio).ln().sqrt()
}
