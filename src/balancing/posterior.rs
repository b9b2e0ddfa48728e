//! Gaussian posterior computation over the basis.
//!
//! With a diagonal prior C₀ over θ, diagonal data covariance Cₓ and the
//! selected dependency rows Q*, the posterior over θ is Gaussian with
//!
//! ```text
//! C_post = (C₀⁻¹ + Q*ᵀ Cₓ⁻¹ Q*)⁻¹
//! m_post = C_post (C₀⁻¹ m₀ + Q*ᵀ Cₓ⁻¹ x)
//! ```
//!
//! and projects through the full Q onto every modeled quantity. Solves go
//! through a Cholesky factorization of the posterior precision; explicit
//! inverses are formed only for the covariance itself.

use nalgebra::{Cholesky, DMatrix, DVector};

use crate::error::BalanceError;

use super::data::DataVector;
use super::prior::Prior;

/// Posterior moments over θ and their projection onto q.
#[derive(Debug)]
pub struct Posterior {
    /// Posterior mean over the basis.
    pub mean_theta: DVector<f64>,
    /// Posterior covariance over the basis.
    pub cov_theta: DMatrix<f64>,
    /// Posterior precision (C_post⁻¹), kept for the mode refiner.
    pub precision_theta: DMatrix<f64>,
    /// Posterior mean over all modeled quantities (Q · m_post).
    pub mean_q: DVector<f64>,
    /// Per-quantity posterior standard deviation (√diag of Q C_post Qᵀ).
    pub std_q: DVector<f64>,
}

/// Solve for the posterior.
///
/// Fails with [`BalanceError::DimensionMismatch`] when the observation
/// vector, its covariance and Q* disagree, and with
/// [`BalanceError::IllConditioned`] when the prior or the posterior
/// precision cannot be factorized.
pub fn solve_posterior(
    q: &DMatrix<f64>,
    q_star: &DMatrix<f64>,
    data: &DataVector,
    prior: &Prior,
) -> Result<Posterior, BalanceError> {
    let n_theta = q.ncols();
    if q_star.ncols() != n_theta {
        return Err(BalanceError::DimensionMismatch(format!(
            "Q* has {} columns, expected {}",
            q_star.ncols(),
            n_theta
        )));
    }
    if q_star.nrows() != data.len() || data.values.len() != data.variances.len() {
        return Err(BalanceError::DimensionMismatch(format!(
            "{} observation slots against {} selected dependency rows",
            data.len(),
            q_star.nrows()
        )));
    }
    if prior.mean.len() != n_theta {
        return Err(BalanceError::DimensionMismatch(format!(
            "prior of length {} against basis of length {}",
            prior.mean.len(),
            n_theta
        )));
    }

    if prior.variances.iter().any(|&v| v <= 0.0) {
        return Err(BalanceError::IllConditioned {
            matrix: "prior covariance",
            condition: diagonal_condition(prior.variances.iter().copied()),
        });
    }

    // Precision = C₀⁻¹ + Q*ᵀ Cₓ⁻¹ Q*, accumulated without forming Cₓ⁻¹.
    let mut precision = DMatrix::from_diagonal(&prior.variances.map(|v| 1.0 / v));
    let mut rhs = DVector::zeros(n_theta);
    for i in 0..n_theta {
        rhs[i] = prior.mean[i] / prior.variances[i];
    }
    for (i, row) in q_star.row_iter().enumerate() {
        let weight = 1.0 / data.variances[i];
        let row_t = row.transpose();
        precision.ger(weight, &row_t, &row_t, 1.0);
        rhs.axpy(weight * data.values[i], &row_t, 1.0);
    }

    let cholesky = Cholesky::new(precision.clone()).ok_or(BalanceError::IllConditioned {
        matrix: "posterior precision",
        condition: diagonal_condition(precision.diagonal().iter().copied()),
    })?;

    let mean_theta = cholesky.solve(&rhs);
    let cov_theta = cholesky.inverse();

    let mean_q = q * &mean_theta;
    let mut std_q = DVector::zeros(q.nrows());
    for (i, row) in q.row_iter().enumerate() {
        let variance = (row * &cov_theta * row.transpose())[(0, 0)];
        std_q[i] = variance.max(0.0).sqrt();
    }

    Ok(Posterior {
        mean_theta,
        cov_theta,
        precision_theta: precision,
        mean_q,
        std_q,
    })
}

/// Crude condition estimate from the diagonal of a matrix that failed to
/// factorize: ratio of the largest to the smallest diagonal magnitude.
fn diagonal_condition<I: Iterator<Item = f64>>(diagonal: I) -> f64 {
    let mut lo = f64::INFINITY;
    let mut hi: f64 = 0.0;
    for d in diagonal {
        let a = d.abs();
        lo = lo.min(a);
        hi = hi.max(a);
    }
    if lo == 0.0 {
        f64::INFINITY
    } else {
        hi / lo
    }
}
