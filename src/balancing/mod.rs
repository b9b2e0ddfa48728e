//! The balancing pipeline.
//!
//! One run: normalize observations, lay out the basis, build the dependency
//! matrix, assemble prior and data, solve the Gaussian posterior, optionally
//! refine the mode under bounds, and emit per-quantity results. All stages
//! produce immutable values consumed by the next; the orchestrator owns the
//! run log and the configuration.

pub mod basis;
pub mod data;
pub mod dependency;
pub mod posterior;
pub mod prior;
pub mod refiner;
pub mod results;
pub mod transforms;

use std::sync::atomic::AtomicBool;

use nalgebra::DVector;

use crate::catalog::QuantityCatalog;
use crate::config::BalancingConfig;
use crate::error::BalanceError;
use crate::network::NetworkIndex;
use crate::observations::{InputNormalizer, Observation, ObservationRow, QuantityAddress};

use basis::BasisLayout;
use refiner::{ModeRefiner, ProjectedBound, RefinedMode, RefinerSettings};
use results::BalancedQuantity;

/// Ordered, sectioned log of one run; also mirrored to the logger.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn section(&mut self, title: &str) {
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.push(format!("== {} ==", title));
    }

    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{}", line);
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::warn!("{}", line);
        self.lines.push(format!("warning: {}", line));
    }

    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Everything a run produces besides its side channel, the log.
#[derive(Debug)]
pub struct BalancingOutcome {
    pub quantities: Vec<BalancedQuantity>,
    pub log: RunLog,
    /// Whether the bounded mode refiner ran.
    pub refined: bool,
}

/// Orchestrates one balancing run.
pub struct Balancer {
    catalog: QuantityCatalog,
    config: BalancingConfig,
}

impl Balancer {
    pub fn new(config: BalancingConfig) -> Self {
        let catalog = QuantityCatalog::new(config.temperature_k);
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &QuantityCatalog {
        &self.catalog
    }

    /// Mutable catalog access for prior-table overrides.
    pub fn catalog_mut(&mut self) -> &mut QuantityCatalog {
        &mut self.catalog
    }

    pub fn config(&self) -> &BalancingConfig {
        &self.config
    }

    /// Run the full pipeline over raw observation rows.
    pub fn run(
        &self,
        network: &NetworkIndex,
        rows: &[ObservationRow],
        cancel: &AtomicBool,
    ) -> Result<BalancingOutcome, BalanceError> {
        let mut log = RunLog::default();

        log.section("model");
        log.info(format!(
            "{} species, {} reactions, {} Michaelis pairs, {} activation pairs, {} inhibition pairs",
            network.n_species(),
            network.n_reactions(),
            network.michaelis_pairs().len(),
            network.activation_pairs().len(),
            network.inhibition_pairs().len()
        ));

        let enabled = self.config.enabled_kinds();
        let normalizer = InputNormalizer::new(
            &self.catalog,
            network,
            &enabled,
            self.config.boundary_values,
            self.config.organism.clone(),
            self.config.geometric_averaging,
        );
        let normalized = normalizer.normalize(rows)?;

        log.section("warnings");
        for warning in network.warnings() {
            log.warn(warning.clone());
        }
        for warning in &normalized.warnings {
            log.warn(warning.clone());
        }
        log.info(format!(
            "{} of {} data rows survived normalization",
            normalized.observations.len(),
            rows.len()
        ));

        let layout = BasisLayout::new(&self.catalog, network, &enabled);
        let q = dependency::build_dependency_matrix(&self.catalog, network, &layout);

        let mut data = data::assemble_data(&self.catalog, &normalized.observations);
        if self.config.use_pseudo_values {
            data::append_pseudo_values(&self.catalog, &layout, &mut data);
        }
        let q_star = dependency::select_rows(&q, &layout, &data.addresses)?;
        let prior = prior::assemble_prior(&self.catalog, &layout);

        let posterior = posterior::solve_posterior(&q, &q_star, &data, &prior)?;

        let bounded = bounded_addresses(&normalized.observations);
        let mut refined_mode: Option<RefinedMode> = None;
        if !bounded.is_empty() {
            let (coordinate_bounds, projected_bounds) =
                self.partition_bounds(&layout, &bounded, &mut log);
            let settings = RefinerSettings {
                seed: self.config.samples,
                ..RefinerSettings::default()
            };
            let refiner = ModeRefiner::new(
                &posterior.precision_theta,
                &posterior.mean_theta,
                &q,
                coordinate_bounds,
                projected_bounds,
                settings,
            );
            refined_mode = Some(refiner.refine(cancel));
        }
        let refined_q: Option<DVector<f64>> = refined_mode.as_ref().map(|m| &q * &m.theta);

        let mut range_warnings = Vec::new();
        let quantities = results::emit_results(
            &self.catalog,
            network,
            &layout,
            &enabled,
            &posterior,
            refined_q.as_ref(),
            &mut range_warnings,
        );

        log.section("configuration");
        for line in self.config.echo() {
            log.info(line);
        }

        log.section("range checks");
        for warning in &range_warnings {
            log.warn(warning.clone());
        }
        if range_warnings.is_empty() {
            log.info("all point estimates inside their plausible ranges");
        }

        log.section("diagnostics");
        log.info(format!(
            "basis of {} entries, {} modeled quantities, {} observation slots",
            layout.len_theta(),
            layout.len_extended(),
            data.len()
        ));
        if let Some(mode) = &refined_mode {
            if mode.cancelled {
                log.warn(format!(
                    "mode refinement cancelled after {} generations; best-so-far returned",
                    mode.generations
                ));
            } else {
                log.info(format!(
                    "mode refinement converged after {} generations (misfit {:.6e})",
                    mode.generations, mode.fitness
                ));
            }
        }

        Ok(BalancingOutcome {
            quantities,
            log,
            refined: refined_mode.is_some(),
        })
    }

    /// Split observation bounds into direct coordinate bounds on θ and
    /// bounds on projected (derived) rows, converting multiplicative bounds
    /// to log scale.
    fn partition_bounds(
        &self,
        layout: &BasisLayout,
        bounded: &[(QuantityAddress, Option<f64>, Option<f64>)],
        log: &mut RunLog,
    ) -> (Vec<(f64, f64)>, Vec<ProjectedBound>) {
        let n_theta = layout.len_theta();
        let mut coordinate_bounds = vec![(f64::NEG_INFINITY, f64::INFINITY); n_theta];
        let mut projected_bounds = Vec::new();

        for (address, lower, upper) in bounded {
            let multiplicative = self.catalog.is_multiplicative(address.kind);
            let lo = convert_bound(*lower, multiplicative).unwrap_or(f64::NEG_INFINITY);
            let hi = convert_bound(*upper, multiplicative).unwrap_or(f64::INFINITY);
            match layout.row_of(address) {
                Some(row) if row < n_theta => {
                    coordinate_bounds[row] = (lo, hi);
                }
                Some(row) => {
                    projected_bounds.push(ProjectedBound { row, lower: lo, upper: hi });
                }
                None => log.warn(format!(
                    "bound on {:?} ignored: quantity not modeled in this run",
                    address
                )),
            }
        }
        (coordinate_bounds, projected_bounds)
    }
}

/// Addresses carrying at least one finite bound.
fn bounded_addresses(
    observations: &[Observation],
) -> Vec<(QuantityAddress, Option<f64>, Option<f64>)> {
    observations
        .iter()
        .filter(|obs| obs.lower.is_some() || obs.upper.is_some())
        .map(|obs| (obs.address, obs.lower, obs.upper))
        .collect()
}

/// A multiplicative bound moves to log scale; non-positive bounds on a
/// positive quantity cannot bind and collapse to the infinite default.
fn convert_bound(bound: Option<f64>, multiplicative: bool) -> Option<f64> {
    match bound {
        Some(b) if multiplicative => {
            if b > 0.0 {
                Some(b.ln())
            } else {
                None
            }
        }
        other => other,
    }
}
