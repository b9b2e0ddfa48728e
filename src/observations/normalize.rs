//! Deduplication and sanitation of observed-value rows.
//!
//! Incoming rows are filtered (kind, organism, references, units, bounds),
//! completed (default standard deviations), re-keyed by quantity address and
//! pooled so that each address carries at most one observation. The pooled
//! result depends only on the set of surviving rows, never on their order.

use std::collections::HashMap;

use crate::catalog::{Attachment, QuantityCatalog, QuantityKind, Scale};
use crate::error::BalanceError;
use crate::network::NetworkIndex;

use super::{Observation, ObservationRow, QuantityAddress};

/// Avogadro constant, 1/mol.
const AVOGADRO: f64 = 6.02214076e23;

/// Reference cell volume for the molecules/cell conversion, in liters.
const REFERENCE_CELL_VOLUME_L: f64 = 2.3e-15;

/// Substitute for zero replicate standard deviations before pooling.
const ZERO_STD_SUBSTITUTE: f64 = std::f64::consts::LN_2;

/// What to do with observations outside the catalog's plausibility range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Keep rows whose mean falls outside the catalog range.
    Keep,
    /// Drop such rows with a logged warning.
    Ignore,
}

/// Result of normalization: one observation per address plus merged bounds.
#[derive(Debug)]
pub struct NormalizedInput {
    /// Pooled observations, sorted by address.
    pub observations: Vec<Observation>,
    /// Warnings in the order they were raised.
    pub warnings: Vec<String>,
}

/// Sanitizes raw rows into pooled observations.
pub struct InputNormalizer<'a> {
    catalog: &'a QuantityCatalog,
    network: &'a NetworkIndex,
    enabled: &'a [QuantityKind],
    boundary_policy: BoundaryPolicy,
    organism: Option<String>,
    geometric_averaging: bool,
}

impl<'a> InputNormalizer<'a> {
    pub fn new(
        catalog: &'a QuantityCatalog,
        network: &'a NetworkIndex,
        enabled: &'a [QuantityKind],
        boundary_policy: BoundaryPolicy,
        organism: Option<String>,
        geometric_averaging: bool,
    ) -> Self {
        Self {
            catalog,
            network,
            enabled,
            boundary_policy,
            organism,
            geometric_averaging,
        }
    }

    /// Run the full normalization pass.
    ///
    /// Unknown kinds abort the run; all other problems drop the offending
    /// row with a warning.
    pub fn normalize(&self, rows: &[ObservationRow]) -> Result<NormalizedInput, BalanceError> {
        let mut warnings = Vec::new();
        let mut survivors: Vec<Observation> = Vec::new();

        for row in rows {
            if let Some(obs) = self.sanitize_row(row, &mut warnings)? {
                survivors.push(obs);
            }
        }

        let observations = self.pool(survivors);
        Ok(NormalizedInput { observations, warnings })
    }

    fn sanitize_row(
        &self,
        row: &ObservationRow,
        warnings: &mut Vec<String>,
    ) -> Result<Option<Observation>, BalanceError> {
        let kind = QuantityKind::from_name(row.kind.trim())
            .ok_or_else(|| BalanceError::UnknownKind(row.kind.clone()))?;

        if let (Some(wanted), Some(found)) = (self.organism.as_deref(), row.organism.as_deref()) {
            if !found.trim().is_empty() && found.trim() != wanted {
                log::debug!("dropping {} row for organism '{}'", kind.name(), found);
                return Ok(None);
            }
        }

        if !self.enabled.contains(&kind) {
            warnings.push(format!(
                "dropping {} observation: kind is disabled in this run",
                kind.name()
            ));
            return Ok(None);
        }

        let Some(address) = self.resolve_address(kind, row, warnings)? else {
            return Ok(None);
        };

        let mut mean = row.mean;
        let mut std = row.std;
        let mut lower = row.lower;
        let mut upper = row.upper;

        // Unit handling: the only defined conversion is molecules/cell → mM.
        let canonical = self.catalog.unit(kind);
        if let Some(unit) = row.unit.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            if unit != canonical {
                if unit == "molecules/cell" && canonical == "mM" {
                    let factor = 1e3 / (AVOGADRO * REFERENCE_CELL_VOLUME_L);
                    mean *= factor;
                    std = std.map(|s| s * factor);
                    lower = lower.map(|b| b * factor);
                    upper = upper.map(|b| b * factor);
                } else {
                    warnings.push(format!(
                        "dropping {} observation: unit '{}' not convertible to '{}'",
                        kind.name(),
                        unit,
                        canonical
                    ));
                    return Ok(None);
                }
            }
        }

        if matches!(self.catalog.spec(kind).scale, Scale::Multiplicative) && mean <= 0.0 {
            warnings.push(format!(
                "dropping {} observation at {}: non-positive value {:.4e} for a log-scale quantity",
                kind.name(),
                address.label(self.network),
                mean
            ));
            return Ok(None);
        }

        if self.boundary_policy == BoundaryPolicy::Ignore {
            let (lo, hi) = self.catalog.bounds(kind);
            if mean < lo || mean > hi {
                warnings.push(format!(
                    "dropping {} observation at {}: value {:.4e} outside plausible range [{:.4e}, {:.4e}]",
                    kind.name(),
                    address.label(self.network),
                    mean,
                    lo,
                    hi
                ));
                return Ok(None);
            }
        }

        let std = match std {
            Some(s) if s > 0.0 => s,
            Some(_) => ZERO_STD_SUBSTITUTE,
            None => self.catalog.default_data_std(kind),
        };

        Ok(Some(Observation { address, mean, std, lower, upper }))
    }

    /// Resolve the row's references against the network, blanking irrelevant
    /// ones per the kind's attachment.
    fn resolve_address(
        &self,
        kind: QuantityKind,
        row: &ObservationRow,
        warnings: &mut Vec<String>,
    ) -> Result<Option<QuantityAddress>, BalanceError> {
        let species_ref = row.species.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let reaction_ref = row.reaction.as_deref().map(str::trim).filter(|r| !r.is_empty());

        match self.catalog.attachment(kind) {
            Attachment::Species => {
                let id = species_ref.ok_or_else(|| {
                    BalanceError::InputShape(format!(
                        "{} observation is missing its species reference",
                        kind.name()
                    ))
                })?;
                match self.network.species_by_id(id) {
                    Some(s) => Ok(Some(QuantityAddress::species(kind, s))),
                    None => {
                        warnings.push(format!(
                            "dropping {} observation: species '{}' is not in the network",
                            kind.name(),
                            id
                        ));
                        Ok(None)
                    }
                }
            }
            Attachment::Reaction => {
                let id = reaction_ref.ok_or_else(|| {
                    BalanceError::InputShape(format!(
                        "{} observation is missing its reaction reference",
                        kind.name()
                    ))
                })?;
                match self.network.reaction_by_id(id) {
                    Some(r) => Ok(Some(QuantityAddress::reaction(kind, r))),
                    None => {
                        warnings.push(format!(
                            "dropping {} observation: reaction '{}' is not in the network",
                            kind.name(),
                            id
                        ));
                        Ok(None)
                    }
                }
            }
            Attachment::ReactionSpecies => {
                let (rid, sid) = match (reaction_ref, species_ref) {
                    (Some(r), Some(s)) => (r, s),
                    _ => {
                        return Err(BalanceError::InputShape(format!(
                            "{} observation needs both reaction and species references",
                            kind.name()
                        )))
                    }
                };
                let (Some(r), Some(s)) =
                    (self.network.reaction_by_id(rid), self.network.species_by_id(sid))
                else {
                    warnings.push(format!(
                        "dropping {} observation: pair ({}, {}) is not in the network",
                        kind.name(),
                        rid,
                        sid
                    ));
                    return Ok(None);
                };
                let pairs = match kind {
                    QuantityKind::MichaelisConstant => self.network.michaelis_pairs(),
                    QuantityKind::ActivationConstant => self.network.activation_pairs(),
                    QuantityKind::InhibitoryConstant => self.network.inhibition_pairs(),
                    _ => &[],
                };
                if !pairs.contains(&(r, s)) {
                    warnings.push(format!(
                        "dropping {} observation: '{}' does not take part in reaction '{}' in that role",
                        kind.name(),
                        sid,
                        rid
                    ));
                    return Ok(None);
                }
                Ok(Some(QuantityAddress::pair(kind, r, s)))
            }
        }
    }

    /// Reduce duplicate observations per address to a single one.
    ///
    /// Additive kinds pool by inverse-variance weighting; multiplicative
    /// kinds average means and stds arithmetically (or geometrically when
    /// the alternative policy is on). Members are sorted before pooling so
    /// the reduction is independent of input row order.
    fn pool(&self, survivors: Vec<Observation>) -> Vec<Observation> {
        let mut groups: HashMap<QuantityAddress, Vec<Observation>> = HashMap::new();
        for obs in survivors {
            groups.entry(obs.address).or_default().push(obs);
        }

        let mut pooled: Vec<Observation> = groups
            .into_iter()
            .map(|(address, mut members)| {
                members.sort_by(|a, b| {
                    (a.mean, a.std)
                        .partial_cmp(&(b.mean, b.std))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                self.pool_group(address, &members)
            })
            .collect();

        pooled.sort_by_key(|obs| obs.address.sort_key());
        pooled
    }

    fn pool_group(&self, address: QuantityAddress, members: &[Observation]) -> Observation {
        let lower = members.iter().filter_map(|m| m.lower).fold(None, |acc: Option<f64>, b| {
            Some(acc.map_or(b, |a| a.max(b)))
        });
        let upper = members.iter().filter_map(|m| m.upper).fold(None, |acc: Option<f64>, b| {
            Some(acc.map_or(b, |a| a.min(b)))
        });

        if members.len() == 1 {
            let only = &members[0];
            return Observation { address, mean: only.mean, std: only.std, lower, upper };
        }

        let stds: Vec<f64> = members
            .iter()
            .map(|m| if m.std > 0.0 { m.std } else { ZERO_STD_SUBSTITUTE })
            .collect();

        let (mean, std) = match self.catalog.spec(address.kind).scale {
            Scale::Additive => {
                let weight_sum: f64 = stds.iter().map(|s| 1.0 / (s * s)).sum();
                let weighted: f64 = members
                    .iter()
                    .zip(stds.iter())
                    .map(|(m, s)| m.mean / (s * s))
                    .sum();
                (weighted / weight_sum, (1.0 / weight_sum).sqrt())
            }
            Scale::Multiplicative if self.geometric_averaging => {
                let n = members.len() as f64;
                let log_mean: f64 = members.iter().map(|m| m.mean.ln()).sum::<f64>() / n;
                let log_std: f64 = stds.iter().map(|s| s.ln()).sum::<f64>() / n;
                (log_mean.exp(), log_std.exp())
            }
            Scale::Multiplicative => {
                let n = members.len() as f64;
                let mean: f64 = members.iter().map(|m| m.mean).sum::<f64>() / n;
                let std: f64 = stds.iter().sum::<f64>() / n;
                (mean, std)
            }
        };

        Observation { address, mean, std, lower, upper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
        (QuantityCatalog::new(300.0), NetworkIndex::new(&model))
    }

    fn row(kind: &str, reaction: Option<&str>, species: Option<&str>, mean: f64, std: Option<f64>) -> ObservationRow {
        ObservationRow {
            kind: kind.to_string(),
            reaction: reaction.map(str::to_string),
            species: species.map(str::to_string),
            mean,
            std,
            unit: None,
            organism: None,
            lower: None,
            upper: None,
        }
    }

    fn normalizer<'a>(
        catalog: &'a QuantityCatalog,
        network: &'a NetworkIndex,
        policy: BoundaryPolicy,
    ) -> InputNormalizer<'a> {
        InputNormalizer::new(catalog, network, &QuantityKind::ALL, policy, None, false)
    }

    #[test]
    fn test_unknown_kind_aborts() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let rows = vec![row("mystery constant", None, Some("A"), 1.0, None)];
        assert!(matches!(n.normalize(&rows), Err(BalanceError::UnknownKind(_))));
    }

    #[test]
    fn test_unknown_species_drops_with_warning() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let rows = vec![row("concentration", None, Some("Z"), 1.0, None)];
        let out = n.normalize(&rows).unwrap();
        assert!(out.observations.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("'Z'"));
    }

    #[test]
    fn test_missing_std_gets_default() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let rows = vec![row("concentration", None, Some("A"), 0.5, None)];
        let out = n.normalize(&rows).unwrap();
        assert_eq!(out.observations.len(), 1);
        let expected = catalog.default_data_std(QuantityKind::Concentration);
        assert!((out.observations[0].std - expected).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_multiplicative_pooling() {
        // Two concentration replicates 0.2±0.05 and 0.25±0.05 reduce to
        // their arithmetic means 0.225 and 0.05.
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let rows = vec![
            row("concentration", None, Some("A"), 0.2, Some(0.05)),
            row("concentration", None, Some("A"), 0.25, Some(0.05)),
        ];
        let out = n.normalize(&rows).unwrap();
        assert_eq!(out.observations.len(), 1);
        assert!((out.observations[0].mean - 0.225).abs() < 1e-12);
        assert!((out.observations[0].std - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_additive_pooling_is_inverse_variance() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let rows = vec![
            row("standard chemical potential", None, Some("A"), -100.0, Some(1.0)),
            row("standard chemical potential", None, Some("A"), -104.0, Some(2.0)),
        ];
        let out = n.normalize(&rows).unwrap();
        assert_eq!(out.observations.len(), 1);
        // Weights 1 and 0.25: mean = (-100 - 26)/1.25 = -100.8.
        assert!((out.observations[0].mean - (-100.8)).abs() < 1e-9);
        assert!((out.observations[0].std - (1.0f64 / 1.25).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_stds_fall_back_to_ln_two() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let rows = vec![
            row("concentration", None, Some("A"), 0.2, Some(0.0)),
            row("concentration", None, Some("A"), 0.4, Some(0.0)),
        ];
        let out = n.normalize(&rows).unwrap();
        assert_eq!(out.observations.len(), 1);
        assert!((out.observations[0].std - ZERO_STD_SUBSTITUTE).abs() < 1e-12);
    }

    #[test]
    fn test_pooling_is_order_independent() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let forward = vec![
            row("concentration", None, Some("A"), 0.2, Some(0.05)),
            row("concentration", None, Some("A"), 0.25, Some(0.04)),
            row("concentration", None, Some("B"), 1.0, Some(0.1)),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = n.normalize(&forward).unwrap();
        let b = n.normalize(&reversed).unwrap();
        assert_eq!(a.observations.len(), b.observations.len());
        for (x, y) in a.observations.iter().zip(b.observations.iter()) {
            assert_eq!(x.address, y.address);
            assert_eq!(x.mean.to_bits(), y.mean.to_bits());
            assert_eq!(x.std.to_bits(), y.std.to_bits());
        }
    }

    #[test]
    fn test_out_of_bound_filter() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Ignore);
        let rows = vec![row("concentration", None, Some("A"), 1e7, Some(1.0))];
        let out = n.normalize(&rows).unwrap();
        assert!(out.observations.is_empty());
        assert!(out.warnings[0].contains("outside plausible range"));

        let keep = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let out = keep.normalize(&rows).unwrap();
        assert_eq!(out.observations.len(), 1);
    }

    #[test]
    fn test_molecules_per_cell_conversion() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let mut r = row("concentration", None, Some("A"), 1.385e9, Some(1e8));
        r.unit = Some("molecules/cell".to_string());
        let out = n.normalize(&[r]).unwrap();
        assert_eq!(out.observations.len(), 1);
        // 1.385e9 molecules in 2.3 fL is roughly 1 mM.
        assert!((out.observations[0].mean - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_unconvertible_unit_drops() {
        let (catalog, network) = setup();
        let n = normalizer(&catalog, &network, BoundaryPolicy::Keep);
        let mut r = row("concentration", None, Some("A"), 1.0, None);
        r.unit = Some("mol/kg".to_string());
        let out = n.normalize(&[r]).unwrap();
        assert!(out.observations.is_empty());
        assert!(out.warnings[0].contains("not convertible"));
    }
}
