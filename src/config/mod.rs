//! Run configuration.
//!
//! Defaults match the reference setup; a flattened key/value table (the
//! config table) or individual CLI flags can override them. Unknown keys are
//! logged and ignored so older config tables keep working.

use serde::{Deserialize, Serialize};

use crate::catalog::QuantityKind;
use crate::error::BalanceError;
use crate::observations::BoundaryPolicy;

/// Configuration of one balancing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancingConfig {
    /// Temperature in Kelvin; sets RT for the recipes coupling to current
    /// chemical potentials.
    pub temperature_k: f64,
    /// pH; carried along for downstream consumers, no effect on the
    /// estimator itself.
    pub ph: f64,
    /// Give derived kinds their catalog priors as pseudo observations.
    pub use_pseudo_values: bool,
    /// Out-of-bound observation policy.
    pub boundary_values: BoundaryPolicy,
    /// RNG seed for the bounded mode refiner.
    pub samples: u64,
    /// Pool duplicate multiplicative observations geometrically instead of
    /// arithmetically.
    pub geometric_averaging: bool,
    /// Only accept data rows for this organism (rows without an organism
    /// column always pass).
    pub organism: Option<String>,
    /// Output enablement per kind, indexed by the global kind order.
    kind_enabled: Vec<bool>,
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            temperature_k: 300.0,
            ph: 7.0,
            use_pseudo_values: false,
            boundary_values: BoundaryPolicy::Keep,
            samples: 0,
            geometric_averaging: false,
            organism: None,
            kind_enabled: vec![true; QuantityKind::ALL.len()],
        }
    }
}

impl BalancingConfig {
    /// Kinds requested in the output, in global order.
    pub fn enabled_kinds(&self) -> Vec<QuantityKind> {
        QuantityKind::ALL
            .iter()
            .copied()
            .filter(|k| self.kind_enabled[*k as usize])
            .collect()
    }

    pub fn is_kind_enabled(&self, kind: QuantityKind) -> bool {
        self.kind_enabled[kind as usize]
    }

    pub fn set_kind_enabled(&mut self, kind: QuantityKind, enabled: bool) {
        self.kind_enabled[kind as usize] = enabled;
    }

    /// Apply one key/value entry from the config table.
    ///
    /// Recognized keys are the global options plus the 14 kind names as
    /// booleans; anything else is logged and skipped. Malformed values are
    /// an input-shape error.
    pub fn apply_entry(&mut self, key: &str, value: &str) -> Result<(), BalanceError> {
        let key = key.trim();
        let value = value.trim();
        match key {
            "temperature" => self.temperature_k = parse_number(key, value)?,
            "ph" => self.ph = parse_number(key, value)?,
            "use_pseudo_values" => self.use_pseudo_values = parse_bool(key, value)?,
            "boundary_values" => {
                self.boundary_values = match value {
                    "ignore" => BoundaryPolicy::Ignore,
                    "keep" => BoundaryPolicy::Keep,
                    other => {
                        return Err(BalanceError::InputShape(format!(
                            "boundary_values must be 'keep' or 'ignore', got '{}'",
                            other
                        )))
                    }
                }
            }
            "samples" => {
                self.samples = value.parse().map_err(|_| {
                    BalanceError::InputShape(format!(
                        "samples must be a non-negative integer, got '{}'",
                        value
                    ))
                })?
            }
            "geometric_averaging" => self.geometric_averaging = parse_bool(key, value)?,
            "organism" => {
                self.organism = if value.is_empty() { None } else { Some(value.to_string()) }
            }
            other => match QuantityKind::from_name(other) {
                Some(kind) => {
                    let enabled = parse_bool(other, value)?;
                    self.set_kind_enabled(kind, enabled);
                }
                None => log::warn!("ignoring unrecognized config key '{}'", other),
            },
        }
        Ok(())
    }

    /// Apply a whole config table.
    pub fn apply_entries<'a, I>(&mut self, entries: I) -> Result<(), BalanceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in entries {
            self.apply_entry(key, value)?;
        }
        Ok(())
    }

    /// Lines echoed into the run log.
    pub fn echo(&self) -> Vec<String> {
        let mut lines = vec![
            format!("temperature = {} K", self.temperature_k),
            format!("ph = {}", self.ph),
            format!("use_pseudo_values = {}", self.use_pseudo_values),
            format!(
                "boundary_values = {}",
                match self.boundary_values {
                    BoundaryPolicy::Keep => "keep",
                    BoundaryPolicy::Ignore => "ignore",
                }
            ),
            format!("samples = {}", self.samples),
            format!("geometric_averaging = {}", self.geometric_averaging),
        ];
        if let Some(organism) = &self.organism {
            lines.push(format!("organism = {}", organism));
        }
        let disabled: Vec<&str> = QuantityKind::ALL
            .iter()
            .filter(|k| !self.is_kind_enabled(**k))
            .map(|k| k.name())
            .collect();
        if !disabled.is_empty() {
            lines.push(format!("disabled kinds: {}", disabled.join(", ")));
        }
        lines
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, BalanceError> {
    value.parse().map_err(|_| {
        BalanceError::InputShape(format!("{} must be a number, got '{}'", key, value))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, BalanceError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(BalanceError::InputShape(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
