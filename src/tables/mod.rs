//! Tabular input/output boundary.
//!
//! Observations, prior overrides and configuration come in as CSV tables;
//! balanced results and kinetic laws go out the same way, and the run log is
//! written as plain text. All structured records go through serde.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::balancing::results::ResultRow;
use crate::balancing::RunLog;
use crate::error::BalanceError;
use crate::observations::ObservationRow;

/// One prior-override row: kind name plus (median, spread) per its scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorRow {
    pub kind: String,
    pub median: f64,
    pub std: f64,
}

/// One key/value configuration entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRow {
    pub key: String,
    pub value: String,
}

/// Read the observation table.
pub fn read_observations<P: AsRef<Path>>(path: P) -> Result<Vec<ObservationRow>, BalanceError> {
    read_table(path.as_ref())
}

/// Read the prior-override table.
pub fn read_priors<P: AsRef<Path>>(path: P) -> Result<Vec<PriorRow>, BalanceError> {
    read_table(path.as_ref())
}

/// Read the flattened configuration table.
pub fn read_config_entries<P: AsRef<Path>>(path: P) -> Result<Vec<ConfigRow>, BalanceError> {
    read_table(path.as_ref())
}

fn read_table<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, BalanceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| BalanceError::InputShape(format!("{}: {}", path.display(), e)))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T =
            record.map_err(|e| BalanceError::InputShape(format!("{}: {}", path.display(), e)))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write the balanced-result table.
pub fn write_results<P: AsRef<Path>>(path: P, rows: &[ResultRow]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("balanced results written to {}", path.display());
    Ok(())
}

/// Write the run log as plain text.
pub fn write_run_log<P: AsRef<Path>>(path: P, run_log: &RunLog) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, run_log.render())
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("run log written to {}", path.display());
    Ok(())
}

/// One emitted kinetic-law row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KineticLawRow {
    pub reaction: String,
    pub law: String,
    pub expression: String,
}

/// Write the kinetic-law table.
pub fn write_kinetics<P: AsRef<Path>>(path: P, rows: &[KineticLawRow]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("kinetic laws written to {}", path.display());
    Ok(())
}

/// Output stem for a model file: its directory plus file stem, with a
/// timestamp when no explicit name was given.
pub fn default_output_stem(model_path: &Path) -> PathBuf {
    let stem = model_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "balanced".to_string());
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let name = format!("{}_{}", stem, timestamp);
    model_path.with_file_name(name)
}

/// File writer helper used by the CLI: create a file for the given suffix
/// next to the output stem.
pub fn stem_with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(suffix);
    stem.with_file_name(name)
}

/// Create the parent directory of an output path if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}
