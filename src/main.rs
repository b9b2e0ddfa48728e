//! Parameter balancer - entry point
//!
//! CLI Usage:
//!   parameter-balancer model.json                       # defaults only
//!   parameter-balancer model.json data.csv              # with observations
//!   parameter-balancer model.json data.csv prior.csv config.csv
//!   parameter-balancer model.json --output run1 --log   # named outputs + log file

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Result};
use parameter_balancer::{
    balancing::Balancer,
    catalog::QuantityKind,
    config::BalancingConfig,
    error::BalanceError,
    kinetics::emit_kinetic_laws,
    network::{read_network, NetworkIndex},
    tables,
};

/// Parsed CLI surface.
struct CliArgs {
    model: PathBuf,
    data: Option<PathBuf>,
    prior: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    write_log: bool,
    no_pseudos: bool,
    verbose: bool,
}

fn print_help() {
    println!("Parameter Balancer");
    println!();
    println!("Usage: parameter-balancer MODEL [DATA] [PRIOR] [CONFIG] [OPTIONS]");
    println!();
    println!("Arguments:");
    println!("  MODEL              Reaction network model (JSON)");
    println!("  DATA               Observed values table (CSV, optional)");
    println!("  PRIOR              Prior override table (CSV, optional)");
    println!("  CONFIG             Configuration table (CSV, optional)");
    println!();
    println!("Options:");
    println!("  --output NAME      Output stem (default: model name + timestamp)");
    println!("  --log              Also write the run log next to the outputs");
    println!("  --no-pseudos       Disable pseudo values regardless of config");
    println!("  --verbose          Debug-level logging");
    println!("  --help, -h         Show this help");
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut output = None;
    let mut write_log = false;
    let mut no_pseudos = false;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => {
                i += 1;
                if i >= args.len() {
                    bail!("--output needs a value");
                }
                output = Some(PathBuf::from(&args[i]));
            }
            "--log" => write_log = true,
            "--no-pseudos" => no_pseudos = true,
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown flag '{}'", flag),
            path => positional.push(PathBuf::from(path)),
        }
        i += 1;
    }

    if positional.is_empty() {
        print_help();
        bail!("a model file is required");
    }
    if positional.len() > 4 {
        bail!("at most four positional arguments are accepted");
    }

    let mut positional = positional.into_iter();
    Ok(CliArgs {
        model: positional.next().expect("checked above"),
        data: positional.next(),
        prior: positional.next(),
        config: positional.next(),
        output,
        write_log,
        no_pseudos,
        verbose,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    // Configuration table first, flags override it.
    let mut config = BalancingConfig::default();
    if let Some(path) = &args.config {
        let entries = tables::read_config_entries(path)?;
        config.apply_entries(entries.iter().map(|e| (e.key.as_str(), e.value.as_str())))?;
    }
    if args.no_pseudos {
        config.use_pseudo_values = false;
    }

    let model = read_network(&args.model)?;
    log::info!(
        "model '{}' loaded: {} species, {} reactions",
        model.id.as_deref().unwrap_or("unnamed"),
        model.species.len(),
        model.reactions.len()
    );
    let network = NetworkIndex::new(&model);

    let mut balancer = Balancer::new(config);

    if let Some(path) = &args.prior {
        for row in tables::read_priors(path)? {
            let kind = QuantityKind::from_name(row.kind.trim())
                .ok_or_else(|| BalanceError::UnknownKind(row.kind.clone()))?;
            balancer.catalog_mut().set_prior(kind, row.median, row.std);
            log::info!(
                "prior for {} overridden: median {}, spread {}",
                kind.name(),
                row.median,
                row.std
            );
        }
    }

    let rows = match &args.data {
        Some(path) => tables::read_observations(path)?,
        None => Vec::new(),
    };

    let cancel = AtomicBool::new(false);
    let outcome = balancer.run(&network, &rows, &cancel)?;

    let stem = args
        .output
        .unwrap_or_else(|| tables::default_output_stem(&args.model));
    tables::ensure_parent_dir(&stem)?;

    let result_rows: Vec<_> = outcome
        .quantities
        .iter()
        .map(|q| q.to_row(balancer.catalog(), &network))
        .collect();
    tables::write_results(tables::stem_with_suffix(&stem, "_balanced.csv"), &result_rows)?;

    let laws = emit_kinetic_laws(&network, &outcome.quantities);
    tables::write_kinetics(tables::stem_with_suffix(&stem, "_kinetics.csv"), &laws)?;

    if args.write_log {
        tables::write_run_log(tables::stem_with_suffix(&stem, ".log"), &outcome.log)?;
    }

    log::info!(
        "balanced {} quantities{}",
        outcome.quantities.len(),
        if outcome.refined { " (mode refined under bounds)" } else { "" }
    );
    Ok(())
}
