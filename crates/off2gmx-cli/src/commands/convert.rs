use crate::cli::ConvertArgs;
use crate::error::{CliError, Result};
use off2gmx::core::charges::ChargeSign;
use off2gmx::workflows::{self, config::ConvertConfig};
use tracing::info;

pub fn run(args: ConvertArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    apply_overrides(&mut config, &args)?;

    println!("Converting {}...", args.input.display());
    info!("Invoking the core conversion workflow...");
    let summary = workflows::convert::run(&args.input, &config)?;

    println!(
        "✓ {} nonbonded and {} bonded table(s) written to: {}",
        summary.nonbonded_tables,
        summary.bonded_tables,
        config.output.table_dir.display()
    );
    if let Some(path) = &summary.nonbond_topology {
        println!("✓ Nonbonded topology written to: {}", path.display());
    }
    if let Some(path) = &summary.bonded_topology {
        println!("✓ Bonded topology written to: {}", path.display());
    }

    if !summary.energy_groups.is_empty() {
        println!();
        println!("Add the tabulated energy groups to the run input (.mdp):");
        println!(
            "  energygrps      = {}",
            summary.energy_groups.energygrps_line()
        );
        println!(
            "  energygrp_table = {}",
            summary.energy_groups.energygrp_table_line()
        );
    }

    Ok(())
}

/// CLI flags win over config-file values; unset flags leave the file
/// values in place.
fn apply_overrides(config: &mut ConvertConfig, args: &ConvertArgs) -> Result<()> {
    if let Some(atom) = &args.known_atom {
        config.charges.known_atom = Some(atom.clone());
    }
    if let Some(charge) = args.known_charge {
        config.charges.known_charge = Some(charge);
    }
    if let Some(sign) = &args.charge_sign {
        config.charges.sign = Some(parse_sign(sign)?);
    }
    if let Some(path) = &args.charge_file {
        config.charges.charge_file = Some(path.clone());
    }
    if !args.molecules.is_empty() {
        config.selection.include_molecules = args.molecules.clone();
    }
    if let Some(dir) = &args.table_dir {
        config.output.table_dir = dir.clone();
    }
    if let Some(prefix) = &args.table_prefix {
        config.output.table_prefix = prefix.clone();
    }
    if args.no_blank {
        config.output.write_blank = false;
    }
    if let Some(path) = &args.nonbond_template {
        config.output.nonbond_template = Some(path.clone());
    }
    if let Some(path) = &args.bonded_template {
        config.output.bonded_template = Some(path.clone());
    }
    if let Some(sigma) = args.sc_sigma {
        config.nonbonded.sc_sigma = Some(sigma);
    }
    Ok(())
}

fn parse_sign(value: &str) -> Result<ChargeSign> {
    match value {
        "+" => Ok(ChargeSign::Positive),
        "-" => Ok(ChargeSign::Negative),
        other => Err(CliError::Argument(format!(
            "Invalid charge sign '{}'. Expected '+' or '-'.",
            other
        ))),
    }
}
