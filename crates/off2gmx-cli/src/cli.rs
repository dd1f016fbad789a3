use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "off2gmx - Convert CRYOFF force-field (.off) files into GROMACS tabulated potentials and topology sections.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate tabulated potentials and topology sections from a fitted force field.
    Convert(ConvertArgs),
    /// Parse a force-field file and report its molecules and pair interactions.
    Inspect(InspectArgs),
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    // --- Core Arguments ---
    /// Path to the CRYOFF force-field file (e.g., water.off).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the conversion configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Charge Overrides ---
    /// Override the atom name whose known charge anchors the derivation.
    #[arg(long, value_name = "NAME")]
    pub known_atom: Option<String>,

    /// Override the known atom's charge.
    #[arg(long, value_name = "FLOAT")]
    pub known_charge: Option<f64>,

    /// Take the known atom's charge as the square root of its self-pair
    /// Coulomb coefficient with this sign ('+' or '-').
    #[arg(long, value_name = "SIGN", conflicts_with = "known_charge")]
    pub charge_sign: Option<String>,

    /// Override charges by atom name from a charge file, after derivation.
    #[arg(long, value_name = "PATH")]
    pub charge_file: Option<PathBuf>,

    // --- Selection Overrides ---
    /// Restrict generation to this molecule. Can be used multiple times.
    #[arg(short, long = "molecule", value_name = "NAME")]
    pub molecules: Vec<String>,

    // --- Output Overrides ---
    /// Override the table output directory from the config file.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub table_dir: Option<PathBuf>,

    /// Override the table file prefix from the config file.
    #[arg(short = 'p', long, value_name = "PREFIX")]
    pub table_prefix: Option<String>,

    /// Skip writing the all-zero default table.
    #[arg(long)]
    pub no_blank: bool,

    /// Topology template whose [ nonbond_params ] section receives the
    /// generated pair entries.
    #[arg(long, value_name = "PATH")]
    pub nonbond_template: Option<PathBuf>,

    /// Topology template whose [ moleculetype ] blocks receive the
    /// generated bonded sections.
    #[arg(long, value_name = "PATH")]
    pub bonded_template: Option<PathBuf>,

    /// Scale repulsive table columns for soft-core free-energy runs with
    /// this sc-sigma value.
    #[arg(long, value_name = "FLOAT")]
    pub sc_sigma: Option<f64>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the CRYOFF force-field file to inspect.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,
}
