//! # Conversion Workflow
//!
//! ## Overview
//!
//! End-to-end conversion of one `.off` file into GROMACS inputs, driven
//! by a [`ConvertConfig`]. [`OffForceField`] is the parsed file plus its
//! charge state, with one method per derivation step for callers that
//! need finer control than [`run`]:
//!
//! 1. Parse the file and derive or load per-atom charges.
//! 2. Filter the pair interactions and generate the nonbonded tables,
//!    scaling repulsive columns when a soft-core sigma is configured.
//! 3. Write the tables and the blank default table, collecting the
//!    energy groups the run input must declare.
//! 4. Generate and write the bonded tables of the selected molecules.
//! 5. Splice the generated sections into the topology templates, when
//!    templates are configured.

use super::config::{ConfigError, ConvertConfig};
use crate::core::charges::{self, ChargeError, KnownCharge};
use crate::core::io::charge_file;
use crate::core::io::off::{OffError, OffFile, ParsedOff};
use crate::core::io::xvg::{self, EnergyGroups};
use crate::core::models::bonded::Molecule;
use crate::core::models::charges::ChargeModel;
use crate::core::models::naming::NameTranslation;
use crate::core::models::nonbonded::{
    FilteredNonbonded, InteractionKey, NonbondedFilter, NonbondedModel, PairKey,
};
use crate::core::tables::TableError;
use crate::core::tables::bonded::BondedTables;
use crate::core::tables::nonbonded::{NonbondedTableOptions, NonbondedTables};
use crate::core::topology::TopologyError;
use crate::core::topology::bonded::{MoleculeSections, render_molecules};
use crate::core::topology::nonbond::NonbondParams;
use crate::core::topology::template::{splice_moleculetypes, splice_nonbond_params};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read the force field: {source}")]
    Parse {
        #[from]
        source: OffError,
    },
    #[error("invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
    #[error("charge derivation failed: {source}")]
    Charges {
        #[from]
        source: ChargeError,
    },
    #[error("table generation failed: {source}")]
    Tables {
        #[from]
        source: TableError,
    },
    #[error("topology generation failed: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },
    #[error("template '{path}' could not be read: {source}")]
    Template { path: String, source: io::Error },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A parsed `.off` force field and its charge state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffForceField {
    pub molecules: Vec<Molecule>,
    pub nonbonded: NonbondedModel,
    pub charges: ChargeModel,
}

impl OffForceField {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        Ok(Self::from_parsed(OffFile::read_path(path)?))
    }

    pub fn parse_str(source: &str) -> Result<Self, ConvertError> {
        Ok(Self::from_parsed(OffFile::parse_str(source)?))
    }

    fn from_parsed(parsed: ParsedOff) -> Self {
        let charges = ChargeModel::zeroed(&parsed.molecules);
        Self {
            molecules: parsed.molecules,
            nonbonded: parsed.nonbonded,
            charges,
        }
    }

    /// Derives per-atom charges from the Coulomb coefficients, replacing
    /// the current charge state.
    pub fn calc_charges(
        &mut self,
        known_atom: &str,
        known: KnownCharge,
        tolerance: f64,
    ) -> Result<(), ConvertError> {
        self.charges = charges::derive(
            &self.molecules,
            &self.nonbonded,
            known_atom,
            known,
            tolerance,
        )?;
        Ok(())
    }

    /// Overrides charges from a charge file; returns how many assignments
    /// were applied.
    pub fn load_charges<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, ConvertError> {
        Ok(charge_file::read_path(path, &mut self.charges)?)
    }

    pub fn filtered(&self, filter: &NonbondedFilter) -> FilteredNonbonded {
        self.nonbonded.filtered(filter, &self.molecules)
    }

    pub fn nonbonded_tables(
        &self,
        filter: &NonbondedFilter,
        options: &NonbondedTableOptions,
    ) -> Result<NonbondedTables, ConvertError> {
        Ok(NonbondedTables::generate(&self.filtered(filter), options)?)
    }

    pub fn bonded_tables(
        &self,
        include: &[String],
        spacing: f64,
        length: f64,
    ) -> Result<BondedTables, ConvertError> {
        Ok(BondedTables::generate(
            &self.molecules,
            include,
            spacing,
            length,
        )?)
    }

    pub fn nonbond_params(
        &self,
        filter: &NonbondedFilter,
        scale_c6: bool,
        special_pairs: &BTreeMap<PairKey, Vec<InteractionKey>>,
    ) -> Result<NonbondParams, ConvertError> {
        Ok(NonbondParams::generate(
            &self.filtered(filter),
            scale_c6,
            special_pairs,
        )?)
    }

    pub fn bonded_sections(
        &self,
        include: &[String],
        translation: &NameTranslation,
        tables: &BondedTables,
    ) -> Result<Vec<(String, MoleculeSections)>, ConvertError> {
        Ok(render_molecules(
            &self.molecules,
            include,
            &self.charges,
            translation,
            tables,
        )?)
    }
}

/// What [`run`] produced, for reporting.
#[derive(Debug, Clone)]
pub struct ConvertSummary {
    pub molecules: usize,
    pub nonbonded_tables: usize,
    pub bonded_tables: usize,
    /// Groups the run input must declare for the written pair tables.
    pub energy_groups: EnergyGroups,
    pub nonbond_topology: Option<PathBuf>,
    pub bonded_topology: Option<PathBuf>,
}

/// Writes every nonbonded pair table under `dir` and collects the energy
/// groups of the written pairs.
pub fn write_nonbonded_tables(
    tables: &NonbondedTables,
    dir: &Path,
    prefix: &str,
    translation: &NameTranslation,
    write_blank: bool,
) -> Result<EnergyGroups, ConvertError> {
    xvg::ensure_output_dir(dir)?;
    for (pair, table) in tables.iter() {
        let path = xvg::pair_table_path(dir, prefix, pair, translation);
        xvg::write_columns_path(path, &table.columns())?;
    }
    let groups = EnergyGroups::collect(tables.pairs(), translation);
    if write_blank {
        xvg::write_blank_table_path(xvg::blank_table_path(dir, prefix))?;
    }
    info!(
        tables = tables.len(),
        dir = %dir.display(),
        "nonbonded tables written"
    );
    Ok(groups)
}

/// Writes every numbered bonded table under `dir`.
pub fn write_bonded_tables(
    tables: &BondedTables,
    dir: &Path,
    prefix: &str,
) -> Result<(), ConvertError> {
    xvg::ensure_output_dir(dir)?;
    for table in tables.tables() {
        let path = xvg::bonded_table_path(dir, prefix, table.index());
        xvg::write_columns_path(path, &table.columns())?;
    }
    info!(
        tables = tables.len(),
        dir = %dir.display(),
        "bonded tables written"
    );
    Ok(())
}

/// Runs the full conversion.
#[instrument(skip_all, name = "convert_workflow")]
pub fn run(off_path: &Path, config: &ConvertConfig) -> Result<ConvertSummary, ConvertError> {
    info!(path = %off_path.display(), "reading force field");
    let mut forcefield = OffForceField::from_path(off_path)?;
    info!(
        molecules = forcefield.molecules.len(),
        pairs = forcefield.nonbonded.len(),
        "force field parsed"
    );

    if let Some((atom, known)) = config.charges.known() {
        forcefield.calc_charges(atom, known, config.charges.tolerance)?;
    }
    if let Some(path) = &config.charges.charge_file {
        let assigned = forcefield.load_charges(path)?;
        info!(assigned, path = %path.display(), "charge file applied");
    }

    let translation = config.translation();
    let table_options = config.nonbonded.table_options()?;
    let mut tables = forcefield.nonbonded_tables(&config.selection, &table_options)?;

    // Pair parameters are needed for the topology and for soft-core
    // scaling; skip the derivation when neither is requested.
    let params = if config.output.nonbond_template.is_some() || config.nonbonded.sc_sigma.is_some()
    {
        Some(forcefield.nonbond_params(
            &config.selection,
            table_options.scale_c6,
            &table_options.special_pairs,
        )?)
    } else {
        None
    };

    if let (Some(sc_sigma), Some(params)) = (config.nonbonded.sc_sigma, params.as_ref()) {
        info!(sc_sigma, "scaling repulsive columns for soft-core runs");
        for (pair, factor) in params.soft_core_factors(sc_sigma) {
            if !tables.scale_repulsive(pair, factor) {
                warn!(pair = %pair, "soft-core pair has no table; skipping");
            }
        }
    }

    let energy_groups = write_nonbonded_tables(
        &tables,
        &config.output.table_dir,
        &config.output.table_prefix,
        &translation,
        config.output.write_blank,
    )?;

    let bonded_tables = forcefield.bonded_tables(
        &config.selection.include_molecules,
        config.bonded.spacing,
        config.bonded.length,
    )?;
    if !bonded_tables.is_empty() {
        write_bonded_tables(
            &bonded_tables,
            &config.output.table_dir,
            &config.output.table_prefix,
        )?;
    }

    let mut summary = ConvertSummary {
        molecules: forcefield.molecules.len(),
        nonbonded_tables: tables.len(),
        bonded_tables: bonded_tables.len(),
        energy_groups,
        nonbond_topology: None,
        bonded_topology: None,
    };

    if let (Some(template_path), Some(params)) = (&config.output.nonbond_template, params.as_ref())
    {
        let template = read_template(template_path)?;
        let spliced = splice_nonbond_params(&template, &params.render(&translation))?;
        fs::write(&config.output.nonbond_topology, spliced)?;
        info!(path = %config.output.nonbond_topology.display(), "nonbonded topology written");
        summary.nonbond_topology = Some(config.output.nonbond_topology.clone());
    }

    if let Some(template_path) = &config.output.bonded_template {
        let template = read_template(template_path)?;
        let sections = forcefield.bonded_sections(
            &config.selection.include_molecules,
            &translation,
            &bonded_tables,
        )?;
        let spliced = splice_moleculetypes(&template, &sections);
        fs::write(&config.output.bonded_topology, spliced)?;
        info!(path = %config.output.bonded_topology.display(), "bonded topology written");
        summary.bonded_topology = Some(config.output.bonded_topology.clone());
    }

    Ok(summary)
}

fn read_template(path: &Path) -> Result<String, ConvertError> {
    fs::read_to_string(path).map_err(|e| ConvertError::Template {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::charges::DEFAULT_TOLERANCE;
    use crate::workflows::config::{BondedConfig, ChargeConfig, NonbondedConfig, OutputConfig};

    const OFF: &str = "\
CRYOFF run input
 [ MOL ] WAT 1
 [ ATO ] 4
  1  OW   OW
  2  HW   HW
  3  HW   HW
  4  NETF NETF
 [ BON ]
  HAR
  1 2
  QUA
  1 3
Atom Types:
 OW HW
Intra-Potential:
 [ BON HAR WAT ]  0.9572  450.0
 [ BON QUA WAT ]  0.95  500.0  -100.0  50.0
Inter-Potential:
 HW~HW : COU :  0.3 : 0 0 0 0
 HW~OW : COU :  -0.55 : 0 0 0 0
 OW~OW : POW :  140.0  -6.0 : 0 0 0 0
 HW~OW : EXP :  50.0  3.5 : 0 0 0 0
End Inter-Potential
Molecular-Definition:
none
Table-Potential:
none
";

    #[test]
    fn facade_parses_and_derives_state() {
        let mut forcefield = OffForceField::parse_str(OFF).unwrap();
        assert_eq!(forcefield.molecules.len(), 1);
        assert_eq!(forcefield.nonbonded.len(), 3);
        assert_eq!(forcefield.charges.charge_or_zero("WAT", "OW"), 0.0);

        forcefield
            .calc_charges("HW", KnownCharge::Value(0.52), DEFAULT_TOLERANCE)
            .unwrap();
        assert_eq!(forcefield.charges.get("WAT", "HW"), Some(0.52885));
        assert_eq!(forcefield.charges.get("WAT", "OW"), Some(-1.05769));

        let options = NonbondedTableOptions {
            spacing: 0.01,
            ..Default::default()
        };
        let tables = forcefield
            .nonbonded_tables(&NonbondedFilter::default(), &options)
            .unwrap();
        assert_eq!(tables.len(), 2);

        let bonded = forcefield.bonded_tables(&[], 0.01, 0.3).unwrap();
        assert_eq!(bonded.len(), 1);
    }

    #[test]
    fn run_writes_tables_and_topologies() {
        let dir = tempfile::tempdir().unwrap();
        let off_path = dir.path().join("water.off");
        fs::write(&off_path, OFF).unwrap();

        let nonbond_template = dir.path().join("template_nb.top");
        fs::write(
            &nonbond_template,
            "[ defaults ]\n1 1 no\n\n[ nonbond_params ]\n\n[ system ]\nWater\n",
        )
        .unwrap();
        let bonded_template = dir.path().join("template_b.top");
        fs::write(
            &bonded_template,
            "[ moleculetype ]\nWAT 2\n\n[ atoms ]\n\n[ bonds ]\n\n[ system ]\nWater\n",
        )
        .unwrap();

        let config = ConvertConfig {
            charges: ChargeConfig {
                known_atom: Some("HW".to_string()),
                known_charge: Some(0.52),
                ..Default::default()
            },
            nonbonded: NonbondedConfig {
                spacing: 0.01,
                ..Default::default()
            },
            bonded: BondedConfig {
                spacing: 0.01,
                ..Default::default()
            },
            naming: BTreeMap::from([("OW".to_string(), "OW_spc".to_string())]),
            output: OutputConfig {
                table_dir: dir.path().join("tabpot"),
                nonbond_template: Some(nonbond_template),
                nonbond_topology: dir.path().join("nonbond_topol.top"),
                bonded_template: Some(bonded_template),
                bonded_topology: dir.path().join("bonded_topol.top"),
                ..Default::default()
            },
            ..Default::default()
        };

        let summary = run(&off_path, &config).unwrap();
        assert_eq!(summary.molecules, 1);
        assert_eq!(summary.nonbonded_tables, 2);
        assert_eq!(summary.bonded_tables, 1);
        assert_eq!(summary.energy_groups.atoms(), ["HW", "OW_spc"]);
        assert_eq!(
            summary.energy_groups.energygrp_table_line(),
            "HW OW_spc  OW_spc OW_spc"
        );

        let tabdir = dir.path().join("tabpot");
        assert!(tabdir.join("MOL_HW_OW_spc.xvg").exists());
        assert!(tabdir.join("MOL_OW_spc_OW_spc.xvg").exists());
        assert!(tabdir.join("MOL.xvg").exists());
        assert!(tabdir.join("MOL_b0.xvg").exists());

        let nonbond = fs::read_to_string(summary.nonbond_topology.as_ref().unwrap()).unwrap();
        assert!(nonbond.contains(
            "[ nonbond_params ]\n\
             HW     OW_spc 1      0.000000000000E+00  1.000000000000E+00  \n\
             OW_spc OW_spc 1      5.857600000000E-04  0.000000000000E+00  \n"
        ));
        assert!(nonbond.ends_with("[ system ]\nWater\n"));

        let bonded = fs::read_to_string(summary.bonded_topology.as_ref().unwrap()).unwrap();
        assert!(bonded.contains("1       OW_spc  1       WAT     OW_spc  1       -1.05769\n"));
        assert!(bonded.contains("       1       2       1   0.09572           188280.00\n"));
        assert!(bonded.contains("       1       3       8       0     1.0\n"));
    }

    #[test]
    fn run_without_templates_skips_topologies() {
        let dir = tempfile::tempdir().unwrap();
        let off_path = dir.path().join("water.off");
        fs::write(&off_path, OFF).unwrap();

        let config = ConvertConfig {
            nonbonded: NonbondedConfig {
                spacing: 0.01,
                sc_sigma: Some(0.3),
                ..Default::default()
            },
            bonded: BondedConfig {
                spacing: 0.01,
                ..Default::default()
            },
            output: OutputConfig {
                table_dir: dir.path().join("tabpot"),
                ..Default::default()
            },
            ..Default::default()
        };

        let summary = run(&off_path, &config).unwrap();
        assert!(summary.nonbond_topology.is_none());
        assert!(summary.bonded_topology.is_none());
        assert!(dir.path().join("tabpot").join("MOL.xvg").exists());
        assert!(!dir.path().join("nonbond_topol.top").exists());
    }
}
