//! # Conversion Configuration
//!
//! ## Overview
//!
//! TOML-backed options for the conversion workflow. Every knob has a
//! default matching the generator defaults, so an empty document is a
//! valid configuration; unknown keys are rejected so typos surface
//! instead of silently falling back.
//!
//! ```toml
//! [charges]
//! known-atom = "HW"
//! known-charge = 0.52
//!
//! [selection]
//! exclude-interactions = ["BUCWATER"]
//!
//! [naming]
//! OW = "OW_spc"
//!
//! [output]
//! nonbond-template = "template.top"
//! ```

use crate::core::charges::{ChargeSign, DEFAULT_TOLERANCE, KnownCharge};
use crate::core::io::xvg::DEFAULT_TABLE_DIR;
use crate::core::models::naming::NameTranslation;
use crate::core::models::nonbonded::{
    InteractionKey, NonbondedFilter, PairKey, ParseInteractionKeyError,
};
use crate::core::tables::bonded::{DEFAULT_BONDED_LENGTH, DEFAULT_BONDED_SPACING};
use crate::core::tables::nonbonded::{
    DEFAULT_NONBONDED_LENGTH, DEFAULT_NONBONDED_SPACING, NonbondedTableOptions,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Table file prefix when the configuration does not pick one.
pub const DEFAULT_TABLE_PREFIX: &str = "MOL";

const DEFAULT_NONBOND_TOPOLOGY: &str = "nonbond_topol.top";
const DEFAULT_BONDED_TOPOLOGY: &str = "bonded_topol.top";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid attractive interaction key: {0}")]
    InteractionKey(#[from] ParseInteractionKeyError),
}

/// Options for the whole conversion workflow.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConvertConfig {
    pub charges: ChargeConfig,
    pub selection: NonbondedFilter,
    pub nonbonded: NonbondedConfig,
    pub bonded: BondedConfig,
    /// Atom name translation, `.off` name to topology name.
    pub naming: BTreeMap<String, String>,
    pub output: OutputConfig,
}

impl ConvertConfig {
    /// Loads a configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn translation(&self) -> NameTranslation {
        NameTranslation::from(self.naming.clone())
    }
}

/// How partial charges are obtained.
///
/// With `known-atom` plus either `known-charge` or `sign`, charges are
/// derived from the Coulomb coefficients; a `charge-file` is applied on
/// top afterwards. With neither, every charge stays zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ChargeConfig {
    pub known_atom: Option<String>,
    /// Charge of the known atom; takes precedence over `sign`.
    pub known_charge: Option<f64>,
    /// Sign of the charge taken as the square root of the known atom's
    /// self-pair Coulomb coefficient.
    pub sign: Option<ChargeSign>,
    pub tolerance: f64,
    pub charge_file: Option<PathBuf>,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            known_atom: None,
            known_charge: None,
            sign: None,
            tolerance: DEFAULT_TOLERANCE,
            charge_file: None,
        }
    }
}

impl ChargeConfig {
    /// The derivation request, when the configuration asks for one.
    pub fn known(&self) -> Option<(&str, KnownCharge)> {
        let atom = self.known_atom.as_deref()?;
        if let Some(value) = self.known_charge {
            return Some((atom, KnownCharge::Value(value)));
        }
        self.sign
            .map(|sign| (atom, KnownCharge::SelfCoulomb(sign)))
    }
}

/// Grid and routing options for the nonbonded tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct NonbondedConfig {
    /// Grid spacing in nm.
    pub spacing: f64,
    /// Grid length in nm.
    pub length: f64,
    pub scale_c6: bool,
    /// Soft-core sigma for free-energy runs; scales each eligible pair's
    /// repulsive columns by `1/(C6 * sc_sigma^6)`.
    pub sc_sigma: Option<f64>,
    pub special_pairs: Vec<SpecialPairConfig>,
}

impl Default for NonbondedConfig {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_NONBONDED_SPACING,
            length: DEFAULT_NONBONDED_LENGTH,
            scale_c6: true,
            sc_sigma: None,
            special_pairs: Vec::new(),
        }
    }
}

impl NonbondedConfig {
    /// Builds the typed table options, parsing the special-pair keys.
    pub fn table_options(&self) -> Result<NonbondedTableOptions, ConfigError> {
        let mut special_pairs = BTreeMap::new();
        for entry in &self.special_pairs {
            let keys = entry
                .attractive
                .iter()
                .map(|name| name.parse())
                .collect::<Result<Vec<InteractionKey>, _>>()?;
            special_pairs.insert(PairKey::new(&entry.pair.0, &entry.pair.1), keys);
        }
        Ok(NonbondedTableOptions {
            spacing: self.spacing,
            length: self.length,
            scale_c6: self.scale_c6,
            special_pairs,
        })
    }
}

/// One pair whose attractive interaction keys are chosen by hand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SpecialPairConfig {
    /// The two atom types, in either order.
    pub pair: (String, String),
    /// Normalized interaction keys, e.g. `"POW_6"` or `"BUC"`.
    pub attractive: Vec<String>,
}

/// Grid options for the bonded lookup tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct BondedConfig {
    /// Grid spacing in nm.
    pub spacing: f64,
    /// Grid length in nm.
    pub length: f64,
}

impl Default for BondedConfig {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_BONDED_SPACING,
            length: DEFAULT_BONDED_LENGTH,
        }
    }
}

/// Where the generated files land.
///
/// Topologies are only written when the matching template is set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub table_dir: PathBuf,
    pub table_prefix: String,
    /// Also write the all-zero default table `<prefix>.xvg`.
    pub write_blank: bool,
    pub nonbond_template: Option<PathBuf>,
    pub nonbond_topology: PathBuf,
    pub bonded_template: Option<PathBuf>,
    pub bonded_topology: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            table_dir: PathBuf::from(DEFAULT_TABLE_DIR),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            write_blank: true,
            nonbond_template: None,
            nonbond_topology: PathBuf::from(DEFAULT_NONBOND_TOPOLOGY),
            bonded_template: None,
            bonded_topology: PathBuf::from(DEFAULT_BONDED_TOPOLOGY),
        }
    }
}
