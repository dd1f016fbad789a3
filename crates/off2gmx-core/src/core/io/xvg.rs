//! # Tabulated Potential Files
//!
//! Writers for the `.xvg` table files GROMACS reads alongside a tabulated
//! topology.
//!
//! ## Overview
//!
//! Every table shares one row format: each value is rendered in fixed-width
//! uppercase scientific notation (20 characters, 8 fractional digits, a
//! signed two-digit exponent) and columns are joined by a single space, one
//! grid point per line. Nonbonded pair tables carry seven columns
//! `[r, U_cou, F_cou, U_att, F_att, U_rep, F_rep]`, bonded tables three
//! `[r, U, F]`, and the mandatory blank default table is all zeros past its
//! distance column.
//!
//! File naming follows the GROMACS `energygrp_table` convention: a pair
//! table is `<prefix>_<At1>_<At2>.xvg` with translated atom names, a bonded
//! table is `<prefix>_b<index>.xvg`, and the default table is
//! `<prefix>.xvg`.

use crate::core::models::naming::NameTranslation;
use crate::core::models::nonbonded::PairKey;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Directory the tables land in when the caller does not pick one.
pub const DEFAULT_TABLE_DIR: &str = "tabpot";

/// Grid spacing of the blank default table, in nm.
pub const BLANK_TABLE_SPACING: f64 = 0.0005;

/// Extent of the blank default table, in nm.
pub const BLANK_TABLE_LENGTH: f64 = 5.0;

/// Formats a value the way C's `%.*E` does: an uppercase mantissa with
/// `precision` fractional digits and a signed exponent of at least two
/// digits.
pub(crate) fn scientific(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rendered = format!("{value:.precision$e}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("+", exponent),
            };
            format!("{mantissa}E{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

/// One table field: 8-digit scientific notation right-justified to 20
/// characters.
fn field(value: f64) -> String {
    format!("{:>20}", scientific(value, 8))
}

/// Writes columns of equal length as space-separated rows.
pub fn write_columns(writer: &mut impl Write, columns: &[&[f64]]) -> io::Result<()> {
    let rows = columns.first().map_or(0, |column| column.len());
    for row in 0..rows {
        let line = columns
            .iter()
            .map(|column| field(column[row]))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Writes columns to a file, creating or truncating it.
pub fn write_columns_path<P: AsRef<Path>>(path: P, columns: &[&[f64]]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_columns(&mut writer, columns)
}

/// Writes the all-zero default table GROMACS requires next to the pair
/// tables.
///
/// Covers 0 to 5.0 nm at 0.0005 nm spacing. The distance column carries the
/// real grid; the six potential and force columns are zero.
pub fn write_blank_table(writer: &mut impl Write) -> io::Result<()> {
    let points = (BLANK_TABLE_LENGTH / BLANK_TABLE_SPACING).round() as usize + 1;
    let zero = field(0.0);
    for index in 0..points {
        let mut line = field(index as f64 * BLANK_TABLE_SPACING);
        for _ in 0..6 {
            line.push(' ');
            line.push_str(&zero);
        }
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Writes the blank default table to a file, creating or truncating it.
pub fn write_blank_table_path<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_blank_table(&mut writer)
}

/// Creates the output directory, including missing parents.
pub fn ensure_output_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Path of a nonbonded pair table: `<prefix>_<At1>_<At2>.xvg` with
/// translated atom names.
pub fn pair_table_path(
    dir: &Path,
    prefix: &str,
    pair: &PairKey,
    translation: &NameTranslation,
) -> PathBuf {
    let first = translation.translate(pair.first());
    let second = translation.translate(pair.second());
    dir.join(format!("{prefix}_{first}_{second}.xvg"))
}

/// Path of a bonded table: `<prefix>_b<index>.xvg`.
pub fn bonded_table_path(dir: &Path, prefix: &str, index: u32) -> PathBuf {
    dir.join(format!("{prefix}_b{index}.xvg"))
}

/// Path of the blank default table: `<prefix>.xvg`.
pub fn blank_table_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}.xvg"))
}

/// Energy-group bookkeeping collected while writing nonbonded tables.
///
/// A tabulated run needs every written atom type listed under `energygrps`
/// and every written pair under `energygrp_table` in the run input. Atom
/// names are deduplicated in first-seen order before translation, so two
/// `.off` names mapping to one output name stay distinct entries.
#[derive(Debug, Clone, Default)]
pub struct EnergyGroups {
    atoms: Vec<String>,
    pairs: Vec<(String, String)>,
}

impl EnergyGroups {
    /// Collects groups from the pairs about to be written, in iteration
    /// order.
    pub fn collect<'a>(
        pairs: impl IntoIterator<Item = &'a PairKey>,
        translation: &NameTranslation,
    ) -> Self {
        let mut seen: Vec<&str> = Vec::new();
        let mut translated_pairs = Vec::new();
        for pair in pairs {
            translated_pairs.push((
                translation.translate(pair.first()).to_string(),
                translation.translate(pair.second()).to_string(),
            ));
            for name in [pair.first(), pair.second()] {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        let atoms = seen
            .into_iter()
            .map(|name| translation.translate(name).to_string())
            .collect();
        Self {
            atoms,
            pairs: translated_pairs,
        }
    }

    /// Translated atom names in first-seen order.
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    /// Translated pairs in table-writing order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `energygrps` value: atom names joined by single spaces.
    pub fn energygrps_line(&self) -> String {
        self.atoms.join(" ")
    }

    /// The `energygrp_table` value: pairs joined by two spaces, the atoms of
    /// each pair by one.
    pub fn energygrp_table_line(&self) -> String {
        self.pairs
            .iter()
            .map(|(first, second)| format!("{first} {second}"))
            .collect::<Vec<_>>()
            .join("  ")
    }
}
