//! # Charge Assignment Files
//!
//! Reader for the plain-text sidecar format that assigns partial charges to
//! parsed molecules:
//!
//! ```text
//! WAT
//! O1 -0.8476
//! H1  0.4238
//! ```
//!
//! A one-token line selects a molecule; a two-token line assigns a charge to
//! an atom of the current molecule. Blank lines and lines starting with `#`
//! are ignored. Unknown molecules, unknown atom names, and malformed charge
//! values are skipped with a warning rather than failing the whole file, and
//! atoms the file never mentions keep the charge they already have.

use crate::core::models::charges::ChargeModel;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Applies charge assignments from `reader` onto `charges`.
///
/// Returns the number of charges assigned.
pub fn read_from(reader: &mut impl BufRead, charges: &mut ChargeModel) -> io::Result<usize> {
    let mut current: Option<String> = None;
    let mut assigned = 0;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        match fields.as_slice() {
            [molecule] => {
                if charges.contains_molecule(molecule) {
                    current = Some(molecule.to_string());
                } else {
                    warn!(
                        molecule,
                        "charge file names an unknown molecule, skipping its atom lines"
                    );
                    current = None;
                }
            }
            [atom, value] => {
                let Some(molecule) = current.as_deref() else {
                    warn!(atom, "charge line without a known molecule in scope, skipped");
                    continue;
                };
                let charge: f64 = match value.parse() {
                    Ok(parsed) => parsed,
                    Err(_) => {
                        warn!(molecule, atom, value, "unparseable charge value, skipped");
                        continue;
                    }
                };
                if charges.set(molecule, atom, charge) {
                    assigned += 1;
                } else {
                    warn!(molecule, atom, "charge file names an unknown atom, skipped");
                }
            }
            _ => {
                warn!(
                    line = trimmed,
                    "charge line is not 'MOLNAME' or 'ATOM CHARGE', skipped"
                );
            }
        }
    }

    Ok(assigned)
}

/// Applies charge assignments from the file at `path` onto `charges`.
pub fn read_path<P: AsRef<Path>>(path: P, charges: &mut ChargeModel) -> io::Result<usize> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_from(&mut reader, charges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bonded::{AtomRecord, BondedModel, Molecule};
    use std::io::Write;

    fn model() -> ChargeModel {
        let mut water = BondedModel::default();
        water.atoms.push(AtomRecord::new(1, "OW", "O1"));
        water.atoms.push(AtomRecord::new(2, "HW", "H1"));
        water.atoms.push(AtomRecord::new(3, "HW", "H2"));
        let mut ion = BondedModel::default();
        ion.atoms.push(AtomRecord::new(1, "NA", "NA1"));
        ChargeModel::zeroed(&[
            Molecule {
                name: "WAT".to_string(),
                bonded: water,
            },
            Molecule {
                name: "ION".to_string(),
                bonded: ion,
            },
        ])
    }

    #[test]
    fn assigns_charges_under_molecule_headers() {
        let mut charges = model();
        let text = "# water charges\nWAT\nO1 -0.8476\nH1 0.4238\nH2 0.4238\n\nION\nNA1 1.0\n";
        let assigned = read_from(&mut text.as_bytes(), &mut charges).unwrap();
        assert_eq!(assigned, 4);
        assert_eq!(charges.get("WAT", "O1"), Some(-0.8476));
        assert_eq!(charges.get("ION", "NA1"), Some(1.0));
    }

    #[test]
    fn skips_unknown_names_and_bad_values_without_failing() {
        let mut charges = model();
        let text = "GHOST\nO1 -0.5\nWAT\nXX 1.0\nO1 not-a-number\nO1 -0.8\n";
        let assigned = read_from(&mut text.as_bytes(), &mut charges).unwrap();
        assert_eq!(assigned, 1);
        assert_eq!(charges.get("WAT", "O1"), Some(-0.8));
        assert_eq!(charges.get("WAT", "H1"), Some(0.0));
    }

    #[test]
    fn unmentioned_atoms_keep_their_charges() {
        let mut charges = model();
        charges.set("WAT", "H2", 0.1);
        let text = "WAT\nO1 -0.2\n";
        read_from(&mut text.as_bytes(), &mut charges).unwrap();
        assert_eq!(charges.get("WAT", "H2"), Some(0.1));
    }

    #[test]
    fn reads_from_a_file_path() {
        let mut charges = model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charges.txt");
        let mut file = File::create(&path).unwrap();
        write!(file, "WAT\nO1 -0.8476\n").unwrap();
        let assigned = read_path(&path, &mut charges).unwrap();
        assert_eq!(assigned, 1);
        assert_eq!(charges.get("WAT", "O1"), Some(-0.8476));
    }
}
