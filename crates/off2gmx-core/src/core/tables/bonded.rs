//! # Bonded Lookup Tables
//!
//! ## Overview
//!
//! Quartic bonds and bond-bond cross terms have no native GROMACS
//! functional form, so every such parameter group becomes a numbered
//! lookup table referenced from `funct 8` rows in the topology. Numbering
//! starts at zero and runs through the quartic bond groups and then the
//! cross-term groups of each molecule, in file order, so the indices stay
//! unique across the whole force field.
//!
//! The cross term's `krr` coupling constant never enters its table; the
//! coupling is rendered directly in the topology instead.

use super::TableError;
use super::convert::ANGSTROM_TO_NM;
use super::grid::Grid;
use super::potentials::quartic_bond;
use crate::core::models::bonded::{Molecule, QbbCross, QuarticBond};
use tracing::{debug, warn};

/// Grid spacing for bonded tables, in nm.
pub const DEFAULT_BONDED_SPACING: f64 = 0.0001;

/// Grid length for bonded tables, in nm.
pub const DEFAULT_BONDED_LENGTH: f64 = 0.3;

/// One numbered lookup table: the radial grid plus its potential and force
/// columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BondedTable {
    index: u32,
    r: Vec<f64>,
    potential: Vec<f64>,
    force: Vec<f64>,
}

impl BondedTable {
    fn from_quartic(index: u32, grid: &Grid, r0: f64, k2: f64, k3: f64, k4: f64) -> Self {
        let mut potential = Vec::with_capacity(grid.len());
        let mut force = Vec::with_capacity(grid.len());
        for r in grid.eval_points() {
            let (u, f) = quartic_bond(r, r0, k2, k3, k4);
            potential.push(u);
            force.push(f);
        }
        Self {
            index,
            r: grid.points().to_vec(),
            potential,
            force,
        }
    }

    /// The table number, as used in `_b<n>.xvg` filenames and `funct 8`
    /// topology rows.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The three columns in file order.
    pub fn columns(&self) -> [&[f64]; 3] {
        [&self.r, &self.potential, &self.force]
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

/// The lookup tables of one molecule, keyed by the parameter set that
/// produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeTables {
    quartic_bonds: Vec<(QuarticBond, BondedTable)>,
    qbb_terms: Vec<(QbbCross, BondedTable)>,
}

impl MoleculeTables {
    pub fn quartic_bond(&self, params: &QuarticBond) -> Option<&BondedTable> {
        self.quartic_bonds
            .iter()
            .find(|(p, _)| p == params)
            .map(|(_, table)| table)
    }

    pub fn qbb(&self, params: &QbbCross) -> Option<&BondedTable> {
        self.qbb_terms
            .iter()
            .find(|(p, _)| p == params)
            .map(|(_, table)| table)
    }

    /// Tables in numbering order: quartic bonds first, then cross terms.
    pub fn iter(&self) -> impl Iterator<Item = &BondedTable> {
        self.quartic_bonds
            .iter()
            .map(|(_, table)| table)
            .chain(self.qbb_terms.iter().map(|(_, table)| table))
    }

    pub fn len(&self) -> usize {
        self.quartic_bonds.len() + self.qbb_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quartic_bonds.is_empty() && self.qbb_terms.is_empty()
    }
}

/// Bonded lookup tables for every selected molecule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondedTables {
    molecules: Vec<(String, MoleculeTables)>,
}

impl BondedTables {
    /// Builds the per-molecule tables.
    ///
    /// `include` restricts generation to the named molecules; empty means
    /// all. Every selected molecule gets an entry, even when it has no
    /// table terms; the grid parameters are only validated when at least
    /// one selected molecule needs a table.
    pub fn generate(
        molecules: &[Molecule],
        include: &[String],
        spacing: f64,
        length: f64,
    ) -> Result<Self, TableError> {
        for name in include {
            if !molecules.iter().any(|m| &m.name == name) {
                warn!(molecule = %name, "unknown molecule in selection; ignoring");
            }
        }

        let grid = if molecules
            .iter()
            .filter(|m| is_selected(include, m))
            .any(|m| m.bonded.has_table_terms())
        {
            Some(Grid::new(spacing, length)?)
        } else {
            None
        };

        let mut out = Vec::new();
        let mut next_index = 0u32;
        for molecule in molecules.iter().filter(|m| is_selected(include, m)) {
            let mut tables = MoleculeTables::default();
            if let Some(grid) = &grid {
                for group in &molecule.bonded.quartic_bonds {
                    let q = group.params;
                    let table = BondedTable::from_quartic(
                        next_index,
                        grid,
                        ANGSTROM_TO_NM * q.r0,
                        4.184e2 * q.k2,
                        4.184e3 * q.k3,
                        4.184e4 * q.k4,
                    );
                    tables.quartic_bonds.push((q, table));
                    next_index += 1;
                }
                for group in &molecule.bonded.qbb_terms {
                    let q = group.params;
                    let table = BondedTable::from_quartic(
                        next_index,
                        grid,
                        ANGSTROM_TO_NM * q.r0,
                        4.184e2 * q.k2,
                        4.184e3 * q.k3,
                        4.184e4 * q.k4,
                    );
                    tables.qbb_terms.push((q, table));
                    next_index += 1;
                }
            }
            out.push((molecule.name.clone(), tables));
        }
        debug!(
            tables = next_index,
            molecules = out.len(),
            "bonded tables built"
        );
        Ok(Self { molecules: out })
    }

    pub fn molecule(&self, name: &str) -> Option<&MoleculeTables> {
        self.molecules
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tables)| tables)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MoleculeTables)> {
        self.molecules
            .iter()
            .map(|(name, tables)| (name.as_str(), tables))
    }

    /// All tables across molecules, in numbering order.
    pub fn tables(&self) -> impl Iterator<Item = &BondedTable> {
        self.molecules.iter().flat_map(|(_, tables)| tables.iter())
    }

    pub fn len(&self) -> usize {
        self.molecules.iter().map(|(_, tables)| tables.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_selected(include: &[String], molecule: &Molecule) -> bool {
    include.is_empty() || include.iter().any(|name| name == &molecule.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bonded::{AngleGroup, BondGroup, BondedModel};

    fn quartic(r0: f64, k2: f64, k3: f64, k4: f64) -> QuarticBond {
        QuarticBond { r0, k2, k3, k4 }
    }

    fn molecule_with_bonds(name: &str, bonds: &[QuarticBond], crosses: &[QbbCross]) -> Molecule {
        let mut bonded = BondedModel::default();
        for params in bonds {
            bonded.quartic_bonds.push(BondGroup::new(*params));
        }
        for params in crosses {
            bonded.qbb_terms.push(AngleGroup::new(*params));
        }
        Molecule {
            name: name.to_string(),
            bonded,
        }
    }

    #[test]
    fn numbering_runs_across_molecules() {
        let cross = QbbCross {
            r0: 0.96,
            krr: 10.0,
            k2: 500.0,
            k3: -50.0,
            k4: 25.0,
        };
        let molecules = vec![
            molecule_with_bonds(
                "ETH",
                &[
                    quartic(1.53, 300.0, -100.0, 50.0),
                    quartic(1.09, 340.0, -120.0, 60.0),
                ],
                &[],
            ),
            molecule_with_bonds("WAT", &[quartic(0.96, 450.0, -80.0, 40.0)], &[cross]),
        ];

        let tables = BondedTables::generate(&molecules, &[], 0.01, 0.1).unwrap();
        assert_eq!(tables.len(), 4);

        let indices: Vec<u32> = tables.tables().map(|t| t.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        let wat = tables.molecule("WAT").unwrap();
        assert_eq!(
            wat.quartic_bond(&quartic(0.96, 450.0, -80.0, 40.0))
                .map(|t| t.index()),
            Some(2)
        );
        assert_eq!(wat.qbb(&cross).map(|t| t.index()), Some(3));
        assert!(wat.quartic_bond(&quartic(1.53, 300.0, -100.0, 50.0)).is_none());
    }

    #[test]
    fn table_values_follow_the_converted_quartic_form() {
        let params = quartic(1.0, 300.0, -100.0, 50.0);
        let molecules = vec![molecule_with_bonds("ETH", &[params], &[])];

        let tables = BondedTables::generate(&molecules, &[], 0.01, 0.1).unwrap();
        let table = tables
            .molecule("ETH")
            .and_then(|m| m.quartic_bond(&params))
            .unwrap();

        assert_eq!(table.len(), 11);
        let [r, potential, force] = table.columns();
        assert_eq!(r[0], 0.0);
        // the origin row repeats the first real grid point
        let (u, f) = quartic_bond(0.01, 0.1 * 1.0, 4.184e2 * 300.0, 4.184e3 * -100.0, 4.184e4 * 50.0);
        assert_eq!(potential[0], u);
        assert_eq!(force[0], f);
        assert_eq!(potential[0], potential[1]);

        let (u5, f5) = quartic_bond(5.0 * 0.01, 0.1, 4.184e2 * 300.0, 4.184e3 * -100.0, 4.184e4 * 50.0);
        assert_eq!(potential[5], u5);
        assert_eq!(force[5], f5);
    }

    #[test]
    fn cross_term_coupling_stays_out_of_the_table() {
        let cross = QbbCross {
            r0: 1.0,
            krr: 999.0,
            k2: 300.0,
            k3: -100.0,
            k4: 50.0,
        };
        let molecules = vec![molecule_with_bonds("WAT", &[], &[cross])];

        let tables = BondedTables::generate(&molecules, &[], 0.01, 0.1).unwrap();
        let table = tables.molecule("WAT").and_then(|m| m.qbb(&cross)).unwrap();

        let (u, _) = quartic_bond(0.01, 0.1 * 1.0, 4.184e2 * 300.0, 4.184e3 * -100.0, 4.184e4 * 50.0);
        assert_eq!(table.columns()[1][0], u);
    }

    #[test]
    fn selection_skips_other_molecules_but_keeps_empty_ones() {
        let molecules = vec![
            molecule_with_bonds("ETH", &[quartic(1.53, 300.0, -100.0, 50.0)], &[]),
            molecule_with_bonds("WAT", &[quartic(0.96, 450.0, -80.0, 40.0)], &[]),
            molecule_with_bonds("ION", &[], &[]),
        ];

        let tables =
            BondedTables::generate(&molecules, &["WAT".to_string(), "ION".to_string()], 0.01, 0.1)
                .unwrap();

        assert!(tables.molecule("ETH").is_none());
        assert_eq!(
            tables
                .molecule("WAT")
                .and_then(|m| m.quartic_bond(&quartic(0.96, 450.0, -80.0, 40.0)))
                .map(|t| t.index()),
            Some(0)
        );
        let ion = tables.molecule("ION").unwrap();
        assert!(ion.is_empty());
    }

    #[test]
    fn molecules_without_table_terms_skip_grid_validation() {
        let molecules = vec![molecule_with_bonds("ION", &[], &[])];

        // degenerate spacing, but nothing needs a grid
        let tables = BondedTables::generate(&molecules, &[], 0.0, 0.1).unwrap();
        assert!(tables.is_empty());
        assert_eq!(tables.molecules.len(), 1);

        let molecules = vec![molecule_with_bonds(
            "ETH",
            &[quartic(1.53, 300.0, -100.0, 50.0)],
            &[],
        )];
        assert!(BondedTables::generate(&molecules, &[], 0.0, 0.1).is_err());
    }
}
