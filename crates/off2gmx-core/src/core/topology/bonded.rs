//! # Bonded Topology Sections
//!
//! ## Overview
//!
//! Renders the per-molecule section bodies spliced into a topology
//! template: `[ atoms ]`, `[ bonds ]`, `[ angles ]`, `[ dihedrals ]`,
//! `[ exclusions ]`, and `[ virtual_sitesn ]`. Harmonic and cosine forms
//! become inline GROMACS parameters in kJ/mol, nm, and degrees; quartic
//! bonds and bond-bond cross terms become `funct 8` rows referencing
//! their numbered lookup table. Coupled dihedrals have no GROMACS
//! mapping and are skipped with a warning.

use super::TopologyError;
use crate::core::models::bonded::{BondedModel, Molecule};
use crate::core::models::charges::ChargeModel;
use crate::core::models::naming::NameTranslation;
use crate::core::tables::bonded::{BondedTable, BondedTables, MoleculeTables};
use crate::core::tables::convert::ANGSTROM_TO_NM;
use tracing::warn;

/// Rendered section bodies of one molecule, keyed by topology keyword.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeSections {
    pub atoms: String,
    pub bonds: String,
    pub angles: String,
    pub dihedrals: String,
    pub exclusions: String,
    pub virtual_sites: String,
}

impl MoleculeSections {
    /// The rendered body for a `[ keyword ]` section, when it has content.
    pub fn section(&self, keyword: &str) -> Option<&str> {
        let body = match keyword {
            "atoms" => &self.atoms,
            "bonds" => &self.bonds,
            "angles" => &self.angles,
            "dihedrals" => &self.dihedrals,
            "exclusions" => &self.exclusions,
            "virtual_sitesn" => &self.virtual_sites,
            _ => return None,
        };
        (!body.is_empty()).then_some(body.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
            && self.bonds.is_empty()
            && self.angles.is_empty()
            && self.dihedrals.is_empty()
            && self.exclusions.is_empty()
            && self.virtual_sites.is_empty()
    }
}

/// Renders the bonded sections of every selected molecule, in selection
/// order.
///
/// An empty selection renders all molecules in file order. Selection names
/// that match no molecule are reported and ignored.
pub fn render_molecules(
    molecules: &[Molecule],
    include: &[String],
    charges: &ChargeModel,
    translation: &NameTranslation,
    tables: &BondedTables,
) -> Result<Vec<(String, MoleculeSections)>, TopologyError> {
    let selected: Vec<&Molecule> = if include.is_empty() {
        molecules.iter().collect()
    } else {
        include
            .iter()
            .filter_map(|name| {
                let found = molecules.iter().find(|m| &m.name == name);
                if found.is_none() {
                    warn!(molecule = %name, "unknown molecule in selection; ignoring");
                }
                found
            })
            .collect()
    };

    let mut rendered = Vec::new();
    for molecule in selected {
        rendered.push((
            molecule.name.clone(),
            render_molecule(molecule, charges, translation, tables)?,
        ));
    }
    Ok(rendered)
}

/// Renders the section bodies of one molecule.
///
/// # Errors
///
/// Fails when a quartic bond or cross term has no lookup table generated
/// for this molecule.
pub fn render_molecule(
    molecule: &Molecule,
    charges: &ChargeModel,
    translation: &NameTranslation,
    tables: &BondedTables,
) -> Result<MoleculeSections, TopologyError> {
    let model = &molecule.bonded;
    Ok(MoleculeSections {
        atoms: render_atoms(molecule, charges, translation),
        bonds: render_bonds(molecule, tables.molecule(&molecule.name))?,
        angles: render_angles(model),
        dihedrals: render_dihedrals(model),
        exclusions: render_exclusions(model),
        virtual_sites: render_virtual_sites(model),
    })
}

/// One `[ atoms ]` row per physical atom: index, translated type as both
/// atom name and type, residue 1 named after the molecule, the atom index
/// as its own charge group, and the name-keyed charge.
fn render_atoms(
    molecule: &Molecule,
    charges: &ChargeModel,
    translation: &NameTranslation,
) -> String {
    let mut out = String::new();
    for record in molecule.bonded.atoms.physical() {
        let name = translation.translate(&record.ff_type);
        let charge = charges.charge_or_zero(&molecule.name, &record.name);
        out.push_str(&format!(
            "{:<8}{name:<8}{:<8}{:<8}{name:<8}{:<8}{charge:<8.5}\n",
            record.index, 1, molecule.name, record.index
        ));
    }
    out
}

fn render_bonds(
    molecule: &Molecule,
    tables: Option<&MoleculeTables>,
) -> Result<String, TopologyError> {
    let model = &molecule.bonded;
    let mut out = String::new();
    for group in &model.harmonic_bonds {
        let r0 = ANGSTROM_TO_NM * group.params.r0;
        let k = 4.184e2 * group.params.k;
        for &[at1, at2] in &group.atoms {
            out.push_str(&format!("{at1:8}{at2:8}{:8}{r0:10.5}{k:20.2}\n", 1));
        }
    }
    for group in &model.quartic_bonds {
        let index = table_index(
            tables.and_then(|t| t.quartic_bond(&group.params)),
            &molecule.name,
        )?;
        for &[at1, at2] in &group.atoms {
            out.push_str(&table_bond_row(at1, at2, index));
        }
    }
    // A cross term contributes its two member bonds as table references;
    // the coupling itself is the funct 3 angle row.
    for group in &model.qbb_terms {
        let index = table_index(tables.and_then(|t| t.qbb(&group.params)), &molecule.name)?;
        for &[at1, at2, at3] in &group.atoms {
            let (a1, a2) = ordered(at1, at2);
            let (a3, a4) = ordered(at2, at3);
            out.push_str(&table_bond_row(a1, a2, index));
            out.push_str(&table_bond_row(a3, a4, index));
        }
    }
    Ok(out)
}

fn render_angles(model: &BondedModel) -> String {
    let mut out = String::new();
    for group in &model.harmonic_angles {
        let theta0 = group.params.theta0;
        let k = 4.184 * group.params.k;
        for &[at1, at2, at3] in &group.atoms {
            out.push_str(&format!(
                "{at1:8}{at2:8}{at3:8}{:8}{theta0:10.5}{k:10.4}\n",
                1
            ));
        }
    }
    for group in &model.quartic_angles {
        let q = group.params;
        let (k2, k3, k4) = (4.184 * q.k2, 4.184 * q.k3, 4.184 * q.k4);
        for &[at1, at2, at3] in &group.atoms {
            out.push_str(&format!(
                "{at1:8}{at2:8}{at3:8}{:8}{:10.5}{:>8}{k2:10.4}{k3:10.4}{k4:10.4}\n",
                6, q.theta0, "0.0"
            ));
        }
    }
    for group in &model.qbb_terms {
        let r0 = ANGSTROM_TO_NM * group.params.r0;
        let krr = 4.184e2 * group.params.krr;
        for &[at1, at2, at3] in &group.atoms {
            out.push_str(&format!(
                "{at1:8}{at2:8}{at3:8}{:8}{r0:10.5}{r0:10.5}{krr:20.2}\n",
                3
            ));
        }
    }
    for group in &model.mub_terms {
        warn!("cross bond-angle mapping for MUB terms is unverified; check the generated rows");
        let m = group.params;
        let (r1, r2, r3) = (
            ANGSTROM_TO_NM * m.p2,
            ANGSTROM_TO_NM * m.p3,
            ANGSTROM_TO_NM * m.p4,
        );
        let k = 4.184e2 * m.p1;
        for &[at1, at2, at3] in &group.atoms {
            out.push_str(&format!(
                "{at1:8}{at2:8}{at3:8}{:8}{r1:10.5}{r2:10.5}{r3:10.5}{k:10.5}\n",
                4
            ));
        }
    }
    out
}

fn render_dihedrals(model: &BondedModel) -> String {
    if !model.coupled_periodic_dihedrals.is_empty() || !model.coupled_cosine_dihedrals.is_empty() {
        warn!("coupled dihedral terms have no topology mapping; skipping");
    }

    let mut out = String::new();
    for group in &model.harmonic_dihedrals {
        let k = 4.184 * group.params.p2;
        let phi0 = group.params.p1;
        for &[at1, at2, at3, at4] in &group.atoms {
            out.push_str(&format!(
                "{at1:8}{at2:8}{at3:8}{at4:8}{:8}{k:10.4}{phi0:10.4}\n",
                2
            ));
        }
    }
    for group in model
        .periodic_dihedrals
        .iter()
        .chain(&model.cosine_dihedrals)
    {
        let k = 4.184 * group.params.p1;
        let multiplicity = group.params.p2;
        let phase = group.params.p3;
        for &[at1, at2, at3, at4] in &group.atoms {
            out.push_str(&format!(
                "{at1:8}{at2:8}{at3:8}{at4:8}{:8}{phase:10.5}{k:10.5}{multiplicity:>8?}\n",
                9
            ));
        }
    }
    out
}

/// One row per exclusion list; zero entries are list padding and dropped.
fn render_exclusions(model: &BondedModel) -> String {
    let mut out = String::new();
    for list in &model.exclusions {
        for &atom in list {
            if atom != 0 {
                out.push_str(&format!("{atom:5}"));
            }
        }
        out.push('\n');
    }
    out
}

/// `funct 3` rows built from each site's definition tokens: the leading
/// assignment token and `+` operators drop out, the rest reverse so the
/// constructing atoms come first.
fn render_virtual_sites(model: &BondedModel) -> String {
    let mut out = String::new();
    for site in model.atoms.virtual_sites() {
        let mut tokens: Vec<&str> = site
            .definition
            .iter()
            .skip(1)
            .map(String::as_str)
            .filter(|token| *token != "+")
            .collect();
        tokens.reverse();

        let mut line = format!("{:8}{:8}", site.index, 3);
        for token in tokens {
            line.push_str(&format!("{token:>5}  "));
        }
        // Parentheses stay in place for field widths and blank out after
        // formatting.
        let line = line.replace('(', " ").replace(')', " ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn table_index(table: Option<&BondedTable>, molecule: &str) -> Result<u32, TopologyError> {
    table
        .map(BondedTable::index)
        .ok_or_else(|| TopologyError::MissingTable {
            molecule: molecule.to_string(),
        })
}

/// A `funct 8` bond row referencing table `<prefix>_b<index>.xvg` with
/// unit scale factor.
fn table_bond_row(at1: u32, at2: u32, index: u32) -> String {
    format!("{at1:8}{at2:8}{:8}{index:8}{:>8}\n", 8, "1.0")
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}
