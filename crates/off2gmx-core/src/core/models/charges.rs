//! Per-atom partial charge model.

use super::bonded::Molecule;
use std::collections::BTreeMap;

/// Partial charges keyed by molecule name, then atom name.
///
/// The atom set is fixed at construction from the parsed molecules;
/// constraint rows never appear. [`ChargeModel::set`] refuses names outside
/// that set so charge sources cannot invent atoms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChargeModel {
    molecules: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ChargeModel {
    /// Builds the model with every physical atom at 0.0.
    pub fn zeroed(molecules: &[Molecule]) -> Self {
        let mut out = BTreeMap::new();
        for molecule in molecules {
            let atoms: BTreeMap<String, f64> = molecule
                .bonded
                .atoms
                .physical()
                .map(|record| (record.name.clone(), 0.0))
                .collect();
            out.insert(molecule.name.clone(), atoms);
        }
        Self { molecules: out }
    }

    pub fn get(&self, molecule: &str, atom: &str) -> Option<f64> {
        self.molecules.get(molecule)?.get(atom).copied()
    }

    /// The charge of `atom` in `molecule`, or 0.0 when unknown.
    pub fn charge_or_zero(&self, molecule: &str, atom: &str) -> f64 {
        self.get(molecule, atom).unwrap_or(0.0)
    }

    /// Assigns a charge; returns `false` when the molecule or atom is not
    /// part of the model.
    pub fn set(&mut self, molecule: &str, atom: &str, charge: f64) -> bool {
        match self
            .molecules
            .get_mut(molecule)
            .and_then(|atoms| atoms.get_mut(atom))
        {
            Some(slot) => {
                *slot = charge;
                true
            }
            None => false,
        }
    }

    pub fn contains_molecule(&self, molecule: &str) -> bool {
        self.molecules.contains_key(molecule)
    }

    pub fn molecule(&self, molecule: &str) -> Option<&BTreeMap<String, f64>> {
        self.molecules.get(molecule)
    }

    pub(crate) fn molecule_mut(&mut self, molecule: &str) -> Option<&mut BTreeMap<String, f64>> {
        self.molecules.get_mut(molecule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, f64>)> {
        self.molecules.iter().map(|(name, atoms)| (name.as_str(), atoms))
    }

    /// The summed charge of one molecule, 0.0 when unknown.
    pub fn total(&self, molecule: &str) -> f64 {
        self.molecules
            .get(molecule)
            .map(|atoms| atoms.values().sum())
            .unwrap_or(0.0)
    }
}
