//! # Charge Derivation
//!
//! ## Overview
//!
//! CRYOFF files carry no explicit partial charges; what they have are
//! fitted Coulomb coefficients per atom-type pair, each the product of two
//! charges. Fixing one atom's charge, either given directly or taken as a
//! square root of its self-pair coefficient, determines every type that
//! shares a Coulomb entry with it: `q_other = coefficient / q_known`.
//!
//! Derived charges are keyed by atom type, while the charge model is keyed
//! by atom name; a derived value lands on an atom only where the two names
//! coincide, so force fields that name atoms after their types pick up
//! charges everywhere and others can fill the gaps from a charge file.
//!
//! Fitting leftovers make molecules slightly non-neutral. When a
//! molecule's total charge exceeds the tolerance, the excess is folded
//! into the most populous atom name carrying a nonzero charge and that
//! molecule's charges are rounded to five decimals.

use crate::core::models::bonded::Molecule;
use crate::core::models::charges::ChargeModel;
use crate::core::models::nonbonded::{NonbondedModel, PairKey};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default bound on a molecule's total charge before neutralization.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// Sign choice for a charge derived from a self-pair Coulomb coefficient.
///
/// Deserializes from the literal `"+"` or `"-"` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ChargeSign {
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

/// How the known atom's charge is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnownCharge {
    /// Use this value directly.
    Value(f64),
    /// Derive it as `±sqrt` of the atom's self-pair Coulomb coefficient.
    SelfCoulomb(ChargeSign),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChargeError {
    #[error("atom type '{atom}' has no self-pair Coulomb entry")]
    MissingSelfCoulomb { atom: String },
    #[error(
        "self-pair Coulomb coefficient of '{atom}' is {value}; deriving a charge needs a positive value"
    )]
    InvalidSelfCoulomb { atom: String, value: f64 },
    #[error("the known atom charge must be nonzero")]
    ZeroKnownCharge,
}

/// Derives per-atom charges from the Coulomb coefficients and neutralizes
/// each molecule to within `tolerance`.
pub fn derive(
    molecules: &[Molecule],
    nonbonded: &NonbondedModel,
    known_atom: &str,
    known: KnownCharge,
    tolerance: f64,
) -> Result<ChargeModel, ChargeError> {
    let known_charge = match known {
        KnownCharge::Value(value) => {
            if value == 0.0 {
                return Err(ChargeError::ZeroKnownCharge);
            }
            value
        }
        KnownCharge::SelfCoulomb(sign) => self_coulomb_charge(nonbonded, known_atom, sign)?,
    };

    let derived = derived_type_charges(nonbonded, known_atom, known_charge);
    debug!(
        known_atom = known_atom,
        types = derived.len(),
        "derived type charges"
    );

    let mut charges = ChargeModel::zeroed(molecules);
    for molecule in molecules {
        for record in molecule.bonded.atoms.physical() {
            if let Some(charge) = derived.get(record.name.as_str()) {
                charges.set(&molecule.name, &record.name, *charge);
            }
        }
    }

    neutralize(&mut charges, molecules, tolerance);
    Ok(charges)
}

/// Neutralizes every molecule whose total charge exceeds `tolerance`.
///
/// The excess is subtracted from the most populous atom name that carries
/// a nonzero charge (occurrence-count descending, ties keep file order);
/// the adjustment is divided by that name's instance count so the
/// molecule's sum lands at zero. A modified molecule has all its charges
/// rounded to five decimals; molecules within tolerance are left as they
/// are.
pub fn neutralize(charges: &mut ChargeModel, molecules: &[Molecule], tolerance: f64) {
    for molecule in molecules {
        let names: Vec<&str> = molecule
            .bonded
            .atoms
            .physical()
            .map(|record| record.name.as_str())
            .collect();
        let total: f64 = names
            .iter()
            .map(|name| charges.charge_or_zero(&molecule.name, name))
            .sum();
        if total.abs() <= tolerance {
            continue;
        }
        info!(
            molecule = %molecule.name,
            total = total,
            "total charge exceeds tolerance; neutralizing"
        );

        let mut instances: Vec<(&str, usize)> = Vec::new();
        for &name in &names {
            match instances.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => instances.push((name, 1)),
            }
        }
        instances.sort_by(|a, b| b.1.cmp(&a.1));

        for (name, count) in &instances {
            let current = charges.charge_or_zero(&molecule.name, name);
            if current != 0.0 {
                let adjustment = total / *count as f64;
                charges.set(&molecule.name, name, current - adjustment);
                info!(
                    molecule = %molecule.name,
                    atom = %name,
                    adjustment = -adjustment,
                    "charge adjusted"
                );
                break;
            }
        }

        if let Some(atoms) = charges.molecule_mut(&molecule.name) {
            for value in atoms.values_mut() {
                *value = round5(*value);
            }
        }
    }
}

fn self_coulomb_charge(
    nonbonded: &NonbondedModel,
    known_atom: &str,
    sign: ChargeSign,
) -> Result<f64, ChargeError> {
    let pair = PairKey::new(known_atom, known_atom);
    let coefficient = nonbonded
        .get(&pair)
        .and_then(|interactions| interactions.coulomb())
        .and_then(|sets| sets.first())
        .and_then(|set| set.first())
        .copied()
        .ok_or_else(|| ChargeError::MissingSelfCoulomb {
            atom: known_atom.to_string(),
        })?;
    if coefficient <= 0.0 {
        return Err(ChargeError::InvalidSelfCoulomb {
            atom: known_atom.to_string(),
            value: coefficient,
        });
    }
    Ok(match sign {
        ChargeSign::Positive => coefficient.sqrt(),
        ChargeSign::Negative => -coefficient.sqrt(),
    })
}

/// One charge per atom type reachable from the known atom, the known atom
/// included. The self pair never overrides the known charge.
fn derived_type_charges(
    nonbonded: &NonbondedModel,
    known_atom: &str,
    known_charge: f64,
) -> BTreeMap<String, f64> {
    let mut derived = BTreeMap::new();
    derived.insert(known_atom.to_string(), known_charge);

    for (pair, interactions) in nonbonded.iter() {
        if pair.is_self_pair() && pair.first() == known_atom {
            continue;
        }
        let Some(other) = pair.other(known_atom) else {
            continue;
        };
        let Some(sets) = interactions.coulomb() else {
            continue;
        };
        let Some(coefficient) = sets.first().and_then(|set| set.first()).copied() else {
            warn!(pair = %pair, "Coulomb entry has no coefficient; skipping");
            continue;
        };
        derived.insert(other.to_string(), coefficient / known_charge);
    }
    derived
}

fn round5(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bonded::{AtomRecord, BondedModel};

    fn molecule(name: &str, atoms: &[(&str, &str)]) -> Molecule {
        let mut bonded = BondedModel::default();
        for (i, (ff_type, atom_name)) in atoms.iter().enumerate() {
            bonded
                .atoms
                .push(AtomRecord::new(i as u32 + 1, *ff_type, *atom_name));
        }
        Molecule {
            name: name.to_string(),
            bonded,
        }
    }

    fn water() -> Vec<Molecule> {
        vec![molecule("WAT", &[("OW", "OW"), ("HW", "HW"), ("HW", "HW")])]
    }

    fn coulomb(model: &mut NonbondedModel, a: &str, b: &str, value: f64) {
        model.push(PairKey::new(a, b), "COU", vec![value]);
    }

    #[test]
    fn known_value_propagates_through_coulomb_pairs() {
        let mut nonbonded = NonbondedModel::default();
        coulomb(&mut nonbonded, "HW", "HW", 0.3);
        coulomb(&mut nonbonded, "HW", "OW", -0.5408);

        let model = derive(
            &water(),
            &nonbonded,
            "HW",
            KnownCharge::Value(0.52),
            DEFAULT_TOLERANCE,
        )
        .unwrap();

        // the self pair never overrides the known charge
        assert_eq!(model.get("WAT", "HW"), Some(0.52));
        assert_eq!(model.get("WAT", "OW"), Some(-0.5408 / 0.52));
        assert!(model.total("WAT").abs() < 1e-9);
    }

    #[test]
    fn sign_derivation_takes_the_square_root_of_the_self_pair() {
        let mut nonbonded = NonbondedModel::default();
        coulomb(&mut nonbonded, "OW", "OW", 4.0);
        coulomb(&mut nonbonded, "HW", "OW", -2.0);

        let model = derive(
            &water(),
            &nonbonded,
            "OW",
            KnownCharge::SelfCoulomb(ChargeSign::Negative),
            DEFAULT_TOLERANCE,
        )
        .unwrap();

        assert_eq!(model.get("WAT", "OW"), Some(-2.0));
        assert_eq!(model.get("WAT", "HW"), Some(1.0));
    }

    #[test]
    fn derivation_is_keyed_by_type_but_lands_on_names() {
        let molecules = vec![molecule("WAT", &[("OW", "O1"), ("HW", "HW"), ("HW", "HW")])];
        let mut nonbonded = NonbondedModel::default();
        coulomb(&mut nonbonded, "HW", "OW", -0.5);

        let model = derive(
            &molecules,
            &nonbonded,
            "HW",
            KnownCharge::Value(0.5),
            // wide tolerance keeps the non-neutral result observable
            10.0,
        )
        .unwrap();

        // "OW" matches no atom name, so O1 keeps its zero
        assert_eq!(model.get("WAT", "O1"), Some(0.0));
        assert_eq!(model.get("WAT", "HW"), Some(0.5));
    }

    #[test]
    fn self_pair_errors() {
        let molecules = water();
        let mut nonbonded = NonbondedModel::default();
        coulomb(&mut nonbonded, "OW", "OW", 0.0);

        let missing = derive(
            &molecules,
            &nonbonded,
            "XX",
            KnownCharge::SelfCoulomb(ChargeSign::Positive),
            DEFAULT_TOLERANCE,
        )
        .unwrap_err();
        assert_eq!(
            missing,
            ChargeError::MissingSelfCoulomb {
                atom: "XX".to_string()
            }
        );

        let zero = derive(
            &molecules,
            &nonbonded,
            "OW",
            KnownCharge::SelfCoulomb(ChargeSign::Positive),
            DEFAULT_TOLERANCE,
        )
        .unwrap_err();
        assert_eq!(
            zero,
            ChargeError::InvalidSelfCoulomb {
                atom: "OW".to_string(),
                value: 0.0
            }
        );

        let direct_zero = derive(
            &molecules,
            &nonbonded,
            "OW",
            KnownCharge::Value(0.0),
            DEFAULT_TOLERANCE,
        )
        .unwrap_err();
        assert_eq!(direct_zero, ChargeError::ZeroKnownCharge);
    }

    #[test]
    fn neutralization_targets_the_most_populous_charged_name() {
        let mut nonbonded = NonbondedModel::default();
        coulomb(&mut nonbonded, "HW", "HW", 0.3);
        coulomb(&mut nonbonded, "HW", "OW", -0.55);

        let model = derive(
            &water(),
            &nonbonded,
            "HW",
            KnownCharge::Value(0.52),
            DEFAULT_TOLERANCE,
        )
        .unwrap();

        // total = 2 * 0.52 - 0.55/0.52; half the excess moves onto each HW
        // instance, then everything is rounded to five decimals
        assert_eq!(model.get("WAT", "HW"), Some(0.52885));
        assert_eq!(model.get("WAT", "OW"), Some(-1.05769));
    }

    #[test]
    fn neutralization_skips_zero_charge_names_and_keeps_tie_order() {
        let molecules = vec![molecule("ETH", &[("CT", "C1"), ("CT", "C2")])];
        let mut model = ChargeModel::zeroed(&molecules);
        model.set("ETH", "C2", 0.1);

        neutralize(&mut model, &molecules, DEFAULT_TOLERANCE);

        assert_eq!(model.get("ETH", "C1"), Some(0.0));
        assert_eq!(model.get("ETH", "C2"), Some(0.0));
    }

    #[test]
    fn molecules_within_tolerance_stay_unrounded() {
        let molecules = water();
        let mut model = ChargeModel::zeroed(&molecules);
        model.set("WAT", "OW", -1.0400003);
        model.set("WAT", "HW", 0.52);

        neutralize(&mut model, &molecules, DEFAULT_TOLERANCE);

        assert_eq!(model.get("WAT", "OW"), Some(-1.0400003));
        assert_eq!(model.get("WAT", "HW"), Some(0.52));
    }
}
