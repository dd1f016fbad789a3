//! Nonbonded interaction model.
//!
//! Interactions arrive from the `Inter-Potential:` block keyed by a sorted
//! atom-type pair and the interaction name exactly as written (`BUCWATER`,
//! `POW`, ...). Table and topology generation consume a filtered view whose
//! keys are normalized ([`InteractionKey`]): variable-power forms are split
//! out per parameter set (`POW_6`, `POW_8`, ...), everything else collapses
//! to its three-letter code.

use super::bonded::Molecule;
use phf::{Set, phf_set};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Canonical key for Coulomb entries; any interaction name containing `COU`
/// collapses to this.
pub const COULOMB: &str = "COU";

/// Interaction codes whose normalized key carries the `|P2|` exponent.
static VARIABLE_POWER_CODES: Set<&'static str> = phf_set! {
    "POW", "PEX", "DPO", "SRD",
};

/// A sorted atom-type pair, the key of every nonbonded interaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    /// Builds the key; the two type names are stored in sorted order so
    /// `A~B` and `B~A` collapse to the same pair.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, atom_type: &str) -> bool {
        self.first == atom_type || self.second == atom_type
    }

    /// The partner of `atom_type` in this pair, if `atom_type` is a member.
    pub fn other(&self, atom_type: &str) -> Option<&str> {
        if self.first == atom_type {
            Some(&self.second)
        } else if self.second == atom_type {
            Some(&self.first)
        } else {
            None
        }
    }

    pub fn is_self_pair(&self) -> bool {
        self.first == self.second
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.first, self.second)
    }
}

/// The interactions of one pair, keyed by raw name in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairInteractions {
    terms: Vec<(String, Vec<Vec<f64>>)>,
}

impl PairInteractions {
    /// Appends a parameter set under `name`, creating the entry on first use.
    pub fn push(&mut self, name: &str, params: Vec<f64>) {
        match self.terms.iter_mut().find(|(n, _)| n == name) {
            Some((_, sets)) => sets.push(params),
            None => self.terms.push((name.to_string(), vec![params])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[Vec<f64>]> {
        self.terms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sets)| sets.as_slice())
    }

    pub fn coulomb(&self) -> Option<&[Vec<f64>]> {
        self.get(COULOMB)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<f64>])> {
        self.terms.iter().map(|(n, sets)| (n.as_str(), sets.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|(_, sets)| sets.is_empty())
    }
}

/// Every nonbonded interaction parsed from the file, pair-keyed.
///
/// Pairs iterate in sorted order, which makes downstream generation
/// deterministic regardless of file layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonbondedModel {
    pairs: BTreeMap<PairKey, PairInteractions>,
}

impl NonbondedModel {
    pub fn push(&mut self, pair: PairKey, name: &str, params: Vec<f64>) {
        self.pairs.entry(pair).or_default().push(name, params);
    }

    pub fn get(&self, pair: &PairKey) -> Option<&PairInteractions> {
        self.pairs.get(pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &PairInteractions)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Builds the generation-ready view: Coulomb and empty entries dropped,
    /// exclusions applied, keys normalized.
    ///
    /// # Arguments
    ///
    /// * `filter` - Molecule/interaction/pair selection options.
    /// * `molecules` - The parsed molecules, used to resolve which atom types
    ///   are eligible.
    pub fn filtered(&self, filter: &NonbondedFilter, molecules: &[Molecule]) -> FilteredNonbonded {
        let included = included_types(molecules, &filter.include_molecules);
        let mut out = FilteredNonbonded::default();

        for (pair, interactions) in &self.pairs {
            if filter.excludes_pair(pair) {
                continue;
            }
            let mut kept = FilteredPair::default();
            for (name, sets) in interactions.iter() {
                if name == COULOMB || sets.is_empty() {
                    continue;
                }
                if filter.exclude_interactions.iter().any(|x| x == name) {
                    continue;
                }
                if !included.contains(pair.first()) || !included.contains(pair.second()) {
                    continue;
                }
                for set in sets {
                    match InteractionKey::classify(name, set) {
                        Some(key) => kept.push(key, set.clone()),
                        None => warn!(
                            interaction = name,
                            pair = %pair,
                            "parameter set lacks the power parameter; skipping"
                        ),
                    }
                }
            }
            if !kept.is_empty() {
                out.pairs.insert(pair.clone(), kept);
            }
        }
        out
    }
}

/// Selection options for [`NonbondedModel::filtered`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct NonbondedFilter {
    /// Restrict eligible atom types to these molecules; empty means all.
    pub include_molecules: Vec<String>,
    /// Interaction names to drop, exactly as written in the file.
    pub exclude_interactions: Vec<String>,
    /// Atom-type pairs to drop, in either order.
    pub exclude_pairs: Vec<(String, String)>,
}

impl NonbondedFilter {
    fn excludes_pair(&self, pair: &PairKey) -> bool {
        self.exclude_pairs.iter().any(|(a, b)| {
            (pair.first() == a && pair.second() == b) || (pair.first() == b && pair.second() == a)
        })
    }
}

/// The non-sentinel atom types of the selected molecules.
///
/// An empty selection means every molecule. Selection names that match no
/// molecule are reported and ignored.
pub fn included_types(molecules: &[Molecule], include: &[String]) -> BTreeSet<String> {
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

    selected
        .iter()
        .flat_map(|m| m.bonded.atoms.physical())
        .map(|record| record.ff_type.clone())
        .collect()
}

/// A normalized interaction key, e.g. `EXP`, `BUC`, or `POW_6`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InteractionKey {
    code: String,
    power: Option<u32>,
}

impl InteractionKey {
    /// Normalizes a raw interaction name for one parameter set.
    ///
    /// Variable-power forms (`POW`, `PEX`, `DPO`, `SRD`) take their exponent
    /// from `|trunc(P2)|` and return `None` when the set has no second
    /// parameter; every other name is keyed by its first three letters.
    pub fn classify(raw_name: &str, params: &[f64]) -> Option<Self> {
        let code: String = raw_name.chars().take(3).collect();
        if VARIABLE_POWER_CODES.contains(code.as_str()) {
            let p2 = params.get(1)?;
            Some(Self {
                code,
                power: Some(p2.trunc().abs() as u32),
            })
        } else {
            Some(Self { code, power: None })
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn power(&self) -> Option<u32> {
        self.power
    }

    /// Whether this key is attractive by default (`POW_6`, `DPO_6`, `SRD_6`).
    pub fn is_default_attractive(&self) -> bool {
        self.power == Some(6) && matches!(self.code.as_str(), "POW" | "DPO" | "SRD")
    }
}

impl fmt::Display for InteractionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.power {
            Some(p) => write!(f, "{}_{}", self.code, p),
            None => write!(f, "{}", self.code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid interaction key '{0}'")]
pub struct ParseInteractionKeyError(String);

impl FromStr for InteractionKey {
    type Err = ParseInteractionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('_') {
            Some((code, power)) => {
                let power = power
                    .parse::<u32>()
                    .map_err(|_| ParseInteractionKeyError(s.to_string()))?;
                if code.is_empty() {
                    return Err(ParseInteractionKeyError(s.to_string()));
                }
                Ok(Self {
                    code: code.to_string(),
                    power: Some(power),
                })
            }
            None => {
                if s.is_empty() {
                    return Err(ParseInteractionKeyError(s.to_string()));
                }
                Ok(Self {
                    code: s.to_string(),
                    power: None,
                })
            }
        }
    }
}

/// One pair's normalized interactions, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredPair {
    terms: Vec<(InteractionKey, Vec<Vec<f64>>)>,
}

impl FilteredPair {
    pub fn push(&mut self, key: InteractionKey, params: Vec<f64>) {
        match self.terms.iter_mut().find(|(k, _)| *k == key) {
            Some((_, sets)) => sets.push(params),
            None => self.terms.push((key, vec![params])),
        }
    }

    pub fn get(&self, key: &InteractionKey) -> Option<&[Vec<f64>]> {
        self.terms
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, sets)| sets.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InteractionKey, &[Vec<f64>])> {
        self.terms.iter().map(|(k, sets)| (k, sets.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Generation-ready nonbonded interactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredNonbonded {
    pairs: BTreeMap<PairKey, FilteredPair>,
}

impl FilteredNonbonded {
    pub fn get(&self, pair: &PairKey) -> Option<&FilteredPair> {
        self.pairs.get(pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &FilteredPair)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
