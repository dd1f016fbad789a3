//! # Nonbonded Pair Parameters
//!
//! ## Overview
//!
//! Derives the `[ nonbond_params ]` entry of every filtered pair. For a
//! tabulated run the C6 and C12 values are channel flags rather than
//! Lennard-Jones coefficients: C12 set to one marks a populated repulsive
//! channel, and C6 marks the attractive channel. Under C6 scaling the
//! attractive columns were tabulated with a `-1` prefactor, so C6 holds
//! the real dispersion coefficient in GROMACS units and dispersion
//! corrections come out right; a Buckingham term contributes its C6 the
//! same way. Special pairs bypass the derivation and flag both channels.

use super::TopologyError;
use crate::core::io::xvg::scientific;
use crate::core::models::naming::NameTranslation;
use crate::core::models::nonbonded::{FilteredNonbonded, InteractionKey, PairKey};
use crate::core::tables::TableError;
use crate::core::tables::convert::KCAL_TO_KJ;
use std::collections::BTreeMap;
use tracing::warn;

/// One `[ nonbond_params ]` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NonbondParam {
    pub pair: PairKey,
    pub c6: f64,
    pub c12: f64,
}

/// The derived entries, in sorted pair order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonbondParams {
    entries: Vec<NonbondParam>,
}

impl NonbondParams {
    /// Derives one entry per pair in `nonbonded`.
    ///
    /// A pair starts at zero for both coefficients. Any repulsive
    /// interaction raises C12 to one; a Buckingham term also stores its
    /// dispersion coefficient in C6; a default-attractive term stores its
    /// prefactor in C6. Later interactions of a pair overwrite earlier
    /// ones.
    ///
    /// # Errors
    ///
    /// Fails when special pairs are combined with C6 scaling, or when a
    /// pair carries more than one attractive parameter set under C6
    /// scaling.
    pub fn generate(
        nonbonded: &FilteredNonbonded,
        scale_c6: bool,
        special_pairs: &BTreeMap<PairKey, Vec<InteractionKey>>,
    ) -> Result<Self, TopologyError> {
        if !special_pairs.is_empty() && scale_c6 {
            return Err(TableError::SpecialPairsWithScaling.into());
        }

        let mut entries = Vec::new();
        for (pair, interactions) in nonbonded.iter() {
            if special_pairs.contains_key(pair) {
                entries.push(NonbondParam {
                    pair: pair.clone(),
                    c6: 1.0,
                    c12: 1.0,
                });
                continue;
            }

            let mut c6 = 0.0;
            let mut c12 = 0.0;
            let mut attractive_sets = 0usize;
            for (key, sets) in interactions.iter() {
                match key.code() {
                    "THC" => {
                        warn!(
                            pair = %pair,
                            interaction = %key,
                            "three-body term has no pair entry; skipping"
                        );
                    }
                    "BUC" => {
                        for set in sets {
                            attractive_sets += 1;
                            if attractive_sets > 1 && scale_c6 {
                                return Err(TableError::MultipleAttractive {
                                    pair: pair.to_string(),
                                }
                                .into());
                            }
                            let Some(&coefficient) = set.get(1) else {
                                warn!(
                                    pair = %pair,
                                    interaction = %key,
                                    "Buckingham set lacks a dispersion coefficient; skipping"
                                );
                                continue;
                            };
                            c6 = (coefficient * KCAL_TO_KJ * 1e-6).abs();
                            c12 = 1.0;
                        }
                    }
                    _ if key.is_default_attractive() => {
                        for set in sets {
                            attractive_sets += 1;
                            if attractive_sets > 1 && scale_c6 {
                                return Err(TableError::MultipleAttractive {
                                    pair: pair.to_string(),
                                }
                                .into());
                            }
                            let Some(&prefactor) = set.first() else {
                                warn!(
                                    pair = %pair,
                                    interaction = %key,
                                    "attractive set is empty; skipping"
                                );
                                continue;
                            };
                            c6 = (prefactor * KCAL_TO_KJ * 1e-6).abs();
                        }
                    }
                    _ => {
                        c12 = 1.0;
                    }
                }
            }
            entries.push(NonbondParam {
                pair: pair.clone(),
                c6,
                c12,
            });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, pair: &PairKey) -> Option<&NonbondParam> {
        self.entries.iter().find(|entry| &entry.pair == pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NonbondParam> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the section rows with translated atom names.
    ///
    /// Each row is `At1 At2 1 C6 C12`: names and the combination-rule
    /// function left-justified to 7 characters, coefficients to 20 in
    /// 12-digit scientific notation.
    pub fn render(&self, translation: &NameTranslation) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let first = translation.translate(entry.pair.first());
            let second = translation.translate(entry.pair.second());
            out.push_str(&format!(
                "{first:<7}{second:<7}{:<7}{:<20}{:<20}\n",
                1,
                scientific(entry.c6, 12),
                scientific(entry.c12, 12)
            ));
        }
        out
    }

    /// Per-pair factors for preparing soft-core free-energy tables.
    ///
    /// A pair whose entry flags both channels (nonzero C6 and C12) has its
    /// repulsive table columns divided by `C6 * sc_sigma^6`, matching the
    /// `sc-sigma` value the run input will carry.
    pub fn soft_core_factors(&self, sc_sigma: f64) -> impl Iterator<Item = (&PairKey, f64)> {
        self.entries
            .iter()
            .filter(|entry| entry.c6 != 0.0 && entry.c12 != 0.0)
            .map(move |entry| (&entry.pair, 1.0 / (entry.c6 * sc_sigma.powi(6))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bonded::{AtomRecord, BondedModel, Molecule};
    use crate::core::models::nonbonded::{NonbondedFilter, NonbondedModel};

    fn water() -> Vec<Molecule> {
        let mut bonded = BondedModel::default();
        bonded.atoms.push(AtomRecord::new(1, "OW", "OW1"));
        bonded.atoms.push(AtomRecord::new(2, "HW", "HW1"));
        vec![Molecule {
            name: "WAT".to_string(),
            bonded,
        }]
    }

    fn filtered(entries: &[(&str, &str, &str, &[f64])]) -> FilteredNonbonded {
        let mut model = NonbondedModel::default();
        for (a, b, name, params) in entries {
            model.push(PairKey::new(*a, *b), name, params.to_vec());
        }
        model.filtered(&NonbondedFilter::default(), &water())
    }

    fn no_special() -> BTreeMap<PairKey, Vec<InteractionKey>> {
        BTreeMap::new()
    }

    #[test]
    fn buckingham_stores_the_dispersion_coefficient() {
        let nonbonded = filtered(&[("OW", "OW", "BUCWATER", &[600.0, 1200.0, 3.0])]);
        let params = NonbondParams::generate(&nonbonded, true, &no_special()).unwrap();

        let entry = params.get(&PairKey::new("OW", "OW")).unwrap();
        assert_eq!(entry.c6, (1200.0_f64 * KCAL_TO_KJ * 1e-6).abs());
        assert_eq!(entry.c12, 1.0);
    }

    #[test]
    fn repulsive_interactions_only_raise_c12() {
        let nonbonded = filtered(&[("OW", "HW", "EXP", &[50.0, 3.5])]);
        let params = NonbondParams::generate(&nonbonded, true, &no_special()).unwrap();

        let entry = params.get(&PairKey::new("OW", "HW")).unwrap();
        assert_eq!(entry.c6, 0.0);
        assert_eq!(entry.c12, 1.0);
    }

    #[test]
    fn default_attractive_fills_c6_and_leaves_c12_zero() {
        let nonbonded = filtered(&[("OW", "OW", "POW", &[1000.0, -6.0])]);
        let params = NonbondParams::generate(&nonbonded, true, &no_special()).unwrap();

        let entry = params.get(&PairKey::new("OW", "OW")).unwrap();
        assert_eq!(entry.c6, 1000.0 * KCAL_TO_KJ * 1e-6);
        assert_eq!(entry.c12, 0.0);
    }

    #[test]
    fn second_attractive_set_conflicts_with_c6_scaling() {
        let nonbonded = filtered(&[
            ("OW", "OW", "POW", &[1000.0, -6.0][..]),
            ("OW", "OW", "SRD", &[800.0, -6.0, 2.0][..]),
        ]);

        let err = NonbondParams::generate(&nonbonded, true, &no_special()).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::Table(TableError::MultipleAttractive { .. })
        ));

        // Without scaling the later set simply overwrites the earlier one.
        let params = NonbondParams::generate(&nonbonded, false, &no_special()).unwrap();
        let entry = params.get(&PairKey::new("OW", "OW")).unwrap();
        assert_eq!(entry.c6, (800.0_f64 * KCAL_TO_KJ * 1e-6).abs());
    }

    #[test]
    fn special_pairs_flag_both_channels_and_reject_scaling() {
        let nonbonded = filtered(&[
            ("OW", "OW", "POW", &[1000.0, -6.0][..]),
            ("OW", "OW", "POW", &[2000.0, 8.0][..]),
        ]);
        let special = BTreeMap::from([(
            PairKey::new("OW", "OW"),
            vec!["POW_6".parse().unwrap(), "POW_8".parse().unwrap()],
        )]);

        let params = NonbondParams::generate(&nonbonded, false, &special).unwrap();
        let entry = params.get(&PairKey::new("OW", "OW")).unwrap();
        assert_eq!((entry.c6, entry.c12), (1.0, 1.0));

        let err = NonbondParams::generate(&nonbonded, true, &special).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::Table(TableError::SpecialPairsWithScaling)
        ));
    }

    #[test]
    fn rows_are_left_justified_with_translated_names() {
        let nonbonded = filtered(&[("OW", "HW", "EXP", &[50.0, 3.5])]);
        let params = NonbondParams::generate(&nonbonded, true, &no_special()).unwrap();

        let identity = NameTranslation::new();
        assert_eq!(
            params.render(&identity),
            "HW     OW     1      0.000000000000E+00  1.000000000000E+00  \n"
        );

        let translation = NameTranslation::from_iter([("OW", "OW_spc")]);
        assert_eq!(
            params.render(&translation),
            "HW     OW_spc 1      0.000000000000E+00  1.000000000000E+00  \n"
        );
    }

    #[test]
    fn soft_core_factors_cover_pairs_with_both_channels() {
        let nonbonded = filtered(&[
            ("OW", "OW", "BUCWATER", &[600.0, 1200.0, 3.0][..]),
            ("OW", "HW", "EXP", &[50.0, 3.5][..]),
        ]);
        let params = NonbondParams::generate(&nonbonded, true, &no_special()).unwrap();

        let factors: Vec<(&PairKey, f64)> = params.soft_core_factors(0.3).collect();
        assert_eq!(factors.len(), 1);
        let c6 = params.get(&PairKey::new("OW", "OW")).unwrap().c6;
        assert_eq!(factors[0].0, &PairKey::new("OW", "OW"));
        assert_eq!(factors[0].1, 1.0 / (c6 * 0.3_f64.powi(6)));
    }
}
