//! # Nonbonded Pair Tables
//!
//! ## Overview
//!
//! Builds one table per filtered atom-type pair over a shared radial grid.
//! Each parameter set is converted to GROMACS units and accumulated into
//! either the attractive or the repulsive column pair of its table; the
//! Coulomb columns are always written as zeros. Routing is by interaction
//! key: `POW_6`, `DPO_6`, and `SRD_6` are attractive, `BUC` splits into an
//! attractive dispersion part and a repulsive exponential part, three-body
//! `THC` terms are skipped, and everything else is repulsive. A
//! [`NonbondedTableOptions::special_pairs`] entry replaces the default
//! routing with an explicit set of attractive keys for that pair.
//!
//! With C6 scaling active a pair may carry at most one attractive
//! parameter set; its prefactor is tabulated as `-1` so the real
//! coefficient can live in the pair's `[ nonbond_params ]` entry.

use super::TableError;
use super::convert::{PairPotential, buckingham_parts};
use super::grid::Grid;
use crate::core::models::nonbonded::{FilteredNonbonded, FilteredPair, InteractionKey, PairKey};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Grid spacing for nonbonded tables, in nm.
pub const DEFAULT_NONBONDED_SPACING: f64 = 0.0005;

/// Grid length for nonbonded tables, in nm.
pub const DEFAULT_NONBONDED_LENGTH: f64 = 3.0;

/// Options for [`NonbondedTables::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct NonbondedTableOptions {
    /// Grid spacing in nm.
    pub spacing: f64,
    /// Grid length in nm.
    pub length: f64,
    /// Tabulate the single attractive prefactor as `-1` and defer the real
    /// coefficient to `[ nonbond_params ]`.
    pub scale_c6: bool,
    /// Per-pair override of which interaction keys count as attractive.
    /// Mutually exclusive with `scale_c6`.
    pub special_pairs: BTreeMap<PairKey, Vec<InteractionKey>>,
}

impl Default for NonbondedTableOptions {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_NONBONDED_SPACING,
            length: DEFAULT_NONBONDED_LENGTH,
            scale_c6: true,
            special_pairs: BTreeMap::new(),
        }
    }
}

/// One pair's table: the radial grid plus potential and force columns for
/// the Coulomb, attractive, and repulsive channels.
#[derive(Debug, Clone, PartialEq)]
pub struct NonbondedTable {
    r: Vec<f64>,
    coulomb_potential: Vec<f64>,
    coulomb_force: Vec<f64>,
    attractive_potential: Vec<f64>,
    attractive_force: Vec<f64>,
    repulsive_potential: Vec<f64>,
    repulsive_force: Vec<f64>,
}

impl NonbondedTable {
    fn zeroed(grid: &Grid) -> Self {
        let zeros = vec![0.0; grid.len()];
        Self {
            r: grid.points().to_vec(),
            coulomb_potential: zeros.clone(),
            coulomb_force: zeros.clone(),
            attractive_potential: zeros.clone(),
            attractive_force: zeros.clone(),
            repulsive_potential: zeros.clone(),
            repulsive_force: zeros,
        }
    }

    /// The seven columns in file order.
    pub fn columns(&self) -> [&[f64]; 7] {
        [
            &self.r,
            &self.coulomb_potential,
            &self.coulomb_force,
            &self.attractive_potential,
            &self.attractive_force,
            &self.repulsive_potential,
            &self.repulsive_force,
        ]
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }
}

/// The generated pair tables, in sorted pair order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonbondedTables {
    tables: BTreeMap<PairKey, NonbondedTable>,
}

impl NonbondedTables {
    /// Builds one table per pair in `nonbonded`.
    ///
    /// # Errors
    ///
    /// Fails when the grid parameters are degenerate, when special pairs
    /// are combined with C6 scaling, or when a pair carries more than one
    /// attractive parameter set under C6 scaling.
    pub fn generate(
        nonbonded: &FilteredNonbonded,
        options: &NonbondedTableOptions,
    ) -> Result<Self, TableError> {
        if !options.special_pairs.is_empty() && options.scale_c6 {
            return Err(TableError::SpecialPairsWithScaling);
        }
        let grid = Grid::new(options.spacing, options.length)?;

        let mut tables = BTreeMap::new();
        for (pair, interactions) in nonbonded.iter() {
            let table = match options.special_pairs.get(pair) {
                Some(custom) => special_pair_table(pair, interactions, custom, &grid, options),
                None => default_pair_table(pair, interactions, &grid, options)?,
            };
            tables.insert(pair.clone(), table);
        }
        debug!(
            pairs = tables.len(),
            points = grid.len(),
            "nonbonded tables built"
        );
        Ok(Self { tables })
    }

    pub fn get(&self, pair: &PairKey) -> Option<&NonbondedTable> {
        self.tables.get(pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &NonbondedTable)> {
        self.tables.iter()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &PairKey> {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Multiplies the repulsive potential and force columns of `pair` by
    /// `factor`. Returns `false` when the pair has no table.
    pub fn scale_repulsive(&mut self, pair: &PairKey, factor: f64) -> bool {
        match self.tables.get_mut(pair) {
            Some(table) => {
                for value in &mut table.repulsive_potential {
                    *value *= factor;
                }
                for value in &mut table.repulsive_force {
                    *value *= factor;
                }
                true
            }
            None => false,
        }
    }
}

fn default_pair_table(
    pair: &PairKey,
    interactions: &FilteredPair,
    grid: &Grid,
    options: &NonbondedTableOptions,
) -> Result<NonbondedTable, TableError> {
    let mut table = NonbondedTable::zeroed(grid);
    let mut attractive_sets = 0usize;

    for (key, sets) in interactions.iter() {
        match key.code() {
            "THC" => {
                warn!(
                    pair = %pair,
                    interaction = %key,
                    "three-body term has no pair table; skipping"
                );
            }
            "BUC" => {
                for set in sets {
                    let Some(&[p1, p2, p3]) = set.first_chunk::<3>() else {
                        warn!(
                            pair = %pair,
                            interaction = %key,
                            found = set.len(),
                            "Buckingham set needs 3 parameters; skipping"
                        );
                        continue;
                    };
                    let (dispersion, repulsion) =
                        buckingham_parts(p1, p2, p3, options.scale_c6);
                    accumulate(
                        &mut table.attractive_potential,
                        &mut table.attractive_force,
                        grid,
                        &dispersion,
                    );
                    accumulate(
                        &mut table.repulsive_potential,
                        &mut table.repulsive_force,
                        grid,
                        &repulsion,
                    );
                }
            }
            _ if key.is_default_attractive() => {
                for set in sets {
                    attractive_sets += 1;
                    if attractive_sets > 1 && options.scale_c6 {
                        return Err(TableError::MultipleAttractive {
                            pair: pair.to_string(),
                        });
                    }
                    if let Some(term) = PairPotential::prepare(key, set, true, options.scale_c6) {
                        accumulate(
                            &mut table.attractive_potential,
                            &mut table.attractive_force,
                            grid,
                            &term,
                        );
                    }
                }
            }
            _ => {
                for set in sets {
                    if let Some(term) = PairPotential::prepare(key, set, false, false) {
                        accumulate(
                            &mut table.repulsive_potential,
                            &mut table.repulsive_force,
                            grid,
                            &term,
                        );
                    }
                }
            }
        }
    }
    Ok(table)
}

fn special_pair_table(
    pair: &PairKey,
    interactions: &FilteredPair,
    attractive_keys: &[InteractionKey],
    grid: &Grid,
    options: &NonbondedTableOptions,
) -> NonbondedTable {
    let mut table = NonbondedTable::zeroed(grid);

    for (key, sets) in interactions.iter() {
        if key.code() == "THC" {
            warn!(
                pair = %pair,
                interaction = %key,
                "three-body term has no pair table; skipping"
            );
            continue;
        }
        let attractive = attractive_keys.contains(key);
        if key.code() == "BUC" {
            // The dispersion part joins the attractive channel only when the
            // pair's key set lists it; its repulsion part stays repulsive.
            for set in sets {
                let Some(&[p1, p2, p3]) = set.first_chunk::<3>() else {
                    warn!(
                        pair = %pair,
                        interaction = %key,
                        found = set.len(),
                        "Buckingham set needs 3 parameters; skipping"
                    );
                    continue;
                };
                let (dispersion, repulsion) = buckingham_parts(p1, p2, p3, options.scale_c6);
                if attractive {
                    accumulate(
                        &mut table.attractive_potential,
                        &mut table.attractive_force,
                        grid,
                        &dispersion,
                    );
                } else {
                    accumulate(
                        &mut table.repulsive_potential,
                        &mut table.repulsive_force,
                        grid,
                        &dispersion,
                    );
                }
                accumulate(
                    &mut table.repulsive_potential,
                    &mut table.repulsive_force,
                    grid,
                    &repulsion,
                );
            }
        } else {
            for set in sets {
                if let Some(term) = PairPotential::prepare(key, set, attractive, options.scale_c6)
                {
                    if attractive {
                        accumulate(
                            &mut table.attractive_potential,
                            &mut table.attractive_force,
                            grid,
                            &term,
                        );
                    } else {
                        accumulate(
                            &mut table.repulsive_potential,
                            &mut table.repulsive_force,
                            grid,
                            &term,
                        );
                    }
                }
            }
        }
    }
    table
}

fn accumulate(potential: &mut [f64], force: &mut [f64], grid: &Grid, term: &PairPotential) {
    for (i, r) in grid.eval_points().enumerate() {
        let (u, f) = term.evaluate(r);
        potential[i] += u;
        force[i] += f;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bonded::{AtomRecord, BondedModel, Molecule};
    use crate::core::models::nonbonded::{NonbondedFilter, NonbondedModel};
    use crate::core::tables::convert::{ANGSTROM_TO_NM, KCAL_TO_KJ};
    use crate::core::tables::potentials::{exp_decay, power_law};

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

    fn coarse(scale_c6: bool) -> NonbondedTableOptions {
        NonbondedTableOptions {
            spacing: 0.1,
            length: 1.0,
            scale_c6,
            special_pairs: BTreeMap::new(),
        }
    }

    #[test]
    fn routes_attractive_and_repulsive_terms() {
        let nonbonded = filtered(&[
            ("OW", "OW", "COU", &[0.5186]),
            ("OW", "OW", "POW", &[1000.0, -6.0]),
            ("OW", "OW", "EXP", &[50.0, 3.5]),
        ]);
        let tables = NonbondedTables::generate(&nonbonded, &coarse(false)).unwrap();
        let table = tables.get(&PairKey::new("OW", "OW")).unwrap();

        assert_eq!(table.len(), 11);
        assert_eq!(table.r[0], 0.0);
        assert!(table.coulomb_potential.iter().all(|v| *v == 0.0));
        assert!(table.coulomb_force.iter().all(|v| *v == 0.0));

        let (att_u, att_f) = power_law(0.1, KCAL_TO_KJ * 1000.0 * ANGSTROM_TO_NM.powf(6.0), -6.0);
        assert_eq!(table.attractive_potential[0], att_u);
        assert_eq!(table.attractive_force[0], att_f);
        // the origin row repeats the first real grid point
        assert_eq!(table.attractive_potential[0], table.attractive_potential[1]);

        let (rep_u, rep_f) = exp_decay(0.1, KCAL_TO_KJ * 50.0, 10.0 * 3.5);
        assert_eq!(table.repulsive_potential[0], rep_u);
        assert_eq!(table.repulsive_force[0], rep_f);
    }

    #[test]
    fn c6_scaling_tabulates_a_unit_prefactor() {
        let nonbonded = filtered(&[("OW", "OW", "POW", &[1000.0, -6.0])]);
        let tables = NonbondedTables::generate(&nonbonded, &coarse(true)).unwrap();
        let table = tables.get(&PairKey::new("OW", "OW")).unwrap();

        let (u, f) = power_law(0.1, -1.0, -6.0);
        assert_eq!(table.attractive_potential[0], u);
        assert_eq!(table.attractive_force[0], f);
    }

    #[test]
    fn second_attractive_set_fails_under_c6_scaling() {
        let nonbonded = filtered(&[
            ("OW", "OW", "POW", &[1000.0, -6.0]),
            ("OW", "OW", "SRD", &[2000.0, -6.0, 2.0]),
        ]);
        let err = NonbondedTables::generate(&nonbonded, &coarse(true)).unwrap_err();
        assert_eq!(
            err,
            TableError::MultipleAttractive {
                pair: "OW~OW".to_string()
            }
        );

        assert!(NonbondedTables::generate(&nonbonded, &coarse(false)).is_ok());
    }

    #[test]
    fn special_pairs_and_c6_scaling_conflict() {
        let nonbonded = filtered(&[("OW", "OW", "POW", &[1000.0, -6.0])]);
        let mut options = coarse(true);
        options
            .special_pairs
            .insert(PairKey::new("OW", "OW"), vec!["POW_6".parse().unwrap()]);

        let err = NonbondedTables::generate(&nonbonded, &options).unwrap_err();
        assert_eq!(err, TableError::SpecialPairsWithScaling);
    }

    #[test]
    fn special_pair_set_overrides_the_default_routing() {
        let nonbonded = filtered(&[
            ("OW", "OW", "POW", &[1000.0, -6.0]),
            ("OW", "OW", "POW", &[500.0, -12.0]),
        ]);
        let mut options = coarse(false);
        options
            .special_pairs
            .insert(PairKey::new("OW", "OW"), vec!["POW_12".parse().unwrap()]);

        let tables = NonbondedTables::generate(&nonbonded, &options).unwrap();
        let table = tables.get(&PairKey::new("OW", "OW")).unwrap();

        let (att_u, _) = power_law(0.1, KCAL_TO_KJ * 500.0 * ANGSTROM_TO_NM.powf(12.0), -12.0);
        assert_eq!(table.attractive_potential[0], att_u);
        let (rep_u, _) = power_law(0.1, KCAL_TO_KJ * 1000.0 * ANGSTROM_TO_NM.powf(6.0), -6.0);
        assert_eq!(table.repulsive_potential[0], rep_u);
    }

    #[test]
    fn buckingham_splits_into_dispersion_and_repulsion() {
        let nonbonded = filtered(&[("HW", "OW", "BUCWAT", &[300.0, 1200.0, 3.2])]);
        let tables = NonbondedTables::generate(&nonbonded, &coarse(false)).unwrap();
        let table = tables.get(&PairKey::new("HW", "OW")).unwrap();

        let (att_u, att_f) = power_law(0.1, KCAL_TO_KJ * 1200.0 * ANGSTROM_TO_NM.powf(6.0), -6.0);
        assert_eq!(table.attractive_potential[0], att_u);
        assert_eq!(table.attractive_force[0], att_f);
        let (rep_u, rep_f) = exp_decay(0.1, KCAL_TO_KJ * 300.0, 10.0 * 3.2);
        assert_eq!(table.repulsive_potential[0], rep_u);
        assert_eq!(table.repulsive_force[0], rep_f);
    }

    #[test]
    fn special_buckingham_is_fully_repulsive_unless_listed() {
        let nonbonded = filtered(&[("HW", "OW", "BUCWAT", &[300.0, 1200.0, 3.2])]);
        let pair = PairKey::new("HW", "OW");
        let (disp_u, _) = power_law(0.1, KCAL_TO_KJ * 1200.0 * ANGSTROM_TO_NM.powf(6.0), -6.0);
        let (rep_u, _) = exp_decay(0.1, KCAL_TO_KJ * 300.0, 10.0 * 3.2);

        let mut options = coarse(false);
        options
            .special_pairs
            .insert(pair.clone(), vec!["POW_8".parse().unwrap()]);
        let tables = NonbondedTables::generate(&nonbonded, &options).unwrap();
        let table = tables.get(&pair).unwrap();
        assert!(table.attractive_potential.iter().all(|v| *v == 0.0));
        assert_eq!(table.repulsive_potential[0], disp_u + rep_u);

        options
            .special_pairs
            .insert(pair.clone(), vec!["BUC".parse().unwrap()]);
        let tables = NonbondedTables::generate(&nonbonded, &options).unwrap();
        let table = tables.get(&pair).unwrap();
        assert_eq!(table.attractive_potential[0], disp_u);
        assert_eq!(table.repulsive_potential[0], rep_u);
    }

    #[test]
    fn three_body_terms_produce_no_table_columns() {
        let nonbonded = filtered(&[("OW", "OW", "THC60", &[1.0, 2.0, 3.0])]);
        let tables = NonbondedTables::generate(&nonbonded, &coarse(false)).unwrap();
        let table = tables.get(&PairKey::new("OW", "OW")).unwrap();

        for column in &table.columns()[1..] {
            assert!(column.iter().all(|v| *v == 0.0));
        }
        assert_eq!(table.r.len(), 11);
    }

    #[test]
    fn scale_repulsive_touches_only_the_repulsive_columns() {
        let nonbonded = filtered(&[
            ("OW", "OW", "EXP", &[50.0, 3.5]),
            ("OW", "OW", "POW", &[1000.0, -6.0]),
        ]);
        let mut tables = NonbondedTables::generate(&nonbonded, &coarse(false)).unwrap();
        let pair = PairKey::new("OW", "OW");
        let before = tables.get(&pair).unwrap().clone();

        assert!(tables.scale_repulsive(&pair, 0.5));
        let after = tables.get(&pair).unwrap();
        assert_eq!(after.repulsive_potential[0], before.repulsive_potential[0] * 0.5);
        assert_eq!(after.repulsive_force[3], before.repulsive_force[3] * 0.5);
        assert_eq!(after.attractive_potential, before.attractive_potential);
        assert_eq!(after.coulomb_potential, before.coulomb_potential);

        assert!(!tables.scale_repulsive(&PairKey::new("XX", "YY"), 2.0));
    }
}
