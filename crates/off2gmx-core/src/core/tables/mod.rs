//! # Tabulated Potential Generation
//!
//! Turns filtered force-field interactions into the numeric tables GROMACS
//! reads as `.xvg` files.
//!
//! ## Overview
//!
//! Generation runs in three steps shared by the bonded and nonbonded paths:
//!
//! 1. A distance [`grid`] is laid out from a spacing and a length, with the
//!    origin clamped for evaluation so singular potentials stay finite.
//! 2. Fitted parameters are converted from CRYOFF units (kcal/mol, Angstrom)
//!    to GROMACS units (kJ/mol, nm) and dispatched to the matching pure
//!    potential function ([`convert`], [`potentials`]).
//! 3. Potential and force values accumulate per grid point into the final
//!    column layout ([`nonbonded`], [`bonded`]).
//!
//! Nonbonded tables split every pair into Coulomb, attractive, and repulsive
//! column groups; bonded tables are numbered sequentially across molecules
//! because GROMACS references them as `table_b<n>.xvg`.

pub mod bonded;
pub mod convert;
pub mod grid;
pub mod nonbonded;
pub mod potentials;

use thiserror::Error;

/// Errors raised while generating tabulated potentials.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    /// The requested grid has fewer than two points.
    #[error("table grid with spacing {spacing} nm and length {length} nm has fewer than two points")]
    DegenerateGrid { spacing: f64, length: f64 },

    /// C6 scaling needs exactly one attractive interaction per pair.
    #[error(
        "pair {pair} has more than one attractive interaction; C6 scaling supports exactly one"
    )]
    MultipleAttractive { pair: String },

    /// Custom attractive sets and C6 scaling are mutually exclusive.
    #[error("custom attractive interactions cannot be combined with C6 scaling")]
    SpecialPairsWithScaling,
}
