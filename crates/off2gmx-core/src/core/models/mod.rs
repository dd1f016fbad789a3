//! # Force-Field Models
//!
//! Typed representations of everything a CRYOFF `.off` file declares.
//!
//! ## Key Components
//!
//! - [`bonded`] - Per-molecule bonded terms: the atom table (with virtual
//!   sites), harmonic/quartic bonds and angles, three-center terms,
//!   dihedrals, and exclusion lists
//! - [`nonbonded`] - Pair-keyed nonbonded interactions, both as written in
//!   the file and after filtering/key normalization for table generation
//! - [`charges`] - Per-molecule, per-atom partial charges
//! - [`naming`] - Translation of `.off` type names to output names
//!
//! Parameter groups preserve declaration order throughout; bonded table
//! numbering and topology rendering depend on it.

pub mod bonded;
pub mod charges;
pub mod naming;
pub mod nonbonded;
