//! # Topology Generation
//!
//! Fills a GROMACS topology template with the sections a tabulated force
//! field needs.
//!
//! ## Overview
//!
//! Generation never builds a `.top` file from scratch. The caller supplies
//! a template that already declares `[ defaults ]`, `[ atomtypes ]`, and
//! the `[ moleculetype ]` skeletons for the run, and [`template`] splices
//! generated rows into the matching sections while copying everything else
//! through unchanged.
//!
//! [`nonbond`] derives one `[ nonbond_params ]` entry per filtered pair.
//! Because the real interactions live in tabulated `.xvg` files, the C6
//! and C12 values written here are placeholders that tell GROMACS which
//! channels of each pair table are populated. [`bonded`] renders the
//! per-molecule sections from the typed bonded model, referencing the
//! numbered bonded tables for quartic forms.

pub mod bonded;
pub mod nonbond;
pub mod template;

use super::tables::TableError;
use thiserror::Error;

/// Errors raised while generating topology sections.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopologyError {
    /// A quartic bond or cross term needs a bonded table its molecule does
    /// not have. Bonded tables and the bonded topology must be generated
    /// with the same molecule selection.
    #[error(
        "molecule '{molecule}' has no bonded table set; generate bonded tables with the same molecule selection"
    )]
    MissingTable { molecule: String },

    /// The template lacks a section generation must fill.
    #[error("template has no [ {section} ] section")]
    MissingSection { section: String },

    /// A table-level conflict surfaced while deriving pair parameters.
    #[error(transparent)]
    Table(#[from] TableError),
}
