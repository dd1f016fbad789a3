//! # Core Module
//!
//! The computational core of off2gmx: everything needed to go from `.off`
//! text to GROMACS-ready numbers, without touching the filesystem beyond
//! explicit reader/writer entry points.
//!
//! ## Architecture
//!
//! - **Force-field representation** ([`models`]) - Typed bonded, nonbonded,
//!   and charge models parsed out of an `.off` file
//! - **File I/O** ([`io`]) - The `.off` reader, the charge-assignment file
//!   reader, and the `.xvg` table writers
//! - **Table generation** ([`tables`]) - Distance grids, pure potential
//!   functions, unit conversion, and the bonded/nonbonded table generators
//! - **Charge derivation** ([`charges`]) - Known-atom charge propagation and
//!   molecule neutralization
//! - **Topology content** ([`topology`]) - `[ nonbond_params ]` and
//!   per-molecule bonded section rendering plus template splicing

pub mod charges;
pub mod io;
pub mod models;
pub mod tables;
pub mod topology;
