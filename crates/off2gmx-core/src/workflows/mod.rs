//! # Workflows Module
//!
//! High-level conversion procedures that turn a CRYOFF force-field file
//! into a complete set of GROMACS inputs.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points for users of off2gmx. They tie
//! the `core` pieces together: parse the file once, derive or load partial
//! charges, generate the tabulated potentials, and render and splice
//! topology content, writing every output where the configuration points.
//!
//! ## Architecture
//!
//! - **Conversion** ([`convert`]) - The [`convert::OffForceField`] facade
//!   over one parsed `.off` file, the table and topology write drivers, and
//!   the end-to-end [`convert::run`] procedure.
//! - **Configuration** ([`config`]) - The TOML-backed
//!   [`config::ConvertConfig`] with every workflow default centralized.

pub mod config;
pub mod convert;
