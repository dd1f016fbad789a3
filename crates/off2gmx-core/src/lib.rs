//! # off2gmx Core Library
//!
//! A library for turning CRYOFF force-field files (`.off`, the output of the
//! Adaptive Force Matching workflow) into GROMACS simulation inputs: tabulated
//! potentials (`.xvg`) and topology (`.top`) content.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a strict dependency direction:
//!
//! - **[`core`]: The Foundation.** Typed force-field models (`BondedModel`,
//!   `NonbondedModel`, `ChargeModel`), the `.off` parser, the pure potential
//!   mathematics, the table generators, and topology content rendering.
//!
//! - **[`workflows`]: The Public API.** The user-facing layer. It ties the
//!   pieces of `core` together into complete conversion procedures via the
//!   [`workflows::convert::OffForceField`] facade: read a file once, then
//!   derive charges, generate tables, and render topology sections from the
//!   same parsed model.

pub mod core;
pub mod workflows;
