//! Reading CRYOFF files and writing GROMACS-facing output.

pub mod charge_file;
pub mod off;
pub mod xvg;
