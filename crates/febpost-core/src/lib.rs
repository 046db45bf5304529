//! Post-processing library for FEBio cyclical beam-bending simulations:
//! step-report extraction, derived force/displacement/work columns, per-cycle
//! work accumulation, and peak-period estimation.

pub mod domain;
pub mod io;
pub mod modules;
pub mod numerics;
pub mod table;
