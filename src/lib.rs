//!
//! riskvm runs 2048-byte program images on a small machine that understands a subset of RV32I.
//! The first 1024 bytes of the image are the code and the rest is initialized data. Programs do
//! I/O and dynamic memory through virtual routines: stores (and, for input, loads) to fixed
//! addresses that the simulator intercepts.
//!
//! The machine is not meant to be a faithful RISC-V processor. There are no immediate shifts,
//! `sra` rotates, and code can't be modified at runtime. It does behave exactly like the
//! reference machine it was made to replace, except where [`simulator::Options`] says
//! otherwise.
//!

pub mod config;
pub mod instruction;
pub mod simulator;
