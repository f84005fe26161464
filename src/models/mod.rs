//! Data models for the work-order intake service.
//!
//! Field names on the wire match the shop's form and the intake endpoint contract.

mod history;
mod intake;
mod order;

pub use history::*;
pub use intake::*;
pub use order::*;
