//! eq-core: stable foundation for the equilibrium workspace.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - quantity (unit-string conversion for solver inputs)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod quantity;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{EqError, EqResult};
pub use numeric::*;
pub use quantity::{Quantity, convert_to_si};
pub use units::*;
