//! # Licensing Core
//!
//! Feature entitlement and metered quota enforcement.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! the plan model, the store and resolver ports, and the [`LicensingService`]
//! that ties them together.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::LicensingError;
pub use service::{ConsumeOutcome, Denial, LicensingService};
