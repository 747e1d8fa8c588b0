//! Middleware and extractors.

pub mod error;
pub mod feature_gate;
pub mod profile;
