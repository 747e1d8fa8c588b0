//! # Licensing Shared
//!
//! Wire types shared between the licensing API and its clients.
//! Kept free of server-side dependencies so frontends can reuse them.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
