//! SeaORM entities.

pub mod subscription;
pub mod usage_counter;
