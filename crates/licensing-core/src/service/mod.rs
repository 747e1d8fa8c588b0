//! Application services built on the domain and ports.

mod licensing;

pub use licensing::{ConsumeOutcome, Denial, LicensingService};
