//! Command implementations.

mod devices;
mod run;
mod validate;

pub use devices::run_devices;
pub use run::run_scan;
pub use validate::run_validate;
