//! Layered configuration for the blescan CLI

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::BlescanConfig;
