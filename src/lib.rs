pub mod archive;
pub mod cli;
pub mod config;
pub mod download;
pub mod env;
pub mod error;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod permissions;
pub mod plan;
pub mod runner;
pub mod ui;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{InstallError, InstallResult};
pub use models::*;
