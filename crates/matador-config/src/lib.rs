//! # Matador Config
//!
//! Configuration management for the Matador queue monitor.
//! Supports layered configuration from files and environment variables,
//! plus the plain `PORT` / `REDIS_*` variables used by existing deployments.

mod app_config;
mod error;
mod loader;
mod validation;

pub use app_config::*;
pub use error::*;
pub use loader::*;
