//! # Matador Server
//!
//! HTTP surface for the Matador queue monitor.
//! Exposes queue, job and stats endpoints under `/api`, liveness checks, and
//! optionally serves the built dashboard frontend.

pub mod controllers;
pub mod error;
pub mod responses;
pub mod router;
pub mod startup;
pub mod state;
pub mod telemetry;

pub use error::{ServerError, ServerResult};
pub use router::*;
pub use state::*;
