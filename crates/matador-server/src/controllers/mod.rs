//! HTTP controllers.

pub mod health_controller;
pub mod jobs_controller;
pub mod queues_controller;
pub mod stats_controller;
