//! Campusnet academic records services.
//!
//! The library hosts the grade calculation engine together with the ambient
//! configuration, telemetry, and error plumbing shared by the HTTP service.

pub mod config;
pub mod error;
pub mod grading;
pub mod telemetry;
