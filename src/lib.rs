//! wxlookup library
//!
//! Weather lookups behind a short-lived TTL fetch cache. The binary is a thin
//! layer over these modules; integration tests use them directly.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod display;
pub mod location;
pub mod logging;
pub mod refresh;
pub mod service;
pub mod ui;
pub mod weather;
