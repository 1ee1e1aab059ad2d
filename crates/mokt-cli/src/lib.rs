//! mokt CLI library
//!
//! Exposes the command-line modules for integration tests.

pub mod config;
pub mod exit;
pub mod output;
pub mod runner;
