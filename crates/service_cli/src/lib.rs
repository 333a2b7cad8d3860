//! Neutryx MC CLI - command-line runner for the sharded Monte Carlo engine
//!
//! # Commands
//!
//! - `neutryx-mc run --request <file.json>` - Run a request and print the result JSON
//! - `neutryx-mc plan --request <file.json>` - Print the shard layout without simulating
//! - `neutryx-mc demo` - Run the reference 200,000-path European call
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate only wires configuration,
//! logging and I/O around `pricer_sharding`.

pub mod commands;
pub mod config;
pub mod error;

pub use error::{CliError, Result};
