//! CLI module
//!
//! Command-line interface for producing VM inventory reports.
//!
//! # Commands
//!
//! - `generate` - Fetch all tenants and write one combined report
//! - `list` - List report files
//! - `merge` - Union-merge existing CSV files
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve, AppState};
