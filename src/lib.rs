// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # VM Inventory Report
//!
//! Pulls the virtual machine inventory of every configured tenant from the
//! cloud API, flattens each VM record into one CSV row and union-merges the
//! per-tenant files into a single report.
//!
//! ## Features
//!
//! - **Flattening**: Nested JSON becomes dot-path columns (`disks.0.sizeGb`)
//! - **Schema Reconciliation**: Tenants with different fields share one header
//! - **Safe Merge**: The combined file only appears once fully written
//! - **HTTP Service**: Generate, list and download reports over REST
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vm_inventory_report::config::{credentials_from_env, AppConfig};
//! use vm_inventory_report::engine::{EngineConfig, ReportEngine};
//! use vm_inventory_report::inventory::EmmaClient;
//!
//! #[tokio::main]
//! async fn main() -> vm_inventory_report::Result<()> {
//!     let source = EmmaClient::new(AppConfig::default().http_client_config())?;
//!     let engine = ReportEngine::new(Arc::new(source), EngineConfig::default());
//!
//!     let summary = engine.generate(&credentials_from_env()).await?;
//!     println!("{:?}", summary.report);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              ReportEngine  (CLI / HTTP service)              │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬───────────┬────┴─────────┬────────────┬─────────┐
//! │ Inventory  │   Auth    │   Flatten    │   Output   │  HTTP   │
//! ├────────────┼───────────┼──────────────┼────────────┼─────────┤
//! │ Token      │ Claims    │ Dot paths    │ Row writer │ Retry   │
//! │ VM listing │           │ Scalars      │ Reconcile  │ Backoff │
//! │            │           │              │ Merge      │ Limits  │
//! └────────────┴───────────┴──────────────┴────────────┴─────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Core shared types
pub mod types;

/// Application and tenant configuration
pub mod config;

/// JSON record flattening
pub mod flatten;

/// CSV report files
pub mod output;

/// Access-token claims
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Upstream VM inventory
pub mod inventory;

/// Report generation engine
pub mod engine;

/// Command-line interface and HTTP service
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
