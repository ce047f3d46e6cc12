//! CLI commands and argument parsing

use crate::config::{credentials_from_env, load_credentials_file, AppConfig, DEFAULT_API_URL};
use crate::error::Result;
use crate::types::{BackoffType, FailurePolicy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Multi-tenant VM inventory reports
#[derive(Parser, Debug)]
#[command(name = "vm-inventory-report")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding combined reports
    #[arg(long, global = true, default_value = "reports")]
    pub reports_dir: PathBuf,

    /// Directory for per-tenant intermediate files
    #[arg(long, global = true, default_value = "temp-reports")]
    pub temp_dir: PathBuf,

    /// Upstream API base URL
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Tenant credentials file (YAML); defaults to the CREDENTIALS variable
    #[arg(long, global = true)]
    pub credentials_file: Option<PathBuf>,

    /// Leave failing tenants out of the report instead of aborting
    #[arg(long, global = true)]
    pub skip_failed_tenants: bool,

    /// Upstream request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout_secs: u64,

    /// Retries after a failed upstream request
    #[arg(long, global = true, default_value = "3")]
    pub max_retries: u32,

    /// Growth of the pause between retries
    #[arg(long, global = true, value_enum, default_value = "exponential")]
    pub backoff: BackoffType,

    /// Upstream requests per second, 0 for unlimited
    #[arg(long, global = true, default_value = "5")]
    pub rate_limit: u32,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every tenant's VMs and write one combined report
    Generate,

    /// List report files
    List,

    /// Union-merge existing CSV files into one
    Merge {
        /// CSV files to merge, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Destination file, which must not exist yet
        #[arg(short, long)]
        output: PathBuf,

        /// Do not delete the inputs after a successful merge
        #[arg(long)]
        keep_inputs: bool,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

impl Cli {
    /// Assemble the application configuration from flags and environment
    pub fn app_config(&self) -> Result<AppConfig> {
        let credentials = match &self.credentials_file {
            Some(path) => load_credentials_file(path)?,
            None => credentials_from_env(),
        };

        let config = AppConfig {
            reports_dir: self.reports_dir.clone(),
            temp_dir: self.temp_dir.clone(),
            api_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            backoff: self.backoff,
            requests_per_second: self.rate_limit,
            failure_policy: FailurePolicy::from_skip_flag(self.skip_failed_tenants),
            credentials,
        };
        config.validate()?;
        Ok(config)
    }
}
