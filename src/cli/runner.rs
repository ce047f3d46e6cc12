//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::server::{serve, AppState};
use crate::config::AppConfig;
use crate::engine::{EngineConfig, ReportEngine};
use crate::error::{Error, Result};
use crate::inventory::EmmaClient;
use crate::output::{list_reports, merge_reports, MergeOptions};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Generate => self.generate().await,
            Commands::List => self.list(),
            Commands::Merge {
                inputs,
                output,
                keep_inputs,
            } => self.merge(inputs, output, *keep_inputs).await,
            Commands::Serve { port } => {
                let config = self.cli.app_config()?;
                if config.credentials.is_empty() {
                    tracing::warn!("No tenant credentials configured, generation will fail");
                }
                serve(AppState::new(config)?, *port).await
            }
        }
    }

    fn engine(config: &AppConfig) -> Result<ReportEngine> {
        let source = EmmaClient::new(config.http_client_config())?;
        Ok(ReportEngine::new(
            Arc::new(source),
            EngineConfig::from(config),
        ))
    }

    /// Produce one combined report
    async fn generate(&self) -> Result<()> {
        let config = self.cli.app_config()?;
        let engine = Self::engine(&config)?;
        let start = Instant::now();

        let summary = engine.generate(&config.credentials).await?;

        self.output_message(&json!({
            "type": "REPORT",
            "report": summary.report,
            "rows": summary.rows,
            "columns": summary.columns,
            "tenants": summary.tenants,
            "cleanup_failures": summary.cleanup_failures,
            "duration_ms": start.elapsed().as_millis() as u64,
        }));
        Ok(())
    }

    /// Print the report file names
    fn list(&self) -> Result<()> {
        let files = match list_reports(&self.cli.reports_dir) {
            Ok(files) => files,
            Err(Error::FileNotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        self.output_message(&json!({
            "type": "FILES",
            "files": files
        }));
        Ok(())
    }

    /// Merge existing CSV files
    async fn merge(&self, inputs: &[PathBuf], output: &Path, keep_inputs: bool) -> Result<()> {
        let options = if keep_inputs {
            MergeOptions::default().keep_inputs()
        } else {
            MergeOptions::default()
        };
        let inputs = inputs.to_vec();
        let output = output.to_path_buf();

        let summary =
            tokio::task::spawn_blocking(move || merge_reports(&inputs, &output, options))
                .await?
                .map_err(|e| Error::merge(e.to_string()))?;

        let per_input: Vec<Value> = summary
            .rows_per_input
            .iter()
            .map(|(path, rows)| json!({ "path": path, "rows": rows }))
            .collect();

        self.output_message(&json!({
            "type": "MERGE",
            "output": summary.output,
            "columns": summary.columns,
            "rows": summary.rows_written,
            "inputs": per_input,
            "cleanup_failures": summary.cleanup_failures,
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
