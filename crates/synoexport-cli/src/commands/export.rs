//! Export command - Export Synology Office documents
//!
//! Provides the `synoexport export` CLI command which:
//! 1. Layers command-line flags and environment variables over the config
//! 2. Logs in to the NAS
//! 3. Creates the adapters (Synology Drive, local filesystem)
//! 4. Runs the SyncEngine once per selected source and displays results

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{error, info, warn};

use synoexport_core::config::{Config, ConfigBuilder};
use synoexport_drive::{DriveClient, SynologyDriveProvider};
use synoexport_sync::{ExportSource, LocalFileSystemAdapter, SyncEngine, SyncOptions, SyncStats};

use crate::output::{get_formatter, plural, stats_lines, OutputFormat};

/// Export command with clap options
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// NAS base URL, e.g. https://nas.local:5001
    #[arg(long, env = "SYNOLOGY_NAS_URL")]
    pub url: Option<String>,

    /// NAS account name
    #[arg(long, env = "SYNOLOGY_NAS_USER")]
    pub user: Option<String>,

    /// NAS account password
    #[arg(long, env = "SYNOLOGY_NAS_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory the documents are exported to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Source to export (mydrive, teamfolder, shared); can be repeated
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<ExportSource>,

    /// Download every document even if it is unchanged
    #[arg(long)]
    pub force: bool,

    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,
}

/// Outcome of one source
struct SourceResult {
    source: ExportSource,
    outcome: Result<SyncStats, String>,
}

impl ExportCommand {
    /// Flags layered over the loaded configuration
    fn effective_config(&self, config: Config) -> Config {
        let mut builder = ConfigBuilder::from_config(config);
        if let Some(url) = &self.url {
            builder = builder.drive_url(url);
        }
        if let Some(user) = &self.user {
            builder = builder.drive_username(user);
        }
        if let Some(password) = &self.password {
            builder = builder.drive_password(password);
        }
        if let Some(output) = &self.output {
            builder = builder.export_output_dir(output.clone());
        }
        if !self.sources.is_empty() {
            builder = builder.export_sources(self.sources.iter().map(ExportSource::name));
        }
        if self.force {
            builder = builder.export_force_refresh(true);
        }
        if self.dry_run {
            builder = builder.export_dry_run(true);
        }
        builder.build()
    }

    /// Execute the export command
    ///
    /// Returns `false` if any source failed or any error was counted.
    pub async fn execute(&self, config: Config, format: OutputFormat, quiet: bool) -> Result<bool> {
        let formatter = get_formatter(format, quiet);
        let config = self.effective_config(config);

        let errors = config.validate();
        if !errors.is_empty() {
            for e in &errors {
                formatter.error(&e.to_string());
            }
            bail!("Invalid configuration ({})", plural(errors.len() as u64, "error"));
        }

        let Some(password) = config.drive.password.clone() else {
            bail!("No password given. Set SYNOLOGY_NAS_PASS or pass --password");
        };
        let sources = config
            .export
            .sources
            .iter()
            .map(|s| s.parse::<ExportSource>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?;

        // Step 1: Log in
        let mut client = DriveClient::new(&config.drive).context("Failed to create HTTP client")?;
        client
            .login(&config.drive.username, &password)
            .await
            .with_context(|| format!("Failed to log in to {}", config.drive.url))?;
        let client = Arc::new(client);

        // Step 2: Create adapters and engine
        let options = SyncOptions::from_config(&config.export);
        let engine = SyncEngine::new(
            Arc::new(SynologyDriveProvider::new(Arc::clone(&client))),
            Arc::new(LocalFileSystemAdapter::new()),
            options,
        );

        if config.export.dry_run {
            formatter.info("Dry run mode - no changes will be made");
        }
        formatter.info(&format!(
            "Exporting to {}",
            config.export.output_dir.display()
        ));

        // Step 3: Run every source, a failed source does not stop the others
        let mut results = Vec::with_capacity(sources.len());
        for source in sources {
            info!(source = %source, "Starting export");
            let outcome = match engine.export(source).await {
                Ok(stats) => Ok(stats),
                Err(e) => {
                    error!(source = %source, error = %e, "Export failed");
                    Err(e.to_string())
                }
            };
            results.push(SourceResult { source, outcome });
        }

        // Step 4: Log out
        if let Err(e) = client.logout().await {
            warn!(error = %e, "Logout failed");
        }

        let mut total = SyncStats::default();
        for stats in results.iter().filter_map(|r| r.outcome.as_ref().ok()) {
            total.merge(stats);
        }
        let failed_sources = results.iter().filter(|r| r.outcome.is_err()).count();
        let success = failed_sources == 0 && total.is_success();

        // Step 5: Display results
        if matches!(format, OutputFormat::Json) {
            let per_source: Vec<serde_json::Value> = results
                .iter()
                .map(|r| match &r.outcome {
                    Ok(stats) => serde_json::json!({ "source": r.source, "stats": stats }),
                    Err(e) => serde_json::json!({ "source": r.source, "error": e }),
                })
                .collect();
            formatter.print_json(&serde_json::json!({
                "success": success,
                "dry_run": config.export.dry_run,
                "sources": per_source,
                "total": total,
            }));
        } else {
            for result in &results {
                match &result.outcome {
                    Ok(stats) => {
                        formatter.success(result.source.name());
                        for line in stats_lines(stats) {
                            formatter.info(&line);
                        }
                    }
                    Err(e) => formatter.error(&format!("{}: {}", result.source, e)),
                }
            }
            if success {
                formatter.success("Export completed");
            } else {
                formatter.error(&format!(
                    "Export finished with {} and {}",
                    plural(total.total_errors(), "error"),
                    plural(failed_sources as u64, "failed source")
                ));
            }
        }

        Ok(success)
    }
}
