use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use seaguard_core::config::{EnvSource, ProcessEnv};
use seaguard_core::export::write_export;
use seaguard_core::ingest::{IngestReport, ingest_path};
use seaguard_core::parse::SourceFormat;
use seaguard_core::{AnalysisService, ConfigOverrides, ServiceConfig};
use serde::Serialize;
use tracing::debug;

use crate::cli::{ExportOptions, GlobalArgs};

pub(super) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

pub(super) fn load_config(global: &GlobalArgs) -> Result<ServiceConfig> {
    load_config_with(global, &ProcessEnv)
}

pub(super) fn load_config_with(
    global: &GlobalArgs,
    env: &dyn EnvSource,
) -> Result<ServiceConfig> {
    let overrides = ConfigOverrides {
        base_url: global.api_url.clone(),
        timeout_ms: global.timeout_ms,
        max_retries: global.max_retries,
    };
    ServiceConfig::load(global.config.as_deref(), env, &overrides)
        .context("failed to load service configuration")
}

pub(super) fn connect(global: &GlobalArgs) -> Result<AnalysisService> {
    let config = load_config(global)?;
    debug!(
        base_url = %config.base_url,
        timeout_ms = config.timeout_ms,
        max_retries = config.max_retries,
        "service configuration loaded"
    );
    AnalysisService::from_config(&config).context("failed to create service client")
}

pub(super) fn read_input(path: &Path, format: Option<SourceFormat>) -> Result<IngestReport> {
    ingest_path(path, format).with_context(|| format!("failed to ingest {}", path.display()))
}

/// Writes `records` when an export directory was requested; returns the written path.
pub(super) fn export_if_requested<T: Serialize>(
    options: &ExportOptions,
    default_name: &str,
    records: &[T],
) -> Result<Option<PathBuf>> {
    let Some(dir) = options.export_dir.as_deref() else {
        return Ok(None);
    };
    let name = options
        .export_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(default_name);
    let today = Local::now().date_naive();
    let path = write_export(dir, name, options.export_format, records, today)
        .with_context(|| format!("failed to export into {}", dir.display()))?;
    eprintln!("exported {} records to {}", records.len(), path.display());
    Ok(Some(path))
}
