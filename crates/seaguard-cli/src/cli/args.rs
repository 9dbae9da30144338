use std::path::PathBuf;

use clap::Args;
use seaguard_core::export::ExportFormat;
use seaguard_core::parse::SourceFormat;

use super::parsers::{
    parse_export_format, parse_finite_f64, parse_min_one_u64, parse_source_format,
};

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// TOML file with service settings; environment and flags override it.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Base URL of the analysis service.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
    #[arg(long, global = true, value_parser = parse_min_one_u64)]
    pub timeout_ms: Option<u64>,
    /// Retries after the first attempt (0 disables retrying).
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,
    /// Log at debug level unless SEAGUARD_LOG or RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ExportOptions {
    /// Also write the records to `{name}_{YYYY-MM-DD}.{ext}` in this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
    #[arg(long, value_parser = parse_export_format, default_value = "json")]
    pub export_format: ExportFormat,
    /// File name prefix for the export.
    #[arg(long, value_name = "NAME")]
    pub export_name: Option<String>,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// A `.csv`, `.json` or `.geojson` file, or a directory of them.
    pub path: PathBuf,
    /// Skip extension and content detection.
    #[arg(long, value_parser = parse_source_format)]
    pub format: Option<SourceFormat>,
    #[command(flatten)]
    pub export: ExportOptions,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    pub path: PathBuf,
    #[arg(long, value_parser = parse_source_format)]
    pub format: Option<SourceFormat>,
    #[command(flatten)]
    pub export: ExportOptions,
}

#[derive(Debug, Args)]
pub struct PointArgs {
    #[arg(allow_negative_numbers = true, value_parser = parse_finite_f64)]
    pub latitude: f64,
    #[arg(allow_negative_numbers = true, value_parser = parse_finite_f64)]
    pub longitude: f64,
}

#[derive(Debug, Args)]
pub struct ManualArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: String,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: String,
    #[arg(long)]
    pub id: Option<String>,
    /// Explicit behavior label; otherwise derived from `--speed`.
    #[arg(long)]
    pub behavior: Option<String>,
    #[arg(long, value_parser = parse_finite_f64)]
    pub speed: Option<f64>,
    /// Submit the vessel for a zone check instead of just printing it.
    #[arg(long, default_value_t = false)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Public CSV link; GitHub `blob` links are rewritten to raw content.
    pub url: String,
    #[command(flatten)]
    pub export: ExportOptions,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    pub path: PathBuf,
    #[arg(long, value_parser = parse_source_format)]
    pub format: Option<SourceFormat>,
}
