use clap::{Parser, Subcommand};

mod args;
mod parsers;


pub use args::{
    AnalyzeArgs, CheckArgs, ExportOptions, FetchArgs, GlobalArgs, IngestArgs, ManualArgs,
    PointArgs,
};

#[derive(Debug, Parser)]
#[command(name = "seaguard")]
#[command(about = "Vessel position ingest and protected-zone checks", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse, validate and normalize a file or directory of position reports.
    Ingest(IngestArgs),
    /// Build one vessel from typed coordinates.
    Manual(ManualArgs),
    /// Ingest positions and check them against protected zones.
    Check(CheckArgs),
    /// Check a single coordinate against protected zones.
    CheckPoint(PointArgs),
    /// Query the analysis service health endpoint.
    Health,
    /// Have the service download a CSV by URL and normalize its rows.
    Fetch(FetchArgs),
    /// Request movement predictions for every ingested vessel.
    Predict(AnalyzeArgs),
    /// Run per-vessel analysis for every ingested vessel.
    Analyze(AnalyzeArgs),
}
