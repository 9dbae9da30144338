use anyhow::{Context, Result};
use seaguard_core::ingest::{ManualEntry, manual_vessel};
use seaguard_core::models::{PredictionResponse, VesselData, ZoneCheckResult};
use seaguard_core::{AnalysisService, CancelToken, Vessel, ZoneCheckOrchestrator};

use crate::cli::{AnalyzeArgs, CheckArgs, Cli, Commands, FetchArgs, IngestArgs, ManualArgs};

mod support;


use self::support::{connect, export_if_requested, print_json, read_input};

const VESSELS_EXPORT_NAME: &str = "vessels";
const ZONE_CHECK_EXPORT_NAME: &str = "zone_check";

pub(crate) fn run(cli: Cli) -> Result<()> {
    let Cli { global, command } = cli;
    let cancel = CancelToken::new();

    match command {
        Commands::Ingest(args) => handle_ingest(&args),
        Commands::Manual(args) => {
            let vessel = manual_from_args(&args)?;
            if !args.check {
                return print_json(&vessel);
            }
            let service = connect(&global)?;
            finish_zone_check(run_zone_check(&service, &[vessel], &cancel)?)
        }
        Commands::Check(args) => handle_check(&connect(&global)?, &args, &cancel),
        Commands::CheckPoint(args) => {
            let service = connect(&global)?;
            let response = service
                .check_single_zone(args.latitude, args.longitude, &cancel)
                .context("single-point zone check failed")?;
            print_json(&response)
        }
        Commands::Health => {
            let service = connect(&global)?;
            let health = service
                .health_check(&cancel)
                .context("health check failed")?;
            print_json(&health)?;
            if !health.is_healthy() {
                anyhow::bail!("service reported status '{}'", health.status);
            }
            Ok(())
        }
        Commands::Fetch(args) => handle_fetch(&connect(&global)?, &args, &cancel),
        Commands::Predict(args) => handle_predict(&connect(&global)?, &args, &cancel),
        Commands::Analyze(args) => {
            let service = connect(&global)?;
            let report = read_input(&args.path, args.format)?;
            let payloads = report.vessels.iter().map(VesselData::from).collect::<Vec<_>>();
            let items = service
                .analyze_batch(&payloads, &cancel)
                .context("batch analysis failed")?;
            print_json(&items)
        }
    }
}

fn handle_ingest(args: &IngestArgs) -> Result<()> {
    let report = read_input(&args.path, args.format)?;
    export_if_requested(&args.export, VESSELS_EXPORT_NAME, &report.vessels)?;
    print_json(&report)
}

fn handle_check(service: &AnalysisService, args: &CheckArgs, cancel: &CancelToken) -> Result<()> {
    let report = read_input(&args.path, args.format)?;
    let result = run_zone_check(service, &report.vessels, cancel)?;
    export_if_requested(&args.export, ZONE_CHECK_EXPORT_NAME, &result.vessels)?;
    finish_zone_check(result)
}

fn handle_fetch(service: &AnalysisService, args: &FetchArgs, cancel: &CancelToken) -> Result<()> {
    let fetched = service
        .fetch_csv(&args.url, cancel)
        .with_context(|| format!("failed to fetch {}", args.url))?;
    export_if_requested(&args.export, VESSELS_EXPORT_NAME, &fetched.report.vessels)?;
    print_json(&fetched)
}

fn handle_predict(
    service: &AnalysisService,
    args: &AnalyzeArgs,
    cancel: &CancelToken,
) -> Result<()> {
    let report = read_input(&args.path, args.format)?;
    let predictions = report
        .vessels
        .iter()
        .map(|vessel| {
            service
                .predict(&VesselData::from(vessel), cancel)
                .with_context(|| format!("prediction failed for {}", vessel.vessel_id))
        })
        .collect::<Result<Vec<PredictionResponse>>>()?;
    print_json(&predictions)
}

fn manual_from_args(args: &ManualArgs) -> Result<Vessel> {
    let entry = ManualEntry {
        vessel_id: args.id.clone(),
        latitude: args.lat.clone(),
        longitude: args.lon.clone(),
        behavior: args.behavior.clone(),
        speed: args.speed,
    };
    manual_vessel(&entry, 1).context("manual entry rejected")
}

fn run_zone_check(
    service: &AnalysisService,
    vessels: &[Vessel],
    cancel: &CancelToken,
) -> Result<ZoneCheckResult> {
    ZoneCheckOrchestrator::new(service)
        .run(vessels, cancel)
        .context("zone check aborted")
}

/// Prints the result either way; a failed check still exits non-zero.
fn finish_zone_check(result: ZoneCheckResult) -> Result<()> {
    print_json(&result)?;
    if !result.success {
        let reason = result.error.as_deref().unwrap_or("unknown error");
        match result.suggestion.as_deref() {
            Some(hint) => anyhow::bail!("zone check failed: {reason} ({hint})"),
            None => anyhow::bail!("zone check failed: {reason}"),
        }
    }
    Ok(())
}
