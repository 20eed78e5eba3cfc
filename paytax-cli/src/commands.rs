use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Datelike;
use paytax_core::{CalculatorRegistry, RawCalculationRequest};
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::output::{Outcome, Report};

/// Runs one command. Engine errors are returned as-is so `main` can print
/// them in the `{"error": ...}` shape.
pub async fn run(
    registry: Arc<CalculatorRegistry>,
    command: Command,
) -> Result<Report> {
    let report = match command {
        Command::Jurisdictions => Report::Names(
            registry
                .list_jurisdictions()
                .into_iter()
                .map(str::to_string)
                .collect(),
        ),
        Command::Years => Report::Years(registry.list_years()),
        Command::Regions { jurisdiction } => Report::Names(registry.regions(&jurisdiction)?),
        Command::Subregions {
            jurisdiction,
            region,
        } => Report::Names(registry.subregions(&jurisdiction, &region)?),
        Command::Calculate(args) => {
            let raw = RawCalculationRequest::from(args);
            Report::Breakdown(registry.calculate_request(&raw)?)
        }
        Command::Batch { file } => {
            let requests = read_batch(&file)?;
            Report::Batch(run_batch(registry, requests, current_year()).await)
        }
    };
    Ok(report)
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn read_batch(path: &Path) -> Result<Vec<RawCalculationRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    let requests: Vec<RawCalculationRequest> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse batch file: {}", path.display()))?;
    info!(file = %path.display(), requests = requests.len(), "batch loaded");
    Ok(requests)
}

/// Calculates every request on the blocking pool and returns the outcomes in
/// input order. A request that fails or panics yields [`Outcome::Err`] and
/// does not stop the others.
pub async fn run_batch(
    registry: Arc<CalculatorRegistry>,
    requests: Vec<RawCalculationRequest>,
    default_year: i32,
) -> Vec<Outcome> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|raw| {
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || {
                registry.calculate_request_for_year(&raw, default_year)
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (idx, handle) in handles.into_iter().enumerate() {
        let request = idx + 1;
        outcomes.push(match handle.await {
            Ok(Ok(breakdown)) => Outcome::Ok(breakdown),
            Ok(Err(err)) => {
                debug!(request, error = %err, "batch request failed");
                Outcome::Err {
                    error: err.to_string(),
                }
            }
            Err(join_err) => {
                warn!(request, error = %join_err, "batch request panicked");
                Outcome::Err {
                    error: format!("Request {request} failed unexpectedly"),
                }
            }
        });
    }
    outcomes
}
