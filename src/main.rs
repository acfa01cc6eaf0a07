mod input;
mod logging;
mod measures;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;

use clap::Parser;

use crate::input::resolve_pairs;
use crate::measures::{BinaryPairwiseMeasures, DEFAULT_METRICS, MeasureParams, parse_metric_list};
use crate::pipeline::stage3_subject::evaluate_pair;
use crate::pipeline::stage4_table::build_table;
use crate::pipeline::stage5_report::{ReportPaths, write_reports};

/// Compute per-label segmentation metrics for prediction/reference NIfTI pairs.
#[derive(Debug, Parser)]
#[command(name = "kira-segeval", version, about)]
struct Cli {
    /// Prediction NIfTI image, or a directory of them.
    #[arg(long)]
    prediction: PathBuf,

    /// Reference (ground truth) NIfTI image, or a directory of them.
    #[arg(long)]
    reference: PathBuf,

    /// Metrics to compute.
    #[arg(long, num_args = 1.., default_values_t = default_metric_names())]
    metrics: Vec<String>,

    /// Output CSV file.
    #[arg(long, default_value = "metrics.csv")]
    output: PathBuf,

    /// Optional per-label JSON summary.
    #[arg(long)]
    summary: Option<PathBuf>,

    #[arg(long, default_value_t = 1.0)]
    fbeta_beta: f64,

    /// Surface tolerance for nsd.
    #[arg(long, default_value_t = 1.0)]
    nsd_tau: f64,

    #[arg(long, default_value_t = 95.0)]
    hd_percentile: f64,

    /// Measure distances in header voxel spacing instead of voxel units.
    #[arg(long)]
    use_spacing: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn measure_params(&self) -> MeasureParams {
        MeasureParams {
            fbeta_beta: self.fbeta_beta,
            nsd_tau: self.nsd_tau,
            hd_percentile: self.hd_percentile,
            use_spacing: self.use_spacing,
        }
    }
}

fn default_metric_names() -> Vec<String> {
    DEFAULT_METRICS.iter().map(|m| m.name().to_string()).collect()
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(&cli) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let metrics = parse_metric_list(&cli.metrics).map_err(|e| e.to_string())?;
    let engine = BinaryPairwiseMeasures::new(cli.measure_params()).map_err(|e| e.to_string())?;

    let pairs = resolve_pairs(&cli.prediction, &cli.reference).map_err(|e| e.to_string())?;

    let mut subjects = Vec::with_capacity(pairs.len());
    for (idx, pair) in pairs.iter().enumerate() {
        tracing::info!(
            subject = idx + 1,
            total = pairs.len(),
            reference = %pair.reference.display(),
            prediction = %pair.prediction.display(),
            "evaluating subject"
        );
        let result = evaluate_pair(pair, &metrics, &engine).map_err(|e| e.to_string())?;
        subjects.push(result);
    }

    let table = build_table(&subjects);
    let paths = ReportPaths {
        table: cli.output.clone(),
        summary: cli.summary.clone(),
    };
    write_reports(&table, &subjects, &paths).map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
