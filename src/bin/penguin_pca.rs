use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use ndarray::Array2;
use serde::Serialize;

use penguin_pca::pca::{Biplot, ScreePoint};
use penguin_pca::statistics::{self, ColumnSummary};
use penguin_pca::svd::{CovarianceEigen, NalgebraSVD, SVDImplementation};
use penguin_pca::{PCABuilder, Pca, PcaResult, Table};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// Thin SVD of the standardized matrix.
    Svd,
    /// Symmetric eigen-decomposition of the cross-product matrix.
    Eigen,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Principal component analysis of a CSV table.", long_about = None)]
struct CliArgs {
    /// CSV file with a header row; `NA` and empty cells are missing.
    input: PathBuf,

    /// Numeric columns to analyse.
    #[arg(
        short,
        long,
        value_delimiter = ',',
        default_values = ["bill_length_mm", "bill_depth_mm", "flipper_length_mm", "body_mass_g"]
    )]
    columns: Vec<String>,

    /// Categorical column carried through for colouring.
    #[arg(short, long, default_value = "species")]
    label: String,

    /// Report destination; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Backend::Svd)]
    backend: Backend,

    #[arg(long, default_value = "Info")]
    log_level: String,
}

#[derive(Serialize)]
struct Report<'a> {
    records: usize,
    summaries: Vec<ColumnSummary>,
    correlation: Array2<f64>,
    pca: &'a PcaResult,
    labels: Option<Vec<String>>,
    scree: Vec<ScreePoint>,
    biplot: Option<Biplot>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new().filter_level(log_level).init();

    let table = Table::from_csv_path(&cli_args.input)?;
    info!(
        "Loaded {} records with columns {:?}",
        table.len(),
        table.columns()
    );

    match cli_args.backend {
        Backend::Svd => run(&cli_args, &table, PCABuilder::new(NalgebraSVD).build()),
        Backend::Eigen => run(&cli_args, &table, PCABuilder::new(CovarianceEigen).build()),
    }
}

fn run<S: SVDImplementation>(cli_args: &CliArgs, table: &Table, pca: Pca<S>) -> Result<()> {
    let columns = &cli_args.columns;

    let summaries = statistics::summarize(table, columns)?;
    for s in &summaries {
        info!(
            "{}: n={} missing={} mean={:?} sd={:?} min={:?} median={:?} max={:?}",
            s.column, s.count, s.missing, s.mean, s.std_dev, s.min, s.median, s.max
        );
    }

    let correlation = statistics::correlation_table(table, columns)
        .context("Unable to compute the correlation matrix")?;
    info!("Correlation matrix:\n{:.3}", correlation);

    let result = pca.fit(table, columns).context("PCA failed")?;
    info!(
        "Kept {} of {} records after removing missing values",
        result.n_records(),
        table.len()
    );
    for point in result.scree() {
        info!(
            "PC{}: variance {:.4}, {:.1}% of total ({:.1}% cumulative)",
            point.component,
            point.variance,
            100.0 * point.ratio,
            100.0 * point.cumulative
        );
    }

    let labels = if table.has_column(&cli_args.label) {
        let all = table.labels(&cli_args.label)?;
        Some(
            result
                .retained_rows()
                .iter()
                .map(|&i| all[i].clone())
                .collect(),
        )
    } else {
        warn!("Label column `{}` not found; scores are unlabelled", cli_args.label);
        None
    };

    let biplot = if result.n_components() >= 2 {
        Some(result.biplot(1, 2)?)
    } else {
        None
    };

    let report = Report {
        records: result.n_records(),
        summaries,
        correlation,
        pca: &result,
        labels,
        scree: result.scree(),
        biplot,
    };

    let writer: Box<dyn Write> = match &cli_args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Unable to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    writer.flush()?;

    if let Some(path) = &cli_args.output {
        info!("Report written to {}", path.display());
    }
    Ok(())
}
