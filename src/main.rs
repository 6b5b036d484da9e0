use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::{Read, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use webtest_report::utils::{get_reader, get_writer};
use webtest_report::{ExportKind, ReportBuilder, ReportInput};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a report from a test result
    Export {
        /// Report kind [raw-data, analysis-report, data-table, summary]
        #[arg(long, default_value = "analysis-report")]
        kind: String,

        /// Test result file (JSON)
        #[arg(long, default_value = "stdin")]
        input: String,

        /// Output file, or a directory to write the report under its generated file name
        #[arg(long, default_value = "stdout")]
        output: String,

        /// Maximum number of raw time series rows in data tables
        #[arg(long = "max-rows", default_value = "1000")]
        max_rows: usize,

        /// Number of recommendations kept in the summary
        #[arg(long, default_value = "3")]
        recommendations: usize,

        /// Leave the raw time series out of data tables
        #[arg(long)]
        no_time_series: bool,

        /// Leave the trend analysis out
        #[arg(long)]
        no_trends: bool,

        /// Leave the error statistics out
        #[arg(long)]
        no_errors: bool,

        /// Test name, overrides the one in the input
        #[arg(long)]
        name: Option<String>,
    },

    /// Print the derived analysis of a test result as JSON
    Analyze {
        /// Test result file (JSON)
        #[arg(long, default_value = "stdin")]
        input: String,

        /// Output file
        #[arg(long, default_value = "stdout")]
        output: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Export {
            kind,
            input,
            output,
            max_rows,
            recommendations,
            no_time_series,
            no_trends,
            no_errors,
            name,
        }) => {
            let kind: ExportKind = kind.parse()?;
            let mut report_input = read_input(&input)?;
            if let Some(name) = name {
                report_input.test_name = Value::String(name);
            }

            let file = ReportBuilder::new()
                .time_series_limit(max_rows)
                .summary_recommendations(recommendations)
                .include_time_series(!no_time_series)
                .include_trends(!no_trends)
                .include_errors(!no_errors)
                .export(kind, &report_input)?;

            let dir = Path::new(&output);
            if dir.is_dir() {
                if !file.write_to_dir(dir) {
                    anyhow::bail!("Failed to write {} to {}", file.filename, output);
                }
            } else {
                let mut writer = get_writer(&output)?;
                writer.write_all(file.content.as_bytes())?;
                writer.flush()?;
            }
        }
        Some(Commands::Analyze { input, output }) => {
            let report_input = read_input(&input)?;
            let analysis = ReportBuilder::new().analyze(&report_input);

            let mut writer = get_writer(&output)?;
            serde_json::to_writer_pretty(&mut writer, &analysis)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            println!("No command specified. Use --help for usage information.");
        }
    }

    Ok(())
}

fn read_input(path: &str) -> Result<ReportInput> {
    let mut reader = get_reader(path)?;
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .context(format!("Failed to read test result: {}", path))?;

    serde_json::from_str(&content).context("Failed to parse test result")
}
