//! Webtest Report - analytics and report generation for website test results
//!
//! Takes the raw metrics, time series and errors of a stress, API, security,
//! SEO, UX, compatibility, network or database test and derives a weighted
//! performance grade, bottleneck diagnostics, optimization suggestions,
//! trend and stability classification, and grouped error statistics. The
//! results are rendered as a JSON summary, a CSV data table or an HTML
//! analysis document.
//!
//! Every call is a pure, synchronous transformation: nothing is cached and
//! no state is shared between reports.
//!
//! # Example
//!
//! ```rust,no_run
//! use webtest_report::{ExportKind, ReportBuilder, ReportInput};
//! use serde_json::json;
//!
//! fn main() -> anyhow::Result<()> {
//!     let input = ReportInput {
//!         test_config: json!(r#"{"url": "https://example.com", "duration": 60}"#),
//!         metrics: json!({
//!             "totalRequests": 12000,
//!             "averageResponseTime": 180,
//!             "errorRate": 0.2,
//!             "throughput": 200,
//!         }),
//!         test_type: json!("stress"),
//!         ..Default::default()
//!     };
//!
//!     let file = ReportBuilder::new()
//!         .time_series_limit(500)
//!         .export(ExportKind::AnalysisReport, &input)?;
//!
//!     println!("{} ({} bytes)", file.filename, file.content.len());
//!     Ok(())
//! }
//! ```

mod aggregate;
mod bottleneck;
mod document;
mod encode;
mod error;
mod grade;
mod models;
mod normalize;
mod rating;
mod report;
mod trend;
pub mod utils;

pub use aggregate::aggregate_errors;
pub use bottleneck::{detect_bottlenecks, generate_recommendations, top_recommendations};
pub use encode::BOM;
pub use error::{ReportError, Result};
pub use grade::{calculate_grade, grade_for};
pub use models::{
    Bottleneck, BottleneckKind, ErrorEvent, ErrorGroup, ExportFile, Grade, MetricTrend,
    PerformanceGrade, ReportArtifact, ReportInput, Severity, Stability, TestConfig, TestMetrics,
    TimeSeriesPoint, TrendDirection, TrendMetric, Trends,
};
pub use normalize::{normalize, normalize_metrics, JsonField, NormalizedInput};
pub use rating::{benchmark, metric_rows, rate, MetricRow, MetricScale, Rating};
pub use report::{
    analyze, Analysis, ExportKind, MetricSummary, ReportContext, ReportOptions, SummaryReport,
};
pub use trend::{analyze_trends, coefficient_of_variation, stability};

use chrono::{DateTime, Utc};
use tracing::info;

/// Builder for configuring and generating reports
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    time_series_limit: usize,
    summary_recommendations: usize,
    include_time_series: bool,
    include_trends: bool,
    include_errors: bool,
    generated_at: Option<DateTime<Utc>>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        let options = ReportOptions::default();
        Self {
            time_series_limit: options.time_series_limit,
            summary_recommendations: options.summary_recommendations,
            include_time_series: options.include_time_series,
            include_trends: options.include_trends,
            include_errors: options.include_errors,
            generated_at: None,
        }
    }
}

impl ReportBuilder {
    /// Create a new ReportBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of raw time series rows in data tables
    pub fn time_series_limit(mut self, limit: usize) -> Self {
        self.time_series_limit = limit;
        self
    }

    /// Set how many recommendations the compact summary keeps
    pub fn summary_recommendations(mut self, count: usize) -> Self {
        self.summary_recommendations = count;
        self
    }

    /// Set whether data tables include the raw time series
    pub fn include_time_series(mut self, include: bool) -> Self {
        self.include_time_series = include;
        self
    }

    /// Set whether reports include the trend analysis
    pub fn include_trends(mut self, include: bool) -> Self {
        self.include_trends = include;
        self
    }

    /// Set whether reports include the grouped error statistics
    pub fn include_errors(mut self, include: bool) -> Self {
        self.include_errors = include;
        self
    }

    /// Pin the "generated at" timestamp instead of using the current time
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// The rendering options this builder describes
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            time_series_limit: self.time_series_limit,
            summary_recommendations: self.summary_recommendations,
            include_time_series: self.include_time_series,
            include_trends: self.include_trends,
            include_errors: self.include_errors,
        }
    }

    /// Normalize the input and derive every analysis result
    pub fn analyze(&self, input: &ReportInput) -> Analysis {
        analyze(&normalize(input))
    }

    /// Render one report artifact
    pub fn render(&self, kind: ExportKind, input: &ReportInput) -> Result<ReportArtifact> {
        let normalized = normalize(input);
        let options = self.options();
        let ctx = ReportContext::new(&normalized, &options, self.timestamp());
        report::render(kind, &ctx)
    }

    /// Render one report into a downloadable file
    pub fn export(&self, kind: ExportKind, input: &ReportInput) -> Result<ExportFile> {
        let normalized = normalize(input);
        let options = self.options();
        let ctx = ReportContext::new(&normalized, &options, self.timestamp());
        let file = report::export(kind, &ctx)?;

        info!(
            kind = %kind,
            filename = %file.filename,
            bytes = file.content.len(),
            score = ctx.analysis.grade.score,
            "report generated"
        );

        Ok(file)
    }

    /// Like [`ReportBuilder::export`], with the kind given by name
    /// (`raw-data`, `analysis-report`, `data-table` or `summary`)
    pub fn export_named(&self, kind: &str, input: &ReportInput) -> Result<ExportFile> {
        let kind: ExportKind = kind.parse()?;
        self.export(kind, input)
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.generated_at.unwrap_or_else(Utc::now)
    }
}

/// Export a report with default settings
pub fn export(kind: ExportKind, input: &ReportInput) -> Result<ExportFile> {
    ReportBuilder::new().export(kind, input)
}
