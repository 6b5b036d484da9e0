use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::aggregate::aggregate_errors;
use crate::bottleneck::{detect_bottlenecks, generate_recommendations, top_recommendations};
use crate::error::{ReportError, Result};
use crate::grade::calculate_grade;
use crate::models::{
    Bottleneck, ErrorEvent, ErrorGroup, ExportFile, PerformanceGrade, ReportArtifact, TestConfig,
    TestMetrics, TimeSeriesPoint, Trends,
};
use crate::normalize::{number, NormalizedInput};
use crate::trend::analyze_trends;
use crate::utils::{
    config_text, file_timestamp, format_test_duration, sanitize_filename, target_host,
    NOT_AVAILABLE,
};
use crate::{document, encode};

/// The report a caller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// Full JSON dump of the normalized input, no derived analytics
    RawData,
    /// HTML document with every derived result
    AnalysisReport,
    /// CSV table with every derived result and the optional time series
    DataTable,
    /// Compact JSON with a truncated recommendation list
    Summary,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::RawData,
        ExportKind::AnalysisReport,
        ExportKind::DataTable,
        ExportKind::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::RawData => "raw-data",
            ExportKind::AnalysisReport => "analysis-report",
            ExportKind::DataTable => "data-table",
            ExportKind::Summary => "summary",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::RawData | ExportKind::Summary => "json",
            ExportKind::AnalysisReport => "html",
            ExportKind::DataTable => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportKind::RawData | ExportKind::Summary => "application/json",
            ExportKind::AnalysisReport => "text/html;charset=utf-8",
            ExportKind::DataTable => "text/csv;charset=utf-8",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        ExportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ReportError::UnsupportedFormat(s.to_string()))
    }
}

/// Rendering knobs shared by every report kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Maximum number of raw time series rows in the table
    pub time_series_limit: usize,
    /// Number of recommendations kept in the compact summary
    pub summary_recommendations: usize,
    pub include_time_series: bool,
    pub include_trends: bool,
    pub include_errors: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            time_series_limit: 1000,
            summary_recommendations: 3,
            include_time_series: true,
            include_trends: true,
            include_errors: true,
        }
    }
}

/// Every derived result of one report request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub grade: PerformanceGrade,
    pub bottlenecks: Vec<Bottleneck>,
    pub recommendations: Vec<String>,
    pub trends: Trends,
    pub error_groups: Vec<ErrorGroup>,
}

/// Run every analysis over normalized input. The parts are independent.
pub fn analyze(input: &NormalizedInput) -> Analysis {
    let test_type = input.test_type.as_deref().unwrap_or_default();

    Analysis {
        grade: calculate_grade(&input.metrics),
        bottlenecks: detect_bottlenecks(&input.metrics),
        recommendations: generate_recommendations(&input.metrics, test_type),
        trends: analyze_trends(&input.time_series),
        error_groups: aggregate_errors(&input.errors),
    }
}

/// What a renderer sees: the input, its analysis and the generation time
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub input: &'a NormalizedInput,
    pub analysis: Analysis,
    pub options: &'a ReportOptions,
    pub generated_at: DateTime<Utc>,
}

impl<'a> ReportContext<'a> {
    pub fn new(
        input: &'a NormalizedInput,
        options: &'a ReportOptions,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            input,
            analysis: analyze(input),
            options,
            generated_at,
        }
    }

    pub fn generated_at_text(&self) -> String {
        self.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Test name, falling back to the test type
    pub fn display_name(&self) -> Option<&str> {
        self.input.test_name.as_deref().or(self.input.test_type.as_deref())
    }

    /// Label and display value of every basic info field, shared by all
    /// tabular renderers
    pub fn basic_info(&self) -> Vec<(&'static str, String)> {
        let input = self.input;
        let config = &input.config;
        let text = |value: Option<&String>| {
            value.cloned().unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        vec![
            ("测试ID", text(input.test_id.as_ref())),
            ("测试名称", text(input.test_name.as_ref())),
            ("测试类型", text(input.test_type.as_ref())),
            ("目标URL", config_text(config, "url")),
            ("目标主机", target_host(config).unwrap_or_else(|| NOT_AVAILABLE.to_string())),
            ("测试时长", format_test_duration(number(config.get("duration")).unwrap_or(0.0))),
            ("并发数", config_text(config, "concurrency")),
            ("请求方法", config_text(config, "method")),
            ("性能评分", self.analysis.grade.score.to_string()),
            ("性能等级", self.analysis.grade.grade.to_string()),
            ("生成时间", self.generated_at_text()),
        ]
    }
}

/// Headline metrics carried by the compact summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub total_requests: f64,
    pub average_response_time: f64,
    pub p95_response_time: Option<f64>,
    pub throughput: f64,
    pub error_rate: f64,
    pub success_rate: f64,
}

impl From<&TestMetrics> for MetricSummary {
    fn from(metrics: &TestMetrics) -> Self {
        Self {
            total_requests: metrics.total_requests,
            average_response_time: metrics.average_response_time,
            p95_response_time: metrics.p95_response_time,
            throughput: metrics.throughput,
            error_rate: metrics.error_rate,
            success_rate: metrics.success_rate,
        }
    }
}

/// Compact JSON summary of one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    #[serde(rename = "type")]
    pub report_type: String,
    pub timestamp: String,
    pub test_id: Option<String>,
    pub test_name: Option<String>,
    pub test_type: Option<String>,
    pub url: Option<String>,
    pub grade: PerformanceGrade,
    pub bottlenecks: Vec<Bottleneck>,
    pub recommendations: Vec<String>,
    pub metrics: MetricSummary,
}

impl SummaryReport {
    pub fn build(ctx: &ReportContext<'_>) -> Self {
        let input = ctx.input;
        Self {
            report_type: ExportKind::Summary.as_str().to_string(),
            timestamp: ctx.generated_at_text(),
            test_id: input.test_id.clone(),
            test_name: input.test_name.clone(),
            test_type: input.test_type.clone(),
            url: input.config.get("url").and_then(Value::as_str).map(str::to_string),
            grade: ctx.analysis.grade,
            bottlenecks: ctx.analysis.bottlenecks.clone(),
            recommendations: top_recommendations(
                &ctx.analysis.recommendations,
                ctx.options.summary_recommendations,
            ),
            metrics: MetricSummary::from(&input.metrics),
        }
    }
}

/// Full dump of the normalized input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataReport<'a> {
    #[serde(rename = "type")]
    pub report_type: &'static str,
    pub exported_at: String,
    pub test_id: Option<&'a str>,
    pub test_name: Option<&'a str>,
    pub test_type: Option<&'a str>,
    pub test_config: &'a TestConfig,
    pub result: &'a Map<String, Value>,
    pub metrics: &'a TestMetrics,
    pub real_time_data: &'a [TimeSeriesPoint],
    pub errors: &'a [ErrorEvent],
    pub logs: &'a [Value],
}

impl<'a> RawDataReport<'a> {
    pub fn build(ctx: &ReportContext<'a>) -> Self {
        let input = ctx.input;
        Self {
            report_type: ExportKind::RawData.as_str(),
            exported_at: ctx.generated_at_text(),
            test_id: input.test_id.as_deref(),
            test_name: input.test_name.as_deref(),
            test_type: input.test_type.as_deref(),
            test_config: &input.config,
            result: &input.result,
            metrics: &input.metrics,
            real_time_data: &input.time_series,
            errors: &input.errors,
            logs: &input.logs,
        }
    }
}

/// Render the artifact for a report kind
pub fn render(kind: ExportKind, ctx: &ReportContext<'_>) -> Result<ReportArtifact> {
    let artifact = match kind {
        ExportKind::RawData => ReportArtifact::Json {
            payload: serde_json::to_value(RawDataReport::build(ctx))?,
        },
        ExportKind::Summary => ReportArtifact::Json {
            payload: serde_json::to_value(SummaryReport::build(ctx))?,
        },
        ExportKind::DataTable => ReportArtifact::Csv {
            payload: encode::render_table(ctx)?,
            encoding: encode::CSV_ENCODING,
        },
        ExportKind::AnalysisReport => ReportArtifact::Html {
            payload: document::render_document(ctx),
        },
    };
    Ok(artifact)
}

/// `<kind>-<name-or-type>-<timestamp>.<ext>`
pub fn export_filename(kind: ExportKind, ctx: &ReportContext<'_>) -> String {
    let name = ctx
        .display_name()
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "test".to_string());

    format!(
        "{}-{}-{}.{}",
        kind.as_str(),
        name,
        file_timestamp(&ctx.generated_at),
        kind.extension()
    )
}

/// Render a report kind into a downloadable file
pub fn export(kind: ExportKind, ctx: &ReportContext<'_>) -> Result<ExportFile> {
    let content = render(kind, ctx)?.content()?;
    Ok(ExportFile {
        content,
        filename: export_filename(kind, ctx),
        mime_type: kind.mime_type().to_string(),
    })
}

impl ExportFile {
    /// Save the file under `dir`. Delivery is best effort: failures are
    /// logged and reported as `false`.
    pub fn write_to_dir(&self, dir: &Path) -> bool {
        let path = dir.join(&self.filename);
        match std::fs::write(&path, self.content.as_bytes()) {
            Ok(()) => {
                info!(path = %path.display(), bytes = self.content.len(), "report written");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write report");
                false
            }
        }
    }
}
