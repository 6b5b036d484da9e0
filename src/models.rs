use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical metrics of a single test run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetrics {
    /// Total number of requests sent
    pub total_requests: f64,
    /// Number of successful requests
    pub successful_requests: f64,
    /// Number of failed requests
    pub failed_requests: f64,
    /// Mean response time in milliseconds
    pub average_response_time: f64,
    /// Fastest response in milliseconds
    pub min_response_time: f64,
    /// Slowest response in milliseconds
    pub max_response_time: f64,
    /// 50th percentile response time, if reported
    pub p50_response_time: Option<f64>,
    /// 90th percentile response time, if reported
    pub p90_response_time: Option<f64>,
    /// 95th percentile response time, if reported
    pub p95_response_time: Option<f64>,
    /// 99th percentile response time, if reported
    pub p99_response_time: Option<f64>,
    /// Requests per second
    pub throughput: f64,
    /// Error rate in percent (0 - 100)
    pub error_rate: f64,
    /// Success rate in percent (0 - 100), supplied independently of `error_rate`
    pub success_rate: f64,
}

/// Opaque bag of test parameters (url, duration, concurrency, method, ...)
pub type TestConfig = Map<String, Value>;

/// One sample of a captured time series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Capture time in milliseconds since the Unix epoch, if known
    pub timestamp: Option<i64>,
    pub response_time: Option<f64>,
    pub throughput: Option<f64>,
    pub error_rate: Option<f64>,
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
}

/// A single error observed during a test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Error category, e.g. "Timeout"
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error code, e.g. "408"
    pub code: String,
    /// Occurrence time in milliseconds since the Unix epoch, if known
    pub timestamp: Option<i64>,
    pub message: Option<String>,
}

/// Letter grade summarizing a performance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted performance score and its letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceGrade {
    /// Integer score in [0, 100]
    pub score: u8,
    pub grade: Grade,
}

/// Which rule produced a bottleneck finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckKind {
    ResponseTime,
    ErrorRate,
    Throughput,
    Variance,
    /// Sentinel emitted when no rule triggers
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Medium,
    High,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "提示",
            Severity::Medium => "中",
            Severity::High => "高",
        }
    }
}

/// A rule-triggered diagnosis of a weak metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    /// Short human readable name of the finding
    pub label: String,
    /// Measured value and the threshold it crossed
    pub detail: String,
    pub severity: Severity,
}

/// Direction of a metric between the first and second half of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    #[serde(rename = "上升")]
    Rising,
    #[serde(rename = "下降")]
    Falling,
    #[serde(rename = "稳定")]
    Flat,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "上升",
            TrendDirection::Falling => "下降",
            TrendDirection::Flat => "稳定",
        }
    }
}

/// Stability band derived from the coefficient of variation, most stable first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stability {
    #[serde(rename = "很稳定")]
    VeryStable,
    #[serde(rename = "稳定")]
    Stable,
    #[serde(rename = "较稳定")]
    FairlyStable,
    #[serde(rename = "不稳定")]
    Unstable,
    #[serde(rename = "很不稳定")]
    VeryUnstable,
}

impl Stability {
    pub fn label(&self) -> &'static str {
        match self {
            Stability::VeryStable => "很稳定",
            Stability::Stable => "稳定",
            Stability::FairlyStable => "较稳定",
            Stability::Unstable => "不稳定",
            Stability::VeryUnstable => "很不稳定",
        }
    }
}

/// Time series metrics covered by trend analysis, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendMetric {
    ResponseTime,
    Throughput,
    ErrorRate,
    CpuUsage,
    MemoryUsage,
}

impl TrendMetric {
    pub const ALL: [TrendMetric; 5] = [
        TrendMetric::ResponseTime,
        TrendMetric::Throughput,
        TrendMetric::ErrorRate,
        TrendMetric::CpuUsage,
        TrendMetric::MemoryUsage,
    ];

    /// Key used in JSON output
    pub fn key(&self) -> &'static str {
        match self {
            TrendMetric::ResponseTime => "responseTime",
            TrendMetric::Throughput => "throughput",
            TrendMetric::ErrorRate => "errorRate",
            TrendMetric::CpuUsage => "cpuUsage",
            TrendMetric::MemoryUsage => "memoryUsage",
        }
    }

    /// Display name used in tables
    pub fn label(&self) -> &'static str {
        match self {
            TrendMetric::ResponseTime => "响应时间",
            TrendMetric::Throughput => "吞吐量",
            TrendMetric::ErrorRate => "错误率",
            TrendMetric::CpuUsage => "CPU使用率",
            TrendMetric::MemoryUsage => "内存使用率",
        }
    }

    /// The sample value for this metric, if captured
    pub fn value(&self, point: &TimeSeriesPoint) -> Option<f64> {
        match self {
            TrendMetric::ResponseTime => point.response_time,
            TrendMetric::Throughput => point.throughput,
            TrendMetric::ErrorRate => point.error_rate,
            TrendMetric::CpuUsage => point.cpu_usage,
            TrendMetric::MemoryUsage => point.memory_usage,
        }
    }
}

/// Trend of a single metric over a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    pub direction: TrendDirection,
    /// Percentage change of the second half mean, 2 decimals, or "N/A"
    pub change_rate: String,
    pub stability: Stability,
}

/// Per-metric trends; metrics without enough samples have no entry
pub type Trends = BTreeMap<TrendMetric, MetricTrend>;

/// Errors sharing the same type and code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorGroup {
    /// Composite `type-code` key
    pub key: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
    pub count: usize,
    /// Share of all errors in percent, 2 decimals
    pub rate: String,
    /// Earliest known timestamp in the group; `None` when no member has one
    pub first_occurrence: Option<i64>,
    pub last_occurrence: Option<i64>,
}

/// A rendered report, generated fresh on every call
#[derive(Debug, Clone, PartialEq)]
pub enum ReportArtifact {
    Json { payload: Value },
    /// CSV text, already prefixed with a UTF-8 byte order mark
    Csv { payload: String, encoding: &'static str },
    Html { payload: String },
}

impl ReportArtifact {
    /// Serialized text of the artifact
    pub fn content(&self) -> crate::Result<String> {
        match self {
            ReportArtifact::Json { payload } => Ok(serde_json::to_string_pretty(payload)?),
            ReportArtifact::Csv { payload, .. } => Ok(payload.clone()),
            ReportArtifact::Html { payload } => Ok(payload.clone()),
        }
    }
}

/// The export file handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub content: String,
    pub filename: String,
    pub mime_type: String,
}

/// Raw request bag supplied by history and result views
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportInput {
    /// Test parameters, as an object or a JSON encoded string
    pub test_config: Value,
    /// Stored result, as an object or a JSON encoded string
    pub result: Value,
    pub metrics: Value,
    pub real_time_data: Value,
    pub logs: Value,
    pub errors: Value,
    /// Test type tag, string or number
    pub test_type: Value,
    /// Record identifier, string or number
    pub test_id: Value,
    /// Display name, string or number
    pub test_name: Value,
}
