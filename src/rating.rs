//! Rating bands and benchmark text shared by every renderer.
//!
//! Tables and HTML documents both build their metric rows through
//! [`metric_rows`], so a value always gets the same rating text in every
//! format.

use serde::Serialize;

use crate::models::TestMetrics;

/// Which rating scale a metric is judged on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricScale {
    /// Milliseconds, lower is better
    ResponseTime,
    /// Requests per second, higher is better
    Throughput,
    /// Percent, lower is better; zero is a real value
    ErrorRate,
    /// Percent, higher is better; zero is a real value
    SuccessRate,
    /// Plain counts, not rated
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
    NoData,
    Unrated,
}

impl Rating {
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "优秀",
            Rating::Good => "良好",
            Rating::Fair => "一般",
            Rating::Poor => "较差",
            Rating::NoData => "无数据",
            Rating::Unrated => "-",
        }
    }

    /// CSS class of the badge in HTML reports
    pub fn css_class(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Fair => "fair",
            Rating::Poor => "poor",
            Rating::NoData | Rating::Unrated => "none",
        }
    }
}

/// Upper bounds for lower-is-better scales, lower bounds otherwise
const RESPONSE_TIME_BANDS: [f64; 3] = [200.0, 500.0, 1000.0];
const THROUGHPUT_BANDS: [f64; 3] = [100.0, 50.0, 10.0];
const ERROR_RATE_BANDS: [f64; 3] = [0.5, 2.0, 5.0];
const SUCCESS_RATE_BANDS: [f64; 3] = [99.5, 98.0, 95.0];

const BAND_RATINGS: [Rating; 3] = [Rating::Excellent, Rating::Good, Rating::Fair];

/// Rate a value on a scale; `None` means there is no data
pub fn rate(scale: MetricScale, value: Option<f64>) -> Rating {
    if scale == MetricScale::Count {
        return Rating::Unrated;
    }
    let Some(value) = value else {
        return Rating::NoData;
    };

    let rating = match scale {
        MetricScale::ResponseTime => band_at_most(value, &RESPONSE_TIME_BANDS),
        MetricScale::ErrorRate => band_at_most(value, &ERROR_RATE_BANDS),
        MetricScale::Throughput => band_at_least(value, &THROUGHPUT_BANDS),
        MetricScale::SuccessRate => band_at_least(value, &SUCCESS_RATE_BANDS),
        MetricScale::Count => None,
    };
    rating.unwrap_or(Rating::Poor)
}

fn band_at_most(value: f64, bands: &[f64; 3]) -> Option<Rating> {
    bands.iter().position(|bound| value <= *bound).map(|i| BAND_RATINGS[i])
}

fn band_at_least(value: f64, bands: &[f64; 3]) -> Option<Rating> {
    bands.iter().position(|bound| value >= *bound).map(|i| BAND_RATINGS[i])
}

/// Benchmark description shown next to a rating
pub fn benchmark(scale: MetricScale) -> &'static str {
    match scale {
        MetricScale::ResponseTime => "优秀 ≤200ms / 良好 ≤500ms / 一般 ≤1000ms",
        MetricScale::Throughput => "优秀 ≥100 / 良好 ≥50 / 一般 ≥10 req/s",
        MetricScale::ErrorRate => "优秀 ≤0.5% / 良好 ≤2% / 一般 ≤5%",
        MetricScale::SuccessRate => "优秀 ≥99.5% / 良好 ≥98% / 一般 ≥95%",
        MetricScale::Count => "-",
    }
}

/// The displayable value of a metric, `None` when it has no data.
///
/// Missing, negative and non-finite values never count as data. Zero counts
/// as "no data" except on the rate scales, where 0% is a measurement.
pub fn observed(scale: MetricScale, value: Option<f64>) -> Option<f64> {
    let value = value.filter(|v| v.is_finite() && *v >= 0.0)?;
    match scale {
        MetricScale::ErrorRate | MetricScale::SuccessRate => Some(value),
        _ => (value > 0.0).then_some(value),
    }
}

/// One row of the core metrics table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub label: &'static str,
    pub value: Option<f64>,
    pub unit: &'static str,
    pub decimals: usize,
    pub scale: MetricScale,
    pub rating: Rating,
}

/// The core metrics rows, in display order
pub fn metric_rows(metrics: &TestMetrics) -> Vec<MetricRow> {
    let rows: [(&'static str, Option<f64>, &'static str, usize, MetricScale); 13] = [
        ("总请求数", Some(metrics.total_requests), "次", 0, MetricScale::Count),
        ("成功请求数", Some(metrics.successful_requests), "次", 0, MetricScale::Count),
        ("失败请求数", Some(metrics.failed_requests), "次", 0, MetricScale::Count),
        ("平均响应时间", Some(metrics.average_response_time), "ms", 2, MetricScale::ResponseTime),
        ("最小响应时间", Some(metrics.min_response_time), "ms", 2, MetricScale::ResponseTime),
        ("最大响应时间", Some(metrics.max_response_time), "ms", 2, MetricScale::ResponseTime),
        ("P50响应时间", metrics.p50_response_time, "ms", 2, MetricScale::ResponseTime),
        ("P90响应时间", metrics.p90_response_time, "ms", 2, MetricScale::ResponseTime),
        ("P95响应时间", metrics.p95_response_time, "ms", 2, MetricScale::ResponseTime),
        ("P99响应时间", metrics.p99_response_time, "ms", 2, MetricScale::ResponseTime),
        ("吞吐量", Some(metrics.throughput), "req/s", 2, MetricScale::Throughput),
        ("错误率", Some(metrics.error_rate), "%", 2, MetricScale::ErrorRate),
        ("成功率", Some(metrics.success_rate), "%", 2, MetricScale::SuccessRate),
    ];

    rows.into_iter()
        .map(|(label, raw, unit, decimals, scale)| {
            let value = observed(scale, raw);
            MetricRow {
                label,
                value,
                unit,
                decimals,
                scale,
                rating: rate(scale, value),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_time_bands() {
        assert_eq!(rate(MetricScale::ResponseTime, Some(200.0)), Rating::Excellent);
        assert_eq!(rate(MetricScale::ResponseTime, Some(200.1)), Rating::Good);
        assert_eq!(rate(MetricScale::ResponseTime, Some(1000.0)), Rating::Fair);
        assert_eq!(rate(MetricScale::ResponseTime, Some(1000.1)), Rating::Poor);
    }

    #[test]
    fn higher_is_better_bands() {
        assert_eq!(rate(MetricScale::Throughput, Some(150.0)), Rating::Excellent);
        assert_eq!(rate(MetricScale::Throughput, Some(9.9)), Rating::Poor);
        assert_eq!(rate(MetricScale::SuccessRate, Some(98.0)), Rating::Good);
    }

    #[test]
    fn zero_error_rate_is_data() {
        assert_eq!(observed(MetricScale::ErrorRate, Some(0.0)), Some(0.0));
        assert_eq!(rate(MetricScale::ErrorRate, Some(0.0)), Rating::Excellent);
    }

    #[test]
    fn zero_response_time_is_no_data() {
        assert_eq!(observed(MetricScale::ResponseTime, Some(0.0)), None);
        assert_eq!(observed(MetricScale::Throughput, Some(-3.0)), None);
        assert_eq!(observed(MetricScale::ErrorRate, Some(f64::NAN)), None);
        assert_eq!(rate(MetricScale::ResponseTime, None), Rating::NoData);
    }

    #[test]
    fn counts_are_unrated() {
        assert_eq!(rate(MetricScale::Count, Some(10.0)), Rating::Unrated);
        assert_eq!(benchmark(MetricScale::Count), "-");
    }

    #[test]
    fn rows_carry_rating_of_their_value() {
        let metrics = TestMetrics {
            average_response_time: 650.0,
            p95_response_time: Some(1200.0),
            throughput: 75.0,
            ..Default::default()
        };
        let rows = metric_rows(&metrics);
        assert_eq!(rows.len(), 13);

        let avg = rows.iter().find(|r| r.label == "平均响应时间").unwrap();
        assert_eq!(avg.rating, Rating::Fair);
        let p95 = rows.iter().find(|r| r.label == "P95响应时间").unwrap();
        assert_eq!(p95.rating, Rating::Poor);
        let p99 = rows.iter().find(|r| r.label == "P99响应时间").unwrap();
        assert_eq!(p99.value, None);
        assert_eq!(p99.rating, Rating::NoData);
    }
}
