use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{ErrorEvent, ReportInput, TestConfig, TestMetrics, TimeSeriesPoint};

/// A config or result field after decoding.
///
/// Stored records carry these either as objects or as JSON text; everything
/// downstream only ever sees this tagged value.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonField {
    Object(Map<String, Value>),
    /// Missing, null, malformed, or not an object
    Empty,
}

impl JsonField {
    /// Decode a field, degrading to `Empty` instead of failing
    pub fn decode(field: &str, value: &Value) -> Self {
        match value {
            Value::Object(map) => JsonField::Object(map.clone()),
            Value::Null => JsonField::Empty,
            Value::String(text) if text.trim().is_empty() => JsonField::Empty,
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => JsonField::Object(map),
                Ok(_) => {
                    warn!(field, "decoded JSON is not an object, using empty object");
                    JsonField::Empty
                }
                Err(e) => {
                    warn!(field, error = %e, "malformed JSON, using empty object");
                    JsonField::Empty
                }
            },
            _ => {
                warn!(field, "unexpected value type, using empty object");
                JsonField::Empty
            }
        }
    }

    pub fn into_map(self) -> Map<String, Value> {
        match self {
            JsonField::Object(map) => map,
            JsonField::Empty => Map::new(),
        }
    }
}

/// Report input with every field coerced to its canonical shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedInput {
    pub test_id: Option<String>,
    pub test_name: Option<String>,
    pub test_type: Option<String>,
    pub config: TestConfig,
    pub result: Map<String, Value>,
    pub metrics: TestMetrics,
    pub time_series: Vec<TimeSeriesPoint>,
    pub errors: Vec<ErrorEvent>,
    pub logs: Vec<Value>,
}

/// Normalize a raw input bag. Never fails: bad data becomes defaults.
pub fn normalize(input: &ReportInput) -> NormalizedInput {
    let config = JsonField::decode("testConfig", &input.test_config).into_map();
    let result = JsonField::decode("result", &input.result).into_map();

    // explicit metrics, then result.metrics, then the result itself
    let metrics_source = match JsonField::decode("metrics", &input.metrics) {
        JsonField::Object(map) => map,
        JsonField::Empty => match result.get("metrics") {
            Some(nested) => JsonField::decode("result.metrics", nested).into_map(),
            None => result.clone(),
        },
    };
    let metrics = normalize_metrics(&metrics_source);

    let series_source = first_present(&input.real_time_data, result.get("realTimeData"));
    let time_series = list("realTimeData", series_source)
        .iter()
        .filter_map(time_series_point)
        .collect::<Vec<_>>();

    let errors_source = first_present(&input.errors, result.get("errors"));
    let errors = list("errors", errors_source)
        .iter()
        .filter_map(error_event)
        .collect::<Vec<_>>();

    let logs = list("logs", &input.logs);

    let test_type = text(Some(&input.test_type)).or_else(|| text(config.get("testType")));

    debug!(
        series_points = time_series.len(),
        errors = errors.len(),
        logs = logs.len(),
        "normalized report input"
    );

    NormalizedInput {
        test_id: text(Some(&input.test_id)),
        test_name: text(Some(&input.test_name)),
        test_type,
        config,
        result,
        metrics,
        time_series,
        errors,
        logs,
    }
}

/// Build canonical metrics from a loosely typed object
pub fn normalize_metrics(source: &Map<String, Value>) -> TestMetrics {
    let total_requests = field(source, &["totalRequests"]).unwrap_or(0.0);
    let successful_requests = field(source, &["successfulRequests"]).unwrap_or(0.0);
    let failed_requests = field(source, &["failedRequests"]).unwrap_or(0.0);

    let error_rate = field(source, &["errorRate"])
        .unwrap_or_else(|| percentage(failed_requests, total_requests));
    let success_rate = field(source, &["successRate"])
        .unwrap_or_else(|| percentage(successful_requests, total_requests));

    TestMetrics {
        total_requests,
        successful_requests,
        failed_requests,
        average_response_time: field(source, &["averageResponseTime", "avgResponseTime"])
            .unwrap_or(0.0),
        min_response_time: field(source, &["minResponseTime"]).unwrap_or(0.0),
        max_response_time: field(source, &["maxResponseTime"]).unwrap_or(0.0),
        p50_response_time: field(source, &["p50ResponseTime"]),
        p90_response_time: field(source, &["p90ResponseTime"]),
        p95_response_time: field(source, &["p95ResponseTime"]),
        p99_response_time: field(source, &["p99ResponseTime"]),
        throughput: field(source, &["throughput", "requestsPerSecond", "rps"]).unwrap_or(0.0),
        error_rate,
        success_rate,
    }
}

/// Share of `part` in `total` as a percentage, 0 when there is no total
fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// First alias holding a usable number
fn field(source: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| number(source.get(*name)))
}

/// A finite, non-negative number; anything else counts as missing
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_present<'a>(primary: &'a Value, fallback: Option<&'a Value>) -> &'a Value {
    match (primary, fallback) {
        (Value::Null, Some(fallback)) => fallback,
        _ => primary,
    }
}

/// Array items of a field that may also arrive as JSON text
fn list(field: &str, value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        Value::String(text) if text.trim().is_empty() => Vec::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!(field, "decoded JSON is not an array, ignoring");
                Vec::new()
            }
            Err(e) => {
                warn!(field, error = %e, "malformed JSON, ignoring");
                Vec::new()
            }
        },
        _ => {
            warn!(field, "unexpected value type, ignoring");
            Vec::new()
        }
    }
}

/// Epoch milliseconds from a number or an RFC 3339 string; `None` when
/// absent or unparsable
pub(crate) fn timestamp(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let parsed = s.trim().parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|d| d.timestamp_millis())
            });
            if parsed.is_none() {
                warn!(value = %s, "unparsable timestamp, treating as missing");
            }
            parsed
        }
        Value::Null => None,
        other => {
            warn!(value = %other, "unexpected timestamp type, treating as missing");
            None
        }
    }
}

fn time_series_point(value: &Value) -> Option<TimeSeriesPoint> {
    let Value::Object(map) = value else {
        debug!("skipping non-object time series entry");
        return None;
    };

    Some(TimeSeriesPoint {
        timestamp: timestamp(map.get("timestamp")),
        response_time: number(map.get("responseTime")),
        throughput: number(map.get("throughput")),
        error_rate: number(map.get("errorRate")),
        cpu_usage: number(map.get("cpuUsage")),
        memory_usage: number(map.get("memoryUsage")),
    })
}

fn error_event(value: &Value) -> Option<ErrorEvent> {
    let Value::Object(map) = value else {
        debug!("skipping non-object error entry");
        return None;
    };

    Some(ErrorEvent {
        error_type: text(map.get("type").or_else(|| map.get("errorType"))).unwrap_or_default(),
        code: text(map.get("code").or_else(|| map.get("statusCode"))).unwrap_or_default(),
        timestamp: timestamp(map.get("timestamp")),
        message: text(map.get("message")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_json_string_becomes_empty_object() {
        let field = JsonField::decode("testConfig", &json!("{not json"));
        assert_eq!(field, JsonField::Empty);
        assert!(field.into_map().is_empty());
    }

    #[test]
    fn json_string_and_object_decode_the_same() {
        let as_text = JsonField::decode("result", &json!(r#"{"url":"https://a.test"}"#));
        let as_object = JsonField::decode("result", &json!({"url": "https://a.test"}));
        assert_eq!(as_text, as_object);
    }

    #[test]
    fn non_object_json_is_empty() {
        assert_eq!(JsonField::decode("result", &json!("[1,2]")), JsonField::Empty);
        assert_eq!(JsonField::decode("result", &json!(42)), JsonField::Empty);
    }

    #[test]
    fn bad_numbers_default_to_zero() {
        let source = json!({
            "averageResponseTime": -5,
            "throughput": "NaN",
            "minResponseTime": null,
            "maxResponseTime": "250",
        });
        let metrics = normalize_metrics(source.as_object().unwrap());
        assert_eq!(metrics.average_response_time, 0.0);
        assert_eq!(metrics.throughput, 0.0);
        assert_eq!(metrics.min_response_time, 0.0);
        assert_eq!(metrics.max_response_time, 250.0);
        assert_eq!(metrics.p95_response_time, None);
    }

    #[test]
    fn rates_derived_from_counts_when_missing() {
        let source = json!({"totalRequests": 200, "successfulRequests": 190, "failedRequests": 10});
        let metrics = normalize_metrics(source.as_object().unwrap());
        assert_eq!(metrics.error_rate, 5.0);
        assert_eq!(metrics.success_rate, 95.0);
    }

    #[test]
    fn rates_are_zero_without_requests() {
        let source = json!({"failedRequests": 3});
        let metrics = normalize_metrics(source.as_object().unwrap());
        assert_eq!(metrics.error_rate, 0.0);
        assert_eq!(metrics.success_rate, 0.0);
    }

    #[test]
    fn supplied_rates_are_not_reconciled() {
        let source = json!({"errorRate": 10, "successRate": 10});
        let metrics = normalize_metrics(source.as_object().unwrap());
        assert_eq!(metrics.error_rate, 10.0);
        assert_eq!(metrics.success_rate, 10.0);
    }

    #[test]
    fn aliases_are_accepted() {
        let source = json!({"avgResponseTime": 120, "requestsPerSecond": 80});
        let metrics = normalize_metrics(source.as_object().unwrap());
        assert_eq!(metrics.average_response_time, 120.0);
        assert_eq!(metrics.throughput, 80.0);
    }

    #[test]
    fn metrics_fall_back_to_result() {
        let input = ReportInput {
            result: json!(r#"{"metrics":{"throughput":42}}"#),
            ..Default::default()
        };
        assert_eq!(normalize(&input).metrics.throughput, 42.0);

        let input = ReportInput {
            result: json!({"throughput": 7}),
            ..Default::default()
        };
        assert_eq!(normalize(&input).metrics.throughput, 7.0);
    }

    #[test]
    fn explicit_metrics_win_over_result() {
        let input = ReportInput {
            result: json!({"metrics": {"throughput": 1}}),
            metrics: json!({"throughput": 99}),
            ..Default::default()
        };
        assert_eq!(normalize(&input).metrics.throughput, 99.0);
    }

    #[test]
    fn timestamps_accept_numbers_and_rfc3339() {
        assert_eq!(timestamp(Some(&json!(1500))), Some(1500));
        assert_eq!(timestamp(Some(&json!("1970-01-01T00:00:01Z"))), Some(1000));
        assert_eq!(timestamp(Some(&json!("2000"))), Some(2000));
    }

    #[test]
    fn missing_or_unparsable_timestamps_stay_missing() {
        assert_eq!(timestamp(Some(&json!("yesterday"))), None);
        assert_eq!(timestamp(Some(&json!(null))), None);
        assert_eq!(timestamp(Some(&json!(true))), None);
        assert_eq!(timestamp(None), None);

        let input = ReportInput {
            errors: json!([{"type": "Timeout", "code": "408"}]),
            ..Default::default()
        };
        assert_eq!(normalize(&input).errors[0].timestamp, None);
    }

    #[test]
    fn series_and_errors_are_extracted() {
        let input = ReportInput {
            real_time_data: json!([
                {"timestamp": 1, "responseTime": 100, "cpuUsage": -1},
                "garbage",
                {"timestamp": 2, "responseTime": 110}
            ]),
            errors: json!(r#"[{"type":"Timeout","code":408,"timestamp":5}]"#),
            test_id: json!(17),
            ..Default::default()
        };
        let normalized = normalize(&input);

        assert_eq!(normalized.time_series.len(), 2);
        assert_eq!(normalized.time_series[0].cpu_usage, None);
        assert_eq!(normalized.errors.len(), 1);
        assert_eq!(normalized.errors[0].code, "408");
        assert_eq!(normalized.test_id.as_deref(), Some("17"));
    }

    #[test]
    fn numeric_names_are_coerced_to_text() {
        let input: ReportInput =
            serde_json::from_str(r#"{"testName": 123, "testType": "api", "testId": "run-1"}"#)
                .unwrap();
        let normalized = normalize(&input);
        assert_eq!(normalized.test_name.as_deref(), Some("123"));
        assert_eq!(normalized.test_type.as_deref(), Some("api"));

        let input: ReportInput =
            serde_json::from_str(r#"{"testName": "  ", "testType": {}}"#).unwrap();
        let normalized = normalize(&input);
        assert_eq!(normalized.test_name, None);
        assert_eq!(normalized.test_type, None);
    }

    #[test]
    fn test_type_falls_back_to_config() {
        let input = ReportInput {
            test_config: json!({"testType": "stress"}),
            ..Default::default()
        };
        assert_eq!(normalize(&input).test_type.as_deref(), Some("stress"));
    }
}
