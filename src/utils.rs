use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::time::Duration;
use url::Url;

use crate::models::TestConfig;

/// Placeholder for any cell or field without data
pub const NOT_AVAILABLE: &str = "N/A";

/// Get a reader for a file or stdin
pub fn get_reader(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "stdin" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file = File::open(path).context(format!("Failed to open file: {}", path))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Get a writer for a file or stdout
pub fn get_writer(path: &str) -> Result<Box<dyn Write>> {
    if path == "stdout" {
        Ok(Box::new(io::stdout()))
    } else {
        let file = File::create(path).context(format!("Failed to create file: {}", path))?;
        Ok(Box::new(file))
    }
}

/// Format an optional number with fixed decimals, `N/A` when missing
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// RFC 3339 UTC time with millisecond precision for an epoch millisecond
/// value, `N/A` when missing
pub fn format_timestamp(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Compact timestamp for file names: ISO 8601 with colons and dots removed
pub fn file_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .chars()
        .filter(|c| *c != ':' && *c != '.')
        .collect()
}

/// Human readable test duration from a number of seconds, e.g. "1m 30s"
pub fn format_test_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return NOT_AVAILABLE.to_string();
    }
    humantime::format_duration(Duration::from_secs(seconds.round() as u64)).to_string()
}

/// Host part of the configured target URL
pub fn target_host(config: &TestConfig) -> Option<String> {
    let raw = config.get("url")?.as_str()?;
    let url = Url::parse(raw.trim()).ok()?;
    url.host_str().map(|host| match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Display text of a config entry, `N/A` when absent or empty
pub fn config_text(config: &TestConfig, key: &str) -> String {
    match config.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Escape text for inclusion in HTML
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Replace characters that are not allowed in file names
pub fn sanitize_filename(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn missing_values_render_as_na() {
        assert_eq!(format_value(None, 2), "N/A");
        assert_eq!(format_value(Some(f64::INFINITY), 2), "N/A");
        assert_eq!(format_value(Some(1.005), 0), "1");
        assert_eq!(format_value(Some(12.5), 2), "12.50");
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(format_timestamp(Some(1_000)), "1970-01-01T00:00:01.000Z");
        assert_eq!(format_timestamp(None), "N/A");
    }

    #[test]
    fn file_timestamp_strips_separators() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(file_timestamp(&at), "2024-03-05T140709000Z");
    }

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(format_test_duration(90.0), "1m 30s");
        assert_eq!(format_test_duration(0.0), "N/A");
    }

    #[test]
    fn host_is_extracted_from_config_url() {
        let config = json!({"url": "https://shop.example.com:8443/cart"});
        assert_eq!(
            target_host(config.as_object().unwrap()).as_deref(),
            Some("shop.example.com:8443")
        );
        let config = json!({"url": "not a url"});
        assert_eq!(target_host(config.as_object().unwrap()), None);
    }

    #[test]
    fn config_values_render_as_text() {
        let config = json!({"concurrency": 50, "method": "GET", "empty": ""});
        let config = config.as_object().unwrap();
        assert_eq!(config_text(config, "concurrency"), "50");
        assert_eq!(config_text(config, "method"), "GET");
        assert_eq!(config_text(config, "empty"), "N/A");
        assert_eq!(config_text(config, "missing"), "N/A");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            html_escape("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename(" home page: v2/beta "), "home_page__v2_beta");
    }
}
