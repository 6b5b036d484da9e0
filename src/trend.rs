use tracing::debug;

use crate::models::{MetricTrend, Stability, TimeSeriesPoint, TrendDirection, TrendMetric, Trends};

/// Series shorter than this are not analyzed at all
pub const MIN_SERIES_POINTS: usize = 10;

/// A metric needs this many captured values to get a trend entry
pub const MIN_METRIC_SAMPLES: usize = 5;

/// Means closer to zero than this are treated as zero
const ZERO_MEAN_EPSILON: f64 = 1e-9;

/// Coefficient of variation floors (percent), least stable first
const STABILITY_BANDS: [(f64, Stability); 4] = [
    (50.0, Stability::VeryUnstable),
    (30.0, Stability::Unstable),
    (15.0, Stability::FairlyStable),
    (5.0, Stability::Stable),
];

/// Compare the first and second half of a series for every tracked metric.
///
/// This is a heuristic: the halves are split at `len / 2` (an odd extra
/// sample lands in the second half) and stability comes from the
/// coefficient of variation over the whole series.
pub fn analyze_trends(series: &[TimeSeriesPoint]) -> Trends {
    let mut trends = Trends::new();

    if series.len() < MIN_SERIES_POINTS {
        debug!(points = series.len(), "series too short for trend analysis");
        return trends;
    }

    for metric in TrendMetric::ALL {
        let values: Vec<f64> = series.iter().filter_map(|point| metric.value(point)).collect();
        if values.len() < MIN_METRIC_SAMPLES {
            debug!(metric = metric.key(), samples = values.len(), "skipping sparse metric");
            continue;
        }

        trends.insert(metric, metric_trend(&values));
    }

    trends
}

fn metric_trend(values: &[f64]) -> MetricTrend {
    let (first, second) = values.split_at(values.len() / 2);
    let first_mean = mean(first);
    let second_mean = mean(second);

    let direction = if second_mean > first_mean {
        TrendDirection::Rising
    } else if second_mean < first_mean {
        TrendDirection::Falling
    } else {
        TrendDirection::Flat
    };

    MetricTrend {
        direction,
        change_rate: change_rate(first_mean, second_mean),
        stability: stability(values),
    }
}

/// Percent change between the halves. A zero baseline has no meaningful
/// ratio: it reports "0.00" when both halves are zero and "N/A" otherwise.
fn change_rate(first_mean: f64, second_mean: f64) -> String {
    if first_mean.abs() < ZERO_MEAN_EPSILON {
        if second_mean.abs() < ZERO_MEAN_EPSILON {
            return "0.00".to_string();
        }
        return "N/A".to_string();
    }

    format!("{:.2}", (second_mean - first_mean) / first_mean * 100.0)
}

/// Stability band from the coefficient of variation of the full series
pub fn stability(values: &[f64]) -> Stability {
    let cv = coefficient_of_variation(values);
    STABILITY_BANDS
        .iter()
        .find(|(floor, _)| cv > *floor)
        .map(|(_, band)| *band)
        .unwrap_or(Stability::VeryStable)
}

/// Population standard deviation over mean, in percent; 0 for a zero mean
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let mean = mean(values);
    if mean.abs() < ZERO_MEAN_EPSILON {
        return 0.0;
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / mean * 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
