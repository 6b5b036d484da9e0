use tracing::debug;

use crate::models::{Grade, PerformanceGrade, TestMetrics};

/// (threshold, deduction) pairs, checked in order; the first match wins
type PenaltyTable = [(f64, u8)];

/// Average response time in ms, deducted when above the threshold
const RESPONSE_TIME_PENALTIES: &PenaltyTable =
    &[(2000.0, 40), (1000.0, 25), (500.0, 15), (200.0, 5)];

/// Error rate in percent, deducted when above the threshold
const ERROR_RATE_PENALTIES: &PenaltyTable = &[(10.0, 30), (5.0, 20), (2.0, 10), (0.5, 5)];

/// Requests per second, deducted when below the threshold
const THROUGHPUT_PENALTIES: &PenaltyTable = &[(10.0, 20), (50.0, 10), (100.0, 5)];

/// Spread between slowest and fastest response in ms, deducted when above the threshold
const STABILITY_PENALTIES: &PenaltyTable = &[(5000.0, 10), (2000.0, 5)];

const GRADE_FLOORS: [(u8, Grade); 3] = [(90, Grade::A), (80, Grade::B), (70, Grade::C)];

/// Score a run out of 100 and map it to a letter grade.
///
/// Each metric family deducts a fixed amount from a base of 100. A zero
/// error rate is a real measurement here, not missing data.
pub fn calculate_grade(metrics: &TestMetrics) -> PerformanceGrade {
    let response = penalty_above(metrics.average_response_time, RESPONSE_TIME_PENALTIES);
    let errors = penalty_above(metrics.error_rate, ERROR_RATE_PENALTIES);
    let throughput = penalty_below(metrics.throughput, THROUGHPUT_PENALTIES);
    let stability = penalty_above(response_range(metrics), STABILITY_PENALTIES);

    let deductions = response + errors + throughput + stability;
    let score = 100u8.saturating_sub(deductions).min(100);

    debug!(response, errors, throughput, stability, score, "calculated performance grade");

    PerformanceGrade {
        score,
        grade: grade_for(score),
    }
}

/// Letter grade for a score
pub fn grade_for(score: u8) -> Grade {
    GRADE_FLOORS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::D)
}

/// Max minus min response time, never negative
pub(crate) fn response_range(metrics: &TestMetrics) -> f64 {
    (metrics.max_response_time - metrics.min_response_time).max(0.0)
}

fn penalty_above(value: f64, table: &PenaltyTable) -> u8 {
    table
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|(_, penalty)| *penalty)
        .unwrap_or(0)
}

fn penalty_below(value: f64, table: &PenaltyTable) -> u8 {
    table
        .iter()
        .find(|(threshold, _)| value < *threshold)
        .map(|(_, penalty)| *penalty)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn metrics(avg: f64, error_rate: f64, throughput: f64, min: f64, max: f64) -> TestMetrics {
        TestMetrics {
            average_response_time: avg,
            error_rate,
            throughput,
            min_response_time: min,
            max_response_time: max,
            ..Default::default()
        }
    }

    #[test]
    fn healthy_run_scores_full_marks() {
        let grade = calculate_grade(&metrics(150.0, 0.0, 200.0, 100.0, 300.0));
        assert_eq!(grade, PerformanceGrade { score: 100, grade: Grade::A });
    }

    #[test]
    fn failing_run_keeps_only_the_stability_margin() {
        // 40 + 30 + 20 for the metrics, 5 for a 2500ms range
        let grade = calculate_grade(&metrics(2500.0, 12.0, 5.0, 100.0, 2600.0));
        assert_eq!(grade, PerformanceGrade { score: 5, grade: Grade::D });
    }

    #[test]
    fn worst_case_scores_zero() {
        let grade = calculate_grade(&metrics(2500.0, 12.0, 5.0, 100.0, 5101.0));
        assert_eq!(grade, PerformanceGrade { score: 0, grade: Grade::D });
    }

    #[test]
    fn wide_range_takes_the_top_stability_band() {
        assert_eq!(calculate_grade(&metrics(0.0, 0.0, 200.0, 0.0, 5000.0)).score, 95);
        assert_eq!(calculate_grade(&metrics(0.0, 0.0, 200.0, 0.0, 5001.0)).score, 90);
    }

    #[test]
    fn thresholds_are_exclusive() {
        // exactly on a threshold does not trigger it
        assert_eq!(calculate_grade(&metrics(200.0, 0.5, 100.0, 0.0, 2000.0)).score, 100);
        assert_eq!(calculate_grade(&metrics(200.1, 0.0, 100.0, 0.0, 0.0)).score, 95);
        assert_eq!(calculate_grade(&metrics(0.0, 0.0, 99.9, 0.0, 0.0)).score, 95);
    }

    #[test]
    fn each_family_deducts_independently() {
        assert_eq!(calculate_grade(&metrics(1500.0, 0.0, 200.0, 0.0, 0.0)).score, 75);
        assert_eq!(calculate_grade(&metrics(0.0, 6.0, 200.0, 0.0, 0.0)).score, 80);
        assert_eq!(calculate_grade(&metrics(0.0, 0.0, 20.0, 0.0, 0.0)).score, 90);
        assert_eq!(calculate_grade(&metrics(0.0, 0.0, 200.0, 0.0, 3000.0)).score, 95);
    }

    #[test]
    fn zero_throughput_is_penalized() {
        assert_eq!(calculate_grade(&metrics(0.0, 0.0, 0.0, 0.0, 0.0)).score, 80);
    }

    #[test]
    fn inverted_range_is_ignored() {
        assert_eq!(calculate_grade(&metrics(0.0, 0.0, 200.0, 9000.0, 100.0)).score, 100);
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(grade_for(100), Grade::A);
        assert_eq!(grade_for(90), Grade::A);
        assert_eq!(grade_for(89), Grade::B);
        assert_eq!(grade_for(80), Grade::B);
        assert_eq!(grade_for(70), Grade::C);
        assert_eq!(grade_for(69), Grade::D);
        assert_eq!(grade_for(0), Grade::D);
    }

    proptest! {
        #[test]
        fn score_is_deterministic_and_bounded(
            avg in 0.0f64..10_000.0,
            error_rate in 0.0f64..100.0,
            throughput in 0.0f64..1_000.0,
            min in 0.0f64..5_000.0,
            max in 0.0f64..20_000.0,
        ) {
            let m = metrics(avg, error_rate, throughput, min, max);
            let first = calculate_grade(&m);
            prop_assert_eq!(first, calculate_grade(&m));
            prop_assert!(first.score <= 100);
        }

        #[test]
        fn slower_responses_never_raise_the_score(
            avg in 0.0f64..5_000.0,
            extra in 0.0f64..5_000.0,
            error_rate in 0.0f64..20.0,
            throughput in 0.0f64..500.0,
        ) {
            let faster = calculate_grade(&metrics(avg, error_rate, throughput, 0.0, 0.0));
            let slower = calculate_grade(&metrics(avg + extra, error_rate, throughput, 0.0, 0.0));
            prop_assert!(slower.score <= faster.score);
        }
    }
}
