use std::collections::HashMap;

use crate::models::{ErrorEvent, ErrorGroup};

const UNKNOWN_TYPE: &str = "Unknown";
const UNKNOWN_CODE: &str = "N/A";

/// Group errors by `type-code`.
///
/// Groups are ordered by count, most frequent first; ties keep the order in
/// which the group was first seen. An empty input gives an empty list.
pub fn aggregate_errors(errors: &[ErrorEvent]) -> Vec<ErrorGroup> {
    let total = errors.len();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ErrorGroup> = Vec::new();

    for error in errors {
        let error_type = non_empty(&error.error_type, UNKNOWN_TYPE);
        let code = non_empty(&error.code, UNKNOWN_CODE);
        let key = format!("{}-{}", error_type, code);

        match index.get(&key) {
            Some(&position) => {
                let group = &mut groups[position];
                group.count += 1;
                group.first_occurrence = merge(group.first_occurrence, error.timestamp, i64::min);
                group.last_occurrence = merge(group.last_occurrence, error.timestamp, i64::max);
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(ErrorGroup {
                    key,
                    error_type: error_type.to_string(),
                    code: code.to_string(),
                    count: 1,
                    rate: String::new(),
                    first_occurrence: error.timestamp,
                    last_occurrence: error.timestamp,
                });
            }
        }
    }

    for group in &mut groups {
        group.rate = format!("{:.2}", group.count as f64 / total as f64 * 100.0);
    }

    // stable sort keeps first-seen order among equal counts
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

/// Combine two optional timestamps; a missing one never wins
fn merge(current: Option<i64>, next: Option<i64>, pick: fn(i64, i64) -> i64) -> Option<i64> {
    match (current, next) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}
