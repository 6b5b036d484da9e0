use crate::grade::response_range;
use crate::models::{Bottleneck, BottleneckKind, Severity, TestMetrics};

/// A named check over the metrics. Rules are evaluated in table order and
/// every rule that triggers contributes one finding.
struct BottleneckRule {
    kind: BottleneckKind,
    label: &'static str,
    triggered: fn(&TestMetrics) -> bool,
    severity: fn(&TestMetrics) -> Severity,
    detail: fn(&TestMetrics) -> String,
}

static BOTTLENECK_RULES: &[BottleneckRule] = &[
    BottleneckRule {
        kind: BottleneckKind::ResponseTime,
        label: "响应时间过长",
        triggered: slow_responses,
        severity: response_time_severity,
        detail: response_time_detail,
    },
    BottleneckRule {
        kind: BottleneckKind::ErrorRate,
        label: "错误率偏高",
        triggered: elevated_errors,
        severity: error_rate_severity,
        detail: error_rate_detail,
    },
    BottleneckRule {
        kind: BottleneckKind::Throughput,
        label: "吞吐量不足",
        triggered: low_throughput,
        severity: throughput_severity,
        detail: throughput_detail,
    },
    BottleneckRule {
        kind: BottleneckKind::Variance,
        label: "响应时间波动大",
        triggered: high_variance,
        severity: variance_severity,
        detail: variance_detail,
    },
];

const NO_BOTTLENECK_LABEL: &str = "未发现明显瓶颈";

/// Scan the metrics for bottlenecks. Never returns an empty list.
pub fn detect_bottlenecks(metrics: &TestMetrics) -> Vec<Bottleneck> {
    let found: Vec<Bottleneck> = BOTTLENECK_RULES
        .iter()
        .filter(|rule| (rule.triggered)(metrics))
        .map(|rule| Bottleneck {
            kind: rule.kind,
            label: rule.label.to_string(),
            detail: (rule.detail)(metrics),
            severity: (rule.severity)(metrics),
        })
        .collect();

    if found.is_empty() {
        return vec![Bottleneck {
            kind: BottleneckKind::None,
            label: NO_BOTTLENECK_LABEL.to_string(),
            detail: "各项核心指标均在正常范围内".to_string(),
            severity: Severity::Info,
        }];
    }

    found
}

fn slow_responses(m: &TestMetrics) -> bool {
    m.average_response_time > 1000.0
}

fn elevated_errors(m: &TestMetrics) -> bool {
    m.error_rate > 2.0
}

fn low_throughput(m: &TestMetrics) -> bool {
    m.throughput < 50.0
}

fn high_variance(m: &TestMetrics) -> bool {
    response_range(m) > 2000.0
}

fn response_time_severity(m: &TestMetrics) -> Severity {
    if m.average_response_time > 2000.0 { Severity::High } else { Severity::Medium }
}

fn error_rate_severity(m: &TestMetrics) -> Severity {
    if m.error_rate > 5.0 { Severity::High } else { Severity::Medium }
}

fn throughput_severity(m: &TestMetrics) -> Severity {
    if m.throughput < 10.0 { Severity::High } else { Severity::Medium }
}

fn variance_severity(m: &TestMetrics) -> Severity {
    if response_range(m) > 5000.0 { Severity::High } else { Severity::Medium }
}

fn response_time_detail(m: &TestMetrics) -> String {
    format!("平均响应时间 {:.2}ms，超过 1000ms", m.average_response_time)
}

fn error_rate_detail(m: &TestMetrics) -> String {
    format!("错误率 {:.2}%，超过 2%", m.error_rate)
}

fn throughput_detail(m: &TestMetrics) -> String {
    format!("吞吐量 {:.2} req/s，低于 50 req/s", m.throughput)
}

fn variance_detail(m: &TestMetrics) -> String {
    format!("最大与最小响应时间相差 {:.2}ms，超过 2000ms", response_range(m))
}

/// Metric driven suggestions, in check order
static RECOMMENDATION_RULES: &[(fn(&TestMetrics) -> bool, &str)] = &[
    (slow_responses, "优化服务器响应时间：考虑启用缓存、CDN 加速或优化数据库查询"),
    (elevated_errors, "完善错误处理与重试机制，排查失败请求的根本原因"),
    (low_throughput, "提升系统吞吐量：增加服务器资源、启用负载均衡或优化并发处理"),
];

/// Tail suggestion appended for a given test type
static TYPE_RECOMMENDATIONS: &[(&str, &str)] = &[
    ("stress", "建议在压力测试期间监控服务器 CPU、内存与网络资源使用情况"),
    ("api", "建议为关键接口配置超时与限流策略，并缓存高频响应"),
    ("security", "建议定期复查安全配置，及时修补已知漏洞"),
    ("seo", "建议优化页面元信息与加载速度以提升搜索引擎表现"),
    ("ux", "建议关注首屏渲染与交互响应时间，减少阻塞资源"),
    ("compatibility", "建议在更多浏览器与设备组合上复测关键页面"),
    ("network", "建议检查网络链路延迟与丢包情况，必要时启用就近接入"),
    ("database", "建议检查慢查询日志并为高频查询建立合适索引"),
];

const HEALTHY_RECOMMENDATION: &str = "系统性能表现良好，建议保持当前配置并定期复测";

/// Build optimization suggestions. Order follows the checks (response time,
/// error handling, throughput, test type), not severity. Never empty.
pub fn generate_recommendations(metrics: &TestMetrics, test_type: &str) -> Vec<String> {
    let test_type = test_type.trim().to_ascii_lowercase();

    let mut recommendations: Vec<String> = RECOMMENDATION_RULES
        .iter()
        .filter(|(triggered, _)| triggered(metrics))
        .map(|(_, text)| text.to_string())
        .collect();

    if let Some((_, text)) = TYPE_RECOMMENDATIONS.iter().find(|(kind, _)| *kind == test_type) {
        recommendations.push(text.to_string());
    }

    if recommendations.is_empty() {
        recommendations.push(HEALTHY_RECOMMENDATION.to_string());
    }

    recommendations
}

/// Keep the first `limit` suggestions, preserving their order
pub fn top_recommendations(recommendations: &[String], limit: usize) -> Vec<String> {
    recommendations.iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> TestMetrics {
        TestMetrics {
            average_response_time: 150.0,
            error_rate: 0.0,
            throughput: 200.0,
            min_response_time: 100.0,
            max_response_time: 300.0,
            ..Default::default()
        }
    }

    fn struggling() -> TestMetrics {
        TestMetrics {
            average_response_time: 2500.0,
            error_rate: 3.0,
            throughput: 20.0,
            min_response_time: 100.0,
            max_response_time: 2600.0,
            ..Default::default()
        }
    }

    #[test]
    fn healthy_metrics_yield_sentinel() {
        let found = detect_bottlenecks(&healthy());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, BottleneckKind::None);
        assert_eq!(found[0].severity, Severity::Info);
    }

    #[test]
    fn bottlenecks_co_occur_in_rule_order() {
        let kinds: Vec<_> = detect_bottlenecks(&struggling()).iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BottleneckKind::ResponseTime,
                BottleneckKind::ErrorRate,
                BottleneckKind::Throughput,
                BottleneckKind::Variance,
            ]
        );
    }

    #[test]
    fn severity_escalates_past_second_threshold() {
        let found = detect_bottlenecks(&struggling());
        assert_eq!(found[0].severity, Severity::High);
        assert_eq!(found[1].severity, Severity::Medium);
        assert_eq!(found[2].severity, Severity::Medium);
        assert_eq!(found[3].severity, Severity::Medium);
    }

    #[test]
    fn detail_carries_measured_value() {
        let found = detect_bottlenecks(&struggling());
        assert!(found[0].detail.contains("2500.00ms"));
    }

    #[test]
    fn healthy_generic_run_gets_affirmation() {
        let recommendations = generate_recommendations(&healthy(), "custom");
        assert_eq!(recommendations, vec![HEALTHY_RECOMMENDATION.to_string()]);
    }

    #[test]
    fn stress_tests_get_resource_monitoring_tail() {
        let recommendations = generate_recommendations(&struggling(), "Stress");
        assert_eq!(recommendations.len(), 4);
        assert!(recommendations[0].contains("响应时间"));
        assert!(recommendations[1].contains("错误处理"));
        assert!(recommendations[2].contains("吞吐量"));
        assert!(recommendations[3].contains("监控服务器"));
    }

    #[test]
    fn type_tail_alone_replaces_affirmation() {
        let recommendations = generate_recommendations(&healthy(), "stress");
        assert_eq!(recommendations.len(), 1);
        assert!(recommendations[0].contains("监控服务器"));
    }

    #[test]
    fn truncation_preserves_order() {
        let recommendations = generate_recommendations(&struggling(), "stress");
        let top = top_recommendations(&recommendations, 3);
        assert_eq!(top, recommendations[..3].to_vec());
        assert_eq!(top_recommendations(&recommendations, 10), recommendations);
    }
}
