use crate::models::{Grade, Severity};
use crate::rating::{benchmark, metric_rows};
use crate::report::ReportContext;
use crate::utils::{format_timestamp, format_value, html_escape};

/// Render a self-contained HTML analysis report: inline styles, no scripts,
/// no external resources.
pub fn render_document(ctx: &ReportContext<'_>) -> String {
    let title = format!("{} 测试分析报告", ctx.display_name().unwrap_or("网站"));
    let grade = ctx.analysis.grade;

    let info_rows: String = ctx
        .basic_info()
        .into_iter()
        .map(|(label, value)| {
            format!("<tr><th>{}</th><td>{}</td></tr>", label, html_escape(&value))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let metric_rows: String = metric_rows(&ctx.input.metrics)
        .into_iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td>\
                 <td><span class=\"badge {}\">{}</span></td><td class=\"muted\">{}</td></tr>",
                row.label,
                format_value(row.value, row.decimals),
                row.unit,
                row.rating.css_class(),
                row.rating.label(),
                benchmark(row.scale),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let bottleneck_items: String = ctx
        .analysis
        .bottlenecks
        .iter()
        .map(|b| {
            format!(
                "<li class=\"{}\"><strong>{}</strong> <span class=\"muted\">[{}]</span> {}</li>",
                severity_class(b.severity),
                html_escape(&b.label),
                b.severity.label(),
                html_escape(&b.detail),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let recommendation_items: String = ctx
        .analysis
        .recommendations
        .iter()
        .map(|text| format!("<li>{}</li>", html_escape(text)))
        .collect::<Vec<_>>()
        .join("\n");

    let error_section = if ctx.options.include_errors && !ctx.analysis.error_groups.is_empty() {
        let rows = ctx
            .analysis
            .error_groups
            .iter()
            .map(|g| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}%</td><td>{}</td><td>{}</td></tr>",
                    html_escape(&g.error_type),
                    html_escape(&g.code),
                    g.count,
                    g.rate,
                    format_timestamp(g.first_occurrence),
                    format_timestamp(g.last_occurrence),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"<h2>错误统计</h2>
<table>
<thead><tr><th>错误类型</th><th>错误代码</th><th>次数</th><th>占比</th><th>首次出现</th><th>最后出现</th></tr></thead>
<tbody>
{rows}
</tbody>
</table>"#
        )
    } else {
        String::new()
    };

    let trend_section = if ctx.options.include_trends && !ctx.analysis.trends.is_empty() {
        let rows = ctx
            .analysis
            .trends
            .iter()
            .map(|(metric, trend)| {
                let change = if trend.change_rate == "N/A" {
                    trend.change_rate.clone()
                } else {
                    format!("{}%", trend.change_rate)
                };
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    metric.label(),
                    trend.direction.label(),
                    change,
                    trend.stability.label(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"<h2>趋势分析</h2>
<table>
<thead><tr><th>指标</th><th>趋势</th><th>变化率</th><th>稳定性</th></tr></thead>
<tbody>
{rows}
</tbody>
</table>"#
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
  body {{ font-family: -apple-system, 'Segoe UI', 'PingFang SC', 'Microsoft YaHei', sans-serif;
         margin: 0; padding: 2rem; background: #f8fafc; color: #1e293b; line-height: 1.6; }}
  h1 {{ font-size: 1.75rem; margin: 0 0 0.25rem; }}
  h2 {{ font-size: 1.125rem; color: #334155; margin: 2rem 0 0.75rem;
        border-bottom: 1px solid #e2e8f0; padding-bottom: 0.5rem; }}
  .meta, .muted {{ color: #64748b; font-size: 0.875rem; }}
  .score-card {{ display: flex; align-items: center; gap: 1.5rem; background: #fff;
                border: 1px solid #e2e8f0; border-radius: 0.5rem; padding: 1.25rem 1.5rem; }}
  .score {{ font-size: 2.5rem; font-weight: 700; }}
  .grade {{ font-size: 2rem; font-weight: 700; border-radius: 0.5rem;
            padding: 0.25rem 1rem; color: #fff; }}
  .grade-a {{ background: #16a34a; }}
  .grade-b {{ background: #2563eb; }}
  .grade-c {{ background: #d97706; }}
  .grade-d {{ background: #dc2626; }}
  table {{ width: 100%; border-collapse: collapse; background: #fff; font-size: 0.875rem; }}
  th, td {{ padding: 0.5rem 0.75rem; border: 1px solid #e2e8f0; text-align: left; }}
  thead th, tbody th {{ background: #f1f5f9; font-weight: 600; }}
  .badge {{ display: inline-block; padding: 0.1rem 0.5rem; border-radius: 999px;
            font-size: 0.75rem; color: #fff; }}
  .badge.excellent {{ background: #16a34a; }}
  .badge.good {{ background: #2563eb; }}
  .badge.fair {{ background: #d97706; }}
  .badge.poor {{ background: #dc2626; }}
  .badge.none {{ background: #94a3b8; }}
  li {{ margin: 0.25rem 0; }}
  .severity-high {{ color: #b91c1c; }}
  .severity-medium {{ color: #b45309; }}
  footer {{ margin-top: 3rem; padding-top: 1rem; border-top: 1px solid #e2e8f0;
            color: #94a3b8; font-size: 0.8rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div class="meta">生成时间：{generated_at}</div>

<h2>性能评分</h2>
<div class="score-card">
  <div class="score">{score}<span class="muted"> / 100</span></div>
  <div class="grade {grade_class}">{grade}</div>
</div>

<h2>基本信息</h2>
<table>
<tbody>
{info_rows}
</tbody>
</table>

<h2>核心指标</h2>
<table>
<thead><tr><th>指标</th><th>数值</th><th>单位</th><th>评级</th><th>基准</th></tr></thead>
<tbody>
{metric_rows}
</tbody>
</table>

<h2>性能瓶颈</h2>
<ul>
{bottleneck_items}
</ul>

<h2>优化建议</h2>
<ol>
{recommendation_items}
</ol>

{error_section}
{trend_section}

<footer>报告生成于 {generated_at}</footer>
</body>
</html>
"#,
        title = html_escape(&title),
        generated_at = ctx.generated_at_text(),
        score = grade.score,
        grade = grade.grade,
        grade_class = grade_class(grade.grade),
        info_rows = info_rows,
        metric_rows = metric_rows,
        bottleneck_items = bottleneck_items,
        recommendation_items = recommendation_items,
        error_section = error_section,
        trend_section = trend_section,
    )
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "severity-high",
        Severity::Medium => "severity-medium",
        Severity::Info => "severity-info",
    }
}

fn grade_class(grade: Grade) -> &'static str {
    match grade {
        Grade::A => "grade-a",
        Grade::B => "grade-b",
        Grade::C => "grade-c",
        Grade::D => "grade-d",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorEvent, TestMetrics};
    use crate::normalize::NormalizedInput;
    use crate::report::ReportOptions;
    use chrono::{TimeZone, Utc};

    fn render(input: &NormalizedInput) -> String {
        let options = ReportOptions::default();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        render_document(&ReportContext::new(input, &options, at))
    }

    #[test]
    fn document_is_self_contained() {
        let html = render(&NormalizedInput::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("<link"));
        assert!(!html.contains("http://"));
        assert!(!html.contains("https://"));
    }

    #[test]
    fn caller_text_is_escaped() {
        let mut input = NormalizedInput {
            test_name: Some("<script>alert(1)</script>".to_string()),
            ..Default::default()
        };
        input.errors.push(ErrorEvent {
            error_type: "<b>".to_string(),
            code: "500".to_string(),
            timestamp: None,
            message: None,
        });
        let html = render(&input);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("<td>&lt;b&gt;</td>"));
    }

    #[test]
    fn grade_and_badges_are_embedded() {
        let input = NormalizedInput {
            metrics: TestMetrics {
                average_response_time: 150.0,
                throughput: 200.0,
                min_response_time: 100.0,
                max_response_time: 300.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let html = render(&input);
        assert!(html.contains("<div class=\"grade grade-a\">A</div>"));
        assert!(html.contains(
            "<td>平均响应时间</td><td>150.00</td><td>ms</td>\
             <td><span class=\"badge excellent\">优秀</span></td>"
        ));
    }

    #[test]
    fn optional_sections_are_omitted_without_data() {
        let html = render(&NormalizedInput::default());
        assert!(!html.contains("<h2>错误统计</h2>"));
        assert!(!html.contains("<h2>趋势分析</h2>"));
    }
}
