use csv::{Terminator, WriterBuilder};

use crate::error::{ReportError, Result};
use crate::rating::{benchmark, metric_rows};
use crate::report::ReportContext;
use crate::utils::{format_timestamp, format_value};

/// Encoding tag carried by CSV artifacts
pub const CSV_ENCODING: &str = "utf-8-bom";

/// Spreadsheet tools need the byte order mark to decode the Chinese headers
pub const BOM: char = '\u{FEFF}';

/// Render the data table: logical sections separated by blank lines,
/// prefixed with a UTF-8 byte order mark.
pub fn render_table(ctx: &ReportContext<'_>) -> Result<String> {
    let mut sections = vec![
        basic_info(ctx)?,
        core_metrics(ctx)?,
        bottlenecks(ctx)?,
        recommendations(ctx)?,
    ];

    if ctx.options.include_errors && !ctx.analysis.error_groups.is_empty() {
        sections.push(error_groups(ctx)?);
    }
    if ctx.options.include_time_series
        && ctx.options.time_series_limit > 0
        && !ctx.input.time_series.is_empty()
    {
        sections.push(time_series(ctx)?);
    }
    if ctx.options.include_trends && !ctx.analysis.trends.is_empty() {
        sections.push(trends(ctx)?);
    }

    Ok(format!("{}{}", BOM, sections.join("\n")))
}

/// Write one section: a title row, a header row, then data rows
fn section(title: &str, header: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record([title])?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn basic_info(ctx: &ReportContext<'_>) -> Result<String> {
    let rows: Vec<Vec<String>> = ctx
        .basic_info()
        .into_iter()
        .map(|(label, value)| vec![label.to_string(), value])
        .collect();

    section("基本信息", &["项目", "值"], &rows)
}

fn core_metrics(ctx: &ReportContext<'_>) -> Result<String> {
    let rows: Vec<Vec<String>> = metric_rows(&ctx.input.metrics)
        .into_iter()
        .map(|row| {
            vec![
                row.label.to_string(),
                format_value(row.value, row.decimals),
                row.unit.to_string(),
                row.rating.label().to_string(),
                benchmark(row.scale).to_string(),
            ]
        })
        .collect();

    section("核心指标", &["指标", "数值", "单位", "评级", "基准"], &rows)
}

fn bottlenecks(ctx: &ReportContext<'_>) -> Result<String> {
    let rows: Vec<Vec<String>> = ctx
        .analysis
        .bottlenecks
        .iter()
        .map(|b| vec![b.label.clone(), b.severity.label().to_string(), b.detail.clone()])
        .collect();

    section("性能瓶颈", &["瓶颈", "严重程度", "说明"], &rows)
}

fn recommendations(ctx: &ReportContext<'_>) -> Result<String> {
    let rows: Vec<Vec<String>> = ctx
        .analysis
        .recommendations
        .iter()
        .enumerate()
        .map(|(i, text)| vec![(i + 1).to_string(), text.clone()])
        .collect();

    section("优化建议", &["序号", "建议"], &rows)
}

fn error_groups(ctx: &ReportContext<'_>) -> Result<String> {
    let rows: Vec<Vec<String>> = ctx
        .analysis
        .error_groups
        .iter()
        .map(|g| {
            vec![
                g.error_type.clone(),
                g.code.clone(),
                g.count.to_string(),
                g.rate.clone(),
                format_timestamp(g.first_occurrence),
                format_timestamp(g.last_occurrence),
            ]
        })
        .collect();

    section(
        "错误统计",
        &["错误类型", "错误代码", "次数", "占比(%)", "首次出现", "最后出现"],
        &rows,
    )
}

fn time_series(ctx: &ReportContext<'_>) -> Result<String> {
    let series = &ctx.input.time_series;
    let limit = ctx.options.time_series_limit;

    let title = if series.len() > limit {
        format!("原始时序数据（前 {} 条，共 {} 条）", limit, series.len())
    } else {
        format!("原始时序数据（共 {} 条）", series.len())
    };

    let rows: Vec<Vec<String>> = series
        .iter()
        .take(limit)
        .map(|p| {
            vec![
                format_timestamp(p.timestamp),
                format_value(p.response_time, 2),
                format_value(p.throughput, 2),
                format_value(p.error_rate, 2),
                format_value(p.cpu_usage, 2),
                format_value(p.memory_usage, 2),
            ]
        })
        .collect();

    section(
        &title,
        &["时间", "响应时间(ms)", "吞吐量(req/s)", "错误率(%)", "CPU使用率(%)", "内存使用率(%)"],
        &rows,
    )
}

fn trends(ctx: &ReportContext<'_>) -> Result<String> {
    let rows: Vec<Vec<String>> = ctx
        .analysis
        .trends
        .iter()
        .map(|(metric, trend)| {
            vec![
                metric.label().to_string(),
                trend.direction.label().to_string(),
                trend.change_rate.clone(),
                trend.stability.label().to_string(),
            ]
        })
        .collect();

    section("趋势分析", &["指标", "趋势", "变化率(%)", "稳定性"], &rows)
}
