use super::ui;
use crate::artifacts;
use crate::core::config::AppConfig;
use crate::metrics::{self, AverageRow, MetricRow};
use anyhow::{Context, Result, bail};
use comfy_table::Cell;

/// Recomputes the wide metric table and cohort averages from the collected
/// statement records and prints them.
pub fn run(config: &AppConfig) -> Result<()> {
    let records = artifacts::read_statements(&config.statements_path()?)
        .context("No statement records found. Run `dartx collect` first.")?;
    if records.is_empty() {
        bail!("Statement table is empty. Run `dartx collect` first.");
    }

    let mut rows = metrics::reshape(&records, &config.collection.metrics);
    metrics::derive(&mut rows, &config.metric_names);
    let averages = metrics::industry_average(&rows);
    let stats = metrics::summary_stats(&rows, &config.metric_names);

    let columns = report_columns(config);

    println!(
        "{}\n",
        ui::style_text("Entity metrics", ui::StyleType::Title)
    );
    println!("{}", metrics_table(&rows, &columns));

    println!(
        "\n{}\n",
        ui::style_text("Industry average", ui::StyleType::Title)
    );
    println!("{}", averages_table(&averages, &columns));

    println!(
        "\n{} entities, {} rows, years {:?}",
        stats.entities, stats.records, stats.years
    );
    if let Some(year) = stats.latest_year {
        let fmt_amount = |v: Option<f64>| v.map_or("N/A".to_string(), |v| format!("{v:.0}"));
        let fmt_pct = |v: Option<f64>| v.map_or("N/A".to_string(), |v| format!("{v:.2}%"));
        println!(
            "{year}: avg revenue {}, total revenue {}, avg operating margin {}, avg net margin {}",
            fmt_amount(stats.avg_revenue),
            fmt_amount(stats.total_revenue),
            fmt_pct(stats.avg_operating_margin),
            fmt_pct(stats.avg_net_margin),
        );
    }
    Ok(())
}

/// Tracked metrics in config order, then ratios, then growth columns.
fn report_columns(config: &AppConfig) -> Vec<String> {
    let mut columns = config.collection.metrics.clone();
    columns.push(metrics::OPERATING_MARGIN.to_string());
    columns.push(metrics::NET_MARGIN.to_string());
    columns.push(metrics::DEBT_RATIO.to_string());
    for metric in [
        &config.metric_names.revenue,
        &config.metric_names.operating_profit,
        &config.metric_names.net_income,
    ] {
        columns.push(metrics::growth_column(metric));
    }
    columns
}

fn is_percentage_column(column: &str) -> bool {
    column == metrics::OPERATING_MARGIN
        || column == metrics::NET_MARGIN
        || column == metrics::DEBT_RATIO
        || column.ends_with("_growth")
}

fn value_cell(column: &str, value: Option<f64>) -> Cell {
    match value {
        Some(v) if is_percentage_column(column) => ui::change_cell(v),
        _ => ui::format_optional_cell(value, |v| format!("{v:.0}")),
    }
}

fn metrics_table(rows: &[MetricRow], columns: &[String]) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Year"),
    ];
    header.extend(columns.iter().map(|c| ui::header_cell(c)));
    table.set_header(header);

    for row in rows {
        let mut cells = vec![
            Cell::new(&row.code),
            Cell::new(&row.name),
            Cell::new(row.year.to_string()),
        ];
        for column in columns {
            cells.push(value_cell(
                column,
                row.values.get(column).copied().flatten(),
            ));
        }
        table.add_row(cells);
    }

    table.to_string()
}

fn averages_table(averages: &[AverageRow], columns: &[String]) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Year")];
    header.extend(columns.iter().map(|c| ui::header_cell(c)));
    table.set_header(header);

    for row in averages {
        let mut cells = vec![Cell::new(row.year.to_string())];
        for column in columns {
            let value = row.values.get(column).copied().flatten();
            cells.push(match value {
                Some(v) if is_percentage_column(column) => ui::change_cell(v),
                _ => ui::format_optional_cell(value, |v| format!("{v:.1}")),
            });
        }
        table.add_row(cells);
    }

    table.to_string()
}
