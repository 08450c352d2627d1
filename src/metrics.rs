//! Pure reshaping and derivation over collected statement records. No
//! network or storage access; everything operates on in-memory tables.

use crate::core::config::MetricNames;
use crate::core::model::StatementRecord;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const OPERATING_MARGIN: &str = "operating_margin";
pub const NET_MARGIN: &str = "net_margin";
pub const DEBT_RATIO: &str = "debt_ratio";

pub fn growth_column(metric: &str) -> String {
    format!("{metric}_growth")
}

/// One wide row per (code, year). Missing and underivable values stay
/// `None`; they are never replaced with fabricated numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub code: String,
    pub name: String,
    pub year: i32,
    pub values: BTreeMap<String, Option<f64>>,
}

/// Per-year cohort averages over all entities observed in that year.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageRow {
    pub year: i32,
    pub values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub entities: usize,
    pub years: Vec<i32>,
    pub records: usize,
    pub latest_year: Option<i32>,
    pub avg_revenue: Option<f64>,
    pub total_revenue: Option<f64>,
    pub avg_operating_margin: Option<f64>,
    pub avg_net_margin: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(round2(n / d * 100.0)),
        _ => None,
    }
}

/// Pivots long-format records into wide rows keyed by (code, year), one
/// column per tracked metric. The first-seen value wins on duplicate
/// (code, year, metric) keys.
pub fn reshape(records: &[StatementRecord], tracked: &[String]) -> Vec<MetricRow> {
    let mut index: BTreeMap<(String, i32), MetricRow> = BTreeMap::new();

    for record in records {
        let row = index
            .entry((record.code.clone(), record.year))
            .or_insert_with(|| MetricRow {
                code: record.code.clone(),
                name: record.name.clone(),
                year: record.year,
                values: tracked.iter().map(|m| (m.clone(), None)).collect(),
            });
        if let Some(slot) = row.values.get_mut(&record.metric)
            && slot.is_none()
        {
            *slot = Some(record.value);
        }
    }

    index.into_values().collect()
}

/// Adds ratio and year-over-year growth columns in place. Every derived
/// column is `None` when an input is missing or a denominator is zero;
/// growth is `None` for an entity's first observed year.
pub fn derive(rows: &mut [MetricRow], names: &MetricNames) {
    rows.sort_by(|a, b| (&a.code, a.year).cmp(&(&b.code, b.year)));

    for i in 0..rows.len() {
        let prev_values = (i > 0 && rows[i - 1].code == rows[i].code)
            .then(|| rows[i - 1].values.clone());
        let row = &mut rows[i];

        let revenue = row.values.get(&names.revenue).copied().flatten();
        let operating = row.values.get(&names.operating_profit).copied().flatten();
        let net = row.values.get(&names.net_income).copied().flatten();
        let assets = row.values.get(&names.assets).copied().flatten();
        let liabilities = row.values.get(&names.liabilities).copied().flatten();

        row.values
            .insert(OPERATING_MARGIN.to_string(), ratio(operating, revenue));
        row.values.insert(NET_MARGIN.to_string(), ratio(net, revenue));
        let equity = match (assets, liabilities) {
            (Some(a), Some(l)) => Some(a - l),
            _ => None,
        };
        row.values
            .insert(DEBT_RATIO.to_string(), ratio(liabilities, equity));

        for metric in [&names.revenue, &names.operating_profit, &names.net_income] {
            let growth = prev_values.as_ref().and_then(|prev| {
                let previous = prev.get(metric).copied().flatten()?;
                let current = row.values.get(metric).copied().flatten()?;
                (previous != 0.0).then(|| round2((current - previous) / previous * 100.0))
            });
            row.values.insert(growth_column(metric), growth);
        }
    }

    debug!("Derived metrics for {} rows", rows.len());
}

/// Averages every column per year across the entities observed that year.
/// Entities with no row for a year are excluded from that year's mean, not
/// counted as zero.
pub fn industry_average(rows: &[MetricRow]) -> Vec<AverageRow> {
    let mut columns: BTreeSet<&String> = BTreeSet::new();
    for row in rows {
        columns.extend(row.values.keys());
    }

    let mut by_year: BTreeMap<i32, Vec<&MetricRow>> = BTreeMap::new();
    for row in rows {
        by_year.entry(row.year).or_default().push(row);
    }

    by_year
        .into_iter()
        .map(|(year, year_rows)| {
            let values = columns
                .iter()
                .map(|&column| {
                    let observed: Vec<f64> = year_rows
                        .iter()
                        .filter_map(|row| row.values.get(column).copied().flatten())
                        .collect();
                    let mean = (!observed.is_empty())
                        .then(|| observed.iter().sum::<f64>() / observed.len() as f64);
                    (column.clone(), mean)
                })
                .collect();
            AverageRow { year, values }
        })
        .collect()
}

/// Top `n` rows of one year ranked by a column, descending. Rows without a
/// value in that column are not ranked.
pub fn top_performers(rows: &[MetricRow], column: &str, year: i32, n: usize) -> Vec<MetricRow> {
    let mut ranked: Vec<MetricRow> = rows
        .iter()
        .filter(|row| row.year == year && row.values.get(column).copied().flatten().is_some())
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        let va = a.values.get(column).copied().flatten().unwrap_or(f64::MIN);
        let vb = b.values.get(column).copied().flatten().unwrap_or(f64::MIN);
        vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

pub fn summary_stats(rows: &[MetricRow], names: &MetricNames) -> SummaryStats {
    let entities = rows.iter().map(|r| &r.code).collect::<BTreeSet<_>>().len();
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let latest_year = years.last().copied();

    let latest: Vec<&MetricRow> = rows
        .iter()
        .filter(|r| Some(r.year) == latest_year)
        .collect();
    let column_values = |column: &str| -> Vec<f64> {
        latest
            .iter()
            .filter_map(|r| r.values.get(column).copied().flatten())
            .collect()
    };
    let mean = |values: &[f64]| (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);

    let revenues = column_values(&names.revenue);
    let operating_margins = column_values(OPERATING_MARGIN);
    let net_margins = column_values(NET_MARGIN);

    SummaryStats {
        entities,
        records: rows.len(),
        latest_year,
        avg_revenue: mean(&revenues),
        total_revenue: (!revenues.is_empty()).then(|| revenues.iter().sum()),
        avg_operating_margin: mean(&operating_margins),
        avg_net_margin: mean(&net_margins),
        years,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, year: i32, metric: &str, value: f64) -> StatementRecord {
        StatementRecord {
            code: code.to_string(),
            name: format!("entity-{code}"),
            year,
            metric: metric.to_string(),
            value,
            unit: "KRW".to_string(),
        }
    }

    fn tracked() -> Vec<String> {
        vec![
            "매출액".to_string(),
            "영업이익".to_string(),
            "당기순이익".to_string(),
            "자산총계".to_string(),
            "부채총계".to_string(),
        ]
    }

    fn value(row: &MetricRow, column: &str) -> Option<f64> {
        row.values.get(column).copied().flatten()
    }

    #[test]
    fn test_reshape_keeps_first_seen_duplicate() {
        let records = vec![
            record("00100001", 2023, "매출액", 1000.0),
            record("00100001", 2023, "매출액", 2000.0),
        ];
        let rows = reshape(&records, &tracked());
        assert_eq!(rows.len(), 1);
        assert_eq!(value(&rows[0], "매출액"), Some(1000.0));
    }

    #[test]
    fn test_reshape_ignores_untracked_metrics() {
        let records = vec![
            record("00100001", 2023, "매출액", 1000.0),
            record("00100001", 2023, "판매비와관리비", 400.0),
        ];
        let rows = reshape(&records, &tracked());
        assert!(!rows[0].values.contains_key("판매비와관리비"));
    }

    #[test]
    fn test_operating_margin_is_null_on_zero_revenue() {
        let records = vec![
            record("00100001", 2023, "매출액", 0.0),
            record("00100001", 2023, "영업이익", 50.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        assert_eq!(value(&rows[0], OPERATING_MARGIN), None);
    }

    #[test]
    fn test_operating_margin_is_null_on_missing_input() {
        let records = vec![record("00100001", 2023, "매출액", 1000.0)];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        assert_eq!(value(&rows[0], OPERATING_MARGIN), None);
        assert_eq!(value(&rows[0], NET_MARGIN), None);
    }

    #[test]
    fn test_ratios_and_rounding() {
        let records = vec![
            record("00100001", 2023, "매출액", 3000.0),
            record("00100001", 2023, "영업이익", 1000.0),
            record("00100001", 2023, "당기순이익", 600.0),
            record("00100001", 2023, "자산총계", 5000.0),
            record("00100001", 2023, "부채총계", 2000.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        assert_eq!(value(&rows[0], OPERATING_MARGIN), Some(33.33));
        assert_eq!(value(&rows[0], NET_MARGIN), Some(20.0));
        // 2000 / (5000 - 2000) * 100
        assert_eq!(value(&rows[0], DEBT_RATIO), Some(66.67));
    }

    #[test]
    fn test_debt_ratio_null_when_equity_is_zero() {
        let records = vec![
            record("00100001", 2023, "자산총계", 2000.0),
            record("00100001", 2023, "부채총계", 2000.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        assert_eq!(value(&rows[0], DEBT_RATIO), None);
    }

    #[test]
    fn test_growth_is_null_for_first_observed_year() {
        let records = vec![
            record("00100001", 2022, "매출액", 1000.0),
            record("00100001", 2023, "매출액", 1500.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        assert_eq!(value(&rows[0], &growth_column("매출액")), None);
        assert_eq!(value(&rows[1], &growth_column("매출액")), Some(50.0));
    }

    #[test]
    fn test_growth_is_null_on_zero_or_missing_previous() {
        let records = vec![
            record("00100001", 2022, "매출액", 0.0),
            record("00100001", 2023, "매출액", 1500.0),
            record("00100002", 2022, "영업이익", 10.0),
            record("00100002", 2023, "매출액", 100.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        // Zero previous revenue
        assert_eq!(value(&rows[1], &growth_column("매출액")), None);
        // Previous year has no revenue observation at all
        assert_eq!(value(&rows[3], &growth_column("매출액")), None);
    }

    #[test]
    fn test_growth_does_not_cross_entities() {
        let records = vec![
            record("00100001", 2022, "매출액", 1000.0),
            record("00100002", 2023, "매출액", 2000.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        // 00100002's first year must not inherit 00100001's 2022 value
        assert_eq!(value(&rows[1], &growth_column("매출액")), None);
    }

    #[test]
    fn test_industry_average_excludes_absent_entities() {
        let records = vec![
            record("A0000001", 2022, "매출액", 100.0),
            record("B0000001", 2023, "매출액", 300.0),
            record("A0000001", 2023, "매출액", 100.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        let averages = industry_average(&rows);

        // B is absent in 2022: the average is 100, not 50.
        let avg_2022 = averages.iter().find(|a| a.year == 2022).unwrap();
        assert_eq!(avg_2022.values.get("매출액").copied().flatten(), Some(100.0));
        let avg_2023 = averages.iter().find(|a| a.year == 2023).unwrap();
        assert_eq!(avg_2023.values.get("매출액").copied().flatten(), Some(200.0));
    }

    #[test]
    fn test_top_performers_ranks_descending() {
        let records = vec![
            record("A0000001", 2023, "매출액", 100.0),
            record("B0000001", 2023, "매출액", 300.0),
            record("C0000001", 2023, "매출액", 200.0),
            record("D0000001", 2022, "매출액", 999.0),
        ];
        let rows = reshape(&records, &tracked());
        let top = top_performers(&rows, "매출액", 2023, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].code, "B0000001");
        assert_eq!(top[1].code, "C0000001");
    }

    #[test]
    fn test_summary_stats_cover_latest_year() {
        let records = vec![
            record("A0000001", 2022, "매출액", 100.0),
            record("A0000001", 2023, "매출액", 200.0),
            record("B0000001", 2023, "매출액", 400.0),
        ];
        let mut rows = reshape(&records, &tracked());
        derive(&mut rows, &MetricNames::default());
        let stats = summary_stats(&rows, &MetricNames::default());

        assert_eq!(stats.entities, 2);
        assert_eq!(stats.years, vec![2022, 2023]);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.latest_year, Some(2023));
        assert_eq!(stats.avg_revenue, Some(300.0));
        assert_eq!(stats.total_revenue, Some(600.0));
        assert_eq!(stats.avg_operating_margin, None);
    }
}
