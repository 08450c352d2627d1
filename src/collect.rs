//! Gathers statement records for the selected entities across the
//! configured year range.

use crate::core::config::CollectionConfig;
use crate::core::model::{ClassificationResult, StatementRecord};
use crate::providers::{ReportType, StatementClient};
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_UNIT: &str = "KRW";

/// Normalizes a reported amount. Thousands separators are stripped;
/// anything unparsable (placeholders like "-") becomes 0.0 with a warning
/// instead of failing the record.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warn!("Unparsable amount {raw:?}, treating as 0");
            0.0
        }
    }
}

pub struct Collector {
    statements: Arc<StatementClient>,
    config: CollectionConfig,
}

impl Collector {
    pub fn new(statements: Arc<StatementClient>, config: CollectionConfig) -> Self {
        Self { statements, config }
    }

    /// Collects annual-report records for one entity. A failed year is
    /// logged and skipped; the records gathered so far are always kept.
    pub async fn collect(&self, code: &str, name: &str) -> Vec<StatementRecord> {
        let mut records = Vec::new();

        for &year in &self.config.years {
            match self
                .statements
                .get_statement(code, year, ReportType::Annual)
                .await
            {
                Ok(Some(rows)) => {
                    let before = records.len();
                    for row in rows {
                        if !self.config.metrics.contains(&row.account) {
                            continue;
                        }
                        records.push(StatementRecord {
                            code: code.to_string(),
                            name: name.to_string(),
                            year,
                            metric: row.account,
                            value: parse_amount(&row.amount),
                            unit: row.currency.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
                        });
                    }
                    debug!("Collected {} records for {name} in {year}", records.len() - before);
                }
                Ok(None) => warn!("No financial data for {name} in {year}"),
                Err(e) => warn!("Failed to collect {year} data for {name}: {e:#}"),
            }
        }

        records
    }

    pub async fn collect_all(
        &self,
        companies: &[ClassificationResult],
        progress: Option<&ProgressBar>,
    ) -> Vec<StatementRecord> {
        info!(
            "Starting statement collection for {} entities",
            companies.len()
        );

        let mut all_records = Vec::new();
        for company in companies {
            let records = self.collect(&company.code, &company.name).await;
            if !records.is_empty() {
                info!("Collected {} records for {}", records.len(), company.name);
            }
            all_records.extend(records);
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        info!("Collection complete: {} records", all_records.len());
        all_records
    }
}
