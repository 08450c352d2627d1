use super::ui;
use crate::artifacts;
use crate::collect::Collector;
use crate::core::config::AppConfig;
use crate::providers::StatementClient;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Collects statement records for the previously classified entities and
/// persists the long-format table.
pub async fn run(config: &AppConfig, statements: Arc<StatementClient>) -> Result<()> {
    let classified_path = config.classified_path()?;
    let companies = artifacts::read_classified(&classified_path)
        .context("No classified entities found. Run `dartx classify` first.")?;

    let collector = Collector::new(statements, config.collection.clone());
    let progress = ui::new_progress_bar(companies.len() as u64, true);
    progress.set_message("Collecting statements");
    let records = collector.collect_all(&companies, Some(&progress)).await;
    progress.finish_and_clear();

    let path = config.statements_path()?;
    artifacts::write_statements(&path, &records)?;

    let covered = records
        .iter()
        .map(|r| r.code.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    println!(
        "Collected {} records across {covered} of {} entities, saved to {}",
        ui::style_text(&records.len().to_string(), ui::StyleType::TotalValue),
        companies.len(),
        path.display()
    );
    Ok(())
}
