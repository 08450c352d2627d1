use super::ui;
use crate::artifacts;
use crate::classify::Classifier;
use crate::core::config::AppConfig;
use crate::core::model::ClassificationResult;
use crate::providers::RegistryClient;
use anyhow::Result;
use comfy_table::Cell;
use std::sync::Arc;

/// Downloads the registry, classifies every entity, persists the matched
/// set and prints it.
pub async fn run(config: &AppConfig, registry: Arc<RegistryClient>) -> Result<()> {
    let entities = registry.list_entities().await?;

    let classifier = Classifier::new(registry, config.classification.clone());
    let progress = ui::new_progress_bar(entities.len() as u64, true);
    progress.set_message("Classifying entities");
    let results = classifier.classify_all(&entities, Some(&progress)).await;
    progress.finish_and_clear();

    let mut matched: Vec<ClassificationResult> =
        results.into_iter().filter(|r| r.matched).collect();
    matched.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));

    let path = config.classified_path()?;
    artifacts::write_classified(&path, &matched)?;

    println!("{}", display_as_table(&matched));
    println!(
        "\nMatched {} of {} entities (threshold {}), saved to {}",
        ui::style_text(&matched.len().to_string(), ui::StyleType::TotalValue),
        entities.len(),
        config.classification.threshold,
        path.display()
    );
    Ok(())
}

fn display_as_table(matched: &[ClassificationResult]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Listing"),
        ui::header_cell("Score"),
    ]);

    for result in matched {
        table.add_row(vec![
            Cell::new(&result.code),
            Cell::new(&result.name),
            Cell::new(result.listing_symbol.as_deref().unwrap_or("-")),
            Cell::new(result.score.to_string()),
        ]);
    }

    table.to_string()
}
