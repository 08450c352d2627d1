use crate::core::config::CacheConfig;
use crate::core::model::{EntityCode, EntityProfile};
use crate::fetch::FetchClient;
use crate::providers::STATUS_OK;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Client for the registry side of the disclosure API: the full entity
/// code list and per-entity profiles.
pub struct RegistryClient {
    fetch: Arc<FetchClient>,
    entity_list_ttl: Duration,
    profile_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct EntityIndex {
    #[serde(default)]
    list: Vec<EntityEntry>,
}

#[derive(Debug, Deserialize)]
struct EntityEntry {
    corp_code: String,
    corp_name: String,
    stock_code: Option<String>,
    modify_date: Option<String>,
}

impl From<EntityEntry> for EntityCode {
    fn from(entry: EntityEntry) -> Self {
        let listing_symbol = entry
            .stock_code
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let last_modified = entry
            .modify_date
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y%m%d").ok());
        EntityCode {
            code: entry.corp_code,
            name: entry.corp_name,
            listing_symbol,
            last_modified,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    status: String,
    #[serde(default)]
    message: String,
    corp_name: Option<String>,
    corp_name_eng: Option<String>,
    stock_name: Option<String>,
    induty_code: Option<String>,
}

impl RegistryClient {
    pub fn new(fetch: Arc<FetchClient>, cache: &CacheConfig) -> Self {
        Self {
            fetch,
            entity_list_ttl: cache.entity_list_ttl(),
            profile_ttl: cache.profile_ttl(),
        }
    }

    /// Downloads the entity-list archive and unpacks it into codes.
    pub async fn list_entities(&self) -> Result<Vec<EntityCode>> {
        info!("Fetching entity codes from the registry");
        let bytes = self
            .fetch
            .fetch("corp_code", "corpCode.xml", &[], self.entity_list_ttl)
            .await?;

        let entities = parse_entity_archive(&bytes)?;
        info!("Retrieved {} entities", entities.len());
        Ok(entities)
    }

    /// Looks up the detailed profile for one entity. A business-level
    /// "not found" is `Ok(None)`; only transport failures are errors.
    pub async fn get_profile(&self, code: &str) -> Result<Option<EntityProfile>> {
        debug!("Fetching profile for {code}");
        let params = [("corp_code", code.to_string())];
        let bytes = self
            .fetch
            .fetch("company_info", "company.json", &params, self.profile_ttl)
            .await?;

        let response: ProfileResponse = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse profile response for {code}"))?;

        if response.status != STATUS_OK {
            debug!(
                "No profile for {code}: status {} ({})",
                response.status, response.message
            );
            return Ok(None);
        }

        Ok(Some(EntityProfile {
            code: code.to_string(),
            name: response.corp_name.unwrap_or_default(),
            name_eng: response.corp_name_eng.unwrap_or_default(),
            stock_name: response.stock_name.unwrap_or_default(),
            industry_code: response.induty_code.unwrap_or_default(),
        }))
    }
}

fn parse_entity_archive(bytes: &[u8]) -> Result<Vec<EntityCode>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .context("Entity list is not a valid zip archive")?;
    let mut xml = String::new();
    archive
        .by_name("CORPCODE.xml")
        .context("CORPCODE.xml missing from entity list archive")?
        .read_to_string(&mut xml)
        .context("Failed to read CORPCODE.xml")?;

    let index: EntityIndex =
        quick_xml::de::from_str(&xml).context("Failed to parse entity list XML")?;
    Ok(index.list.into_iter().map(EntityCode::from).collect())
}
