use crate::core::config::CacheConfig;
use crate::fetch::FetchClient;
use crate::providers::STATUS_OK;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Upstream report periods and their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Annual,
    Half,
    FirstQuarter,
    ThirdQuarter,
}

impl ReportType {
    pub fn code(&self) -> &'static str {
        match self {
            ReportType::Annual => "11011",
            ReportType::Half => "11012",
            ReportType::FirstQuarter => "11013",
            ReportType::ThirdQuarter => "11014",
        }
    }
}

/// Statement variant: group-wide first, single-entity as fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Consolidated,
    Separate,
}

impl StatementKind {
    fn code(&self) -> &'static str {
        match self {
            StatementKind::Consolidated => "CFS",
            StatementKind::Separate => "OFS",
        }
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::Consolidated => write!(f, "consolidated"),
            StatementKind::Separate => write!(f, "separate"),
        }
    }
}

/// One account line from a statement payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRow {
    #[serde(rename = "account_nm")]
    pub account: String,
    #[serde(rename = "thstrm_amount", default)]
    pub amount: String,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    status: String,
    #[serde(default)]
    message: String,
    list: Option<Vec<AccountRow>>,
}

/// Client for per-entity, per-year financial statements.
pub struct StatementClient {
    fetch: Arc<FetchClient>,
    ttl: Duration,
}

impl StatementClient {
    pub fn new(fetch: Arc<FetchClient>, cache: &CacheConfig) -> Self {
        Self {
            fetch,
            ttl: cache.statement_ttl(),
        }
    }

    /// Fetches one statement. The consolidated variant is tried first; on
    /// business-level absence the separate variant is tried exactly once.
    /// This fallback sits above the fetch layer's transport retries and
    /// never loops.
    pub async fn get_statement(
        &self,
        code: &str,
        year: i32,
        report: ReportType,
    ) -> Result<Option<Vec<AccountRow>>> {
        for kind in [StatementKind::Consolidated, StatementKind::Separate] {
            if let Some(rows) = self.fetch_variant(code, year, report, kind).await? {
                return Ok(Some(rows));
            }
            debug!("No {kind} statement for {code} in {year}");
        }
        Ok(None)
    }

    async fn fetch_variant(
        &self,
        code: &str,
        year: i32,
        report: ReportType,
        kind: StatementKind,
    ) -> Result<Option<Vec<AccountRow>>> {
        let params = [
            ("corp_code", code.to_string()),
            ("bsns_year", year.to_string()),
            ("reprt_code", report.code().to_string()),
            ("fs_div", kind.code().to_string()),
        ];
        let bytes = self
            .fetch
            .fetch(
                "financial_statement",
                "fnlttSinglAcntAll.json",
                &params,
                self.ttl,
            )
            .await?;

        let response: StatementResponse = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse statement response for {code} {year}"))?;

        if response.status != STATUS_OK {
            debug!(
                "Statement lookup for {code} {year} ({kind}) returned status {} ({})",
                response.status, response.message
            );
            return Ok(None);
        }

        Ok(Some(response.list.unwrap_or_default()))
    }
}
