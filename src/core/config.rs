use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retry_count: u32,
    pub retry_delay_secs: u64,
    pub rate_limit_cooldown_secs: u64,
    pub min_call_interval_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "https://opendart.fss.or.kr/api".to_string(),
            timeout_secs: 30,
            retry_count: 3,
            retry_delay_secs: 5,
            rate_limit_cooldown_secs: 60,
            min_call_interval_ms: 100,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }

    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms)
    }
}

/// TTLs per operation class. The entity list refreshes daily; profiles and
/// statements change rarely and keep for a week.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    pub entity_list_ttl_secs: u64,
    pub profile_ttl_secs: u64,
    pub statement_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            entity_list_ttl_secs: 86_400,
            profile_ttl_secs: 604_800,
            statement_ttl_secs: 604_800,
        }
    }
}

impl CacheConfig {
    pub fn entity_list_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_list_ttl_secs)
    }

    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    pub fn statement_ttl(&self) -> Duration {
        Duration::from_secs(self.statement_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeywordTiers {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScoreWeights {
    pub industry: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            industry: 10,
            high: 3,
            medium: 2,
            low: 1,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassificationConfig {
    pub industry_codes: Vec<String>,
    pub keywords: KeywordTiers,
    #[serde(default)]
    pub weights: ScoreWeights,
    pub threshold: u32,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        ClassificationConfig {
            industry_codes: vec![
                "C20423".to_string(), // 화장품 제조업
                "C20412".to_string(), // 기타 기초 유기화학물질 제조업
                "C20411".to_string(), // 석유화학계 기초화합물 제조업
                "C20421".to_string(), // 비누 및 세제 제조업
                "C20422".to_string(), // 화장용 유지류 제조업
                "C20429".to_string(), // 기타 화장품 제조업
            ],
            keywords: KeywordTiers {
                high: vec![
                    "화장품원료".to_string(),
                    "화장품 원료".to_string(),
                    "cosmetic ingredient".to_string(),
                    "기능성원료".to_string(),
                    "기능성 원료".to_string(),
                ],
                medium: vec![
                    "화장품".to_string(),
                    "색소".to_string(),
                    "향료".to_string(),
                    "피부".to_string(),
                    "스킨".to_string(),
                    "뷰티".to_string(),
                    "케미칼".to_string(),
                ],
                low: vec![
                    "화학".to_string(),
                    "제조".to_string(),
                    "chemical".to_string(),
                    "원료".to_string(),
                ],
            },
            weights: ScoreWeights::default(),
            threshold: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CollectionConfig {
    pub years: Vec<i32>,
    pub metrics: Vec<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        CollectionConfig {
            years: vec![2021, 2022, 2023, 2024, 2025],
            metrics: vec![
                "매출액".to_string(),
                "영업이익".to_string(),
                "당기순이익".to_string(),
                "자산총계".to_string(),
                "부채총계".to_string(),
                "자본총계".to_string(),
            ],
        }
    }
}

/// Maps the ratio/growth inputs onto tracked metric names, so the derivation
/// stage stays independent of the upstream account naming.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetricNames {
    pub revenue: String,
    pub operating_profit: String,
    pub net_income: String,
    pub assets: String,
    pub liabilities: String,
}

impl Default for MetricNames {
    fn default() -> Self {
        MetricNames {
            revenue: "매출액".to_string(),
            operating_profit: "영업이익".to_string(),
            net_income: "당기순이익".to_string(),
            assets: "자산총계".to_string(),
            liabilities: "부채총계".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub metric_names: MetricNames,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("kr", "dartx", "dartx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Resolves the upstream credential. The environment variable wins over
    /// the config file; a missing key is fatal at startup.
    pub fn api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var("DART_API_KEY")
            && !key.is_empty()
        {
            return Ok(key);
        }
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                anyhow!("No API key configured. Set DART_API_KEY or add api_key to the config file.")
            })
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("kr", "dartx", "dartx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        Ok(self.data_path()?.join("cache"))
    }

    pub fn classified_path(&self) -> Result<PathBuf> {
        Ok(self.data_path()?.join("classified.csv"))
    }

    pub fn statements_path(&self) -> Result<PathBuf> {
        Ok(self.data_path()?.join("statements.csv"))
    }
}
