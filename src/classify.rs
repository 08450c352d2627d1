//! Rule-based classification of registry entities against the configured
//! industry allow-list and keyword tiers.

use crate::core::config::ClassificationConfig;
use crate::core::model::{ClassificationResult, EntityCode, EntityProfile};
use crate::providers::RegistryClient;
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Classifier {
    registry: Arc<RegistryClient>,
    config: ClassificationConfig,
}

impl Classifier {
    pub fn new(registry: Arc<RegistryClient>, config: ClassificationConfig) -> Self {
        Self { registry, config }
    }

    /// Scores one text against every keyword tier. Each configured keyword
    /// present in the text adds its tier weight once; a keyword that is a
    /// substring of another counted keyword scores both.
    fn keyword_score(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }

        let text = text.to_lowercase();
        let weights = &self.config.weights;
        let tiers = [
            (&self.config.keywords.high, weights.high),
            (&self.config.keywords.medium, weights.medium),
            (&self.config.keywords.low, weights.low),
        ];

        let mut score = 0;
        for (keywords, weight) in tiers {
            for keyword in keywords {
                if text.contains(&keyword.to_lowercase()) {
                    score += weight;
                }
            }
        }
        score
    }

    /// Pure scoring function over (profile, name). An industry code on the
    /// allow-list carries the highest weight; keywords are matched against
    /// the combined searchable text of the name and profile fields.
    pub fn score(&self, profile: Option<&EntityProfile>, name: &str) -> u32 {
        let mut score = 0;
        let mut searchable = name.to_string();

        if let Some(profile) = profile {
            if self.config.industry_codes.contains(&profile.industry_code) {
                debug!("{name} matched industry code {}", profile.industry_code);
                score += self.config.weights.industry;
            }
            for field in [&profile.name, &profile.name_eng, &profile.stock_name] {
                if !field.is_empty() {
                    searchable.push(' ');
                    searchable.push_str(field);
                }
            }
        }

        score + self.keyword_score(&searchable)
    }

    /// Classifies one entity. A failed or absent profile degrades to
    /// name-only scoring; it never drops the entity.
    pub async fn classify(&self, entity: &EntityCode) -> ClassificationResult {
        let profile = match self.registry.get_profile(&entity.code).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    "Profile fetch failed for {} ({}), scoring by name only: {e:#}",
                    entity.name, entity.code
                );
                None
            }
        };

        let score = self.score(profile.as_ref(), &entity.name);
        ClassificationResult {
            code: entity.code.clone(),
            name: entity.name.clone(),
            listing_symbol: entity.listing_symbol.clone(),
            score,
            matched: score >= self.config.threshold,
        }
    }

    pub async fn classify_all(
        &self,
        entities: &[EntityCode],
        progress: Option<&ProgressBar>,
    ) -> Vec<ClassificationResult> {
        info!("Starting classification of {} entities", entities.len());

        let mut results = Vec::with_capacity(entities.len());
        for entity in entities {
            let result = self.classify(entity).await;
            if result.matched {
                debug!("Matched: {} (score: {})", result.name, result.score);
            }
            results.push(result);
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        let matched = results.iter().filter(|r| r.matched).count();
        info!("Classification complete: {matched} entities matched");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ApiConfig, CacheConfig};
    use crate::fetch::FetchClient;
    use crate::store::MemoryCache;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn classifier_for(server: &MockServer) -> Classifier {
        let config = ApiConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            retry_count: 1,
            retry_delay_secs: 0,
            rate_limit_cooldown_secs: 0,
            min_call_interval_ms: 0,
        };
        let cache = Arc::new(MemoryCache::new());
        let fetch = Arc::new(FetchClient::new(&config, "test-key", cache).unwrap());
        let registry = Arc::new(RegistryClient::new(fetch, &CacheConfig::default()));
        Classifier::new(registry, ClassificationConfig::default())
    }

    fn offline_classifier() -> Classifier {
        // Scoring is pure; the registry is only consulted by classify().
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            retry_count: 1,
            retry_delay_secs: 0,
            rate_limit_cooldown_secs: 0,
            min_call_interval_ms: 0,
        };
        let cache = Arc::new(MemoryCache::new());
        let fetch = Arc::new(FetchClient::new(&config, "test-key", cache).unwrap());
        let registry = Arc::new(RegistryClient::new(fetch, &CacheConfig::default()));
        Classifier::new(registry, ClassificationConfig::default())
    }

    fn profile(industry_code: &str) -> EntityProfile {
        EntityProfile {
            code: "00000001".to_string(),
            name: String::new(),
            name_eng: String::new(),
            stock_name: String::new(),
            industry_code: industry_code.to_string(),
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let classifier = offline_classifier();
        let profile = profile("C20423");
        let first = classifier.score(Some(&profile), "코스맥스 화장품");
        let second = classifier.score(Some(&profile), "코스맥스 화장품");
        assert_eq!(first, second);
    }

    #[test]
    fn test_score_is_monotonic_in_matching_keywords() {
        let classifier = offline_classifier();
        let base = classifier.score(None, "화학");
        let more = classifier.score(None, "화학 화장품");
        assert!(more >= base);
    }

    #[test]
    fn test_keyword_tiers_weight_differently() {
        let classifier = offline_classifier();
        // "cosmetic ingredient" is high tier (3) and case-insensitive
        assert_eq!(classifier.score(None, "Acme Cosmetic Ingredient Co."), 3);
        // "뷰티" is medium tier (2)
        assert_eq!(classifier.score(None, "서울뷰티"), 2);
        // "chemical" is low tier (1)
        assert_eq!(classifier.score(None, "Acme Chemical"), 1);
        assert_eq!(classifier.score(None, "무관한 이름"), 0);
    }

    #[test]
    fn test_substring_keywords_double_count() {
        let classifier = offline_classifier();
        // "화장품 원료" (high, 3) also contains "화장품" (medium, 2),
        // "원료" (low, 1) and "화장품원료" is absent; double counting is
        // deliberate.
        assert_eq!(classifier.score(None, "한국 화장품 원료"), 6);
    }

    #[test]
    fn test_industry_match_plus_high_keyword() {
        let classifier = offline_classifier();
        let profile = profile("C20423");
        // Allow-listed industry (+10) and one high keyword (+3)
        let score = classifier.score(Some(&profile), "Acme Cosmetic Ingredient Co.");
        assert_eq!(score, 13);
        assert!(score >= 5);
    }

    #[test]
    fn test_profile_fields_join_the_searchable_text() {
        let classifier = offline_classifier();
        let profile = EntityProfile {
            code: "00000001".to_string(),
            name: "서울케미칼".to_string(),
            name_eng: "Seoul Chemical Co.,Ltd.".to_string(),
            stock_name: String::new(),
            industry_code: "X99999".to_string(),
        };
        // "케미칼" (2) from the profile name, "chemical" (1) from the
        // English name; the registry name itself matches nothing.
        assert_eq!(classifier.score(Some(&profile), "서울"), 3);
    }

    #[tokio::test]
    async fn test_classify_matches_at_threshold() {
        let server = MockServer::start().await;
        let body = r#"{
            "status": "000",
            "message": "정상",
            "corp_name": "한국코스메틱",
            "corp_name_eng": "Korea Cosmetics Co.,Ltd.",
            "stock_name": "한국코스메틱",
            "induty_code": "C20423"
        }"#;
        Mock::given(method("GET"))
            .and(path("/company.json"))
            .and(query_param("corp_code", "00434003"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server);
        let entity = EntityCode {
            code: "00434003".to_string(),
            name: "한국코스메틱".to_string(),
            listing_symbol: None,
            last_modified: None,
        };
        let result = classifier.classify(&entity).await;
        assert_eq!(result.score, 10);
        assert!(result.matched);
    }

    #[tokio::test]
    async fn test_profile_failure_degrades_to_name_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/company.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server);
        let entity = EntityCode {
            code: "00434003".to_string(),
            name: "한국화장품".to_string(),
            listing_symbol: None,
            last_modified: None,
        };
        // Profile fetch exhausts its retries, but the entity still scores
        // on its name: "화장품" (2).
        let result = classifier.classify(&entity).await;
        assert_eq!(result.score, 2);
        assert!(!result.matched);
    }

    #[tokio::test]
    async fn test_classify_all_keeps_every_entity() {
        let server = MockServer::start().await;
        let body = r#"{"status": "013", "message": "조회된 데이타가 없습니다."}"#;
        Mock::given(method("GET"))
            .and(path("/company.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let classifier = classifier_for(&server);
        let entities = vec![
            EntityCode {
                code: "00000001".to_string(),
                name: "한국화장품원료".to_string(),
                listing_symbol: None,
                last_modified: None,
            },
            EntityCode {
                code: "00000002".to_string(),
                name: "무관한 회사".to_string(),
                listing_symbol: None,
                last_modified: None,
            },
        ];

        let results = classifier.classify_all(&entities, None).await;
        assert_eq!(results.len(), 2);
        // "화장품원료" (3) + "화장품" (2) + "원료" (1) = 6 >= threshold
        assert!(results[0].matched);
        assert_eq!(results[0].score, 6);
        assert!(!results[1].matched);
    }
}
