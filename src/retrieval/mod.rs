//! 网络检索模块 - 为调研阶段提供来源资料

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::{SEARCH_API_KEY_ENV, SearchConfig};
use crate::error::{StormError, StormResult};

/// 一条检索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Information {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub snippets: Vec<String>,
}

impl Information {
    /// 用于引用展示的摘要：优先第一个片段，否则用描述
    pub fn primary_snippet(&self) -> &str {
        self.snippets
            .iter()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
            .unwrap_or(&self.description)
    }
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// 每个查询最多返回的结果数
    fn top_k(&self) -> usize;

    /// 依次执行查询，跳过 exclude_urls 中的结果
    async fn search(
        &self,
        queries: &[String],
        exclude_urls: &[String],
    ) -> StormResult<Vec<Information>>;
}

/// You.com 搜索客户端
pub struct YouRetriever {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct YouSearchResponse {
    #[serde(default)]
    hits: Vec<Information>,
}

impl YouRetriever {
    pub fn new(config: &SearchConfig, k: usize) -> StormResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(StormError::MissingCredential(SEARCH_API_KEY_ENV));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StormError::upstream("you.com", e))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
            k,
        })
    }

    async fn search_one(&self, query: &str) -> StormResult<Vec<Information>> {
        let response = self
            .http
            .get(&self.api_base_url)
            .header("X-API-Key", &self.api_key)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| StormError::upstream("you.com", e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StormError::Credential {
                provider: "you.com".to_string(),
                message: status.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StormError::upstream("you.com", status));
        }

        let body: YouSearchResponse = response
            .json()
            .await
            .map_err(|e| StormError::upstream("you.com", e))?;
        Ok(body.hits.into_iter().take(self.k).collect())
    }
}

#[async_trait]
impl Retriever for YouRetriever {
    fn top_k(&self) -> usize {
        self.k
    }

    async fn search(
        &self,
        queries: &[String],
        exclude_urls: &[String],
    ) -> StormResult<Vec<Information>> {
        let mut results = Vec::new();

        for query in queries {
            match self.search_one(query).await {
                Ok(hits) => results.extend(hits),
                // 凭据问题对后续查询同样致命
                Err(e @ StormError::Credential { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!("⚠️ 搜索查询失败，已跳过 `{}`: {}", query, e);
                }
            }
        }

        Ok(exclude_and_dedup(results, exclude_urls))
    }
}

/// 去掉被排除的URL，并按首次出现保留唯一URL
pub fn exclude_and_dedup(results: Vec<Information>, exclude_urls: &[String]) -> Vec<Information> {
    let mut seen: HashSet<String> = exclude_urls.iter().cloned().collect();
    results
        .into_iter()
        .filter(|info| seen.insert(info.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(url: &str) -> Information {
        Information {
            url: url.to_string(),
            title: format!("title of {}", url),
            description: String::new(),
            snippets: vec![],
        }
    }

    #[test]
    fn test_parse_you_search_response() {
        let body = r#"{
            "hits": [
                {
                    "url": "https://en.wikipedia.org/wiki/Quantum_computing",
                    "title": "Quantum computing",
                    "description": "A quantum computer is a computer that exploits quantum mechanics.",
                    "snippets": ["Qubits can exist in superposition.", "Shor's algorithm factors integers."],
                    "thumbnail_url": "ignored"
                },
                {
                    "url": "https://example.org/qc",
                    "title": "QC overview"
                }
            ],
            "latency": 0.4
        }"#;

        let parsed: YouSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.hits.len(), 2);
        assert_eq!(parsed.hits[0].snippets.len(), 2);
        assert_eq!(parsed.hits[1].description, "");
        assert!(parsed.hits[1].snippets.is_empty());
    }

    #[test]
    fn test_parse_response_without_hits() {
        let parsed: YouSearchResponse = serde_json::from_str(r#"{"error": "quota"}"#).unwrap();
        assert!(parsed.hits.is_empty());
    }

    #[test]
    fn test_primary_snippet_falls_back_to_description() {
        let mut item = info("https://a.example");
        item.description = "fallback description".to_string();
        assert_eq!(item.primary_snippet(), "fallback description");

        item.snippets = vec!["  ".to_string(), "real snippet".to_string()];
        assert_eq!(item.primary_snippet(), "real snippet");
    }

    #[test]
    fn test_exclude_and_dedup() {
        let results = vec![
            info("https://a.example"),
            info("https://b.example"),
            info("https://a.example"),
            info("https://c.example"),
        ];
        let filtered = exclude_and_dedup(results, &["https://b.example".to_string()]);
        let urls: Vec<_> = filtered.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example", "https://c.example"]);
    }

    #[test]
    fn test_you_retriever_requires_api_key() {
        let config = SearchConfig {
            api_key: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            YouRetriever::new(&config, 5),
            Err(StormError::MissingCredential(SEARCH_API_KEY_ENV))
        ));
    }

    #[test]
    fn test_you_retriever_keeps_k() {
        let config = SearchConfig {
            api_key: "ydc-test".to_string(),
            ..Default::default()
        };
        let retriever = YouRetriever::new(&config, 2).unwrap();
        assert_eq!(retriever.top_k(), 2);
    }
}
