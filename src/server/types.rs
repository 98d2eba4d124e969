use serde::{Deserialize, Serialize};

use crate::retrieval::Information;

fn default_true() -> bool {
    true
}

fn default_citation_top_k() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    #[serde(default = "default_true")]
    pub do_polish_article: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub topic: String,
    pub article: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CitationRequest {
    pub article_text: String,
    #[serde(default = "default_citation_top_k")]
    pub search_top_k: usize,
    #[serde(default)]
    pub topic: Option<String>,
}

impl CitationRequest {
    /// 非空的主题；缺省或空字符串时需要从正文中提取
    pub fn explicit_topic(&self) -> Option<&str> {
        self.topic.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

impl From<&Information> for Citation {
    fn from(info: &Information) -> Self {
        Self {
            url: info.url.clone(),
            title: info.title.clone(),
            snippet: info.primary_snippet().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationResponse {
    pub topic: String,
    pub citations: Vec<Citation>,
    pub message: String,
}

impl CitationResponse {
    pub fn new(topic: String, citations: Vec<Citation>) -> Self {
        let message = format!("Found {} citations", citations.len());
        Self {
            topic,
            citations,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_defaults_to_polish() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"topic": "Artificial Intelligence"}"#).unwrap();
        assert!(req.do_polish_article);

        let req: GenerateRequest =
            serde_json::from_str(r#"{"topic": "AI", "do_polish_article": false}"#).unwrap();
        assert!(!req.do_polish_article);
    }

    #[test]
    fn test_citation_request_defaults() {
        let req: CitationRequest = serde_json::from_str(r#"{"article_text": "text"}"#).unwrap();
        assert_eq!(req.search_top_k, 5);
        assert_eq!(req.explicit_topic(), None);

        let req: CitationRequest =
            serde_json::from_str(r#"{"article_text": "text", "topic": ""}"#).unwrap();
        assert_eq!(req.explicit_topic(), None);

        let req: CitationRequest =
            serde_json::from_str(r#"{"article_text": "text", "topic": "Qubits"}"#).unwrap();
        assert_eq!(req.explicit_topic(), Some("Qubits"));
    }

    #[test]
    fn test_citation_snippet_falls_back_to_description() {
        let info = Information {
            url: "https://a.example".to_string(),
            title: "A".to_string(),
            description: "fallback".to_string(),
            snippets: vec![],
        };
        assert_eq!(Citation::from(&info).snippet, "fallback");
    }

    #[test]
    fn test_message_counts_citations() {
        let citation = Citation {
            url: "u".to_string(),
            title: "t".to_string(),
            snippet: "s".to_string(),
        };
        let response = CitationResponse::new("T".to_string(), vec![citation.clone(), citation]);
        assert_eq!(response.message, "Found 2 citations");
        assert_eq!(
            CitationResponse::new("T".to_string(), vec![]).message,
            "Found 0 citations"
        );
    }
}
