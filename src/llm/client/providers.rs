//! LLM Provider支持模块

use anyhow::Result;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt};
use serde_json::json;

use crate::{
    config::{LLMConfig, LLMProvider},
    llm::ModelSettings,
};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Anthropic(rig::providers::anthropic::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        match config.provider {
            LLMProvider::OpenAI => {
                let client = rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::OpenAI(client))
            }
            LLMProvider::DeepSeek => {
                let client = rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build();
                Ok(ProviderClient::DeepSeek(client))
            }
            LLMProvider::Anthropic => {
                let client =
                    rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?;
                Ok(ProviderClient::Anthropic(client))
            }
            LLMProvider::Ollama => {
                let client = rig::providers::ollama::Client::builder().build();
                Ok(ProviderClient::Ollama(client))
            }
        }
    }

    /// 创建绑定了采样参数和输出上限的Agent
    pub fn create_agent(&self, settings: &ModelSettings) -> ProviderAgent {
        let sampling = json!({ "top_p": settings.top_p });

        match self {
            ProviderClient::OpenAI(client) => {
                let agent = client
                    .completion_model(&settings.model)
                    .completions_api()
                    .into_agent_builder()
                    .max_tokens(settings.max_tokens)
                    .temperature(settings.temperature)
                    .additional_params(sampling)
                    .build();
                ProviderAgent::OpenAI(agent)
            }
            ProviderClient::DeepSeek(client) => {
                let agent = client
                    .agent(&settings.model)
                    .max_tokens(settings.max_tokens)
                    .temperature(settings.temperature)
                    .additional_params(sampling)
                    .build();
                ProviderAgent::DeepSeek(agent)
            }
            ProviderClient::Anthropic(client) => {
                let agent = client
                    .agent(&settings.model)
                    .max_tokens(settings.max_tokens)
                    .temperature(settings.temperature)
                    .additional_params(sampling)
                    .build();
                ProviderAgent::Anthropic(agent)
            }
            ProviderClient::Ollama(client) => {
                let agent = client
                    .agent(&settings.model)
                    .max_tokens(settings.max_tokens)
                    .temperature(settings.temperature)
                    .additional_params(sampling)
                    .build();
                ProviderAgent::Ollama(agent)
            }
        }
    }
}

/// 统一的Agent枚举
pub enum ProviderAgent {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

impl ProviderAgent {
    /// 执行prompt
    pub async fn prompt(&self, prompt: &str) -> Result<String> {
        match self {
            ProviderAgent::OpenAI(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::DeepSeek(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Anthropic(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
            ProviderAgent::Ollama(agent) => agent.prompt(prompt).await.map_err(|e| e.into()),
        }
    }
}
