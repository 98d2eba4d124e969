//! LLM客户端 - 基于rig的角色模型实现

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::config::{LLMConfig, LLMProvider};
use crate::error::{StormError, StormResult};
use crate::llm::{LanguageModel, ModelSettings, ModelTier};

mod providers;

use providers::{ProviderAgent, ProviderClient};

/// 可复用的provider连接，按角色派生模型
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端，缺少凭据时直接失败
    pub fn new(config: LLMConfig) -> StormResult<Self> {
        if config.provider.requires_api_key() && config.api_key.trim().is_empty() {
            return Err(StormError::MissingCredential(
                crate::config::LLM_API_KEY_ENV,
            ));
        }
        let client = ProviderClient::new(&config)
            .map_err(|e| StormError::upstream(config.provider.to_string(), e))?;
        Ok(Self { config, client })
    }

    /// 按档位和输出上限构造一个模型。
    /// 需要在Tokio运行时内调用（rig的agent构建会spawn后台任务）
    pub fn model(&self, tier: ModelTier, max_tokens: u64) -> RigLanguageModel {
        let model = match tier {
            ModelTier::Fast => self.config.model_efficient.clone(),
            ModelTier::Strong => self.config.model_powerful.clone(),
        };
        let settings = ModelSettings {
            model,
            tier,
            max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };
        let agent = self.client.create_agent(&settings);

        RigLanguageModel {
            settings,
            agent,
            provider: self.config.provider.clone(),
            retry_attempts: self.config.retry_attempts,
            retry_delay_ms: self.config.retry_delay_ms,
        }
    }
}

pub struct RigLanguageModel {
    settings: ModelSettings,
    agent: ProviderAgent,
    provider: LLMProvider,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl RigLanguageModel {
    /// 通用重试逻辑
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.retry_attempts.max(1);
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试, model={}): {}",
                        retries,
                        max_retries,
                        self.settings.model,
                        err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl LanguageModel for RigLanguageModel {
    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    async fn complete(&self, prompt: &str) -> StormResult<String> {
        self.retry_with_backoff(|| async { self.agent.prompt(prompt).await })
            .await
            .map_err(|e| StormError::upstream(self.provider.to_string(), e))
    }
}
