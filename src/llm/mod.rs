//! 语言模型接口 - 每个流水线角色绑定一个模型实例

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StormResult;

pub mod client;

/// 模型档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// 快速模型（对应配置中的 model_efficient）
    Fast,
    /// 高质量模型（对应配置中的 model_powerful）
    Strong,
}

/// 模型构造参数，构造后只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model: String,
    pub tier: ModelTier,
    pub max_tokens: u64,
    pub temperature: f64,
    pub top_p: f64,
}

/// 单轮补全接口
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn settings(&self) -> &ModelSettings;

    async fn complete(&self, prompt: &str) -> StormResult<String>;
}
