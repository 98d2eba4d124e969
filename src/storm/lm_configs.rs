use std::fmt::Display;
use std::sync::Arc;

use crate::error::StormResult;
use crate::llm::client::LLMClient;
use crate::llm::{LanguageModel, ModelTier};

/// 流水线中的模型角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    ConvSimulator,
    QuestionAsker,
    OutlineGen,
    ArticleGen,
    ArticlePolish,
}

impl ModelRole {
    pub const ALL: [ModelRole; 5] = [
        ModelRole::ConvSimulator,
        ModelRole::QuestionAsker,
        ModelRole::OutlineGen,
        ModelRole::ArticleGen,
        ModelRole::ArticlePolish,
    ];

    pub fn tier(self) -> ModelTier {
        match self {
            ModelRole::ConvSimulator | ModelRole::QuestionAsker => ModelTier::Fast,
            ModelRole::OutlineGen | ModelRole::ArticleGen | ModelRole::ArticlePolish => {
                ModelTier::Strong
            }
        }
    }

    /// 角色的输出token上限
    pub fn max_tokens(self) -> u64 {
        match self {
            ModelRole::ConvSimulator => 500,
            ModelRole::QuestionAsker => 500,
            ModelRole::OutlineGen => 400,
            ModelRole::ArticleGen => 700,
            ModelRole::ArticlePolish => 4000,
        }
    }
}

impl Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            ModelRole::ConvSimulator => "conv_simulator",
            ModelRole::QuestionAsker => "question_asker",
            ModelRole::OutlineGen => "outline_gen",
            ModelRole::ArticleGen => "article_gen",
            ModelRole::ArticlePolish => "article_polish",
        };
        write!(f, "{}", str)
    }
}

/// 五个角色绑定的模型
#[derive(Clone)]
pub struct StormLMConfigs {
    pub conv_simulator_lm: Arc<dyn LanguageModel>,
    pub question_asker_lm: Arc<dyn LanguageModel>,
    pub outline_gen_lm: Arc<dyn LanguageModel>,
    pub article_gen_lm: Arc<dyn LanguageModel>,
    pub article_polish_lm: Arc<dyn LanguageModel>,
}

impl StormLMConfigs {
    /// 逐个角色调用 build 构造模型
    pub fn build_with<F>(mut build: F) -> StormResult<Self>
    where
        F: FnMut(ModelRole) -> StormResult<Arc<dyn LanguageModel>>,
    {
        Ok(Self {
            conv_simulator_lm: build(ModelRole::ConvSimulator)?,
            question_asker_lm: build(ModelRole::QuestionAsker)?,
            outline_gen_lm: build(ModelRole::OutlineGen)?,
            article_gen_lm: build(ModelRole::ArticleGen)?,
            article_polish_lm: build(ModelRole::ArticlePolish)?,
        })
    }

    /// 基于provider客户端，按角色表构造模型。
    /// rig构建agent时会 `tokio::spawn`，必须在Tokio运行时内调用
    pub fn from_client(client: &LLMClient) -> Self {
        let build = |role: ModelRole| -> Arc<dyn LanguageModel> {
            Arc::new(client.model(role.tier(), role.max_tokens()))
        };
        Self {
            conv_simulator_lm: build(ModelRole::ConvSimulator),
            question_asker_lm: build(ModelRole::QuestionAsker),
            outline_gen_lm: build(ModelRole::OutlineGen),
            article_gen_lm: build(ModelRole::ArticleGen),
            article_polish_lm: build(ModelRole::ArticlePolish),
        }
    }

    pub fn get(&self, role: ModelRole) -> &Arc<dyn LanguageModel> {
        match role {
            ModelRole::ConvSimulator => &self.conv_simulator_lm,
            ModelRole::QuestionAsker => &self.question_asker_lm,
            ModelRole::OutlineGen => &self.outline_gen_lm,
            ModelRole::ArticleGen => &self.article_gen_lm,
            ModelRole::ArticlePolish => &self.article_polish_lm,
        }
    }
}
