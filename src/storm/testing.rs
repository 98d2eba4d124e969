//! 单元测试用的脚本化模型与检索器

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{StormError, StormResult};
use crate::llm::{LanguageModel, ModelSettings};
use crate::retrieval::{Information, Retriever};
use crate::storm::curation::CONVERSATION_END;
use crate::storm::lm_configs::{ModelRole, StormLMConfigs};

type Responder = Box<dyn Fn(&str) -> StormResult<String> + Send + Sync>;

pub struct ScriptedModel {
    settings: ModelSettings,
    respond: Responder,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(
        role: ModelRole,
        respond: impl Fn(&str) -> StormResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            settings: ModelSettings {
                model: format!("scripted-{}", role),
                tier: role.tier(),
                max_tokens: role.max_tokens(),
                temperature: 1.0,
                top_p: 0.9,
            },
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    async fn complete(&self, prompt: &str) -> StormResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }
}

/// 模拟一次完整流水线的五个角色
pub fn scripted_role(role: ModelRole) -> ScriptedModel {
    match role {
        ModelRole::QuestionAsker => ScriptedModel::new(role, |prompt| {
            if prompt.contains("select a group of Wikipedia editors") {
                Ok("1. Physicist: studies qubits\n2. Historian: history of computing\n3. Investor: market view".to_string())
            } else if prompt.contains("\nYou: ") {
                Ok(CONVERSATION_END.to_string())
            } else {
                Ok("What is the history of quantum computing?".to_string())
            }
        }),
        ModelRole::ConvSimulator => ScriptedModel::new(role, |prompt| {
            if prompt.contains("Queries:") {
                Ok("- quantum computing history\n- first quantum computer".to_string())
            } else if prompt.contains("Extract the main topic") {
                Ok("  Quantum Computing \n".to_string())
            } else {
                Ok("It began with Feynman's proposal in 1981 [1].".to_string())
            }
        }),
        ModelRole::OutlineGen => ScriptedModel::new(role, |_| {
            Ok("# Introduction\n# History\n## Early proposals\n# Applications".to_string())
        }),
        ModelRole::ArticleGen => {
            ScriptedModel::new(role, |_| Ok("The history of qubits is long [1].".to_string()))
        }
        ModelRole::ArticlePolish => {
            ScriptedModel::new(role, |_| Ok("Quantum computing uses qubits [1].".to_string()))
        }
    }
}

pub fn scripted_lm_configs() -> StormLMConfigs {
    StormLMConfigs::build_with(|role| Ok(Arc::new(scripted_role(role)) as Arc<dyn LanguageModel>))
        .unwrap()
}

/// 所有角色都返回上游错误
pub fn failing_lm_configs() -> StormLMConfigs {
    StormLMConfigs::build_with(|role| {
        Ok(Arc::new(ScriptedModel::new(role, |_| {
            Err(StormError::upstream("openai", "429 Too Many Requests"))
        })) as Arc<dyn LanguageModel>)
    })
    .unwrap()
}

/// 每个查询返回一条固定结果的检索器
pub struct StaticRetriever {
    pub k: usize,
    pub queries: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn top_k(&self) -> usize {
        self.k
    }

    async fn search(
        &self,
        queries: &[String],
        exclude_urls: &[String],
    ) -> StormResult<Vec<Information>> {
        self.queries.lock().unwrap().extend(queries.iter().cloned());
        let results = queries
            .iter()
            .map(|q| Information {
                url: format!("https://example.com/{}", q.replace(' ', "-")),
                title: q.clone(),
                description: format!("About {}", q),
                snippets: vec![format!("{} history snippet", q)],
            })
            .collect();
        Ok(crate::retrieval::exclude_and_dedup(results, exclude_urls))
    }
}
