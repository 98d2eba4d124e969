// 多视角调研写作流水线
// 调研（curation）：每个视角模拟 提问 -> 检索 -> 回答 的多轮对话，产出资料表
// 大纲（outline）：先按主题直接生成草稿大纲，再结合调研对话细化
// 正文（article）：按一级章节挑选相关资料并行撰写，行内引用 [n]
// 润色（polish）：生成摘要段落置于文章开头

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StormError, StormResult};

pub mod article;
pub mod curation;
pub mod factory;
pub mod lm_configs;
pub mod outline;
pub mod runner;
pub mod topic;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::{ModelBackend, ProviderBackend, StormRunnerFactory};
pub use lm_configs::{ModelRole, StormLMConfigs};
pub use runner::{RunOptions, RunnerArguments, StormRunner};
pub use workspace::Workspace;

pub(crate) fn write_text(path: &Path, content: &str) -> StormResult<()> {
    std::fs::write(path, content).map_err(|e| StormError::workspace(path, e))
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StormResult<()> {
    let content =
        serde_json::to_string_pretty(value).map_err(|e| StormError::workspace(path, e))?;
    write_text(path, &content)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StormResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| StormError::workspace(path, e))?;
    serde_json::from_str(&content).map_err(|e| StormError::workspace(path, e))
}
