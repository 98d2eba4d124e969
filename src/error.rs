//! 统一的错误类型 - 流水线各层共享的失败分类

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StormError {
    /// 凭据缺失（环境变量或配置中未设置）
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// 上游服务拒绝了凭据
    #[error("{provider} rejected the credential: {message}")]
    Credential { provider: String, message: String },

    /// 上游模型或搜索服务调用失败（重试后仍失败）
    #[error("{provider} request failed: {message}")]
    Upstream { provider: String, message: String },

    /// 工作目录读写失败
    #[error("workspace error at {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// 某个阶段产出了无法继续使用的结果
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl StormError {
    pub fn workspace(path: &Path, source: impl Into<std::io::Error>) -> Self {
        StormError::Workspace {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl ToString) -> Self {
        StormError::Upstream {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// 是否值得调用方稍后重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, StormError::Upstream { .. })
    }
}

pub type StormResult<T> = Result<T, StormError>;
