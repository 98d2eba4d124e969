use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// 模型凭据的环境变量
pub const LLM_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// 搜索凭据的环境变量
pub const SEARCH_API_KEY_ENV: &str = "YDC_API_KEY";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl LLMProvider {
    /// 是否需要API KEY
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP服务配置
    pub server: ServerConfig,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 网络搜索配置
    pub search: SearchConfig,

    /// 流水线运行参数
    pub runner: RunnerConfig,

    /// 临时工作目录配置
    pub workspace: WorkspaceConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// 请求体大小上限（字节）
    pub max_body_bytes: usize,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 快速模型，用于对话模拟和提问
    pub model_efficient: String,

    /// 高质量模型，用于大纲、正文生成和润色
    pub model_powerful: String,

    /// 温度
    pub temperature: f64,

    /// nucleus sampling
    pub top_p: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
}

/// 网络搜索（You.com）配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,

    pub api_base_url: String,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// 流水线运行参数
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// 每个视角的最大对话轮数
    pub max_conv_turn: usize,

    /// 最多生成的编辑视角数（不含默认视角）
    pub max_perspective: usize,

    /// 同时进行的对话/章节数
    pub max_thread_num: usize,

    /// 每个章节引用的资料条数
    pub retrieve_top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// 临时目录的父目录，None时使用系统临时目录
    pub root: Option<PathBuf>,

    /// 请求结束后保留工作目录（用于排查问题）
    pub retain_artifacts: bool,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8000,
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var(LLM_API_KEY_ENV).unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model_efficient: String::from("gpt-3.5-turbo"),
            model_powerful: String::from("gpt-4"),
            temperature: 1.0,
            top_p: 0.9,
            retry_attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(SEARCH_API_KEY_ENV).unwrap_or_default(),
            api_base_url: String::from("https://api.ydc-index.io/search"),
            timeout_seconds: 30,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_conv_turn: 3,
            max_perspective: 3,
            max_thread_num: 3,
            retrieve_top_k: 3,
        }
    }
}
