use crate::config::{Config, LLMProvider};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "storm.toml";

/// storm-gateway - 多视角调研与文章生成服务
#[derive(Parser, Debug)]
#[command(name = "storm-gateway")]
#[command(
    about = "HTTP service that researches a topic from multiple perspectives, outlines, drafts and polishes an article, and finds citations for existing text."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 监听地址
    #[arg(long)]
    pub host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    pub port: Option<u16>,

    /// LLM Provider (openai, deepseek, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 快速模型，用于对话模拟和提问
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于大纲、正文和润色
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 搜索服务 API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 临时工作目录的父目录
    #[arg(long)]
    pub workspace_root: Option<PathBuf>,

    /// 请求结束后保留工作目录
    #[arg(long)]
    pub retain_artifacts: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)
                .context(format!("Failed to load config file {:?}", config_path))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        // 服务配置
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(e) => bail!(e),
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        if let Some(search_api_key) = self.search_api_key {
            config.search.api_key = search_api_key;
        }

        // 工作目录配置
        if let Some(root) = self.workspace_root {
            config.workspace.root = Some(root);
        }
        if self.retain_artifacts {
            config.workspace.retain_artifacts = true;
        }

        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
