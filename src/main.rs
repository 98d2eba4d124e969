use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use storm_gateway::cli::Args;
use storm_gateway::serve;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.into_config()?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    tracing::info!(
        "⚙️ 模型: {} ({} / {})",
        config.llm.provider,
        config.llm.model_efficient,
        config.llm.model_powerful
    );
    if config.workspace.retain_artifacts {
        tracing::info!("📁 已开启产物保留，工作目录不会被删除");
    }

    serve(&config).await
}
