use axum::{Json, extract::State};

use crate::server::AppState;
use crate::server::error::ApiError;
use crate::server::types::{
    Citation, CitationRequest, CitationResponse, GenerateRequest, GenerateResponse,
    HealthResponse,
};
use crate::storm::RunOptions;
use crate::storm::factory::DEFAULT_SEARCH_TOP_K;
use crate::storm::topic::extract_topic;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// 不启用检索，完整执行 调研 -> 大纲 -> 正文 -> (润色)
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    tracing::info!("📝 生成文章: {}", req.topic);

    let (runner, _workspace) = state
        .factory
        .create(false, DEFAULT_SEARCH_TOP_K, Some(&req.topic))?;
    let options = RunOptions {
        do_research: true,
        do_generate_outline: true,
        do_generate_article: true,
        do_polish_article: req.do_polish_article,
    };
    let article = runner.run(&req.topic, options).await?;

    Ok(Json(GenerateResponse {
        topic: req.topic,
        article,
    }))
}

/// 为已有文章检索来源。未提供主题时先用对话模型提取
pub async fn find_citations(
    State(state): State<AppState>,
    Json(req): Json<CitationRequest>,
) -> Result<Json<CitationResponse>, ApiError> {
    let topic = match req.explicit_topic() {
        Some(topic) => topic.to_string(),
        None => {
            // 只借用这个运行器的对话模型，工作目录随即释放
            let (extractor, _workspace) = state.factory.create(false, DEFAULT_SEARCH_TOP_K, None)?;
            let topic = extract_topic(
                &req.article_text,
                extractor.lm_configs.conv_simulator_lm.as_ref(),
            )
            .await?;
            tracing::info!("🔍 提取到主题: {}", topic);
            topic
        }
    };

    let (runner, _workspace) = state
        .factory
        .create(true, req.search_top_k, Some(&topic))?;
    let table = runner
        .run_knowledge_curation_module(&topic, Some(&req.article_text))
        .await?;

    let citations: Vec<Citation> = table.results.iter().map(Citation::from).collect();
    tracing::info!("✓ 找到 {} 条引用: {}", citations.len(), topic);

    Ok(Json(CitationResponse::new(topic, citations)))
}
