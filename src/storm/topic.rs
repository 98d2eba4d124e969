use crate::error::StormResult;
use crate::llm::LanguageModel;
use crate::storm::curation::truncate_chars;

/// 送给模型的原文最大字符数
pub const TOPIC_CONTEXT_CHARS: usize = 1000;

/// 让模型把一段文本概括成2-3个词的主题。返回值只做trim，不做其他校验
pub async fn extract_topic(article_text: &str, lm: &dyn LanguageModel) -> StormResult<String> {
    let prompt = format!(
        "Extract the main topic or subject from this text in 2-3 words:\n\n{}...\n\nTopic:",
        truncate_chars(article_text, TOPIC_CONTEXT_CHARS)
    );

    let response = lm.complete(&prompt).await?;
    Ok(response.trim().to_string())
}
