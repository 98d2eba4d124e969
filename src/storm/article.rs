//! 正文生成与润色阶段

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;

use crate::error::{StormError, StormResult};
use crate::llm::LanguageModel;
use crate::retrieval::Information;
use crate::storm::curation::InformationTable;
use crate::storm::outline::{Outline, OutlineSection};
use crate::storm::write_json;
use crate::storm::write_text;

pub const ARTICLE_FILE: &str = "storm_gen_article.txt";
pub const POLISHED_ARTICLE_FILE: &str = "storm_gen_article_polished.txt";
pub const URL_TO_INFO_FILE: &str = "url_to_info.json";


const MAX_ARTICLE_CONTEXT_CHARS: usize = 16_000;

/// url_to_info.json 的内容：URL 到引用编号（从1开始）以及 URL 到资料
#[derive(Debug, Serialize)]
pub struct UrlToInfo<'a> {
    pub url_to_unified_index: BTreeMap<&'a str, usize>,
    pub url_to_info: BTreeMap<&'a str, &'a Information>,
}

pub fn url_to_info(results: &[Information]) -> UrlToInfo<'_> {
    UrlToInfo {
        url_to_unified_index: results
            .iter()
            .enumerate()
            .map(|(i, info)| (info.url.as_str(), i + 1))
            .collect(),
        url_to_info: results.iter().map(|info| (info.url.as_str(), info)).collect(),
    }
}

/// 按关键词重合度选出与章节最相关的资料，返回 (引用编号, 资料)
pub fn select_relevant<'a>(
    section: &OutlineSection,
    results: &'a [Information],
    top_k: usize,
) -> Vec<(usize, &'a Information)> {
    let query_terms: HashSet<String> = std::iter::once(section.title.as_str())
        .chain(section.subheadings.iter().map(|s| s.as_str()))
        .flat_map(tokenize)
        .collect();

    let mut scored: Vec<(usize, usize, &Information)> = results
        .iter()
        .enumerate()
        .map(|(i, info)| {
            let text = format!("{} {} {}", info.title, info.description, info.snippets.join(" "));
            let score = tokenize(&text)
                .into_iter()
                .collect::<HashSet<_>>()
                .intersection(&query_terms)
                .count();
            (score, i + 1, info)
        })
        .filter(|(score, _, _)| *score > 0)
        .collect();

    // 分数降序，同分保持原始顺序
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(top_k)
        .map(|(_, idx, info)| (idx, info))
        .collect()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

/// 引言、结论和总结章节由润色阶段的摘要代替
fn is_skipped(section: &OutlineSection) -> bool {
    let title = section.title.trim().to_lowercase();
    title == "introduction" || title.starts_with("conclusion") || title.starts_with("summary")
}

/// 按大纲逐章节生成正文，章节并发数受 max_thread_num 限制
pub async fn generate_article(
    lm: &dyn LanguageModel,
    topic: &str,
    outline: &Outline,
    information_table: &InformationTable,
    retrieve_top_k: usize,
    max_thread_num: usize,
    topic_dir: &Path,
) -> StormResult<String> {
    tracing::info!("🤖 生成正文: {}", topic);

    let all_sections = outline.sections();
    let mut sections: Vec<OutlineSection> = all_sections
        .iter()
        .filter(|s| !is_skipped(s))
        .cloned()
        .collect();
    if sections.is_empty() {
        // 大纲只有引言/结论时照常撰写这些章节
        tracing::warn!("⚠️ 大纲中没有正文章节，改为撰写全部章节");
        sections = all_sections;
    }

    let pending: Vec<_> = sections
        .iter()
        .map(|section| {
            let relevant = select_relevant(section, &information_table.results, retrieve_top_k);
            write_section(lm, topic, section, relevant)
        })
        .collect();
    let written: Vec<String> = stream::iter(pending)
        .buffered(max_thread_num.max(1))
        .try_collect()
        .await?;

    let article = written.join("\n\n");
    if article.trim().is_empty() {
        return Err(StormError::Pipeline(format!(
            "no article sections were generated for `{}`",
            topic
        )));
    }

    write_text(&topic_dir.join(ARTICLE_FILE), &article)?;
    write_json(
        &topic_dir.join(URL_TO_INFO_FILE),
        &url_to_info(&information_table.results),
    )?;

    tracing::info!("✓ 正文生成完成: {} 个章节", written.len());
    Ok(article)
}

async fn write_section(
    lm: &dyn LanguageModel,
    topic: &str,
    section: &OutlineSection,
    relevant: Vec<(usize, &Information)>,
) -> StormResult<String> {
    let mut collected = String::new();
    for (idx, info) in &relevant {
        collected.push_str(&format!("[{}]\n{}\n", idx, info.primary_snippet()));
    }
    if collected.is_empty() {
        collected.push_str("N/A");
    }

    let mut outline_hint = format!("# {}\n", section.title);
    for sub in &section.subheadings {
        outline_hint.push_str(&format!("## {}\n", sub));
    }

    let prompt = format!(
        "Write a Wikipedia section based on the collected information.\n\
Here is the format of your writing:\n\
1. Use \"# Title\" to indicate section title, \"## Title\" to indicate subsection title, and so on.\n\
2. Use [1], [2], ..., [n] in line (for example, \"The capital of the United States is Washington, D.C.[1][3].\"). \
Cite only the collected information; you do not need to include a References section.\n\n\
The collected information:\n{}\n\
The topic of the page: {}\nThe section you need to write:\n{}\n\
Write the section with proper inline citations (Start your writing with # section title. Don't include the page title or try to write other sections):",
        collected, topic, outline_hint
    );

    let text = lm.complete(&prompt).await?;
    let text = text.trim();
    if text.starts_with('#') {
        Ok(text.to_string())
    } else {
        Ok(format!("# {}\n\n{}", section.title, text))
    }
}

/// 生成摘要段落并置于文章开头
pub async fn polish_article(
    lm: &dyn LanguageModel,
    topic: &str,
    article: &str,
    topic_dir: &Path,
) -> StormResult<String> {
    tracing::info!("✨ 润色文章: {}", topic);

    let prompt = format!(
        "Write a lead section for the given Wikipedia page with the following guidelines:\n\
1. The lead should stand on its own as a concise overview of the article's topic. It should identify the topic, establish context, \
explain why the topic is notable, and summarize the most important points, including any prominent controversies.\n\
2. The lead section should be concise and contain no more than four well-composed paragraphs.\n\
3. The lead section should be carefully sourced as appropriate. Add inline citations (e.g., \"Washington, D.C., is the capital of the United States.[1][3].\") where necessary.\n\n\
The topic of the page: {}\n\nThe draft page:\n{}\n\n\
Write the lead section:",
        topic,
        crate::storm::curation::truncate_chars(article, MAX_ARTICLE_CONTEXT_CHARS)
    );

    let lead = lm.complete(&prompt).await?;
    let lead = lead.trim();
    // 模型有时会自带标题
    let lead = lead
        .strip_prefix("# summary")
        .or_else(|| lead.strip_prefix("# Summary"))
        .unwrap_or(lead)
        .trim();

    let polished = if lead.is_empty() {
        article.to_string()
    } else {
        format!("# summary\n{}\n\n{}", lead, article)
    };
    write_text(&topic_dir.join(POLISHED_ARTICLE_FILE), &polished)?;

    tracing::info!("✓ 润色完成");
    Ok(polished)
}
