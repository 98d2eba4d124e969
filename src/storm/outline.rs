//! 大纲生成阶段

use std::path::Path;

use crate::error::{StormError, StormResult};
use crate::llm::LanguageModel;
use crate::storm::curation::InformationTable;
use crate::storm::write_text;

pub const DIRECT_OUTLINE_FILE: &str = "direct_gen_outline.txt";
pub const OUTLINE_FILE: &str = "storm_gen_outline.txt";

const MAX_TRANSCRIPT_CHARS: usize = 12_000;

/// 以markdown标题表示的文章大纲
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    headings: Vec<String>,
}

/// 一级章节及其下属的子标题
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineSection {
    pub title: String,
    pub subheadings: Vec<String>,
}

impl Outline {
    /// 只保留以 # 开头的行
    pub fn parse(text: &str) -> StormResult<Self> {
        let headings: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with('#') && !line.trim_start_matches('#').trim().is_empty())
            .map(str::to_string)
            .collect();

        if headings.is_empty() {
            return Err(StormError::Pipeline(
                "outline contains no headings".to_string(),
            ));
        }
        Ok(Self { headings })
    }

    pub fn load(path: &Path) -> StormResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StormError::workspace(path, e))?;
        Self::parse(&text)
    }

    pub fn to_markdown(&self) -> String {
        self.headings.join("\n")
    }

    /// 按一级标题切分章节。若大纲没有一级标题，则把最浅一级视为章节
    pub fn sections(&self) -> Vec<OutlineSection> {
        let top_level = self
            .headings
            .iter()
            .map(|h| heading_level(h))
            .min()
            .unwrap_or(1);

        let mut sections: Vec<OutlineSection> = Vec::new();
        for heading in &self.headings {
            let title = heading.trim_start_matches('#').trim().to_string();
            if heading_level(heading) == top_level {
                sections.push(OutlineSection {
                    title,
                    subheadings: Vec::new(),
                });
            } else if let Some(current) = sections.last_mut() {
                current.subheadings.push(title);
            }
        }
        sections
    }
}

fn heading_level(heading: &str) -> usize {
    heading.chars().take_while(|c| *c == '#').count()
}

/// 先直接生成草稿大纲，再结合调研对话细化
pub async fn generate_outline(
    lm: &dyn LanguageModel,
    topic: &str,
    information_table: &InformationTable,
    topic_dir: &Path,
) -> StormResult<Outline> {
    tracing::info!("📝 生成大纲: {}", topic);

    let draft_prompt = format!(
        "Write an outline for a Wikipedia page.\n\
Here is the format of your writing:\n\
1. Use \"# Title\" to indicate section title, \"## Title\" to indicate subsection title, \"### Title\" to indicate subsubsection title, and so on.\n\
2. Do not include other information.\n\
3. Do not include topic name itself in the outline.\n\n\
The topic you want to write: {}\nWrite the Wikipedia page outline:",
        topic
    );
    let draft_text = lm.complete(&draft_prompt).await?;
    let draft = Outline::parse(&draft_text)?;
    write_text(&topic_dir.join(DIRECT_OUTLINE_FILE), &draft.to_markdown())?;

    let transcript = information_table.transcript();
    if transcript.trim().is_empty() {
        write_text(&topic_dir.join(OUTLINE_FILE), &draft.to_markdown())?;
        return Ok(draft);
    }

    let refine_prompt = format!(
        "Improve an outline for a Wikipedia page. You already have a draft outline that covers the general information. \
Now you want to improve it based on the information learned from an information-seeking conversation to make it more informative.\n\
Here is the format of your writing:\n\
1. Use \"# Title\" to indicate section title, \"## Title\" to indicate subsection title, \"### Title\" to indicate subsubsection title, and so on.\n\
2. Do not include other information.\n\
3. Do not include topic name itself in the outline.\n\n\
Topic you want to write: {}\n\nConversation history:\n{}\n\nCurrent outline:\n{}\n\nWrite the Wikipedia page outline:",
        topic,
        crate::storm::curation::truncate_chars(&transcript, MAX_TRANSCRIPT_CHARS),
        draft.to_markdown()
    );
    let refined_text = lm.complete(&refine_prompt).await?;
    let outline = match Outline::parse(&refined_text) {
        Ok(outline) => outline,
        Err(e) => {
            tracing::warn!("⚠️ 细化大纲无效，使用草稿大纲: {}", e);
            draft
        }
    };
    write_text(&topic_dir.join(OUTLINE_FILE), &outline.to_markdown())?;

    tracing::info!("✓ 大纲生成完成: {} 个章节", outline.sections().len());
    Ok(outline)
}
