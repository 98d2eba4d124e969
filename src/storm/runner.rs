use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{StormError, StormResult};
use crate::retrieval::Retriever;
use crate::storm::article::{self, ARTICLE_FILE};
use crate::storm::curation::{InformationTable, KnowledgeCurator};
use crate::storm::lm_configs::StormLMConfigs;
use crate::storm::outline::{self, OUTLINE_FILE, Outline};
use crate::storm::workspace::{CONVERSATION_LOG_FILE, topic_dir};
use crate::storm::write_json;

pub const RUN_CONFIG_FILE: &str = "run_config.json";

/// 流水线运行参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerArguments {
    /// 输出根目录（工作目录）
    pub output_dir: PathBuf,
    pub max_conv_turn: usize,
    pub max_perspective: usize,
    /// 每个查询的检索结果数，为0表示不检索
    pub search_top_k: usize,
    pub max_thread_num: usize,
    pub retrieve_top_k: usize,
}

/// 本次运行需要执行的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub do_research: bool,
    pub do_generate_outline: bool,
    pub do_generate_article: bool,
    pub do_polish_article: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            do_research: true,
            do_generate_outline: true,
            do_generate_article: true,
            do_polish_article: true,
        }
    }
}

#[derive(Serialize)]
struct RunRecord<'a> {
    topic: &'a str,
    args: &'a RunnerArguments,
    do_research: bool,
    do_generate_outline: bool,
    do_generate_article: bool,
    do_polish_article: bool,
    finished_at: chrono::DateTime<Utc>,
}

pub struct StormRunner {
    pub args: RunnerArguments,
    pub lm_configs: StormLMConfigs,
    pub retriever: Option<Arc<dyn Retriever>>,
}

impl StormRunner {
    pub fn new(
        args: RunnerArguments,
        lm_configs: StormLMConfigs,
        retriever: Option<Arc<dyn Retriever>>,
    ) -> Self {
        Self {
            args,
            lm_configs,
            retriever,
        }
    }

    fn curator(&self) -> KnowledgeCurator<'_> {
        KnowledgeCurator::new(&self.lm_configs, self.retriever.as_deref(), &self.args)
    }

    /// 准备主题目录（已存在时不覆盖对话日志）
    fn prepare_topic_dir(&self, topic: &str) -> StormResult<PathBuf> {
        if topic.trim().is_empty() {
            let dir = topic_dir(&self.args.output_dir, topic)?;
            std::fs::create_dir_all(&dir).map_err(|e| StormError::workspace(&dir, e))?;
            return Ok(dir);
        }
        crate::storm::workspace::setup_topic_directory(&self.args.output_dir, topic)
    }

    /// 仅执行调研阶段，可附带一篇需要查找来源的草稿
    pub async fn run_knowledge_curation_module(
        &self,
        topic: &str,
        article_text: Option<&str>,
    ) -> StormResult<InformationTable> {
        let dir = self.prepare_topic_dir(topic)?;
        self.curator().research(topic, article_text, &dir).await
    }

    /// 依次执行启用的阶段，返回最终文章。未启用的阶段从主题目录读取其产物
    pub async fn run(&self, topic: &str, options: RunOptions) -> StormResult<String> {
        tracing::info!("🚀 开始执行流水线: {}", topic);
        let dir = self.prepare_topic_dir(topic)?;

        let information_table = if options.do_research {
            self.curator().research(topic, None, &dir).await?
        } else {
            InformationTable::load(&dir.join(CONVERSATION_LOG_FILE))?
        };

        let outline = if options.do_generate_outline {
            outline::generate_outline(
                self.lm_configs.outline_gen_lm.as_ref(),
                topic,
                &information_table,
                &dir,
            )
            .await?
        } else {
            Outline::load(&dir.join(OUTLINE_FILE))?
        };

        let mut article_text = if options.do_generate_article {
            article::generate_article(
                self.lm_configs.article_gen_lm.as_ref(),
                topic,
                &outline,
                &information_table,
                self.args.retrieve_top_k,
                self.args.max_thread_num,
                &dir,
            )
            .await?
        } else {
            let path = dir.join(ARTICLE_FILE);
            std::fs::read_to_string(&path).map_err(|e| StormError::workspace(&path, e))?
        };

        if options.do_polish_article {
            article_text = article::polish_article(
                self.lm_configs.article_polish_lm.as_ref(),
                topic,
                &article_text,
                &dir,
            )
            .await?;
        }

        write_json(
            &dir.join(RUN_CONFIG_FILE),
            &RunRecord {
                topic,
                args: &self.args,
                do_research: options.do_research,
                do_generate_outline: options.do_generate_outline,
                do_generate_article: options.do_generate_article,
                do_polish_article: options.do_polish_article,
                finished_at: Utc::now(),
            },
        )?;

        tracing::info!("✓ 流水线执行完毕: {}", topic);
        Ok(article_text)
    }
}
