//! 知识整理阶段：多视角模拟对话 + 网络检索

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use futures::{StreamExt, TryStreamExt, stream};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StormResult;
use crate::retrieval::{Information, Retriever};
use crate::storm::lm_configs::StormLMConfigs;
use crate::storm::runner::RunnerArguments;
use crate::storm::{read_json, write_json};

pub const RAW_SEARCH_RESULTS_FILE: &str = "raw_search_results.json";

/// 对话结束语
pub const CONVERSATION_END: &str = "Thank you so much for your help!";

const DEFAULT_PERSPECTIVE: &str = "Basic fact writer: Basic fact writer focusing on broadly covering the basic facts about the topic.";
/// 模型没有给出回答时记录的回复
pub const NO_ANSWER: &str =
    "Sorry, I cannot find information for this question. Please ask another question.";
const MAX_SEARCH_QUERIES_PER_TURN: usize = 3;
const MAX_DRAFT_CONTEXT_CHARS: usize = 2000;

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*(\S.*?)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub user_utterance: String,
    pub agent_utterance: String,
    #[serde(default)]
    pub search_queries: Vec<String>,
    #[serde(default)]
    pub search_results: Vec<Information>,
}

/// 一个视角下的完整对话，对应 conversation_log.json 中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub perspective: String,
    pub dlg_turns: Vec<DialogueTurn>,
}

/// 调研产出：所有对话以及按URL去重后的资料列表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InformationTable {
    pub conversations: Vec<Conversation>,
    pub results: Vec<Information>,
}

impl InformationTable {
    /// 合并所有对话中的检索结果，同一URL的片段归并到首次出现的位置
    pub fn from_conversations(conversations: Vec<Conversation>) -> Self {
        let mut results: Vec<Information> = Vec::new();
        let mut index_by_url: HashMap<String, usize> = HashMap::new();

        for turn in conversations.iter().flat_map(|c| c.dlg_turns.iter()) {
            for info in &turn.search_results {
                match index_by_url.get(&info.url) {
                    Some(&idx) => {
                        let existing = &mut results[idx];
                        for snippet in &info.snippets {
                            if !existing.snippets.contains(snippet) {
                                existing.snippets.push(snippet.clone());
                            }
                        }
                    }
                    None => {
                        index_by_url.insert(info.url.clone(), results.len());
                        results.push(info.clone());
                    }
                }
            }
        }

        Self {
            conversations,
            results,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// 所有对话拼接成的文本，用于大纲生成
    pub fn transcript(&self) -> String {
        let mut content = String::new();
        for conversation in &self.conversations {
            for turn in &conversation.dlg_turns {
                content.push_str(&format!(
                    "Wikipedia Writer: {}\nExpert: {}\n",
                    turn.user_utterance, turn.agent_utterance
                ));
            }
        }
        content
    }

    /// 从对话日志恢复
    pub fn load(log_path: &Path) -> StormResult<Self> {
        let conversations: Vec<Conversation> = read_json(log_path)?;
        Ok(Self::from_conversations(conversations))
    }
}

/// 多视角调研执行器
pub struct KnowledgeCurator<'a> {
    lm_configs: &'a StormLMConfigs,
    retriever: Option<&'a dyn Retriever>,
    args: &'a RunnerArguments,
}

impl<'a> KnowledgeCurator<'a> {
    pub fn new(
        lm_configs: &'a StormLMConfigs,
        retriever: Option<&'a dyn Retriever>,
        args: &'a RunnerArguments,
    ) -> Self {
        Self {
            lm_configs,
            retriever,
            args,
        }
    }

    /// 执行调研，并把对话日志和原始检索结果写入主题目录
    pub async fn research(
        &self,
        topic: &str,
        draft: Option<&str>,
        topic_dir: &Path,
    ) -> StormResult<InformationTable> {
        tracing::info!("🔍 开始调研主题: {}", topic);

        let perspectives = self.generate_perspectives(topic, draft).await?;
        tracing::debug!("已生成 {} 个视角", perspectives.len());

        let pending: Vec<_> = perspectives
            .into_iter()
            .map(|perspective| self.converse(topic, perspective, draft))
            .collect();
        let conversations: Vec<Conversation> = stream::iter(pending)
            .buffered(self.args.max_thread_num.max(1))
            .try_collect()
            .await?;

        let table = InformationTable::from_conversations(conversations);

        write_json(
            &topic_dir.join(crate::storm::workspace::CONVERSATION_LOG_FILE),
            &table.conversations,
        )?;
        write_json(&topic_dir.join(RAW_SEARCH_RESULTS_FILE), &table.results)?;

        tracing::info!(
            "✓ 调研完成: {} 段对话, {} 条资料",
            table.conversations.len(),
            table.results.len()
        );
        Ok(table)
    }

    /// 生成编辑视角，默认视角始终排在第一位
    async fn generate_perspectives(
        &self,
        topic: &str,
        draft: Option<&str>,
    ) -> StormResult<Vec<String>> {
        let mut perspectives = vec![DEFAULT_PERSPECTIVE.to_string()];
        if self.args.max_perspective == 0 {
            return Ok(perspectives);
        }

        let mut prompt = format!(
            "You need to select a group of Wikipedia editors who will work together to create a comprehensive article on the topic. \
Each of them represents a different perspective, role, or affiliation related to this topic. \
Give at most {} editors, one per line, in the format:\n1. short summary of editor 1: description\n2. short summary of editor 2: description\n...\n\n\
Topic of interest: {}\n",
            self.args.max_perspective, topic
        );
        if let Some(draft) = draft {
            prompt.push_str(&format!(
                "\nAn existing draft about the topic, for reference:\n{}\n",
                truncate_chars(draft, MAX_DRAFT_CONTEXT_CHARS)
            ));
        }

        let response = self.lm_configs.question_asker_lm.complete(&prompt).await?;
        perspectives.extend(
            parse_numbered_list(&response)
                .into_iter()
                .take(self.args.max_perspective),
        );
        Ok(perspectives)
    }

    /// 单个视角下的提问-检索-回答循环
    async fn converse(
        &self,
        topic: &str,
        perspective: String,
        draft: Option<&str>,
    ) -> StormResult<Conversation> {
        let mut dlg_turns: Vec<DialogueTurn> = Vec::new();

        for _ in 0..self.args.max_conv_turn {
            let question = self
                .ask_question(topic, &perspective, draft, &dlg_turns)
                .await?;
            if question.is_empty() || question.starts_with(CONVERSATION_END) {
                break;
            }

            let search_queries = self.generate_queries(topic, &question).await?;
            // 同一视角内已引用过的URL不再重复检索
            let seen_urls: Vec<String> = dlg_turns
                .iter()
                .flat_map(|t| t.search_results.iter().map(|r| r.url.clone()))
                .collect();
            let search_results = self.search(&search_queries, &seen_urls).await?;
            let answer = self
                .answer_question(topic, &question, &search_results)
                .await?;

            dlg_turns.push(DialogueTurn {
                user_utterance: question,
                agent_utterance: answer,
                search_queries,
                search_results,
            });
        }

        Ok(Conversation {
            perspective,
            dlg_turns,
        })
    }

    async fn ask_question(
        &self,
        topic: &str,
        perspective: &str,
        draft: Option<&str>,
        history: &[DialogueTurn],
    ) -> StormResult<String> {
        let mut conversation = String::new();
        for turn in history {
            conversation.push_str(&format!(
                "You: {}\nExpert: {}\n",
                turn.user_utterance, turn.agent_utterance
            ));
        }
        if conversation.is_empty() {
            conversation.push_str("N/A");
        }

        let mut prompt = format!(
            "You are an experienced Wikipedia writer and want to edit a specific page. \
Besides your identity as a Wikipedia writer, you have a specific focus when researching the topic.\n\
Now, you are chatting with an expert to get information. Ask good questions to get more useful information.\n\
When you have no more question to ask, say \"{}\" to end the conversation.\n\
Please only ask one question at a time and don't ask what you have asked before. \
Your questions should be related to the topic you want to write.\n\n\
Topic you want to write: {}\nYour persona besides being a Wikipedia writer: {}\n",
            CONVERSATION_END, topic, perspective
        );
        if let Some(draft) = draft {
            prompt.push_str(&format!(
                "The claims of this draft need supporting sources:\n{}\n",
                truncate_chars(draft, MAX_DRAFT_CONTEXT_CHARS)
            ));
        }
        prompt.push_str(&format!("Conversation history:\n{}\n\nQuestion:", conversation));

        let response = self.lm_configs.question_asker_lm.complete(&prompt).await?;
        Ok(response.trim().to_string())
    }

    async fn generate_queries(&self, topic: &str, question: &str) -> StormResult<Vec<String>> {
        let prompt = format!(
            "You want to answer the question using Google search. What do you type in the search box?\n\
Write the queries you will use in the following format:\n- query 1\n- query 2\n...\n\n\
Topic you are discussing about: {}\nQuestion you want to answer: {}\nQueries:",
            topic, question
        );
        let response = self.lm_configs.conv_simulator_lm.complete(&prompt).await?;

        let mut queries = parse_bullet_list(&response);
        if queries.is_empty() {
            queries.push(question.to_string());
        }
        queries.truncate(MAX_SEARCH_QUERIES_PER_TURN);
        Ok(queries)
    }

    async fn search(
        &self,
        queries: &[String],
        exclude_urls: &[String],
    ) -> StormResult<Vec<Information>> {
        match self.retriever {
            Some(retriever) if self.args.search_top_k > 0 => {
                retriever.search(queries, exclude_urls).await
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn answer_question(
        &self,
        topic: &str,
        question: &str,
        search_results: &[Information],
    ) -> StormResult<String> {
        let prompt = if search_results.is_empty() {
            format!(
                "You are an expert who can use information effectively. You are chatting with a Wikipedia writer who wants to write a Wikipedia page on a topic you know. \
Answer the question as informatively as you can.\n\n\
Topic you are discussing about: {}\nQuestion: {}\nAnswer:",
                topic, question
            )
        } else {
            let mut gathered = String::new();
            for (i, info) in search_results.iter().enumerate() {
                gathered.push_str(&format!("[{}]: {}\n", i + 1, info.primary_snippet()));
            }
            format!(
                "You are an expert who can use information effectively. You are chatting with a Wikipedia writer who wants to write a Wikipedia page on a topic you know. \
You have gathered the related information and will now use the information to form a response.\n\
Make your response as informative as possible and make sure every sentence is supported by the gathered information. \
Use [1], [2], ..., [n] in line to indicate the source.\n\n\
Topic you are discussing about: {}\nQuestion: {}\nGathered information:\n{}\nNow give your response:",
                topic, question, gathered
            )
        };

        let response = self.lm_configs.conv_simulator_lm.complete(&prompt).await?;
        let answer = response.trim();
        if answer.is_empty() {
            tracing::warn!("⚠️ 专家回答为空，使用默认回复: {}", question);
            return Ok(NO_ANSWER.to_string());
        }
        Ok(answer.to_string())
    }
}

/// 解析 "1. xxx" 形式的编号列表
pub fn parse_numbered_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| NUMBERED_LINE.captures(line))
        .map(|caps| caps[1].to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// 解析 "- xxx" 形式的列表
pub fn parse_bullet_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-').or_else(|| line.strip_prefix('*')))
        .map(|item| item.trim().trim_matches('"').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// 按字符截断
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
