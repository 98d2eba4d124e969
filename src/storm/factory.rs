//! 流水线运行器工厂：工作目录 + 角色模型 + 可选检索 + 运行参数

use std::sync::Arc;

use crate::config::{Config, LLMConfig, RunnerConfig, SearchConfig, WorkspaceConfig};
use crate::error::StormResult;
use crate::llm::client::LLMClient;
use crate::retrieval::{Retriever, YouRetriever};
use crate::storm::lm_configs::StormLMConfigs;
use crate::storm::runner::{RunnerArguments, StormRunner};
use crate::storm::workspace::{Workspace, setup_topic_directory};

/// 未指定时每个查询的检索结果数
pub const DEFAULT_SEARCH_TOP_K: usize = 3;

/// 模型与检索服务的来源
pub trait ModelBackend: Send + Sync {
    fn lm_configs(&self) -> StormResult<StormLMConfigs>;

    fn retriever(&self, search_top_k: usize) -> StormResult<Arc<dyn Retriever>>;
}

/// 基于配置连接真实provider
pub struct ProviderBackend {
    llm: LLMConfig,
    search: SearchConfig,
}

impl ProviderBackend {
    pub fn new(llm: LLMConfig, search: SearchConfig) -> Self {
        Self { llm, search }
    }
}

impl ModelBackend for ProviderBackend {
    fn lm_configs(&self) -> StormResult<StormLMConfigs> {
        let client = LLMClient::new(self.llm.clone())?;
        Ok(StormLMConfigs::from_client(&client))
    }

    fn retriever(&self, search_top_k: usize) -> StormResult<Arc<dyn Retriever>> {
        Ok(Arc::new(YouRetriever::new(&self.search, search_top_k)?))
    }
}

#[derive(Clone)]
pub struct StormRunnerFactory {
    backend: Arc<dyn ModelBackend>,
    runner: RunnerConfig,
    workspace: WorkspaceConfig,
}

impl StormRunnerFactory {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        runner: RunnerConfig,
        workspace: WorkspaceConfig,
    ) -> Self {
        Self {
            backend,
            runner,
            workspace,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let backend = ProviderBackend::new(config.llm.clone(), config.search.clone());
        Self::new(
            Arc::new(backend),
            config.runner.clone(),
            config.workspace.clone(),
        )
    }

    /// 创建运行器及其独占的工作目录。
    /// 工作目录守卫需要保持存活直到流水线结束。
    pub fn create(
        &self,
        with_retrieval: bool,
        search_top_k: usize,
        topic: Option<&str>,
    ) -> StormResult<(StormRunner, Workspace)> {
        let lm_configs = self.backend.lm_configs()?;

        let retriever = if with_retrieval {
            Some(self.backend.retriever(search_top_k)?)
        } else {
            None
        };

        let workspace = Workspace::create(&self.workspace)?;
        if let Some(topic) = topic
            && !topic.is_empty()
        {
            setup_topic_directory(workspace.path(), topic)?;
        }

        let args = RunnerArguments {
            output_dir: workspace.path().to_path_buf(),
            max_conv_turn: self.runner.max_conv_turn,
            max_perspective: self.runner.max_perspective,
            search_top_k: if with_retrieval { search_top_k } else { 0 },
            max_thread_num: self.runner.max_thread_num,
            retrieve_top_k: self.runner.retrieve_top_k,
        };
        tracing::debug!(
            "创建运行器: retrieval={}, search_top_k={}, workspace={}",
            with_retrieval,
            args.search_top_k,
            workspace.path().display()
        );

        Ok((StormRunner::new(args, lm_configs, retriever), workspace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StormError;
    use crate::storm::testing::{StaticRetriever, scripted_lm_configs};
    use crate::storm::workspace::CONVERSATION_LOG_FILE;
    use tempfile::TempDir;

    struct ScriptedBackend;

    impl ModelBackend for ScriptedBackend {
        fn lm_configs(&self) -> StormResult<StormLMConfigs> {
            Ok(scripted_lm_configs())
        }

        fn retriever(&self, search_top_k: usize) -> StormResult<Arc<dyn Retriever>> {
            Ok(Arc::new(StaticRetriever::new(search_top_k)))
        }
    }

    fn factory(root: &TempDir) -> StormRunnerFactory {
        StormRunnerFactory::new(
            Arc::new(ScriptedBackend),
            RunnerConfig::default(),
            WorkspaceConfig {
                root: Some(root.path().to_path_buf()),
                retain_artifacts: false,
            },
        )
    }

    #[test]
    fn test_create_without_retrieval_forces_zero_search_depth() {
        let root = TempDir::new().unwrap();
        let (runner, workspace) = factory(&root)
            .create(false, DEFAULT_SEARCH_TOP_K, Some("Artificial Intelligence"))
            .unwrap();

        assert!(runner.retriever.is_none());
        assert_eq!(runner.args.search_top_k, 0);
        assert_eq!(runner.args.max_conv_turn, 3);
        assert_eq!(runner.args.max_perspective, 3);
        assert_eq!(runner.args.max_thread_num, 3);
        assert_eq!(runner.args.output_dir, workspace.path());
        assert!(
            workspace
                .path()
                .join("Artificial_Intelligence")
                .join(CONVERSATION_LOG_FILE)
                .exists()
        );
    }

    #[test]
    fn test_create_with_retrieval_keeps_search_depth() {
        let root = TempDir::new().unwrap();
        let (runner, _workspace) = factory(&root).create(true, 7, Some("Quantum")).unwrap();

        assert_eq!(runner.args.search_top_k, 7);
        assert_eq!(runner.retriever.as_ref().unwrap().top_k(), 7);
    }

    #[test]
    fn test_create_without_topic_makes_no_topic_dir() {
        let root = TempDir::new().unwrap();
        let (_runner, workspace) = factory(&root).create(false, 3, None).unwrap();
        assert_eq!(std::fs::read_dir(workspace.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_each_runner_gets_fresh_workspace_released_on_drop() {
        let root = TempDir::new().unwrap();
        let factory = factory(&root);
        let (_r1, w1) = factory.create(false, 3, Some("Same")).unwrap();
        let (_r2, w2) = factory.create(false, 3, Some("Same")).unwrap();
        assert_ne!(w1.path(), w2.path());

        let path = w1.path().to_path_buf();
        drop(w1);
        assert!(!path.exists());
        assert!(w2.path().exists());
    }

    #[tokio::test]
    async fn test_provider_backend_builds_role_table() {
        let backend = ProviderBackend::new(
            LLMConfig {
                api_key: "sk-test".to_string(),
                ..Default::default()
            },
            SearchConfig {
                api_key: "ydc-test".to_string(),
                ..Default::default()
            },
        );
        let lm_configs = backend.lm_configs().unwrap();
        assert_eq!(lm_configs.conv_simulator_lm.settings().max_tokens, 500);
        assert_eq!(lm_configs.question_asker_lm.settings().max_tokens, 500);
        assert_eq!(lm_configs.outline_gen_lm.settings().max_tokens, 400);
        assert_eq!(lm_configs.article_gen_lm.settings().max_tokens, 700);
        assert_eq!(lm_configs.article_polish_lm.settings().max_tokens, 4000);

        assert_eq!(backend.retriever(5).unwrap().top_k(), 5);
    }

    #[test]
    fn test_provider_backend_missing_credentials() {
        let backend = ProviderBackend::new(
            LLMConfig {
                api_key: String::new(),
                ..Default::default()
            },
            SearchConfig {
                api_key: String::new(),
                ..Default::default()
            },
        );
        assert!(matches!(
            backend.lm_configs(),
            Err(StormError::MissingCredential("OPENAI_API_KEY"))
        ));
        assert!(matches!(
            backend.retriever(5),
            Err(StormError::MissingCredential("YDC_API_KEY"))
        ));
    }
}
