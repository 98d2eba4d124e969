//! 每次请求独占的临时工作目录

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::WorkspaceConfig;
use crate::error::{StormError, StormResult};

pub const CONVERSATION_LOG_FILE: &str = "conversation_log.json";

/// 临时目录守卫。默认在 drop 时删除整个目录树
#[derive(Debug)]
pub struct Workspace {
    dir: WorkspaceDir,
}

#[derive(Debug)]
enum WorkspaceDir {
    Scoped(TempDir),
    Retained(PathBuf),
}

impl Workspace {
    pub fn create(config: &WorkspaceConfig) -> StormResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("storm-");

        let temp_dir = match &config.root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|e| StormError::workspace(root, e))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| {
            let root = config.root.clone().unwrap_or_else(std::env::temp_dir);
            StormError::workspace(&root, e)
        })?;

        let dir = if config.retain_artifacts {
            let path = temp_dir.keep();
            tracing::info!("📁 工作目录将被保留: {}", path.display());
            WorkspaceDir::Retained(path)
        } else {
            WorkspaceDir::Scoped(temp_dir)
        };

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            WorkspaceDir::Scoped(temp_dir) => temp_dir.path(),
            WorkspaceDir::Retained(path) => path,
        }
    }

    pub fn is_retained(&self) -> bool {
        matches!(self.dir, WorkspaceDir::Retained(_))
    }
}

/// 主题对应的目录名：空格替换为下划线
pub fn topic_dir_name(topic: &str) -> String {
    topic.replace([' ', '/', '\\'], "_")
}

/// 主题在工作目录中的路径
pub fn topic_dir(root: &Path, topic: &str) -> StormResult<PathBuf> {
    let name = topic_dir_name(topic);
    if name == "." || name == ".." {
        return Err(StormError::InvalidTopic(topic.to_string()));
    }
    Ok(root.join(name))
}

/// 创建主题目录，并确保其中存在初始化为空列表的对话日志。
/// 已存在的日志不会被覆盖。
pub fn setup_topic_directory(root: &Path, topic: &str) -> StormResult<PathBuf> {
    let dir = topic_dir(root, topic)?;
    std::fs::create_dir_all(&dir).map_err(|e| StormError::workspace(&dir, e))?;

    let log_path = dir.join(CONVERSATION_LOG_FILE);
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&log_path)
    {
        Ok(mut file) => file
            .write_all(b"[]")
            .map_err(|e| StormError::workspace(&log_path, e))?,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
        Err(e) => return Err(StormError::workspace(&log_path, e)),
    }

    Ok(dir)
}
