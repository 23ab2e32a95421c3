//! 分析产物存储
//!
//! ## 职责
//! - 管理精读产物（Markdown 分析文件）的命名、存在性检查和落盘
//! - 产物存在即视为该论文已精读，跳过整个会话
//!
//! `exists` 与 `save` 之间不加锁：同一 key 的内容由同一条提示词生成，
//! 并发重复只会用等价内容覆盖。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

/// 精读产物存储接口
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 由文档路径推导产物 key
    fn key_for(&self, document: &Path) -> String;

    /// 产物是否已存在
    async fn exists(&self, key: &str) -> bool;

    /// 写入产物，返回落盘路径
    async fn save(&self, key: &str, content: &str) -> Result<PathBuf>;

    /// key 对应的落盘路径
    fn path_for(&self, key: &str) -> PathBuf;
}

/// 本地文件系统实现
///
/// 产物命名规则：`<文档文件名>_summary.md`，如
/// `2504.05259v1.pdf` 对应 `2504.05259v1.pdf_summary.md`
pub struct FsArtifactStore {
    base_dir: PathBuf,
}

impl FsArtifactStore {
    /// 使用默认目录 `summary_result` 创建
    pub fn new() -> Self {
        Self::with_dir("summary_result")
    }

    /// 使用指定目录创建
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for FsArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn key_for(&self, document: &Path) -> String {
        let file_name = document
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{}_summary.md", file_name)
    }

    async fn exists(&self, key: &str) -> bool {
        fs::try_exists(self.path_for(key)).await.unwrap_or(false)
    }

    async fn save(&self, key: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir)
            .await
            .with_context(|| format!("无法创建产物目录: {}", self.base_dir.display()))?;

        let path = self.path_for(key);
        fs::write(&path, content)
            .await
            .with_context(|| format!("无法写入产物文件: {}", path.display()))?;

        info!("📁 分析产物已保存: {}", path.display());
        Ok(path)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}
