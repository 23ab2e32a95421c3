//! 文档获取服务
//!
//! ## 职责
//! - 下载论文 PDF 到本地目录
//! - 结果以 bool 表达，失败不向上抛错，由流程层决定降级

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::Config;

/// PDF 下载器
pub struct PdfFetcher {
    client: reqwest::Client,
}

impl PdfFetcher {
    /// 创建下载器
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("arxiv-auto-read/0.1")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self { client })
    }

    /// 下载文件到指定路径
    ///
    /// # 参数
    /// - `url`: 下载地址
    /// - `dest`: 目标文件路径，父目录不存在时自动创建
    ///
    /// # 返回
    /// 成功返回 `true`；任何失败（网络、HTTP 状态、写盘）记录告警后返回 `false`
    pub async fn fetch(&self, url: &str, dest: &Path) -> bool {
        match self.try_fetch(url, dest).await {
            Ok(bytes) => {
                info!("✓ PDF 下载完成: {} ({} 字节)", dest.display(), bytes);
                true
            }
            Err(e) => {
                warn!("⚠️ PDF 下载失败 ({}): {:#}", url, e);
                // 清理可能残留的半截文件
                let _ = fs::remove_file(dest).await;
                false
            }
        }
    }

    /// 流式下载，返回写入的字节数
    async fn try_fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .context("无法创建下载目录")?;
        }

        let resp = self.client.get(url).send().await.context("请求失败")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {}", status);
        }

        let mut file = fs::File::create(dest).await.context("无法创建文件")?;
        let mut stream = resp.bytes_stream();
        let mut total: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("读取响应流失败")?;
            file.write_all(&chunk).await.context("写入文件失败")?;
            total += chunk.len() as u64;
        }
        file.flush().await.context("刷新文件失败")?;

        Ok(total)
    }
}
