//! Semantic Scholar API 模块
//!
//! 负责查询论文引用量。查询失败不会向上传播错误，
//! 统一折叠为 `CitationCount::Unavailable`，由报告层展示占位文案

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::CitationCount;

/// Semantic Scholar 的论文响应（只取引用量字段）
#[derive(Debug, Deserialize)]
struct PaperResponse {
    #[serde(rename = "citationCount")]
    citation_count: Option<u64>,
}

/// 查询论文引用量
///
/// # 参数
/// - `client`: 复用的 HTTP 客户端
/// - `api_base`: 接口地址，来自 `Config::citation_api_base`
/// - `base_id`: 去版本号的 arXiv ID，如 `2504.05259`
///
/// # 返回
/// 查询成功返回 `CitationCount::Known`，任何失败返回 `CitationCount::Unavailable`
pub async fn get_citation_count(
    client: &reqwest::Client,
    api_base: &str,
    base_id: &str,
) -> CitationCount {
    match try_get_citation_count(client, api_base, base_id).await {
        Ok(count) => {
            info!("✓ 引用量: {} (arXiv:{})", count, base_id);
            CitationCount::Known(count)
        }
        Err(e) => {
            warn!("⚠️ 引用量查询失败 (arXiv:{}): {:#}", base_id, e);
            CitationCount::Unavailable
        }
    }
}

/// 实际执行查询
///
/// 收录了论文但缺少引用量字段时按 0 处理
async fn try_get_citation_count(
    client: &reqwest::Client,
    api_base: &str,
    base_id: &str,
) -> Result<u64> {
    let url = format!("{}/arXiv:{}", api_base.trim_end_matches('/'), base_id);

    let resp = client
        .get(&url)
        .query(&[("fields", "citationCount")])
        .send()
        .await
        .context("Semantic Scholar 请求失败")?;

    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("Semantic Scholar 返回错误状态: HTTP {}", status);
    }

    let paper: PaperResponse = resp
        .json()
        .await
        .context("解析 Semantic Scholar 响应失败")?;

    Ok(paper.citation_count.unwrap_or(0))
}
