//! 论文清单文件加载
//!
//! 支持从本地 TOML 清单加载论文记录，替代 arXiv 在线查询，
//! 用于离线运行或补读指定论文。

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use crate::models::paper::PaperRecord;

/// 清单文件结构
///
/// ```toml
/// [[papers]]
/// title = "..."
/// abstract = "..."
/// source_url = "https://arxiv.org/abs/2504.05259v1"
/// ```
#[derive(Debug, Deserialize)]
struct FeedFile {
    #[serde(default)]
    papers: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: String,
    source_url: String,
}

/// 从 TOML 清单文件加载论文记录
pub async fn load_feed_file(path: &str) -> Result<Vec<PaperRecord>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取论文清单文件: {}", path))?;

    let records = parse_feed(&content).with_context(|| format!("无法解析论文清单文件: {}", path))?;
    info!("✓ 从 {} 加载了 {} 篇论文", path, records.len());

    Ok(records)
}

/// 解析清单内容
///
/// 单个条目解析失败只告警跳过，不影响其余条目
fn parse_feed(content: &str) -> Result<Vec<PaperRecord>> {
    let feed: FeedFile = toml::from_str(content)?;

    let mut records = Vec::new();
    for entry in feed.papers {
        match PaperRecord::from_feed_entry(&entry.title, &entry.abstract_text, &entry.source_url) {
            Ok(record) => records.push(record),
            Err(e) => warn!("跳过无法解析的论文条目 \"{}\": {}", entry.title, e),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[papers]]
title = "Prompt Injection Attacks"
abstract = "We study prompt injection."
source_url = "https://arxiv.org/abs/2501.11111v1"

[[papers]]
title = "Broken Entry"
abstract = "No valid link."
source_url = "https://example.com/whitepaper"

[[papers]]
title = "LLM-based Fuzzing"
abstract = "We fuzz with LLMs."
source_url = "https://arxiv.org/abs/2501.22222"
"#;

    #[test]
    fn test_parse_feed_skips_bad_entries() {
        let records = parse_feed(SAMPLE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].arxiv_id, "2501.11111v1");
        assert_eq!(records[1].arxiv_id, "2501.22222");
    }

    #[test]
    fn test_parse_feed_empty_file() {
        let records = parse_feed("").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_feed_rejects_invalid_toml() {
        assert!(parse_feed("[[papers]]\ntitle = ").is_err());
    }
}
