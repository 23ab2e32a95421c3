//! arXiv API 模块
//!
//! 负责与 arXiv Atom API 的交互：构造日期窗口检索式、抓取并解析论文列表

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::ACCEPT;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::PaperRecord;

/// 构造带日期窗口的检索式
///
/// # 参数
/// - `user_query`: 用户检索式，如 `ti:llm AND all:security`
/// - `days_back`: 窗口天数
///
/// # 返回
/// `submittedDate:[<起始日> TO <今日>] AND <用户检索式>` 形式的检索式
pub fn build_search_query(user_query: &str, days_back: i64) -> String {
    let now = chrono::Local::now();
    let today = now.format("%Y%m%d");
    let start = (now - chrono::Duration::days(days_back)).format("%Y%m%d");
    format!("submittedDate:[{} TO {}] AND {}", start, today, user_query)
}

/// 查询最近提交的论文
///
/// 按提交日期倒序返回，数量由 `config.max_results` 限制
pub async fn search_recent(config: &Config) -> Result<Vec<PaperRecord>> {
    let search_query = build_search_query(&config.search_query, config.days_back);
    info!("🔍 arXiv 检索式: {}", search_query);

    let client = reqwest::Client::builder()
        .user_agent("arxiv-auto-read/0.1")
        .timeout(Duration::from_secs(30))
        .build()
        .context("无法创建 HTTP 客户端")?;

    let max_results = config.max_results.to_string();
    let resp = client
        .get(&config.arxiv_api_base)
        .query(&[("search_query", search_query.as_str())])
        .query(&[("start", "0"), ("max_results", max_results.as_str())])
        .query(&[("sortBy", "submittedDate"), ("sortOrder", "descending")])
        .header(ACCEPT, "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8")
        .send()
        .await
        .context("arXiv API 请求失败")?;

    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("arXiv API 返回错误状态: HTTP {}", status);
    }

    let text = resp.text().await.context("读取 arXiv 响应失败")?;
    let records = parse_atom_feed(&text)?;
    info!("✓ arXiv 返回 {} 篇论文", records.len());

    Ok(records)
}

/// 解析 Atom 查询结果
///
/// 缺少必需字段的条目告警跳过，不中断解析
pub fn parse_atom_feed(xml: &str) -> Result<Vec<PaperRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut records = Vec::new();
    let mut in_entry = false;
    let mut cur_id = String::new();
    let mut cur_title = String::new();
    let mut cur_summary = String::new();
    let mut cur_category: Option<String> = None;
    let mut text_target: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name_buf: Vec<u8> = e.name().as_ref().to_vec();
                match strip_namespace(&name_buf) {
                    b"entry" => {
                        in_entry = true;
                        cur_id.clear();
                        cur_title.clear();
                        cur_summary.clear();
                        cur_category = None;
                        text_target = None;
                    }
                    b"id" if in_entry => text_target = Some("id"),
                    b"title" if in_entry => text_target = Some("title"),
                    b"summary" if in_entry => text_target = Some("summary"),
                    b"primary_category" if in_entry => {
                        for a in e.attributes().flatten() {
                            if a.key.as_ref().ends_with(b"term") {
                                cur_category = Some(String::from_utf8_lossy(&a.value).to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
            // primary_category 通常是自闭合标签
            Ok(Event::Empty(e)) => {
                let name_buf: Vec<u8> = e.name().as_ref().to_vec();
                if strip_namespace(&name_buf) == b"primary_category" && in_entry {
                    for a in e.attributes().flatten() {
                        if a.key.as_ref().ends_with(b"term") {
                            cur_category = Some(String::from_utf8_lossy(&a.value).to_string());
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(target) = text_target.take() {
                    let txt = t.unescape().unwrap_or_default().to_string();
                    match target {
                        "id" => cur_id = txt,
                        "title" => cur_title = txt,
                        "summary" => cur_summary = txt,
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name_buf: Vec<u8> = e.name().as_ref().to_vec();
                if strip_namespace(&name_buf) == b"entry" && in_entry {
                    in_entry = false;

                    if cur_id.is_empty() || cur_title.is_empty() || cur_summary.is_empty() {
                        warn!("⚠️ 跳过字段不完整的论文条目 (id: {:?})", cur_id);
                        buf.clear();
                        continue;
                    }

                    match PaperRecord::from_feed_entry(&cur_title, &cur_summary, &cur_id) {
                        Ok(mut record) => {
                            record.primary_category = cur_category.clone();
                            records.push(record);
                        }
                        Err(e) => warn!("⚠️ 跳过无法解析的论文条目: {}", e),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("Atom XML 解析失败: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// 去掉标签名里的命名空间前缀
fn strip_namespace(raw: &[u8]) -> &[u8] {
    match raw.iter().position(|b| *b == b':') {
        Some(ix) => &raw[ix + 1..],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <id>http://arxiv.org/api/feed-id</id>
  <entry>
    <id>http://arxiv.org/abs/2501.01234v1</id>
    <updated>2025-01-15T12:00:00Z</updated>
    <title>LLM-driven  Vulnerability
  Detection</title>
    <summary>We study how large language models
  find bugs.</summary>
    <author><name>Doe, J.</name></author>
    <link rel="alternate" type="text/html" href="https://arxiv.org/abs/2501.01234v1"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CR"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2501.05678v2</id>
    <title>Entry Without Summary</title>
  </entry>
</feed>
"#;

    #[test]
    fn test_parse_atom_feed() {
        let records = parse_atom_feed(SAMPLE).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.arxiv_id, "2501.01234v1");
        assert_eq!(record.base_id, "2501.01234");
        assert_eq!(record.title, "LLM-driven Vulnerability Detection");
        assert_eq!(record.summary, "We study how large language models find bugs.");
        assert_eq!(record.abs_url, "http://arxiv.org/abs/2501.01234v1");
        assert_eq!(record.pdf_url, "http://arxiv.org/pdf/2501.01234v1.pdf");
        assert_eq!(record.primary_category.as_deref(), Some("cs.CR"));
    }

    #[test]
    fn test_parse_atom_feed_empty() {
        let records = parse_atom_feed(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_build_search_query_window() {
        let query = build_search_query("ti:llm AND all:security", 7);
        assert!(query.starts_with("submittedDate:["));
        assert!(query.ends_with("] AND ti:llm AND all:security"));

        // 窗口两端都是 YYYYMMDD 形式
        let range = query
            .trim_start_matches("submittedDate:[")
            .split(']')
            .next()
            .unwrap();
        let parts: Vec<&str> = range.split(" TO ").collect();
        assert_eq!(parts.len(), 2);
        for part in parts {
            assert_eq!(part.len(), 8);
            assert!(part.chars().all(|c| c.is_ascii_digit()));
        }
    }

    /// 真实 arXiv 查询冒烟测试
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_search_recent_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_search_recent_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config {
            max_results: 3,
            ..Config::default()
        };

        println!("\n========== 测试 arXiv 查询 ==========");
        let records = search_recent(&config).await.unwrap();
        for record in &records {
            println!("📄 {} ({})", record.title, record.arxiv_id);
            println!("   {}", record.pdf_url);
        }
        println!("=====================================\n");

        assert!(records.len() <= 3);
        for record in &records {
            assert!(!record.base_id.is_empty());
            assert!(record.pdf_url.contains("/pdf/"));
        }
    }
}
