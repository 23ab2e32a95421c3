//! 论文处理流程 - 流程层
//!
//! 核心职责：定义"一篇论文"的完整处理流程
//!
//! 流程顺序：
//! 1. 摘要翻译总结
//! 2. 主题标签提取
//! 3. 引用量查询（失败降级为占位文案）
//! 4. 精读（可选，失败降级为状态标注）
//! 5. 追加报告条目

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::agent::{prompts, DeepReadOutcome, DeepReadSession};
use crate::api::semantic_scholar;
use crate::config::Config;
use crate::models::{AnalysisArtifact, DeepReadStatus, PaperRecord};
use crate::services::{ArtifactStore, FsArtifactStore, LlmInvoke, PdfFetcher, ReportWriter};
use crate::utils::logging::truncate_text;
use crate::workflow::paper_ctx::PaperCtx;

/// 论文处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// 已写入报告
    Reported,
    /// 精读失败且按配置丢弃，未写入报告
    Discarded,
}

/// 论文处理流程
///
/// - 编排单篇论文的完整处理流程
/// - 决定何时调用 LLM、何时降级
/// - 不出现 Vec<PaperRecord>
/// - 只依赖业务能力（services / agent）
pub struct PaperFlow {
    invoker: Arc<dyn LlmInvoke>,
    citation_client: reqwest::Client,
    citation_api_base: String,
    pdf_fetcher: PdfFetcher,
    report_writer: ReportWriter,
    session: DeepReadSession,
    pdf_dir: PathBuf,
    deep_read: bool,
    discard_failed_deep_read: bool,
}

impl PaperFlow {
    /// 创建新的论文处理流程
    pub fn new(config: &Config, invoker: Arc<dyn LlmInvoke>) -> Result<Self> {
        let citation_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("无法创建 HTTP 客户端")?;

        let store: Arc<dyn ArtifactStore> =
            Arc::new(FsArtifactStore::with_dir(&config.summary_dir));
        let session = DeepReadSession::new(config, invoker.clone(), store);

        Ok(Self {
            invoker,
            citation_client,
            citation_api_base: config.citation_api_base.clone(),
            pdf_fetcher: PdfFetcher::new(config)?,
            report_writer: ReportWriter::with_path(&config.report_file),
            session,
            pdf_dir: PathBuf::from(&config.pdf_dir),
            deep_read: config.deep_read,
            discard_failed_deep_read: config.discard_failed_deep_read,
        })
    }

    pub async fn run(&self, paper: &PaperRecord, ctx: &PaperCtx) -> Result<FlowOutcome> {
        self.log_paper(paper, ctx);

        // ========== 阶段 1: 摘要翻译总结 ==========
        info!("{} 📄 正在生成中文简述...", ctx);

        let summary_prompt = prompts::build_summary_prompt(paper);
        let translated_summary = self
            .invoker
            .invoke(&summary_prompt, None)
            .await
            .with_context(|| format!("生成中文简述失败: {}", paper.arxiv_id))?;

        info!(
            "{} ✓ 中文简述完成 ({} 字符)",
            ctx,
            translated_summary.chars().count()
        );

        // ========== 阶段 2: 主题标签提取 ==========
        info!("{} 🔍 正在提取主题标签...", ctx);

        let tag_prompt = prompts::build_tag_prompt(paper, &translated_summary);
        let raw_tags = self
            .invoker
            .invoke(&tag_prompt, None)
            .await
            .with_context(|| format!("提取主题标签失败: {}", paper.arxiv_id))?;
        let tags = split_tags(&raw_tags);

        if tags.is_empty() {
            warn!("{} ⚠️ 模型未返回有效标签", ctx);
        } else {
            info!("{} ✓ 标签: {}", ctx, tags.join("、"));
        }

        // ========== 阶段 3: 引用量查询 ==========
        info!("{} 📊 正在查询引用量...", ctx);

        let citation_count = semantic_scholar::get_citation_count(
            &self.citation_client,
            &self.citation_api_base,
            &paper.base_id,
        )
        .await;

        // ========== 阶段 4: 精读（可选） ==========
        let deep_read = if self.deep_read {
            self.run_deep_read(paper, ctx).await
        } else {
            DeepReadStatus::NotRequested
        };

        if self.discard_failed_deep_read {
            if let DeepReadStatus::Failed { reason } = &deep_read {
                warn!(
                    "{} ⚠️ 精读失败且配置为丢弃，本篇不写入报告 ({})",
                    ctx, reason
                );
                return Ok(FlowOutcome::Discarded);
            }
        }

        // ========== 阶段 5: 追加报告条目 ==========
        let artifact = AnalysisArtifact {
            translated_summary,
            tags,
            citation_count,
            deep_read,
        };

        self.report_writer
            .append_entry(paper, &artifact)
            .await
            .with_context(|| format!("写入报告条目失败: {}", paper.arxiv_id))?;

        info!("{} ✅ 已写入报告", ctx);
        Ok(FlowOutcome::Reported)
    }

    /// 执行精读阶段
    ///
    /// PDF 下载失败与会话失败都不向上抛错，降级为对应状态
    async fn run_deep_read(&self, paper: &PaperRecord, ctx: &PaperCtx) -> DeepReadStatus {
        let dest = self.pdf_dir.join(paper.pdf_file_name());

        info!("{} 📦 正在下载 PDF: {}", ctx, paper.pdf_url);
        if !self.pdf_fetcher.fetch(&paper.pdf_url, &dest).await {
            warn!("{} ⚠️ PDF 获取失败，跳过精读", ctx);
            return DeepReadStatus::PdfUnavailable;
        }

        match self.session.run(&dest).await {
            Ok(DeepReadOutcome::Completed { artifact_path }) => {
                info!("{} ✅ 精读完成: {}", ctx, artifact_path);
                DeepReadStatus::Completed { artifact_path }
            }
            Ok(DeepReadOutcome::AlreadyAnalyzed { artifact_path }) => {
                info!("{} 📑 已有分析产物: {}", ctx, artifact_path);
                DeepReadStatus::AlreadyAnalyzed { artifact_path }
            }
            Err(e) => {
                error!("{} ❌ 精读会话失败: {:#}", ctx, e);
                DeepReadStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    // ========== 日志辅助方法 ==========

    /// 显示论文标题横幅
    fn log_paper(&self, paper: &PaperRecord, ctx: &PaperCtx) {
        info!("\n{}", "─".repeat(60));
        info!("{} {}", ctx, truncate_text(&paper.title, 80));
        info!("{} arXiv: {} | {}", ctx, paper.arxiv_id, paper.abs_url);
    }
}

/// 解析逗号分隔的标签响应
///
/// 去掉换行后按逗号切分，空白项丢弃
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.replace('\n', "")
        .split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags_basic() {
        assert_eq!(split_tags("A,B,C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_split_tags_trims_whitespace() {
        assert_eq!(split_tags("A, B , C "), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_split_tags_empty_response() {
        assert_eq!(split_tags(""), Vec::<String>::new());
        assert_eq!(split_tags(" , ,"), Vec::<String>::new());
    }

    #[test]
    fn test_split_tags_strips_newlines() {
        assert_eq!(
            split_tags("LLM for Security,\n模糊测试,\n漏洞挖掘"),
            vec!["LLM for Security", "模糊测试", "漏洞挖掘"]
        );
    }
}
