//! 报告写入服务 - 业务能力层
//!
//! 只负责"追加报告条目"能力，不关心流程
//!
//! 报告文件跨运行累积，每次运行先写一条带时间戳的分隔横幅，
//! 之后逐篇追加条目

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::models::{category_label, AnalysisArtifact, DeepReadStatus, PaperRecord};

/// 报告写入服务
///
/// 职责：
/// - 将单篇论文的分析结果渲染为 Markdown 并追加到报告文件
/// - 只处理单篇论文，不出现 Vec<PaperRecord>
/// - 不关心流程顺序
pub struct ReportWriter {
    report_file_path: String,
}

impl ReportWriter {
    /// 创建新的报告写入服务
    pub fn new() -> Self {
        Self {
            report_file_path: "report.md".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
        }
    }

    /// 写入本次运行的分隔横幅
    pub async fn append_run_banner(&self) -> Result<()> {
        let banner = format!(
            "\n---\n\n# 论文分析报告 {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.append(&banner)
    }

    /// 追加单篇论文的条目
    ///
    /// # 参数
    /// - `paper`: 论文记录
    /// - `artifact`: 分析产物（翻译、标签、引用量、精读状态）
    pub async fn append_entry(
        &self,
        paper: &PaperRecord,
        artifact: &AnalysisArtifact,
    ) -> Result<()> {
        debug!(
            "写入报告条目: {} | 标签数: {}",
            paper.arxiv_id,
            artifact.tags.len()
        );

        let entry = render_entry(paper, artifact);
        self.append(&entry)
    }

    fn append(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.report_file_path)
            .with_context(|| format!("无法打开报告文件: {}", self.report_file_path))?;

        file.write_all(content.as_bytes())
            .with_context(|| format!("无法写入报告文件: {}", self.report_file_path))?;

        Ok(())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// 渲染单篇论文的 Markdown 条目
fn render_entry(paper: &PaperRecord, artifact: &AnalysisArtifact) -> String {
    let mut entry = String::new();

    entry.push_str(&format!("## {}\n\n", paper.title));
    entry.push_str(&format!("- arXiv ID: {}\n", paper.arxiv_id));
    entry.push_str(&format!("- 链接: {}\n", paper.abs_url));
    entry.push_str(&format!("- PDF: {}\n", paper.pdf_url));

    if let Some(code) = &paper.primary_category {
        match category_label(code) {
            Some(label) => entry.push_str(&format!("- 分类: {}（{}）\n", code, label)),
            None => entry.push_str(&format!("- 分类: {}\n", code)),
        }
    }

    entry.push_str(&format!("- 引用量: {}\n", artifact.citation_count));

    if artifact.tags.is_empty() {
        entry.push_str("- 标签: 无\n");
    } else {
        entry.push_str(&format!("- 标签: {}\n", artifact.tags.join("、")));
    }

    entry.push_str(&format!("\n**原始摘要**：\n\n> {}\n", paper.summary));
    entry.push_str(&format!("\n**中文简述**：\n\n{}\n", artifact.translated_summary));

    let deep_read_line = match &artifact.deep_read {
        DeepReadStatus::NotRequested => "未启用精读".to_string(),
        DeepReadStatus::Completed { artifact_path } => format!("见 {}", artifact_path),
        DeepReadStatus::AlreadyAnalyzed { artifact_path } => {
            format!("已有分析，见 {}", artifact_path)
        }
        DeepReadStatus::PdfUnavailable => "PDF 获取失败，未精读".to_string(),
        DeepReadStatus::Failed { reason } => format!("精读失败（{}）", reason),
    };
    entry.push_str(&format!("\n**精读分析**：{}\n\n", deep_read_line));

    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CitationCount;

    fn sample_paper() -> PaperRecord {
        PaperRecord {
            arxiv_id: "2504.05259v1".to_string(),
            base_id: "2504.05259".to_string(),
            title: "Fuzzing with LLMs".to_string(),
            summary: "We fuzz things with language models.".to_string(),
            abs_url: "https://arxiv.org/abs/2504.05259v1".to_string(),
            pdf_url: "https://arxiv.org/pdf/2504.05259v1.pdf".to_string(),
            primary_category: Some("cs.CR".to_string()),
        }
    }

    #[test]
    fn test_render_entry_full() {
        let paper = sample_paper();
        let artifact = AnalysisArtifact {
            translated_summary: "本文用大模型做模糊测试。".to_string(),
            tags: vec!["LLM for Security".to_string(), "模糊测试".to_string()],
            citation_count: CitationCount::Known(17),
            deep_read: DeepReadStatus::Completed {
                artifact_path: "summary_result/2504.05259v1.pdf_summary.md".to_string(),
            },
        };

        let entry = render_entry(&paper, &artifact);
        assert!(entry.starts_with("## Fuzzing with LLMs\n"));
        assert!(entry.contains("- arXiv ID: 2504.05259v1\n"));
        assert!(entry.contains("- 分类: cs.CR（密码学与安全）\n"));
        assert!(entry.contains("- 引用量: 17\n"));
        assert!(entry.contains("- 标签: LLM for Security、模糊测试\n"));
        assert!(entry.contains("> We fuzz things with language models."));
        assert!(entry.contains("本文用大模型做模糊测试。"));
        assert!(entry.contains("**精读分析**：见 summary_result/2504.05259v1.pdf_summary.md"));
    }

    #[test]
    fn test_render_entry_degraded() {
        let mut paper = sample_paper();
        paper.primary_category = Some("q-bio.GN".to_string());

        let artifact = AnalysisArtifact {
            translated_summary: "简述".to_string(),
            tags: vec![],
            citation_count: CitationCount::Unavailable,
            deep_read: DeepReadStatus::PdfUnavailable,
        };

        let entry = render_entry(&paper, &artifact);
        // 未知分类只展示代码
        assert!(entry.contains("- 分类: q-bio.GN\n"));
        assert!(entry.contains("- 引用量: 暂无数据（查询失败）\n"));
        assert!(entry.contains("- 标签: 无\n"));
        assert!(entry.contains("**精读分析**：PDF 获取失败，未精读"));
    }

    #[test]
    fn test_render_entry_failed_deep_read() {
        let paper = sample_paper();
        let artifact = AnalysisArtifact {
            translated_summary: "简述".to_string(),
            tags: vec!["漏洞挖掘".to_string()],
            citation_count: CitationCount::Known(0),
            deep_read: DeepReadStatus::Failed {
                reason: "会话达到最大轮数 12 仍未得到最终回答".to_string(),
            },
        };

        let entry = render_entry(&paper, &artifact);
        assert!(entry.contains("**精读分析**：精读失败（会话达到最大轮数 12 仍未得到最终回答）"));
    }

    #[tokio::test]
    async fn test_append_entries_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let writer = ReportWriter::with_path(path.to_string_lossy().to_string());

        writer.append_run_banner().await.unwrap();

        let paper = sample_paper();
        let artifact = AnalysisArtifact {
            translated_summary: "第一篇".to_string(),
            tags: vec![],
            citation_count: CitationCount::Known(1),
            deep_read: DeepReadStatus::NotRequested,
        };
        writer.append_entry(&paper, &artifact).await.unwrap();

        let mut second = sample_paper();
        second.title = "Second Paper".to_string();
        writer.append_entry(&second, &artifact).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# 论文分析报告"));

        let first_pos = content.find("## Fuzzing with LLMs").unwrap();
        let second_pos = content.find("## Second Paper").unwrap();
        assert!(first_pos < second_pos);
        assert!(content.contains("未启用精读"));
    }
}
