//! 论文数据模型
//!
//! `PaperRecord` 是整个流程的输入单元，由 arXiv 查询结果或本地清单
//! 文件构造，构造时完成 ID 与各链接的推导。

use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;

/// 论文记录
#[derive(Debug, Clone)]
pub struct PaperRecord {
    /// arXiv ID（可能带版本号，如 2504.05259v1）
    pub arxiv_id: String,
    /// 去掉版本号的 ID（如 2504.05259），引用量查询用
    pub base_id: String,
    /// 论文标题
    pub title: String,
    /// 原始英文摘要
    pub summary: String,
    /// 摘要页链接（/abs/ 形式）
    pub abs_url: String,
    /// PDF 链接
    pub pdf_url: String,
    /// 主分类（如 cs.CR），arXiv 查询结果才有
    pub primary_category: Option<String>,
}

impl PaperRecord {
    /// 由条目字段构造论文记录
    ///
    /// # 参数
    /// - `title`: 标题（多余空白会被归一化）
    /// - `summary`: 摘要
    /// - `source_url`: 摘要页链接，必须是 `…/abs/<id>` 形式
    ///
    /// # 返回
    /// 链接无法识别时返回错误，由调用方决定跳过该条目
    pub fn from_feed_entry(title: &str, summary: &str, source_url: &str) -> Result<Self> {
        let url = source_url.trim().trim_end_matches('/');
        if !url.contains("/abs/") {
            anyhow::bail!("论文链接缺少 /abs/ 段: {}", source_url);
        }

        let arxiv_id = url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        let base_id = strip_version(&arxiv_id)
            .with_context(|| format!("无法识别的 arXiv ID: {}", arxiv_id))?;

        Ok(Self {
            arxiv_id,
            base_id,
            title: normalize_whitespace(title),
            summary: normalize_whitespace(summary),
            abs_url: url.to_string(),
            pdf_url: format!("{}.pdf", url.replace("/abs/", "/pdf/")),
            primary_category: None,
        })
    }

    /// 下载保存用的文件名，如 2504.05259v1.pdf
    pub fn pdf_file_name(&self) -> String {
        format!("{}.pdf", self.arxiv_id)
    }
}

/// 去掉 arXiv ID 的版本后缀
///
/// 只接受新式 ID（YYMM.NNNNN 可带 vN），旧式 ID 视为无法识别
fn strip_version(arxiv_id: &str) -> Option<String> {
    let re = Regex::new(r"^(\d{4}\.\d{4,5})(v\d+)?$").ok()?;
    let caps = re.captures(arxiv_id)?;
    Some(caps[1].to_string())
}

/// 把换行和连续空白压成单个空格
///
/// Atom 源里的标题和摘要带有换行缩进
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 引用量查询结果
///
/// 查询失败与引用量为零是不同的事实，报告中分别呈现
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationCount {
    /// 查询成功
    Known(u64),
    /// 查询失败（网络或接口错误）
    Unavailable,
}

impl fmt::Display for CitationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationCount::Known(count) => write!(f, "{}", count),
            CitationCount::Unavailable => write!(f, "暂无数据（查询失败）"),
        }
    }
}

/// 精读阶段的最终状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepReadStatus {
    /// 本次运行未启用精读
    NotRequested,
    /// 本次完成精读
    Completed { artifact_path: String },
    /// 之前已分析过，本次跳过
    AlreadyAnalyzed { artifact_path: String },
    /// PDF 获取失败，未执行精读
    PdfUnavailable,
    /// 精读会话失败
    Failed { reason: String },
}

/// 单篇论文的分析产物
#[derive(Debug, Clone)]
pub struct AnalysisArtifact {
    /// 中文翻译总结
    pub translated_summary: String,
    /// 主题标签
    pub tags: Vec<String>,
    /// 引用量
    pub citation_count: CitationCount,
    /// 精读状态
    pub deep_read: DeepReadStatus,
}

// ========== 分类标签 ==========

/// 常见 arXiv 分类的中文名
static CATEGORY_LABELS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "cs.CR" => "密码学与安全",
    "cs.CL" => "计算与语言",
    "cs.AI" => "人工智能",
    "cs.LG" => "机器学习",
    "cs.SE" => "软件工程",
    "cs.CV" => "计算机视觉",
    "cs.DC" => "分布式计算",
    "cs.NI" => "网络与互联网架构",
    "cs.IR" => "信息检索",
    "cs.HC" => "人机交互",
    "cs.DB" => "数据库",
    "cs.OS" => "操作系统",
    "stat.ML" => "统计机器学习",
    "eess.SY" => "系统与控制",
};

/// 查询分类代码的中文名，未知分类返回 None
pub fn category_label(code: &str) -> Option<&'static str> {
    CATEGORY_LABELS.get(code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_feed_entry_derivations() {
        let record = PaperRecord::from_feed_entry(
            "A Paper",
            "An abstract.",
            "https://arxiv.org/abs/1234.5678v1",
        )
        .unwrap();

        assert_eq!(record.arxiv_id, "1234.5678v1");
        assert_eq!(record.base_id, "1234.5678");
        assert_eq!(record.abs_url, "https://arxiv.org/abs/1234.5678v1");
        assert_eq!(record.pdf_url, "https://arxiv.org/pdf/1234.5678v1.pdf");
        assert_eq!(record.pdf_file_name(), "1234.5678v1.pdf");
    }

    #[test]
    fn test_from_feed_entry_without_version() {
        let record = PaperRecord::from_feed_entry(
            "A Paper",
            "An abstract.",
            "http://arxiv.org/abs/2504.05259",
        )
        .unwrap();

        assert_eq!(record.arxiv_id, "2504.05259");
        assert_eq!(record.base_id, "2504.05259");
        assert_eq!(record.pdf_url, "http://arxiv.org/pdf/2504.05259.pdf");
    }

    #[test]
    fn test_from_feed_entry_trailing_slash() {
        let record = PaperRecord::from_feed_entry(
            "A Paper",
            "An abstract.",
            "https://arxiv.org/abs/2504.05259v2/",
        )
        .unwrap();

        assert_eq!(record.arxiv_id, "2504.05259v2");
        assert_eq!(record.base_id, "2504.05259");
    }

    #[test]
    fn test_from_feed_entry_rejects_bad_url() {
        assert!(PaperRecord::from_feed_entry("T", "S", "https://example.com/paper.pdf").is_err());
        assert!(PaperRecord::from_feed_entry("T", "S", "https://arxiv.org/abs/not-an-id").is_err());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  A Survey of\n  LLM Security  "),
            "A Survey of LLM Security"
        );
    }

    #[test]
    fn test_citation_count_display() {
        assert_eq!(CitationCount::Known(3).to_string(), "3");
        assert_eq!(
            CitationCount::Unavailable.to_string(),
            "暂无数据（查询失败）"
        );
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label("cs.CR"), Some("密码学与安全"));
        assert_eq!(category_label("math.AG"), None);
    }
}
