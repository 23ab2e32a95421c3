use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- 论文来源配置 ---
    /// arXiv 检索式（与日期窗口拼接）
    pub search_query: String,
    /// 检索最近多少天提交的论文
    pub days_back: i64,
    /// 单次检索的论文数量上限
    pub max_results: usize,
    /// arXiv API 地址
    pub arxiv_api_base: String,
    /// 引用量查询 API 地址（Semantic Scholar Graph API）
    pub citation_api_base: String,
    /// 本地论文清单文件（设置后不再查询 arXiv）
    pub feed_file: Option<String>,
    // --- LLM 配置 ---
    /// LLM 服务类型（目前仅支持 openai）
    pub llm_service_type: String,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 精读配置 ---
    /// 是否对每篇论文执行 Agent 精读
    pub deep_read: bool,
    /// MCP 工具后端地址
    pub mcp_url: String,
    /// 精读会话的最大对话轮数
    pub max_agent_turns: usize,
    /// LLM/工具请求超时（秒）
    pub request_timeout_secs: u64,
    /// 精读失败时是否丢弃该论文（不写报告条目）
    pub discard_failed_deep_read: bool,
    // --- 输出配置 ---
    /// PDF 下载目录
    pub pdf_dir: String,
    /// 精读产物目录
    pub summary_dir: String,
    /// 报告文件
    pub report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_query: "ti:llm AND all:security".to_string(),
            days_back: 7,
            max_results: 10,
            arxiv_api_base: "https://export.arxiv.org/api/query".to_string(),
            citation_api_base: "https://api.semanticscholar.org/graph/v1/paper".to_string(),
            feed_file: None,
            llm_service_type: "openai".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            deep_read: true,
            mcp_url: "http://127.0.0.1:3001/mcp".to_string(),
            max_agent_turns: 12,
            request_timeout_secs: 300,
            discard_failed_deep_read: false,
            pdf_dir: "pdf_downloads".to_string(),
            summary_dir: "summary_result".to_string(),
            report_file: "report.md".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            search_query: std::env::var("SEARCH_QUERY").unwrap_or(default.search_query),
            days_back: std::env::var("DAYS_BACK").ok().and_then(|v| v.parse().ok()).unwrap_or(default.days_back),
            max_results: std::env::var("MAX_RESULTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_results),
            arxiv_api_base: std::env::var("ARXIV_API_BASE").unwrap_or(default.arxiv_api_base),
            citation_api_base: std::env::var("CITATION_API_BASE").unwrap_or(default.citation_api_base),
            feed_file: std::env::var("FEED_FILE").ok().filter(|v| !v.is_empty()),
            llm_service_type: std::env::var("LLM_SERVICE_TYPE").unwrap_or(default.llm_service_type),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            deep_read: std::env::var("DEEP_READ").ok().and_then(|v| v.parse().ok()).unwrap_or(default.deep_read),
            mcp_url: std::env::var("MCP_URL").unwrap_or(default.mcp_url),
            max_agent_turns: std::env::var("MAX_AGENT_TURNS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_agent_turns),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            discard_failed_deep_read: std::env::var("DISCARD_FAILED_DEEP_READ").ok().and_then(|v| v.parse().ok()).unwrap_or(default.discard_failed_deep_read),
            pdf_dir: std::env::var("PDF_DIR").unwrap_or(default.pdf_dir),
            summary_dir: std::env::var("SUMMARY_DIR").unwrap_or(default.summary_dir),
            report_file: std::env::var("REPORT_FILE").unwrap_or(default.report_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 校验配置
    ///
    /// 应用初始化时调用，凭证缺失等问题在进入处理流程前直接失败
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::missing_credential("LLM_API_KEY"));
        }
        if self.deep_read && self.mcp_url.trim().is_empty() {
            return Err(ConfigError::invalid("启用精读时 MCP_URL 不能为空"));
        }
        if self.max_agent_turns == 0 {
            return Err(ConfigError::invalid("MAX_AGENT_TURNS 必须大于 0"));
        }
        if self.max_results == 0 {
            return Err(ConfigError::invalid("MAX_RESULTS 必须大于 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_api_key() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_validate_requires_mcp_url_when_deep_read() {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            mcp_url: "  ".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_allows_empty_mcp_url_without_deep_read() {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            deep_read: false,
            mcp_url: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
