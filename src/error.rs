//! 应用错误类型
//!
//! 只为调用方需要区分的失败情形定义专门类型：
//! 配置问题在启动阶段直接终止程序，精读会话失败由流程层捕获降级。
//! 其余错误用 anyhow 逐层携带上下文。

use thiserror::Error;

/// 配置错误
///
/// 在 `Config::validate` 和 LLM 服务工厂中产生，应用初始化时直接失败
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少必需的凭证
    #[error("缺少凭证: 环境变量 {var_name} 未设置")]
    MissingCredential { var_name: String },

    /// LLM 服务类型无法识别
    #[error("未知的 LLM 服务类型: {name}（当前仅支持 openai）")]
    UnknownProvider { name: String },

    /// 其他无效配置
    #[error("无效配置: {reason}")]
    Invalid { reason: String },
}

/// 精读会话错误
///
/// 会话内的协议级失败，由流程层捕获后标注在报告条目里
#[derive(Debug, Error)]
pub enum AgentError {
    /// 无法建立到工具后端的通道
    #[error("无法连接工具后端 {url}: {reason}")]
    ChannelUnavailable { url: String, reason: String },

    /// 达到轮数上限仍未得到最终回答
    #[error("会话达到最大轮数 {max_turns} 仍未得到最终回答")]
    TurnLimitExceeded { max_turns: usize },

    /// 会话结束但最终回答为空
    #[error("会话结束但最终回答为空")]
    EmptyFinalAnswer,

    /// 工具调用的传输层失败
    #[error("工具调用失败 ({tool}): {reason}")]
    ToolCallFailed { tool: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl ConfigError {
    /// 创建缺少凭证错误
    pub fn missing_credential(var_name: impl Into<String>) -> Self {
        ConfigError::MissingCredential {
            var_name: var_name.into(),
        }
    }

    /// 创建无效配置错误
    pub fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            reason: reason.into(),
        }
    }
}

impl AgentError {
    /// 创建通道不可用错误
    pub fn channel_unavailable(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AgentError::ChannelUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建工具调用失败错误
    pub fn tool_call_failed(tool: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AgentError::ToolCallFailed {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}
