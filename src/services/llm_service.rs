//! LLM 服务 - 业务能力层
//!
//! 只负责"LLM 调用"能力，不关心流程
//!
//! ## 技术栈
//! - 简单调用使用 `async-openai` crate
//! - 工具调用轮次直接走 HTTP（`/chat/completions` + tools 字段）
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ConfigError;

/// 一轮工具会话中模型给出的回复
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// 文本内容（最终回答时非空）
    pub content: Option<String>,
    /// 模型请求执行的工具调用
    pub tool_calls: Vec<ToolCallRequest>,
    /// 原始 assistant 消息，追加回对话历史时使用
    pub assistant_message: Value,
}

impl ChatTurn {
    /// 本轮是否为最终回答（不再请求工具）
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// 模型请求的单个工具调用
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// LLM 调用能力
///
/// 职责：
/// - `invoke`: 一问一答式调用，用于摘要翻译和打标签
/// - `chat_turn`: 带工具定义的单轮调用，用于精读会话
/// - 不出现 PaperRecord
/// - 不关心流程顺序
#[async_trait]
pub trait LlmInvoke: Send + Sync {
    /// 一问一答式调用，返回模型的文本回复
    async fn invoke(&self, user_message: &str, system_message: Option<&str>) -> Result<String>;

    /// 带工具定义的单轮调用
    ///
    /// # 参数
    /// - `messages`: 完整对话历史（OpenAI 消息对象）
    /// - `tools`: 工具定义列表（OpenAI function 格式），可为空
    async fn chat_turn(&self, messages: &[Value], tools: &[Value]) -> Result<ChatTurn>;

    /// 当前使用的模型名
    fn model_name(&self) -> &str;
}

/// OpenAI 兼容服务的实现
pub struct OpenAiInvoker {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model_name: String,
}

impl OpenAiInvoker {
    /// 创建新的调用器
    ///
    /// 凭证缺失时立即失败，不等到第一次调用
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        if config.llm_api_key.trim().is_empty() {
            return Err(ConfigError::missing_credential("LLM_API_KEY"));
        }

        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::invalid(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            http,
            api_base: config.llm_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            model_name: config.llm_model_name.clone(),
        })
    }
}

#[async_trait]
impl LlmInvoke for OpenAiInvoker {
    async fn invoke(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(8192u32)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    async fn chat_turn(&self, messages: &[Value], tools: &[Value]) -> Result<ChatTurn> {
        debug!(
            "调用 LLM 工具会话，模型: {}, 历史消息: {}, 工具: {}",
            self.model_name,
            messages.len(),
            tools.len()
        );

        let mut body = serde_json::json!({
            "model": self.model_name,
            "messages": messages,
        });
        // 部分服务不接受空的 tools 数组
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.to_vec());
            body["tool_choice"] = Value::String("auto".to_string());
        }

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("LLM 工具会话请求失败")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("LLM 工具会话返回错误状态: HTTP {}: {}", status, text);
        }

        let payload: Value = resp.json().await.context("解析 LLM 工具会话响应失败")?;
        let message = payload["choices"]
            .get(0)
            .and_then(|choice| choice.get("message"))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("LLM 工具会话响应缺少 message 字段"))?;

        Ok(parse_chat_message(message))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// 解析 assistant 消息，提取文本内容和工具调用
///
/// arguments 字段在线上是 JSON 字符串，解析失败时降级为空对象
pub fn parse_chat_message(message: Value) -> ChatTurn {
    let content = message["content"]
        .as_str()
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty());

    let mut tool_calls = Vec::new();
    if let Some(calls) = message["tool_calls"].as_array() {
        for call in calls {
            let id = call["id"].as_str().unwrap_or_default().to_string();
            let name = call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = call["function"]["arguments"]
                .as_str()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_else(|| serde_json::json!({}));

            if name.is_empty() {
                warn!("跳过缺少函数名的工具调用 (id: {:?})", id);
                continue;
            }
            tool_calls.push(ToolCallRequest {
                id,
                name,
                arguments,
            });
        }
    }

    ChatTurn {
        content,
        tool_calls,
        assistant_message: message,
    }
}

/// 按配置构造 LLM 调用器
///
/// # 返回
/// 凭证缺失或服务类型无法识别时返回配置错误，应用初始化阶段直接终止
pub fn create_invoker(config: &Config) -> Result<Arc<dyn LlmInvoke>> {
    match config.llm_service_type.to_lowercase().as_str() {
        "openai" => {
            let invoker = OpenAiInvoker::new(config)?;
            Ok(Arc::new(invoker))
        }
        other => Err(ConfigError::UnknownProvider {
            name: other.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 创建测试用的配置
    fn create_test_config() -> Config {
        Config {
            llm_api_key: "test-key-not-real".to_string(),
            llm_api_base_url: "http://127.0.0.1:9/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_create_invoker_ok() {
        let config = create_test_config();
        let invoker = create_invoker(&config).unwrap();
        assert_eq!(invoker.model_name(), "gpt-4o");
    }

    #[test]
    fn test_create_invoker_missing_key() {
        let config = Config {
            llm_api_key: "  ".to_string(),
            ..create_test_config()
        };

        let err = create_invoker(&config).err().unwrap();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::MissingCredential { var_name }) => {
                assert_eq!(var_name, "LLM_API_KEY");
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
    }

    #[test]
    fn test_create_invoker_unknown_provider() {
        let config = Config {
            llm_service_type: "bedrock".to_string(),
            ..create_test_config()
        };

        let err = create_invoker(&config).err().unwrap();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::UnknownProvider { name }) => {
                assert_eq!(name, "bedrock");
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_message_with_tool_calls() {
        let message = serde_json::json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "read_document",
                        "arguments": "{\"path\": \"pdf_downloads/2501.01234v1.pdf\"}"
                    }
                },
                {
                    "id": "call_2",
                    "type": "function",
                    "function": {
                        "name": "list_pages",
                        "arguments": "not-json"
                    }
                }
            ]
        });

        let turn = parse_chat_message(message);
        assert!(!turn.is_final());
        assert!(turn.content.is_none());
        assert_eq!(turn.tool_calls.len(), 2);
        assert_eq!(turn.tool_calls[0].name, "read_document");
        assert_eq!(
            turn.tool_calls[0].arguments["path"],
            "pdf_downloads/2501.01234v1.pdf"
        );
        // 非法 arguments 降级为空对象
        assert_eq!(turn.tool_calls[1].arguments, serde_json::json!({}));
    }

    #[test]
    fn test_parse_chat_message_final_answer() {
        let message = serde_json::json!({
            "role": "assistant",
            "content": "## 研究问题\n本文研究了……",
        });

        let turn = parse_chat_message(message);
        assert!(turn.is_final());
        assert_eq!(turn.content.as_deref(), Some("## 研究问题\n本文研究了……"));
        assert_eq!(turn.assistant_message["role"], "assistant");
    }

    #[test]
    fn test_parse_chat_message_blank_content() {
        let message = serde_json::json!({
            "role": "assistant",
            "content": "   ",
        });

        let turn = parse_chat_message(message);
        assert!(turn.is_final());
        assert!(turn.content.is_none());
    }

    /// 测试通用 LLM 调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=sk-xxx cargo test test_invoke_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_invoke_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let invoker = create_invoker(&config).unwrap();

        println!("\n========== 测试通用 LLM 调用 ==========");
        let result = invoker
            .invoke("请用一句话介绍 arXiv。", Some("你是一个简洁的助手，回答要简短。"))
            .await;

        match result {
            Ok(response) => {
                println!("\n========== LLM 响应 ==========");
                println!("{}", response);
                println!("==============================\n");
                println!("✅ 通用 LLM 调用成功！");
                assert!(!response.is_empty());
            }
            Err(e) => {
                println!("❌ LLM 调用失败: {}", e);
                panic!("测试失败: {}", e);
            }
        }
    }
}
