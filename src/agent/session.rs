//! 精读会话
//!
//! ## 职责
//! - 驱动"模型请求工具 → 执行工具 → 结果回传"的有界循环
//! - 会话产物交给 `ArtifactStore` 落盘
//! - 产物已存在时跳过整个会话，不产生任何 LLM 流量
//!
//! ## 终止条件
//! - 模型不再请求工具且给出非空文本：正常完成
//! - 达到最大轮数：`AgentError::TurnLimitExceeded`
//! - 最终文本为空：`AgentError::EmptyFinalAnswer`

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AgentError;
use crate::services::{ArtifactStore, LlmInvoke};
use crate::utils::logging::truncate_text;

use super::prompts;
use super::tool_channel::{build_tool_defs, McpHttpChannel, ToolChannel};

/// 会话步骤的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRole {
    Assistant,
    Tool,
}

impl StepRole {
    fn label(&self) -> &'static str {
        match self {
            StepRole::Assistant => "模型",
            StepRole::Tool => "工具",
        }
    }
}

/// 会话过程中记录的单个步骤
#[derive(Debug, Clone)]
pub struct SessionStep {
    pub role: StepRole,
    pub content: String,
}

/// 会话的成功结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepReadOutcome {
    /// 本次完成精读并落盘
    Completed { artifact_path: String },
    /// 产物已存在，本次跳过
    AlreadyAnalyzed { artifact_path: String },
}

/// 精读会话
pub struct DeepReadSession {
    invoker: Arc<dyn LlmInvoke>,
    store: Arc<dyn ArtifactStore>,
    mcp_url: String,
    max_turns: usize,
    timeout_secs: u64,
    verbose_logging: bool,
}

impl DeepReadSession {
    /// 创建精读会话
    pub fn new(config: &Config, invoker: Arc<dyn LlmInvoke>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            invoker,
            store,
            mcp_url: config.mcp_url.clone(),
            max_turns: config.max_agent_turns,
            timeout_secs: config.request_timeout_secs,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 对单个文档执行精读
    ///
    /// 产物已存在时直接返回，不建立工具通道
    pub async fn run(&self, document: &Path) -> Result<DeepReadOutcome> {
        let key = self.store.key_for(document);
        if self.store.exists(&key).await {
            let path = self.store.path_for(&key);
            info!("📑 已有分析产物，跳过精读: {}", path.display());
            return Ok(DeepReadOutcome::AlreadyAnalyzed {
                artifact_path: path.display().to_string(),
            });
        }

        let channel = McpHttpChannel::connect(&self.mcp_url, self.timeout_secs).await?;
        self.run_with_channel(document, &channel).await
    }

    /// 在给定的工具通道上执行精读
    pub async fn run_with_channel(
        &self,
        document: &Path,
        channel: &dyn ToolChannel,
    ) -> Result<DeepReadOutcome> {
        let key = self.store.key_for(document);
        if self.store.exists(&key).await {
            let path = self.store.path_for(&key);
            info!("📑 已有分析产物，跳过精读: {}", path.display());
            return Ok(DeepReadOutcome::AlreadyAnalyzed {
                artifact_path: path.display().to_string(),
            });
        }

        let answer = self.drive_loop(document, channel).await?;
        let path = self.store.save(&key, &answer).await?;

        Ok(DeepReadOutcome::Completed {
            artifact_path: path.display().to_string(),
        })
    }

    /// 有界会话循环
    async fn drive_loop(&self, document: &Path, channel: &dyn ToolChannel) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let short_token = &token[..8];

        let tools = channel.list_tools().await.context("获取工具清单失败")?;
        let tool_defs = build_tool_defs(&tools);

        info!(
            "🤖 开始精读会话 [{}] (模型: {}, 工具: {}, 最大 {} 轮)",
            short_token,
            self.invoker.model_name(),
            tools.len(),
            self.max_turns
        );

        let document_path = document.display().to_string();
        let document_name = document
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| document_path.clone());
        let mut messages = vec![
            json!({"role": "system", "content": prompts::system_prompt()}),
            json!({
                "role": "user",
                "content": prompts::build_read_task(&document_path, &document_name),
            }),
        ];

        let mut steps: Vec<SessionStep> = Vec::new();

        for turn in 0..self.max_turns {
            debug!("[会话 {}] 第 {}/{} 轮", short_token, turn + 1, self.max_turns);

            let reply = self
                .invoker
                .chat_turn(&messages, &tool_defs)
                .await
                .with_context(|| format!("第 {} 轮 LLM 调用失败", turn + 1))?;

            if reply.is_final() {
                let content = reply.content.clone().unwrap_or_default();
                self.push_step(&mut steps, short_token, StepRole::Assistant, content);

                // 最终回答取最后一步的内容
                let answer = steps
                    .last()
                    .map(|step| step.content.trim().to_string())
                    .unwrap_or_default();
                if answer.is_empty() {
                    return Err(AgentError::EmptyFinalAnswer.into());
                }

                info!("✅ 精读会话完成 [{}] (共 {} 步)", short_token, steps.len());
                return Ok(answer);
            }

            let call_names: Vec<&str> = reply.tool_calls.iter().map(|c| c.name.as_str()).collect();
            let step_summary = match &reply.content {
                Some(text) => format!("{} | 工具调用: {}", text, call_names.join(", ")),
                None => format!("工具调用: {}", call_names.join(", ")),
            };
            self.push_step(&mut steps, short_token, StepRole::Assistant, step_summary);

            // assistant 消息必须先于对应的 tool 消息进入历史
            messages.push(reply.assistant_message.clone());

            for call in &reply.tool_calls {
                let result = channel
                    .invoke_tool(&call.name, &call.arguments)
                    .await
                    .map_err(|e| AgentError::tool_call_failed(&call.name, e))?;

                self.push_step(&mut steps, short_token, StepRole::Tool, result.clone());

                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": result,
                }));
            }
        }

        Err(AgentError::TurnLimitExceeded {
            max_turns: self.max_turns,
        }
        .into())
    }

    /// 记录并打印一个会话步骤
    fn push_step(&self, steps: &mut Vec<SessionStep>, token: &str, role: StepRole, content: String) {
        let limit = if self.verbose_logging { 400 } else { 120 };
        info!(
            "[会话 {}] 步骤 {} ({}): {}",
            token,
            steps.len() + 1,
            role.label(),
            truncate_text(&content, limit)
        );
        steps.push(SessionStep { role, content });
    }
}
