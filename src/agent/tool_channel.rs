//! 工具通道
//!
//! ## 职责
//! - 与文档工具后端（Streamable HTTP 上的 JSON-RPC 2.0）建立会话
//! - 提供工具清单查询和工具调用
//! - 把工具定义转换为 OpenAI function 格式
//!
//! 响应体可能是纯 JSON，也可能是 SSE（取第一条 `data:` 行）

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::AgentError;

/// 后端声明的单个工具
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema 形式的入参定义
    pub input_schema: Value,
}

/// 工具后端的抽象
#[async_trait]
pub trait ToolChannel: Send + Sync {
    /// 查询可用工具清单
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// 调用工具，返回拼接好的文本结果
    async fn invoke_tool(&self, name: &str, arguments: &Value) -> Result<String>;
}

/// Streamable HTTP 实现
pub struct McpHttpChannel {
    http: reqwest::Client,
    url: String,
    session_id: Option<String>,
    next_id: AtomicU64,
}

impl McpHttpChannel {
    /// 建立会话
    ///
    /// 完整握手：initialize、捕获会话头、发送 initialized 通知。
    /// 任何一步失败都折叠为 `AgentError::ChannelUnavailable`
    pub async fn connect(url: &str, timeout_secs: u64) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AgentError::channel_unavailable(url, e))?;

        let mut channel = Self {
            http,
            url: url.to_string(),
            session_id: None,
            next_id: AtomicU64::new(1),
        };

        let id = channel.next_id.fetch_add(1, Ordering::SeqCst);
        let msg = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "arxiv-auto-read",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            },
        });

        let resp = channel
            .http
            .post(&channel.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&msg)
            .send()
            .await
            .map_err(|e| AgentError::channel_unavailable(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::channel_unavailable(
                url,
                format!("initialize 返回 HTTP {}", status),
            ));
        }

        // 会话 ID 在响应头里，后续请求都要带上
        let session_id = resp
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let content_type = header_str(&resp, CONTENT_TYPE);
        let body = resp
            .text()
            .await
            .map_err(|e| AgentError::channel_unavailable(url, e))?;
        let payload =
            parse_body(&content_type, &body).map_err(|e| AgentError::channel_unavailable(url, e))?;
        if let Some(err) = payload.get("error") {
            return Err(AgentError::channel_unavailable(
                url,
                format!("initialize 失败: {}", err),
            ));
        }

        channel.session_id = session_id;
        channel
            .notify("notifications/initialized")
            .await
            .map_err(|e| AgentError::channel_unavailable(url, e))?;

        info!("🔗 已连接工具后端: {}", url);
        Ok(channel)
    }

    /// 发送 JSON-RPC 请求并返回 result 字段
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let msg = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("JSON-RPC 请求: {} (id: {})", method, id);

        let mut req = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&msg);
        if let Some(sid) = &self.session_id {
            req = req.header("mcp-session-id", sid);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("{} 请求失败", method))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("{} 返回错误状态: HTTP {}", method, status);
        }

        let content_type = header_str(&resp, CONTENT_TYPE);
        let body = resp
            .text()
            .await
            .with_context(|| format!("读取 {} 响应失败", method))?;
        let payload = parse_body(&content_type, &body)?;

        if let Some(err) = payload.get("error") {
            anyhow::bail!("{} 返回 JSON-RPC 错误: {}", method, err);
        }

        Ok(payload.get("result").cloned().unwrap_or(Value::Null))
    }

    /// 发送 JSON-RPC 通知（无 id，不解析响应体）
    async fn notify(&self, method: &str) -> Result<()> {
        let msg = json!({"jsonrpc": "2.0", "method": method});

        let mut req = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(&msg);
        if let Some(sid) = &self.session_id {
            req = req.header("mcp-session-id", sid);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("{} 通知发送失败", method))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("{} 通知返回错误状态: HTTP {}", method, status);
        }

        Ok(())
    }
}

#[async_trait]
impl ToolChannel for McpHttpChannel {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result = self.request("tools/list", json!({})).await?;

        let mut tools = Vec::new();
        if let Some(arr) = result.get("tools").and_then(|v| v.as_array()) {
            for t in arr {
                let name = t
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or_default()
                    .to_string();
                if name.is_empty() {
                    continue;
                }
                let description = t
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or_default()
                    .to_string();
                let input_schema = t
                    .get("inputSchema")
                    .cloned()
                    .unwrap_or_else(|| json!({"type": "object"}));
                tools.push(ToolDescriptor {
                    name,
                    description,
                    input_schema,
                });
            }
        }

        info!("📡 工具后端提供 {} 个工具", tools.len());
        Ok(tools)
    }

    async fn invoke_tool(&self, name: &str, arguments: &Value) -> Result<String> {
        debug!("调用工具: {} 参数: {}", name, arguments);
        let result = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;
        Ok(render_tool_result(&result))
    }
}

/// 启动阶段的连通性探测
///
/// 只做一次完整握手，成功即认为后端可用
pub async fn probe(url: &str, timeout_secs: u64) -> Result<(), AgentError> {
    McpHttpChannel::connect(url, timeout_secs).await.map(|_| ())
}

/// 把工具清单转换为 OpenAI function 定义
pub fn build_tool_defs(tools: &[ToolDescriptor]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                },
            })
        })
        .collect()
}

/// 把工具调用结果压成一段文本
///
/// content 数组里的 text 块按行拼接；isError 时加前缀；
/// 没有任何 text 块时退回原始 JSON
pub fn render_tool_result(result: &Value) -> String {
    let mut parts = Vec::new();
    if let Some(content) = result.get("content").and_then(|c| c.as_array()) {
        for block in content {
            if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                parts.push(text.to_string());
            }
        }
    }

    let joined = if parts.is_empty() {
        result.to_string()
    } else {
        parts.join("\n")
    };

    if result
        .get("isError")
        .and_then(|b| b.as_bool())
        .unwrap_or(false)
    {
        format!("工具执行出错: {}", joined)
    } else {
        joined
    }
}

fn header_str(resp: &reqwest::Response, name: reqwest::header::HeaderName) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// SSE 响应体里取第一条 data 行
fn parse_body(content_type: &str, body: &str) -> Result<Value> {
    let payload = if content_type.contains("text/event-stream") {
        extract_sse_data(body).ok_or_else(|| anyhow::anyhow!("SSE 响应中没有 data 行"))?
    } else {
        body.to_string()
    };
    serde_json::from_str(&payload).context("解析 JSON-RPC 响应失败")
}

fn extract_sse_data(body: &str) -> Option<String> {
    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}
