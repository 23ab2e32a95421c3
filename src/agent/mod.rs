//! 精读代理层
//!
//! 负责"让模型带着工具读论文"这件事：
//! - `tool_channel`: 与文档工具后端的会话通道
//! - `prompts`: 各阶段提示词
//! - `session`: 有界的工具调用循环

pub mod prompts;
pub mod session;
pub mod tool_channel;

pub use session::{DeepReadOutcome, DeepReadSession};
pub use tool_channel::{probe, McpHttpChannel, ToolChannel, ToolDescriptor};
