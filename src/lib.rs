//! # arXiv Auto Read
//!
//! 一个自动抓取并分析 arXiv 论文的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 外部接口层（API）
//! - `api/` - 与外部系统的交互
//! - `arxiv` - arXiv Atom API 查询与解析
//! - `semantic_scholar` - 引用量查询
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇论文
//! - `LlmInvoke` - LLM 调用能力（一问一答 + 工具会话轮次）
//! - `PdfFetcher` - PDF 下载能力
//! - `ArtifactStore` - 精读产物存取能力
//! - `ReportWriter` - 报告追加能力
//!
//! ### ③ 精读代理层（Agent）
//! - `agent/` - 让模型带着工具读论文
//! - `ToolChannel` - 与文档工具后端的会话通道
//! - `DeepReadSession` - 有界的工具调用循环
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一篇论文"的完整处理流程
//! - `PaperCtx` - 上下文封装（序号 + 总数）
//! - `PaperFlow` - 流程编排（简述 → 标签 → 引用量 → 精读 → 报告）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量论文处理器，顺序调度并隔离失败
//!
//! ## 模块结构

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AgentError, ConfigError};
pub use models::{AnalysisArtifact, CitationCount, DeepReadStatus, PaperRecord};
pub use orchestrator::App;
pub use services::{create_invoker, ArtifactStore, FsArtifactStore, LlmInvoke};
pub use workflow::{FlowOutcome, PaperCtx, PaperFlow};
