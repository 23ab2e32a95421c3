//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量论文处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载论文（Vec<PaperRecord>）
//! - 逐篇顺序处理，隔离单篇失败
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PaperRecord>)
//!     ↓
//! workflow::PaperFlow (处理单篇 PaperRecord)
//!     ↓
//! services (能力层：llm / pdf / artifact / report)
//!     ↓
//! agent (精读会话：tool_channel / session)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，PaperFlow 管单篇
//! 2. **失败隔离**：单篇论文出错只计数，不中断整体
//! 3. **向下依赖**：编排层 → workflow → services / agent
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::App;
