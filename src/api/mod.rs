//! API 模块
//!
//! 负责所有与外部系统的交互

pub mod arxiv;
pub mod semantic_scholar;

// 重新导出常用函数
pub use arxiv::search_recent;
pub use semantic_scholar::get_citation_count;
