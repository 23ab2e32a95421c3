//! 论文处理上下文
//!
//! 封装"我正在处理第几篇论文"这一信息

use std::fmt::Display;

/// 论文处理上下文
///
/// 只用于日志显示，不参与业务逻辑
#[derive(Debug, Clone, Copy)]
pub struct PaperCtx {
    /// 论文在本次运行中的序号（从1开始）
    pub paper_index: usize,

    /// 本次运行的论文总数
    pub total: usize,
}

impl PaperCtx {
    /// 创建新的论文上下文
    pub fn new(paper_index: usize, total: usize) -> Self {
        Self { paper_index, total }
    }
}

impl Display for PaperCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[论文 {}/{}]", self.paper_index, self.total)
    }
}
