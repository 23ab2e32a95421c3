//! 批量论文处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责论文批量处理和全局统计。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、校验配置、创建 LLM 调用器、探测工具后端
//! 2. **批量加载**：从 arXiv API 或本地清单文件加载论文（`Vec<PaperRecord>`）
//! 3. **顺序处理**：逐篇执行处理流程，单篇失败不中断整体
//! 4. **全局统计**：汇总所有论文的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单篇论文的细节
//! - **失败隔离**：单篇论文的错误只记日志和计数
//! - **向下委托**：委托 PaperFlow 处理单篇论文

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::agent;
use crate::api::arxiv;
use crate::config::Config;
use crate::models::{load_feed_file, PaperRecord};
use crate::services::{create_invoker, ReportWriter};
use crate::workflow::{FlowOutcome, PaperCtx, PaperFlow};

/// 应用主结构
pub struct App {
    config: Config,
    flow: PaperFlow,
}

impl App {
    /// 初始化应用
    ///
    /// 配置无效、凭证缺失或（启用精读时）工具后端不可达都在这里直接失败
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        config.validate().context("配置校验失败")?;

        // 创建 LLM 调用器（凭证检查在这里发生）
        let invoker = create_invoker(&config)?;
        info!("✓ LLM 服务已就绪 (模型: {})", invoker.model_name());

        // 启用精读时先探测工具后端，不可达立即退出
        if config.deep_read {
            agent::probe(&config.mcp_url, config.request_timeout_secs)
                .await
                .context("工具后端探测失败")?;
            info!("✓ 工具后端可达: {}", config.mcp_url);
        }

        // 本次运行的报告横幅
        ReportWriter::with_path(&config.report_file)
            .append_run_banner()
            .await
            .context("初始化报告文件失败")?;

        let flow = PaperFlow::new(&config, invoker)?;

        Ok(Self { config, flow })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 加载所有待处理的论文
        let all_papers = self.load_papers().await?;

        if all_papers.is_empty() {
            warn!("⚠️ 没有找到待处理的论文，程序结束");
            return Ok(());
        }

        log_papers_loaded(all_papers.len(), &self.config);

        // 处理所有论文
        let stats = self.process_all_papers(all_papers).await;

        // 输出最终统计
        print_final_stats(&stats, &self.config);

        Ok(())
    }

    /// 加载论文
    ///
    /// 配置了清单文件时从本地读取，否则查询 arXiv API。
    /// arXiv 查询失败折叠为空批次，由空批次路径正常收尾，不终止程序
    async fn load_papers(&self) -> Result<Vec<PaperRecord>> {
        match &self.config.feed_file {
            Some(path) => {
                info!("\n📁 正在读取论文清单: {}", path);
                load_feed_file(path).await
            }
            None => {
                info!("\n📡 正在查询 arXiv...");
                match arxiv::search_recent(&self.config).await {
                    Ok(records) => Ok(records),
                    Err(e) => {
                        error!("❌ arXiv 查询失败: {:#}", e);
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    /// 顺序处理所有论文
    ///
    /// 单篇失败只计数，不中断后续论文
    async fn process_all_papers(&self, all_papers: Vec<PaperRecord>) -> ProcessingStats {
        let total = all_papers.len();
        let mut stats = ProcessingStats {
            total,
            ..Default::default()
        };

        for (idx, paper) in all_papers.iter().enumerate() {
            let ctx = PaperCtx::new(idx + 1, total);

            match self.flow.run(paper, &ctx).await {
                Ok(FlowOutcome::Reported) => stats.reported += 1,
                Ok(FlowOutcome::Discarded) => stats.discarded += 1,
                Err(e) => {
                    error!("{} ❌ 处理失败: {:#}", ctx, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    reported: usize,
    discarded: usize,
    failed: usize,
    total: usize,
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - arXiv 论文自动分析");
    info!(
        "🤖 模型: {} | 精读: {}",
        config.llm_model_name,
        if config.deep_read { "启用" } else { "关闭" }
    );
    info!("{}", "=".repeat(60));
}

fn log_papers_loaded(total: usize, config: &Config) {
    info!("✓ 共 {} 篇待处理论文", total);
    info!("📋 将逐篇顺序处理，单篇失败不影响其余论文");
    info!("💡 报告输出: {}\n", config.report_file);
}

fn print_final_stats(stats: &ProcessingStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已写入报告: {}/{}", stats.reported, stats.total);
    if stats.discarded > 0 {
        info!("📑 精读失败丢弃: {}", stats.discarded);
    }
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", config.report_file);
}
