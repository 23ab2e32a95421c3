//! 提示词构建
//!
//! 集中管理向 LLM 发送的各类提示词，流程层和会话层只管调用

use crate::models::PaperRecord;

/// 构建摘要翻译总结的提示词
pub fn build_summary_prompt(paper: &PaperRecord) -> String {
    format!(
        r#"下面是一篇 arXiv 论文的标题和英文摘要，请用中文总结。

【要求】
1. 用中文写一段 200 字左右的简述，说明论文做了什么、怎么做的、效果如何
2. 专业术语（如 LLM、fuzzing、prompt injection 等）保留英文原文
3. 不要逐句翻译，要概括
4. 只返回简述本身，不要任何开场白或结尾

标题：{}

摘要：{}"#,
        paper.title, paper.summary
    )
}

/// 构建主题标签提取的提示词
///
/// 标签基于中文简述而不是英文原始摘要
pub fn build_tag_prompt(paper: &PaperRecord, translated_summary: &str) -> String {
    format!(
        r#"请根据下面这篇论文的标题和中文简述，提取 3 到 6 个主题标签。

【要求】
1. 标签要具体，如"模糊测试"、"提示注入"、"漏洞挖掘"，不要太宽泛
2. 如果论文是用 LLM 解决安全问题，必须包含标签"LLM for Security"
3. 如果论文是研究 LLM 自身的安全问题，必须包含标签"Security for LLM"
4. 只返回标签本身，用英文逗号分隔，不要编号、不要解释、不要其他内容

标题：{}

中文简述：{}"#,
        paper.title, translated_summary
    )
}

/// 精读会话的系统提示词
pub fn system_prompt() -> String {
    r#"你是一位论文精读专家。你可以调用提供的工具来读取本地论文文档的内容。

工作方式：
1. 先用工具获取文档内容，必要时可多次调用
2. 读完后输出一份结构化的中文分析报告，使用 Markdown 格式
3. 报告必须包含以下四个小节：
   ## 研究问题
   ## 方法
   ## 实验与结果
   ## 结论与局限性
4. 专业术语保留英文原文
5. 当你不再需要调用工具时，直接输出完整报告作为最终回答"#
        .to_string()
}

/// 构建精读任务的用户消息
///
/// # 参数
/// - `document_path`: 论文文件路径，模型在工具调用里使用
/// - `file_name`: 论文文件名
pub fn build_read_task(document_path: &str, file_name: &str) -> String {
    format!(
        "请精读这篇论文并输出分析报告。论文文件名：{}，文件路径：{}",
        file_name, document_path
    )
}
