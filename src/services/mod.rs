pub mod artifact_store;
pub mod llm_service;
pub mod pdf_fetcher;
pub mod report_writer;

pub use artifact_store::{ArtifactStore, FsArtifactStore};
pub use llm_service::{create_invoker, ChatTurn, LlmInvoke, OpenAiInvoker, ToolCallRequest};
pub use pdf_fetcher::PdfFetcher;
pub use report_writer::ReportWriter;
