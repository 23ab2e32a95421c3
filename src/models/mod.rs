pub mod loaders;
pub mod paper;

pub use loaders::load_feed_file;
pub use paper::{category_label, AnalysisArtifact, CitationCount, DeepReadStatus, PaperRecord};
