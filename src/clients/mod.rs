pub mod insight_store;
pub mod llm_engine;
pub mod prompts;
pub mod traits;
pub mod transcript_client;
pub mod youtube_client;

pub use insight_store::{JsonFileInsightStore, MemoryInsightStore};
pub use llm_engine::LlmAnalysisEngine;
pub use traits::{CommentSupplier, ContextSupplier, InsightStore, TextAnalysisEngine};
pub use transcript_client::CommandTranscriptSupplier;
pub use youtube_client::YouTubeCommentSupplier;
