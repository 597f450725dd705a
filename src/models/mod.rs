pub mod comment;
pub mod insight;

pub use comment::CommentRecord;
pub use insight::{Insight, InsightKey, PartialInsight};
