use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::{CommentRecord, Insight, InsightKey};

/// 评论供应方
#[async_trait]
pub trait CommentSupplier: Send + Sync {
    /// 按供应方顺序返回至多 `max_results` 条评论
    async fn get_comments(
        &self,
        content_id: &str,
        max_results: usize,
    ) -> ClientResult<Vec<CommentRecord>>;
}

/// 共享上下文（如视频转写）供应方
#[async_trait]
pub trait ContextSupplier: Send + Sync {
    async fn get_context(&self, content_id: &str) -> ClientResult<String>;
}

/// 文本分析引擎
#[async_trait]
pub trait TextAnalysisEngine: Send + Sync {
    /// 分析一批格式化后的评论行，返回原始分节文本
    async fn analyze(&self, batch_lines: &[String], shared_context: &str) -> ClientResult<String>;

    /// 对上下文生成摘要，每次运行调用一次
    async fn summarize_context(&self, context: &str) -> ClientResult<String>;
}

/// insight 存储
#[async_trait]
pub trait InsightStore: Send + Sync {
    async fn save(&self, insight: &Insight) -> ClientResult<()>;

    /// 未找到时返回 `Ok(None)`
    async fn find_by_key(&self, key: &InsightKey) -> ClientResult<Option<Insight>>;
}
