use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 单批评论的分析结果
///
/// 列表字段缺失时一律是空列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialInsight {
    /// 情感标签（如 "Positif"），无法解析时为空串
    pub sentiment: String,
    /// 本批摘要
    pub summary: String,
    pub top_comments: Vec<String>,
    pub negative_comments: Vec<String>,
    pub question_comments: Vec<String>,
    pub feedback_comments: Vec<String>,
    pub keywords: Vec<String>,
}

impl PartialInsight {
    /// 所有字段都为空（解析失败的批次）
    pub fn is_empty(&self) -> bool {
        self.sentiment.trim().is_empty()
            && self.summary.trim().is_empty()
            && self.top_comments.is_empty()
            && self.negative_comments.is_empty()
            && self.question_comments.is_empty()
            && self.feedback_comments.is_empty()
            && self.keywords.is_empty()
    }
}

/// 一次编排运行的最终聚合结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub owner_id: String,
    pub content_id: String,
    pub created_at: DateTime<Utc>,
    pub sentiment: String,
    pub summary: String,
    pub top_comments: Vec<String>,
    pub negative_comments: Vec<String>,
    pub question_comments: Vec<String>,
    pub feedback_comments: Vec<String>,
    pub keywords: Vec<String>,
    /// 外部转写摘要，与分批管线无关
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_summary: Option<String>,
}

impl Insight {
    pub fn key(&self) -> InsightKey {
        InsightKey::new(self.owner_id.clone(), self.content_id.clone())
    }
}

/// 存储层的查找键：(owner, content)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsightKey {
    pub owner_id: String,
    pub content_id: String,
}

impl InsightKey {
    pub fn new(owner_id: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            content_id: content_id.into(),
        }
    }
}

impl Display for InsightKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[owner#{} content#{}]", self.owner_id, self.content_id)
    }
}
