//! 合并 - 业务能力层
//!
//! 把 N 个批次的 `PartialInsight` 合并成一个结果：
//! - 情感：多数票，并列时取固定的并列标签
//! - 摘要：按批次顺序第一个非空摘要
//! - 示例列表：按批次顺序拼接 → 精确去重（保留首次出现）→ 截断
//! - 关键词：小写后计数 → 频次降序、字母升序 → 截断

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::config::InsightConfig;
use crate::models::{Insight, InsightKey, PartialInsight};

/// 合并参数
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub example_limit: usize,
    pub keyword_limit: usize,
    pub mixed_label: String,
    pub summary_placeholder: String,
}

impl MergeOptions {
    pub fn from_config(config: &InsightConfig) -> Self {
        Self {
            example_limit: config.example_limit,
            keyword_limit: config.keyword_limit,
            mixed_label: config.mixed_label.clone(),
            summary_placeholder: config.summary_placeholder.clone(),
        }
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::from_config(&InsightConfig::default())
    }
}

/// 合并时由编排层提供的上下文字段
#[derive(Debug, Clone)]
pub struct MergeContext {
    pub key: InsightKey,
    pub created_at: DateTime<Utc>,
    pub auxiliary_summary: Option<String>,
}

/// 合并所有批次结果
///
/// 调用方保证 `partials` 非空；零个成功批次由编排层作为致命错误处理
pub fn merge(partials: &[PartialInsight], ctx: MergeContext, options: &MergeOptions) -> Insight {
    debug_assert!(!partials.is_empty(), "merge requires at least one partial");
    let limit = options.example_limit;

    Insight {
        owner_id: ctx.key.owner_id,
        content_id: ctx.key.content_id,
        created_at: ctx.created_at,
        sentiment: majority_sentiment(partials, &options.mixed_label),
        summary: first_summary(partials)
            .unwrap_or_else(|| options.summary_placeholder.clone()),
        top_comments: merge_examples(partials, |p| &p.top_comments, limit),
        negative_comments: merge_examples(partials, |p| &p.negative_comments, limit),
        question_comments: merge_examples(partials, |p| &p.question_comments, limit),
        feedback_comments: merge_examples(partials, |p| &p.feedback_comments, limit),
        keywords: rank_keywords(partials, options.keyword_limit),
        auxiliary_summary: ctx.auxiliary_summary,
    }
}

/// 多数票：严格最多者胜；并列返回 `mixed_label`；全空返回空串
pub fn majority_sentiment(partials: &[PartialInsight], mixed_label: &str) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for partial in partials {
        let label = partial.sentiment.trim();
        if !label.is_empty() {
            *counts.entry(label).or_insert(0) += 1;
        }
    }

    let Some(&max) = counts.values().max() else {
        return String::new();
    };
    let mut leaders = counts.iter().filter(|(_, count)| **count == max);
    match (leaders.next(), leaders.next()) {
        (Some((label, _)), None) => label.to_string(),
        _ => mixed_label.to_string(),
    }
}

fn first_summary(partials: &[PartialInsight]) -> Option<String> {
    partials
        .iter()
        .map(|p| p.summary.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// 按批次顺序拼接、去重、截断
pub fn merge_examples<F>(partials: &[PartialInsight], field: F, limit: usize) -> Vec<String>
where
    F: Fn(&PartialInsight) -> &Vec<String>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    partials
        .iter()
        .flat_map(|p| field(p).iter())
        .filter(|item| seen.insert(item.as_str()))
        .take(limit)
        .cloned()
        .collect()
}

/// 关键词按频次排序，频次相同按字母顺序
pub fn rank_keywords(partials: &[PartialInsight], limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for keyword in partials.iter().flat_map(|p| p.keywords.iter()) {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() {
            *counts.entry(keyword).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));
    ranked.into_iter().take(limit).map(|(k, _)| k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> MergeContext {
        MergeContext {
            key: InsightKey::new("owner-1", "video-1"),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            auxiliary_summary: Some("transcript summary".to_string()),
        }
    }

    fn with_sentiment(label: &str) -> PartialInsight {
        PartialInsight {
            sentiment: label.to_string(),
            ..Default::default()
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_partial_is_identity() {
        let partial = PartialInsight {
            sentiment: "Positif".to_string(),
            summary: "Très bien reçu.".to_string(),
            top_comments: strings(&["a", "b"]),
            negative_comments: strings(&["c"]),
            question_comments: strings(&["d ?"]),
            feedback_comments: strings(&["e"]),
            keywords: strings(&["rust", "tokio"]),
        };

        let insight = merge(&[partial.clone()], ctx(), &MergeOptions::default());

        assert_eq!(insight.owner_id, "owner-1");
        assert_eq!(insight.content_id, "video-1");
        assert_eq!(insight.sentiment, partial.sentiment);
        assert_eq!(insight.summary, partial.summary);
        assert_eq!(insight.top_comments, partial.top_comments);
        assert_eq!(insight.negative_comments, partial.negative_comments);
        assert_eq!(insight.question_comments, partial.question_comments);
        assert_eq!(insight.feedback_comments, partial.feedback_comments);
        assert_eq!(insight.keywords, partial.keywords);
        assert_eq!(insight.auxiliary_summary.as_deref(), Some("transcript summary"));
    }

    #[test]
    fn test_majority_wins() {
        let partials = [
            with_sentiment("Positive"),
            with_sentiment("Positive"),
            with_sentiment("Negative"),
        ];
        assert_eq!(majority_sentiment(&partials, "Mixed"), "Positive");
    }

    #[test]
    fn test_tie_is_mixed_regardless_of_order() {
        let forward = [with_sentiment("Positive"), with_sentiment("Negative")];
        let backward = [with_sentiment("Negative"), with_sentiment("Positive")];
        assert_eq!(majority_sentiment(&forward, "Mixed"), "Mixed");
        assert_eq!(majority_sentiment(&backward, "Mixed"), "Mixed");
    }

    #[test]
    fn test_blank_sentiments_do_not_vote() {
        let partials = [with_sentiment(""), with_sentiment("  "), with_sentiment("Neutre")];
        assert_eq!(majority_sentiment(&partials, "Mixed"), "Neutre");
        assert_eq!(majority_sentiment(&[with_sentiment("")], "Mixed"), "");
    }

    #[test]
    fn test_sentiment_is_case_sensitive() {
        let partials = [with_sentiment("Positive"), with_sentiment("positive")];
        assert_eq!(majority_sentiment(&partials, "Mixed"), "Mixed");
    }

    #[test]
    fn test_example_dedup_keeps_first_seen_order() {
        let partials = [
            PartialInsight {
                top_comments: strings(&["a", "b"]),
                ..Default::default()
            },
            PartialInsight {
                top_comments: strings(&["b", "c"]),
                ..Default::default()
            },
        ];
        let insight = merge(&partials, ctx(), &MergeOptions::default());
        assert_eq!(insight.top_comments, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_examples_truncated_to_limit() {
        let items: Vec<String> = (0..25).map(|i| format!("comment {}", i)).collect();
        let partials = [PartialInsight {
            feedback_comments: items.clone(),
            ..Default::default()
        }];
        let insight = merge(&partials, ctx(), &MergeOptions::default());
        assert_eq!(insight.feedback_comments, items[..10].to_vec());
    }

    #[test]
    fn test_keyword_ranking_with_alphabetical_tie_break() {
        let partials = [
            PartialInsight {
                keywords: strings(&["y", "X", "z"]),
                ..Default::default()
            },
            PartialInsight {
                keywords: strings(&["x", "Y"]),
                ..Default::default()
            },
            PartialInsight {
                keywords: strings(&["y", "x"]),
                ..Default::default()
            },
        ];
        assert_eq!(rank_keywords(&partials, 15), strings(&["x", "y", "z"]));
    }

    #[test]
    fn test_keyword_limit() {
        let keywords: Vec<String> = (0..30).map(|i| format!("k{:02}", i)).collect();
        let partials = [PartialInsight {
            keywords,
            ..Default::default()
        }];
        let ranked = rank_keywords(&partials, 15);
        assert_eq!(ranked.len(), 15);
        assert_eq!(ranked.first().map(String::as_str), Some("k00"));
    }

    #[test]
    fn test_summary_falls_back_to_first_non_empty_then_placeholder() {
        let partials = [
            PartialInsight {
                summary: "   ".to_string(),
                sentiment: "Positif".to_string(),
                ..Default::default()
            },
            PartialInsight {
                summary: "Deuxième lot.".to_string(),
                ..Default::default()
            },
        ];
        let options = MergeOptions::default();
        assert_eq!(merge(&partials, ctx(), &options).summary, "Deuxième lot.");

        let none = [with_sentiment("Positif")];
        assert_eq!(merge(&none, ctx(), &options).summary, options.summary_placeholder);
    }
}
