use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单条评论
///
/// 由评论供应方产生，之后只读；整条管线都保持供应方返回的顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// 作者显示名
    pub author: String,
    /// 评论原文
    pub text: String,
    /// 发布时间
    pub posted_at: DateTime<Utc>,
}

impl CommentRecord {
    pub fn new(
        author: impl Into<String>,
        text: impl Into<String>,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            posted_at,
        }
    }

    /// 格式化为发给分析引擎的一行描述（作者、日期、原文）
    pub fn to_prompt_line(&self) -> String {
        format!(
            "Auteur: {} | Date: {} | Commentaire: \"{}\"",
            self.author,
            self.posted_at.format("%Y-%m-%d"),
            self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_prompt_line_keeps_text_verbatim() {
        let posted_at = Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap();
        let comment = CommentRecord::new("Alice", "Super vidéo, merci !", posted_at);

        assert_eq!(
            comment.to_prompt_line(),
            "Auteur: Alice | Date: 2024-03-09 | Commentaire: \"Super vidéo, merci !\""
        );
    }
}
