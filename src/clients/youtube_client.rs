/// YouTube 评论客户端
///
/// 封装 YouTube Data API v3 `commentThreads` 的分页拉取
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::clients::traits::CommentSupplier;
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::models::CommentRecord;

/// 单页最大条数（API 上限）
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadListResponse {
    #[serde(default)]
    items: Vec<ThreadItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadItem {
    snippet: Option<ThreadSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    author_display_name: String,
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    published_at: String,
}

/// YouTube 评论供应方
pub struct YouTubeCommentSupplier {
    http: Client,
    api_key: String,
    api_base_url: String,
}

impl YouTubeCommentSupplier {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            api_key: config.youtube_api_key.clone(),
            api_base_url: config.youtube_api_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(
        &self,
        content_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> ClientResult<ThreadListResponse> {
        let endpoint = format!("{}/commentThreads", self.api_base_url);
        let page_size = page_size.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", content_id),
            ("textFormat", "plainText"),
            ("maxResults", page_size.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self.http.get(&endpoint).query(&query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::from_status(endpoint, status.as_u16(), body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CommentSupplier for YouTubeCommentSupplier {
    async fn get_comments(
        &self,
        content_id: &str,
        max_results: usize,
    ) -> ClientResult<Vec<CommentRecord>> {
        if self.api_key.is_empty() {
            return Err(ClientError::Other("YOUTUBE_API_KEY 未配置".to_string()));
        }

        info!("获取评论: content {} (最多 {} 条)", content_id, max_results);

        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        while comments.len() < max_results {
            let remaining = (max_results - comments.len()).min(PAGE_SIZE);
            let page = self
                .fetch_page(content_id, remaining, page_token.as_deref())
                .await?;

            let received = page.items.len();
            comments.extend(collect_comments(content_id, page.items));
            debug!("本页 {} 个评论串，累计 {} 条", received, comments.len());

            match page.next_page_token {
                Some(token) if received > 0 => page_token = Some(token),
                _ => break,
            }
        }

        comments.truncate(max_results);
        info!("获取到 {} 条评论: content {}", comments.len(), content_id);
        Ok(comments)
    }
}

fn collect_comments(content_id: &str, items: Vec<ThreadItem>) -> Vec<CommentRecord> {
    items
        .into_iter()
        .filter_map(|item| {
            let snippet = item
                .snippet
                .and_then(|s| s.top_level_comment)
                .and_then(|c| c.snippet);
            if snippet.is_none() {
                warn!("content {} 的评论结构异常，已跳过", content_id);
            }
            snippet
        })
        .map(|snippet| CommentRecord {
            author: snippet.author_display_name,
            text: snippet.text_display,
            posted_at: parse_published_at(content_id, &snippet.published_at),
        })
        .collect()
}

fn parse_published_at(content_id: &str, raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(time) => time.with_timezone(&Utc),
        Err(e) => {
            warn!("content {} 的评论日期 '{}' 解析失败: {}，使用当前时间", content_id, raw, e);
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"{
        "kind": "youtube#commentThreadListResponse",
        "nextPageToken": "QURTSl9p",
        "items": [
            {"snippet": {"topLevelComment": {"snippet": {
                "authorDisplayName": "@alice",
                "textDisplay": "Première !",
                "publishedAt": "2024-04-01T10:00:00Z"
            }}}},
            {"snippet": {}},
            {"snippet": {"topLevelComment": {"snippet": {
                "authorDisplayName": "@bob",
                "textDisplay": "Merci",
                "publishedAt": "2024-04-02T11:30:00Z"
            }}}}
        ]
    }"#;

    #[test]
    fn test_collect_comments_skips_malformed_threads() {
        let page: ThreadListResponse = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("QURTSl9p"));

        let comments = collect_comments("vid", page.items);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author, "@alice");
        assert_eq!(comments[0].text, "Première !");
        assert_eq!(
            comments[1].posted_at,
            Utc.with_ymd_and_hms(2024, 4, 2, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_bad_date_falls_back_to_now() {
        let before = Utc::now();
        let parsed = parse_published_at("vid", "hier");
        assert!(parsed >= before);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let supplier = YouTubeCommentSupplier::new(&Config::default());
        let result = supplier.get_comments("vid", 10).await;
        assert!(matches!(result, Err(ClientError::Other(_))));
    }

    #[tokio::test]
    #[ignore]
    async fn test_get_comments_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let supplier = YouTubeCommentSupplier::new(&Config::from_env());
        let comments = supplier
            .get_comments("dQw4w9WgXcQ", 150)
            .await
            .expect("获取评论失败");
        println!("获取到 {} 条评论", comments.len());
        assert!(comments.len() <= 150);
    }
}
