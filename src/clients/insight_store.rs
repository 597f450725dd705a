//! insight 存储实现
//!
//! - `MemoryInsightStore`：进程内，测试和单次运行用
//! - `JsonFileInsightStore`：每个 (owner, content) 一个 JSON 文件

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::clients::traits::InsightStore;
use crate::error::ClientResult;
use crate::models::{Insight, InsightKey};

#[derive(Default)]
pub struct MemoryInsightStore {
    insights: RwLock<HashMap<InsightKey, Insight>>,
}

impl MemoryInsightStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.insights.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.insights.read().await.is_empty()
    }
}

#[async_trait]
impl InsightStore for MemoryInsightStore {
    async fn save(&self, insight: &Insight) -> ClientResult<()> {
        self.insights
            .write()
            .await
            .insert(insight.key(), insight.clone());
        Ok(())
    }

    async fn find_by_key(&self, key: &InsightKey) -> ClientResult<Option<Insight>> {
        Ok(self.insights.read().await.get(key).cloned())
    }
}

pub struct JsonFileInsightStore {
    dir: PathBuf,
}

impl JsonFileInsightStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// 两部分分别 hex 编码，以 `.` 连接；不同的键不会落到同一个文件
    fn path_for(&self, key: &InsightKey) -> PathBuf {
        self.dir.join(format!(
            "{}.{}.json",
            hex::encode(key.owner_id.as_bytes()),
            hex::encode(key.content_id.as_bytes())
        ))
    }
}

#[async_trait]
impl InsightStore for JsonFileInsightStore {
    async fn save(&self, insight: &Insight) -> ClientResult<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&insight.key());
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(insight)?;

        // 先写临时文件再 rename，读者不会看到半个文件
        fs::write(&tmp, body).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("insight 已写入 {}", path.display());
        Ok(())
    }

    async fn find_by_key(&self, key: &InsightKey) -> ClientResult<Option<Insight>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                let insight: Insight = serde_json::from_slice(&bytes)?;
                if insight.key() != *key {
                    warn!("{} 的文件内容属于 {}，按未找到处理", key, insight.key());
                    return Ok(None);
                }
                Ok(Some(insight))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(owner: &str, content: &str) -> Insight {
        Insight {
            owner_id: owner.to_string(),
            content_id: content.to_string(),
            created_at: Utc::now(),
            sentiment: "Positif".to_string(),
            summary: "ok".to_string(),
            top_comments: vec!["a".to_string()],
            negative_comments: vec![],
            question_comments: vec![],
            feedback_comments: vec![],
            keywords: vec!["rust".to_string()],
            auxiliary_summary: None,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("comment_insight_{}_{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryInsightStore::new();
        let insight = sample("u1", "v1");

        store.save(&insight).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.find_by_key(&insight.key()).await.unwrap(), Some(insight));
        assert_eq!(store.find_by_key(&InsightKey::new("u1", "other")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_store_persists_and_overwrites() {
        let dir = temp_dir("overwrite");
        let store = JsonFileInsightStore::new(&dir);

        let mut insight = sample("u1", "v/1?x");
        store.save(&insight).await.unwrap();
        insight.sentiment = "Négatif".to_string();
        store.save(&insight).await.unwrap();

        let found = store.find_by_key(&insight.key()).await.unwrap().unwrap();
        assert_eq!(found.sentiment, "Négatif");
        assert_eq!(found, insight);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_json_store_missing_is_none() {
        let store = JsonFileInsightStore::new(temp_dir("missing"));
        let found = store.find_by_key(&InsightKey::new("nobody", "nothing")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_json_store_keeps_similar_keys_apart() {
        let dir = temp_dir("similar_keys");
        let store = JsonFileInsightStore::new(&dir);

        let mut dotted = sample("alice", "a.b");
        dotted.summary = "A".to_string();
        let mut underscored = sample("alice", "a_b");
        underscored.summary = "B".to_string();
        let mut joined = sample("bob__x", "y");
        joined.summary = "C".to_string();
        for insight in [&dotted, &underscored, &joined] {
            store.save(insight).await.unwrap();
        }

        let found = store.find_by_key(&InsightKey::new("alice", "a.b")).await.unwrap();
        assert_eq!(found.map(|i| i.summary), Some("A".to_string()));
        let found = store.find_by_key(&InsightKey::new("alice", "a_b")).await.unwrap();
        assert_eq!(found.map(|i| i.summary), Some("B".to_string()));
        let found = store.find_by_key(&InsightKey::new("bob", "x__y")).await.unwrap();
        assert!(found.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_json_store_ignores_file_of_another_key() {
        let dir = temp_dir("foreign_file");
        let store = JsonFileInsightStore::new(&dir);
        let wanted = InsightKey::new("alice", "v1");

        std::fs::create_dir_all(&dir).unwrap();
        let foreign = serde_json::to_vec(&sample("mallory", "v1")).unwrap();
        std::fs::write(store.path_for(&wanted), foreign).unwrap();

        assert!(store.find_by_key(&wanted).await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = temp_dir("failed_rename");
        let store = JsonFileInsightStore::new(&dir);
        let insight = sample("u1", "v1");

        let target = store.path_for(&insight.key());
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        assert!(store.save(&insight).await.is_err());
        assert!(!target.with_extension("json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_names_stay_filesystem_safe() {
        let store = JsonFileInsightStore::new("insights");
        let path = store.path_for(&InsightKey::new("../etc", "pass/wd"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.'));
        assert_eq!(path.parent(), Some(Path::new("insights")));
    }
}
