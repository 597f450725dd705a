use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置（进程级：密钥、端点、存储目录）
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- YouTube 配置 ---
    pub youtube_api_key: String,
    pub youtube_api_base_url: String,
    // --- 转写脚本 ---
    pub transcript_program: String,
    pub transcript_script: String,
    /// insight JSON 文件存放目录
    pub store_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 管线配置 TOML 文件（可选）
    pub insight_config_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.groq.com/openai/v1".to_string(),
            llm_model_name: "llama3-70b-8192".to_string(),
            llm_temperature: 0.5,
            llm_max_tokens: 2048,
            youtube_api_key: String::new(),
            youtube_api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            transcript_program: ".venv/bin/python".to_string(),
            transcript_script: "scripts/get_transcript.py".to_string(),
            store_dir: "insights".to_string(),
            verbose_logging: false,
            insight_config_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            llm_max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_tokens),
            youtube_api_key: std::env::var("YOUTUBE_API_KEY").unwrap_or(default.youtube_api_key),
            youtube_api_base_url: std::env::var("YOUTUBE_API_BASE_URL").unwrap_or(default.youtube_api_base_url),
            transcript_program: std::env::var("TRANSCRIPT_PROGRAM").unwrap_or(default.transcript_program),
            transcript_script: std::env::var("TRANSCRIPT_SCRIPT").unwrap_or(default.transcript_script),
            store_dir: std::env::var("STORE_DIR").unwrap_or(default.store_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            insight_config_file: std::env::var("INSIGHT_CONFIG_FILE").ok().or(default.insight_config_file),
        }
    }
}

/// 一个响应分节的约定：标题前缀 + "未找到"哨兵短语
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SectionSpec {
    /// 标题前缀（区分大小写，精确前缀匹配）
    pub header: String,
    /// 该节为空时引擎输出的句子开头（大小写不敏感）
    #[serde(default)]
    pub none_found: Option<String>,
}

impl SectionSpec {
    pub fn new(header: impl Into<String>, none_found: Option<&str>) -> Self {
        Self {
            header: header.into(),
            none_found: none_found.map(str::to_string),
        }
    }
}

/// 七个分节，顺序即响应中的约定顺序
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SectionHeaders {
    pub sentiment: SectionSpec,
    pub summary: SectionSpec,
    pub questions: SectionSpec,
    pub negative: SectionSpec,
    pub positive: SectionSpec,
    pub feedback: SectionSpec,
    pub keywords: SectionSpec,
}

impl Default for SectionHeaders {
    fn default() -> Self {
        Self {
            sentiment: SectionSpec::new("## 1. Sentiment Général", None),
            summary: SectionSpec::new("## 2. Résumé Général des Commentaires", None),
            questions: SectionSpec::new("## 3. Questions Posées", Some("Aucune question")),
            negative: SectionSpec::new("## 4. Critiques Négatives", Some("Aucune critique")),
            positive: SectionSpec::new(
                "## 5. Points Positifs ou Constructifs",
                Some("Aucun commentaire positif"),
            ),
            feedback: SectionSpec::new(
                "## 6. Feedbacks Spécifiques ou Techniques",
                Some("Aucun feedback"),
            ),
            keywords: SectionSpec::new(
                "## 7. Mots-clés et Thèmes Fréquents",
                Some("Aucun mot-clé"),
            ),
        }
    }
}

impl SectionHeaders {
    fn all(&self) -> [(&'static str, &SectionSpec); 7] {
        [
            ("sections.sentiment", &self.sentiment),
            ("sections.summary", &self.summary),
            ("sections.questions", &self.questions),
            ("sections.negative", &self.negative),
            ("sections.positive", &self.positive),
            ("sections.feedback", &self.feedback),
            ("sections.keywords", &self.keywords),
        ]
    }
}

/// 管线配置，构造编排器时一次性传入
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// 每批评论数
    pub batch_size: usize,
    /// 批次之间的等待（毫秒）
    pub inter_batch_delay_ms: u64,
    /// 每次运行最多获取的评论数
    pub max_comments: usize,
    /// 每个示例列表的上限
    pub example_limit: usize,
    /// 关键词上限
    pub keyword_limit: usize,
    /// 单次协作者调用的超时（毫秒）
    pub call_timeout_ms: u64,
    /// 作为分析上下文的转写最多保留的词数
    pub context_max_words: usize,
    pub sections: SectionHeaders,
    /// 所有批次都没有摘要时的占位
    pub summary_placeholder: String,
    /// 转写不可用时发给引擎的上下文
    pub context_placeholder: String,
    /// 转写不可用时的辅助摘要
    pub auxiliary_placeholder_no_context: String,
    /// 转写摘要生成失败时的辅助摘要
    pub auxiliary_placeholder_failed: String,
    /// 情感票数并列时的标签
    pub mixed_label: String,
    /// 去掉关键词后面的 "(12 mentions)" 计数
    pub strip_keyword_counts: bool,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            inter_batch_delay_ms: 500,
            max_comments: 2000,
            example_limit: 10,
            keyword_limit: 15,
            call_timeout_ms: 90_000,
            context_max_words: 5000,
            sections: SectionHeaders::default(),
            summary_placeholder: "Aucun résumé généré.".to_string(),
            context_placeholder: "Transcription non disponible.".to_string(),
            auxiliary_placeholder_no_context:
                "Résumé non généré (erreur récupération transcript).".to_string(),
            auxiliary_placeholder_failed: "Résumé non généré (erreur IA).".to_string(),
            mixed_label: "Mixed".to_string(),
            strip_keyword_counts: true,
        }
    }
}

impl InsightConfig {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// 从 TOML 字符串加载，缺省字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: InsightConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "必须大于 0"));
        }
        if self.example_limit == 0 {
            return Err(ConfigError::invalid("example_limit", "必须大于 0"));
        }
        if self.keyword_limit == 0 {
            return Err(ConfigError::invalid("keyword_limit", "必须大于 0"));
        }
        if self.max_comments == 0 {
            return Err(ConfigError::invalid("max_comments", "必须大于 0"));
        }
        for (field, spec) in self.sections.all() {
            if spec.header.trim().is_empty() {
                return Err(ConfigError::invalid(field, "标题前缀不能为空"));
            }
        }
        Ok(())
    }
}
