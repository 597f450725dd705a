use thiserror::Error;

use crate::orchestrator::RunState;

/// 编排运行的致命错误
///
/// 只有这些错误会越过 `analyze_and_store` 的边界；
/// 非致命的情况（上下文缺失、单批失败）在内部吸收
#[derive(Debug, Error)]
pub enum InsightError {
    /// 评论获取失败
    #[error("评论获取失败 (content: {content_id}): {source}")]
    FetchFailed {
        content_id: String,
        #[source]
        source: ClientError,
    },
    /// 供应方没有返回任何评论
    #[error("没有找到任何评论 (content: {content_id})")]
    NoComments { content_id: String },
    /// 所有批次都失败
    #[error("所有批次分析失败 (共 {total_batches} 批)")]
    AllBatchesFailed { total_batches: usize },
    /// 持久化失败，已合并的结果丢失
    #[error("保存 insight 失败: {source}")]
    PersistenceFailed {
        #[source]
        source: ClientError,
    },
    /// 查询已保存的 insight 失败
    #[error("查询 insight 失败: {source}")]
    LookupFailed {
        #[source]
        source: ClientError,
    },
    /// 调用方取消
    #[error("运行在 {state:?} 阶段被取消")]
    Cancelled { state: RunState },
    /// 构造时缺少协作者
    #[error("缺少协作者: {0}")]
    MissingCollaborator(&'static str),
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 错误类别，用于日志和统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FetchFailed,
    AllBatchesFailed,
    PersistenceFailed,
    LookupFailed,
    Cancelled,
    Misconfigured,
}

impl InsightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InsightError::FetchFailed { .. } | InsightError::NoComments { .. } => {
                ErrorKind::FetchFailed
            }
            InsightError::AllBatchesFailed { .. } => ErrorKind::AllBatchesFailed,
            InsightError::PersistenceFailed { .. } => ErrorKind::PersistenceFailed,
            InsightError::LookupFailed { .. } => ErrorKind::LookupFailed,
            InsightError::Cancelled { .. } => ErrorKind::Cancelled,
            InsightError::MissingCollaborator(_) | InsightError::Config(_) => {
                ErrorKind::Misconfigured
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, InsightError::Cancelled { .. })
    }
}

/// 协作者（评论源、转写源、分析引擎、存储）返回的错误
#[derive(Debug, Error)]
pub enum ClientError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    Request {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 非 2xx 响应
    #[error("错误响应 ({endpoint}): status={status}, body={body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应为空
    #[error("返回结果为空: {0}")]
    EmptyResponse(String),
    /// 超时
    #[error("调用超时 ({0:?})")]
    Timeout(std::time::Duration),
    /// 被取消
    #[error("调用被取消")]
    Cancelled,
    /// 配额用尽或频率限制
    #[error("配额或频率限制: {0}")]
    Quota(String),
    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),
    /// 反序列化失败
    #[error("解析失败: {0}")]
    Decode(#[from] serde_json::Error),
    /// 文件或子进程 I/O
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    /// LLM API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {source}")]
    Llm {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },
    /// 其他错误
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|url| format!("{}{}", url.host_str().unwrap_or_default(), url.path()))
            .unwrap_or_default();
        ClientError::Request {
            endpoint,
            source: Box::new(err),
        }
    }
}

impl ClientError {
    /// 创建LLM API调用错误
    pub fn llm(model: impl Into<String>, source: async_openai::error::OpenAIError) -> Self {
        ClientError::Llm {
            model: model.into(),
            source,
        }
    }

    /// 根据 HTTP 状态码归类错误响应
    pub fn from_status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let body = body.into();
        match status {
            403 | 429 => ClientError::Quota(format!("{} ({}): {}", endpoint, status, body)),
            404 => ClientError::NotFound(endpoint),
            _ => ClientError::BadStatus {
                endpoint,
                status,
                body,
            },
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 字段取值非法
    #[error("配置项 {field} 非法: {reason}")]
    Invalid { field: &'static str, reason: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// 单批的非致命失败，记录在运行报告里，不向外返回
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchFailure {
    /// 分析引擎返回错误
    AnalysisFailed(String),
    /// 调用超时
    TimedOut,
    /// 响应无法解析出任何内容
    Unparseable,
}

impl std::fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchFailure::AnalysisFailed(reason) => write!(f, "分析失败: {}", reason),
            BatchFailure::TimedOut => write!(f, "分析超时"),
            BatchFailure::Unparseable => write!(f, "响应无法解析"),
        }
    }
}

// ========== Result 类型别名 ==========

/// 编排结果类型
pub type AppResult<T> = Result<T, InsightError>;

/// 协作者调用结果类型
pub type ClientResult<T> = Result<T, ClientError>;
