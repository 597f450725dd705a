//! # Comment Insight
//!
//! 对一个内容（视频）的观众评论做分批分析，合并成一份 insight 并保存
//!
//! ## 架构设计
//!
//! ### ① 协作者层（Clients）
//! - `clients/` - 所有外部副作用都在这里，通过 trait 注入
//! - `YouTubeCommentSupplier` - 评论源
//! - `CommandTranscriptSupplier` - 转写上下文
//! - `LlmAnalysisEngine` - 分析引擎（OpenAI 兼容接口）
//! - `JsonFileInsightStore` / `MemoryInsightStore` - 存储
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 纯函数：分批、解析、合并
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/` - 运行状态机，串行处理批次，支持取消和超时
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::{Config, InsightConfig, SectionHeaders, SectionSpec};
pub use error::{AppResult, ClientError, ErrorKind, InsightError};
pub use models::{CommentRecord, Insight, InsightKey, PartialInsight};
pub use orchestrator::{CancelSignal, InsightOrchestrator, RunReport, RunState};
