//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 驱动一次 (owner, content) 的完整运行，持有所有协作者。
//!
//! ## 模块划分
//!
//! ### `insight_orchestrator` - 运行状态机
//! - 获取评论和共享上下文
//! - 分批、逐批调用分析引擎并解析
//! - 合并部分结果并保存
//! - 输出运行统计（RunReport）
//!
//! ### `cancel` - 取消信号
//!
//! ## 层次关系
//!
//! ```text
//! insight_orchestrator (处理一次运行)
//!     ↓
//! services (能力层：partitioner / response_parser / merger)
//!     ↓
//! clients (协作者：评论源 / 转写源 / 分析引擎 / 存储)
//! ```

pub mod cancel;
pub mod insight_orchestrator;

pub use cancel::CancelSignal;
pub use insight_orchestrator::{
    InsightOrchestrator, InsightOrchestratorBuilder, RunReport, RunState,
};
