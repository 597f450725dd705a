//! 业务能力层，全部是纯函数，不做 I/O
//!
//! - `partitioner` - 评论分批
//! - `response_parser` - 解析分析引擎的分节响应
//! - `merger` - 合并多个批次的部分结果

pub mod merger;
pub mod partitioner;
pub mod response_parser;

pub use merger::{merge, MergeContext, MergeOptions};
pub use partitioner::partition;
pub use response_parser::ResponseParser;
