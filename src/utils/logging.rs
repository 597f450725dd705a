/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::InsightKey;
use crate::orchestrator::RunReport;

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`；否则 `verbose` 时为 debug，默认 info。
/// 重复调用是安全的
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录运行开始信息
pub fn log_run_start(
    key: &InsightKey,
    total_comments: usize,
    total_batches: usize,
    batch_size: usize,
) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始分析 {}", key);
    info!("📊 评论 {} 条，每批 {} 条，共 {} 批", total_comments, batch_size, total_batches);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
pub fn log_batch_start(batch_num: usize, total_batches: usize, batch_len: usize) {
    info!("📦 分析第 {}/{} 批 ({} 条评论)...", batch_num, total_batches, batch_len);
}

/// 打印运行统计
pub fn log_run_complete(key: &InsightKey, report: &RunReport) {
    info!("{}", "─".repeat(60));
    info!("📊 {} 分析完成", key);
    info!(
        "✅ 成功批次: {}/{}",
        report.succeeded_batches, report.total_batches
    );
    if !report.skipped_batches.is_empty() {
        info!("⚠️ 跳过批次: {}", report.skipped_batches.len());
    }
    if !report.context_available {
        info!("⚠️ 本次运行没有可用的转写上下文");
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 按词截断，词之间以单个空格重新连接
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("héhého", 3), "héh...");
        assert_eq!(truncate_text("court", 10), "court");
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("un  deux\ntrois quatre", 3), "un deux trois");
        assert_eq!(truncate_words("un deux", 10), "un deux");
        assert_eq!(truncate_words("", 5), "");
    }
}
