use anyhow::{bail, Context, Result};
use std::sync::Arc;

use comment_insight::clients::{
    CommandTranscriptSupplier, JsonFileInsightStore, LlmAnalysisEngine, YouTubeCommentSupplier,
};
use comment_insight::utils::logging;
use comment_insight::{CancelSignal, Config, InsightConfig, InsightOrchestrator};

const USAGE: &str = "用法: comment-insight <analyze|show> <content_id> [owner_id]";
const DEFAULT_OWNER: &str = "local";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, content_id, owner_id) = match args.as_slice() {
        [command, content_id] => (command.as_str(), content_id.as_str(), DEFAULT_OWNER),
        [command, content_id, owner_id] => {
            (command.as_str(), content_id.as_str(), owner_id.as_str())
        }
        _ => bail!(USAGE),
    };

    let insight_config = match &config.insight_config_file {
        Some(path) => InsightConfig::load(path)
            .await
            .with_context(|| format!("加载管线配置失败: {}", path))?,
        None => InsightConfig::default(),
    };

    let orchestrator = InsightOrchestrator::builder()
        .comment_supplier(Arc::new(YouTubeCommentSupplier::new(&config)))
        .context_supplier(Arc::new(CommandTranscriptSupplier::new(&config)))
        .analysis_engine(Arc::new(LlmAnalysisEngine::new(
            &config,
            insight_config.sections.clone(),
        )))
        .insight_store(Arc::new(JsonFileInsightStore::new(&config.store_dir)))
        .config(insight_config)
        .build()?;

    match command {
        "analyze" => {
            let cancel = CancelSignal::new();
            let run = orchestrator.analyze_and_store_with_report(owner_id, content_id, &cancel);
            tokio::pin!(run);

            let (insight, _report) = tokio::select! {
                result = &mut run => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("收到 Ctrl-C，正在取消...");
                    cancel.cancel();
                    run.await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&insight)?);
        }
        "show" => match orchestrator.find_insight(owner_id, content_id).await? {
            Some(insight) => println!("{}", serde_json::to_string_pretty(&insight)?),
            None => bail!("没有找到 insight (owner: {}, content: {})", owner_id, content_id),
        },
        _ => bail!(USAGE),
    }

    Ok(())
}
