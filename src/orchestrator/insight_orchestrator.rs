//! insight 编排器 - 编排层
//!
//! ## 职责
//!
//! 驱动一次完整运行：获取评论 → 获取上下文 → 分批 → 逐批分析/解析/累积 → 合并 → 保存。
//! 这是唯一有外部副作用的模块；能力层（分批、解析、合并）都是纯函数。
//!
//! ## 状态机
//!
//! ```text
//! NotStarted → FetchingComments → FetchingContext → Analyzing → Merging → Persisting → Done
//!      └──────────────┴─────────────────┴──────────────┴──────────┴───────────┴──→ Failed
//! ```
//!
//! ## 设计特点
//!
//! - 批次严格串行，同一时间只有一个分析调用
//! - 每次运行自带累积器，不同 (owner, content) 的运行可以并发
//! - 每个挂起点都受取消信号和单次调用超时约束

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::clients::{CommentSupplier, ContextSupplier, InsightStore, TextAnalysisEngine};
use crate::config::InsightConfig;
use crate::error::{AppResult, BatchFailure, ClientError, ClientResult, InsightError};
use crate::models::{CommentRecord, Insight, InsightKey, PartialInsight};
use crate::orchestrator::cancel::CancelSignal;
use crate::services::merger::{self, MergeContext, MergeOptions};
use crate::services::partitioner;
use crate::services::ResponseParser;
use crate::utils::logging;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    FetchingComments,
    FetchingContext,
    Analyzing,
    Merging,
    Persisting,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

/// 单次运行的统计
#[derive(Debug, Clone)]
pub struct RunReport {
    pub total_comments: usize,
    pub total_batches: usize,
    pub succeeded_batches: usize,
    /// (批次编号，从 1 开始, 失败原因)
    pub skipped_batches: Vec<(usize, BatchFailure)>,
    pub context_available: bool,
    pub final_state: RunState,
}

impl RunReport {
    fn new() -> Self {
        Self {
            total_comments: 0,
            total_batches: 0,
            succeeded_batches: 0,
            skipped_batches: Vec::new(),
            context_available: false,
            final_state: RunState::NotStarted,
        }
    }

    fn enter(&mut self, state: RunState) {
        debug_assert!(!self.final_state.is_terminal(), "run already finished");
        debug!("状态切换: {:?} → {:?}", self.final_state, state);
        self.final_state = state;
    }
}

/// 上下文阶段的产出
struct SharedContext {
    analysis_context: String,
    auxiliary_summary: String,
    available: bool,
}

/// insight 编排器
///
/// 通过 [`InsightOrchestrator::builder`] 构造；缺少任何协作者都会在 `build()` 时失败
pub struct InsightOrchestrator {
    comments: Arc<dyn CommentSupplier>,
    context: Arc<dyn ContextSupplier>,
    engine: Arc<dyn TextAnalysisEngine>,
    store: Arc<dyn InsightStore>,
    parser: ResponseParser,
    merge_options: MergeOptions,
    config: InsightConfig,
}

#[derive(Default)]
pub struct InsightOrchestratorBuilder {
    comments: Option<Arc<dyn CommentSupplier>>,
    context: Option<Arc<dyn ContextSupplier>>,
    engine: Option<Arc<dyn TextAnalysisEngine>>,
    store: Option<Arc<dyn InsightStore>>,
    config: Option<InsightConfig>,
}

impl InsightOrchestratorBuilder {
    pub fn comment_supplier(mut self, supplier: Arc<dyn CommentSupplier>) -> Self {
        self.comments = Some(supplier);
        self
    }

    pub fn context_supplier(mut self, supplier: Arc<dyn ContextSupplier>) -> Self {
        self.context = Some(supplier);
        self
    }

    pub fn analysis_engine(mut self, engine: Arc<dyn TextAnalysisEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn insight_store(mut self, store: Arc<dyn InsightStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: InsightConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> AppResult<InsightOrchestrator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(InsightOrchestrator {
            comments: self.comments.ok_or(InsightError::MissingCollaborator("comment_supplier"))?,
            context: self.context.ok_or(InsightError::MissingCollaborator("context_supplier"))?,
            engine: self.engine.ok_or(InsightError::MissingCollaborator("analysis_engine"))?,
            store: self.store.ok_or(InsightError::MissingCollaborator("insight_store"))?,
            parser: ResponseParser::from_config(&config),
            merge_options: MergeOptions::from_config(&config),
            config,
        })
    }
}

impl InsightOrchestrator {
    pub fn builder() -> InsightOrchestratorBuilder {
        InsightOrchestratorBuilder::default()
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// 分析并保存，唯一的入口
    pub async fn analyze_and_store(&self, owner_id: &str, content_id: &str) -> AppResult<Insight> {
        let cancel = CancelSignal::new();
        self.analyze_and_store_with_report(owner_id, content_id, &cancel)
            .await
            .map(|(insight, _)| insight)
    }

    /// 同上，附带取消信号并返回运行统计
    pub async fn analyze_and_store_with_report(
        &self,
        owner_id: &str,
        content_id: &str,
        cancel: &CancelSignal,
    ) -> AppResult<(Insight, RunReport)> {
        let key = InsightKey::new(owner_id, content_id);
        let span = info_span!(
            "insight_run",
            owner_id = %key.owner_id,
            content_id = %key.content_id
        );

        async {
            let mut report = RunReport::new();
            match self.run(&key, cancel, &mut report).await {
                Ok(insight) => {
                    report.enter(RunState::Done);
                    logging::log_run_complete(&key, &report);
                    Ok((insight, report))
                }
                Err(e) => {
                    let failed_in = report.final_state;
                    report.enter(RunState::Failed);
                    error!("❌ {} 运行失败 (阶段 {:?}, 类别 {:?}): {}", key, failed_in, e.kind(), e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// 查询已保存的 insight
    pub async fn find_insight(
        &self,
        owner_id: &str,
        content_id: &str,
    ) -> AppResult<Option<Insight>> {
        self.store
            .find_by_key(&InsightKey::new(owner_id, content_id))
            .await
            .map_err(|source| InsightError::LookupFailed { source })
    }

    async fn run(
        &self,
        key: &InsightKey,
        cancel: &CancelSignal,
        report: &mut RunReport,
    ) -> AppResult<Insight> {
        // ========== 阶段 1: 获取评论 ==========
        report.enter(RunState::FetchingComments);
        let comments = self.fetch_comments(key, cancel).await?;
        report.total_comments = comments.len();

        // ========== 阶段 2: 获取共享上下文（失败不致命） ==========
        report.enter(RunState::FetchingContext);
        let shared = self.fetch_context(key, cancel).await?;
        report.context_available = shared.available;

        // ========== 阶段 3: 逐批分析 ==========
        report.enter(RunState::Analyzing);
        let partials = self
            .analyze_batches(key, &comments, &shared.analysis_context, cancel, report)
            .await?;

        // ========== 阶段 4: 合并 ==========
        report.enter(RunState::Merging);
        if partials.is_empty() {
            return Err(InsightError::AllBatchesFailed {
                total_batches: report.total_batches,
            });
        }
        info!("🔀 合并 {} 个批次的结果", partials.len());
        let insight = merger::merge(
            &partials,
            MergeContext {
                key: key.clone(),
                created_at: Utc::now(),
                auxiliary_summary: Some(shared.auxiliary_summary),
            },
            &self.merge_options,
        );

        // ========== 阶段 5: 保存 ==========
        report.enter(RunState::Persisting);
        match self.guarded(cancel, self.store.save(&insight)).await {
            Ok(()) => {}
            Err(ClientError::Cancelled) => return Err(self.cancelled(report.final_state)),
            Err(source) => return Err(InsightError::PersistenceFailed { source }),
        }
        info!("💾 insight 已保存: {}", key);

        Ok(insight)
    }

    async fn fetch_comments(
        &self,
        key: &InsightKey,
        cancel: &CancelSignal,
    ) -> AppResult<Vec<CommentRecord>> {
        if cancel.is_cancelled() {
            return Err(self.cancelled(RunState::FetchingComments));
        }
        info!("📥 获取评论 (最多 {} 条)", self.config.max_comments);

        let fetched = self
            .guarded(
                cancel,
                self.comments
                    .get_comments(&key.content_id, self.config.max_comments),
            )
            .await;

        let mut comments = match fetched {
            Ok(comments) => comments,
            Err(ClientError::Cancelled) => return Err(self.cancelled(RunState::FetchingComments)),
            Err(source) => {
                return Err(InsightError::FetchFailed {
                    content_id: key.content_id.clone(),
                    source,
                })
            }
        };

        if comments.is_empty() {
            return Err(InsightError::NoComments {
                content_id: key.content_id.clone(),
            });
        }
        comments.truncate(self.config.max_comments);
        info!("✓ 获取到 {} 条评论", comments.len());
        Ok(comments)
    }

    async fn fetch_context(
        &self,
        key: &InsightKey,
        cancel: &CancelSignal,
    ) -> AppResult<SharedContext> {
        if cancel.is_cancelled() {
            return Err(self.cancelled(RunState::FetchingContext));
        }

        let raw = match self
            .guarded(cancel, self.context.get_context(&key.content_id))
            .await
        {
            Ok(raw) => raw,
            Err(ClientError::Cancelled) => return Err(self.cancelled(RunState::FetchingContext)),
            Err(e) => {
                warn!("⚠️ 上下文不可用，使用占位内容继续: {}", e);
                return Ok(SharedContext {
                    analysis_context: self.config.context_placeholder.clone(),
                    auxiliary_summary: self.config.auxiliary_placeholder_no_context.clone(),
                    available: false,
                });
            }
        };

        let analysis_context = logging::truncate_words(&raw, self.config.context_max_words);
        debug!("上下文: {}", logging::truncate_text(&analysis_context, 120));

        let auxiliary_summary = match self
            .guarded(cancel, self.engine.summarize_context(&analysis_context))
            .await
        {
            Ok(summary) => {
                info!("✓ 上下文摘要已生成");
                summary
            }
            Err(ClientError::Cancelled) => return Err(self.cancelled(RunState::FetchingContext)),
            Err(e) => {
                warn!("⚠️ 上下文摘要生成失败: {}", e);
                self.config.auxiliary_placeholder_failed.clone()
            }
        };

        Ok(SharedContext {
            analysis_context,
            auxiliary_summary,
            available: true,
        })
    }

    async fn analyze_batches(
        &self,
        key: &InsightKey,
        comments: &[CommentRecord],
        shared_context: &str,
        cancel: &CancelSignal,
        report: &mut RunReport,
    ) -> AppResult<Vec<PartialInsight>> {
        let total_batches = partitioner::batch_count(comments.len(), self.config.batch_size);
        let batches = partitioner::partition(comments, self.config.batch_size);
        report.total_batches = total_batches;
        logging::log_run_start(key, comments.len(), total_batches, self.config.batch_size);

        let mut partials = Vec::with_capacity(total_batches);

        for (idx, batch) in batches.into_iter().enumerate() {
            let batch_num = idx + 1;
            if cancel.is_cancelled() {
                return Err(self.cancelled(RunState::Analyzing));
            }
            logging::log_batch_start(batch_num, total_batches, batch.len());

            let lines: Vec<String> = batch.iter().map(CommentRecord::to_prompt_line).collect();
            let span = info_span!("batch", batch = batch_num, total_batches);
            let outcome = match self
                .guarded(cancel, self.engine.analyze(&lines, shared_context))
                .instrument(span)
                .await
            {
                Ok(raw) => {
                    let partial = self.parser.parse(&raw);
                    if partial.is_empty() {
                        debug!("无法解析的响应: {}", logging::truncate_text(&raw, 200));
                        Err(BatchFailure::Unparseable)
                    } else {
                        Ok(partial)
                    }
                }
                Err(ClientError::Cancelled) => return Err(self.cancelled(RunState::Analyzing)),
                Err(ClientError::Timeout(_)) => Err(BatchFailure::TimedOut),
                Err(e) => Err(BatchFailure::AnalysisFailed(e.to_string())),
            };

            match outcome {
                Ok(partial) => {
                    info!("✓ 第 {}/{} 批分析完成", batch_num, total_batches);
                    partials.push(partial);
                    report.succeeded_batches += 1;
                }
                Err(failure) => {
                    warn!("⚠️ 第 {}/{} 批已跳过: {}", batch_num, total_batches, failure);
                    report.skipped_batches.push((batch_num, failure));
                }
            }

            if batch_num < total_batches {
                self.pause_between_batches(cancel).await?;
            }
        }

        Ok(partials)
    }

    async fn pause_between_batches(&self, cancel: &CancelSignal) -> AppResult<()> {
        let delay = self.config.inter_batch_delay();
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(self.cancelled(RunState::Analyzing)),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// 在取消信号和单次调用超时之下等待协作者
    async fn guarded<T, F>(&self, cancel: &CancelSignal, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        let timeout: Duration = self.config.call_timeout();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = tokio::time::timeout(timeout, call) => match result {
                Ok(result) => result,
                Err(_) => Err(ClientError::Timeout(timeout)),
            },
        }
    }

    fn cancelled(&self, state: RunState) -> InsightError {
        warn!("🛑 运行在 {:?} 阶段被取消", state);
        InsightError::Cancelled { state }
    }
}
