//! 批量评分处理器 - 编排层
//!
//! ## 职责
//!
//! 对一整批评分记录运行自动评分，是命令行批处理模式的入口。
//!
//! ## 核心功能
//!
//! 1. **状态分流**：未提交的记录直接记 0 分，已评分的记录默认跳过
//! 2. **并发控制**：使用 Semaphore 限制同时在途的评分请求
//! 3. **取消**：取消标志置位后不再发出新的请求，已发出的请求照常完成
//! 4. **原子写入**：每条记录的分数和评语在任务完成后一起写入，已评分的记录不会被回退结果覆盖
//! 5. **警告汇总**：回退的记录写入警告列表和 warn.txt
//!
//! ## 设计特点
//!
//! - **向下委托**：单条记录的评分交给 `workflow::GradingFlow`
//! - **不持有记录**：任务只拿到请求的副本，记录由调用方持有，保存失败后仍可重试

use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::GraderError;
use crate::infrastructure::save_records;
use crate::models::loaders::load_batch;
use crate::models::SubmissionRecord;
use crate::services::{GradingWarning, WarnWriter};
use crate::utils::logging::{log_batch_start, print_final_stats};
use crate::workflow::{AdapterOutcome, Evaluation, GradingCtx, GradingFlow, GradingState};

/// 批处理选项
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// 同时在途的评分请求数
    pub max_concurrent: usize,
    /// 是否重新评分已评分的记录
    pub regrade: bool,
    /// 取消标志
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            regrade: false,
            cancel: None,
        }
    }
}

/// 批处理统计
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    pub total: usize,
    pub scored: usize,
    pub fallback: usize,
    pub auto_finalized: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub warnings: Vec<GradingWarning>,
}

/// 批量评分处理器
pub struct BatchProcessor {
    flow: GradingFlow,
    options: BatchOptions,
    warn_writer: Option<WarnWriter>,
}

impl BatchProcessor {
    pub fn new(flow: GradingFlow, options: BatchOptions) -> Self {
        Self {
            flow,
            options,
            warn_writer: None,
        }
    }

    /// 回退记录同时写入警告文件
    pub fn with_warn_writer(mut self, warn_writer: WarnWriter) -> Self {
        self.warn_writer = Some(warn_writer);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn needs_adapter(&self, state: GradingState) -> bool {
        match state {
            GradingState::NotSubmitted => false,
            GradingState::SubmittedUngraded => true,
            GradingState::Graded => self.options.regrade,
        }
    }

    /// 对整批记录运行自动评分
    pub async fn run(&self, records: &mut [SubmissionRecord]) -> Result<BatchReport> {
        let max_concurrent = self.options.max_concurrent.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut report = BatchReport {
            total: records.len(),
            ..Default::default()
        };

        let pending = records
            .iter()
            .filter(|r| self.needs_adapter(GradingState::of(r)))
            .count();
        log_batch_start(records.len(), pending, max_concurrent);

        let mut handles = Vec::new();

        for (index, record) in records.iter_mut().enumerate() {
            let state = GradingState::of(record);

            if state == GradingState::NotSubmitted {
                self.flow.finalize_not_submitted(record);
                report.auto_finalized += 1;
                continue;
            }

            if !self.needs_adapter(state) {
                GradingFlow::skip(record);
                report.skipped += 1;
                continue;
            }

            let Some(request) = self.flow.request_for(record) else {
                continue;
            };

            let permit = semaphore.clone().acquire_owned().await?;

            if self.is_cancelled() {
                drop(permit);
                report.cancelled += 1;
                continue;
            }

            let flow = self.flow.clone();
            let ctx = GradingCtx::from(&*record);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                flow.evaluate(&ctx, request).await
            });
            handles.push(((index, state), handle));
        }

        if report.cancelled > 0 {
            warn!("⚠️ 已取消，{} 条记录未发出评分请求", report.cancelled);
        }

        // 等待所有任务完成，再按原顺序写入
        let (slots, handles): (Vec<(usize, GradingState)>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        for ((index, prior), result) in slots.into_iter().zip(results) {
            let record = &mut records[index];
            match result {
                Ok(evaluation) => self.apply(record, evaluation, prior, &mut report).await,
                Err(e) => {
                    error!("{} 评分任务执行失败: {}", GradingCtx::from(&*record), e);
                    report.failed += 1;
                    self.record_warning(record, format!("任务执行失败: {}", e), &mut report)
                        .await;
                }
            }
        }

        print_final_stats(
            report.scored,
            report.fallback,
            report.auto_finalized,
            report.skipped + report.cancelled,
            report.total,
        );

        Ok(report)
    }

    async fn apply(
        &self,
        record: &mut SubmissionRecord,
        evaluation: Evaluation,
        prior: GradingState,
        report: &mut BatchReport,
    ) {
        match evaluation.apply(record, prior) {
            AdapterOutcome::Scored => report.scored += 1,
            AdapterOutcome::AutoFinalized => report.auto_finalized += 1,
            AdapterOutcome::Fallback { reason } => {
                report.fallback += 1;
                self.record_warning(record, reason, report).await;
            }
        }
    }

    async fn record_warning(&self, record: &SubmissionRecord, reason: String, report: &mut BatchReport) {
        let warning = GradingWarning {
            sequence_number: record.sequence_number,
            student_name: record.student_name.clone(),
            assignment_id: record.assignment_id.clone(),
            reason,
        };

        if let Some(writer) = &self.warn_writer {
            if let Err(e) = writer.write(&warning).await {
                error!("写入警告文件失败: {}", e);
            }
        }

        report.warnings.push(warning);
    }

    /// 读取批次文件，评分后整文件写入输出路径
    ///
    /// 记录读入调用方提供的 `records`，保存失败时已经算出的分数仍留在其中，
    /// 调用方可以换一个路径重新保存。
    pub async fn process_file(
        &self,
        input: &Path,
        output: &Path,
        records: &mut Vec<SubmissionRecord>,
    ) -> Result<BatchReport> {
        if !input.exists() {
            return Err(GraderError::InputNotFound {
                path: input.display().to_string(),
            }
            .into());
        }

        info!("\n📁 正在读取批次: {}", input.display());
        *records = load_batch(input).await?;

        let report = self.run(records).await?;

        save_records(output, records)
            .with_context(|| format!("无法保存评分结果: {}", output.display()))?;
        info!("✓ 评分结果已保存至: {}", output.display());

        Ok(report)
    }
}
