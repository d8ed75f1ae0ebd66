//! 评分状态机 - 流程层
//!
//! 核心职责：定义"一条记录"如何从未评分走到已评分
//!
//! 状态：
//! 1. `NotSubmitted` → 终态，自动记 0 分，不调用评分器
//! 2. `SubmittedUngraded` → 总分为 0（真实的 0 分与未评分无法区分）
//! 3. `Graded` → 总分大于 0，或人工确认过的 0 分
//!
//! 自动评分失败时回退为 0 分和默认评语，只记警告，不向上抛错。
//! 已评分的记录不会被回退结果覆盖。分数和评语总是一起写入。

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{GraderError, ValidationError};
use crate::models::rubric::validate_breakdown;
use crate::models::{AssignmentPromptSet, Score, ScoringScale, SubmissionRecord, CRITERIA_COUNT};
use crate::services::scoring::{RubricScore, ScoringAdapter, ScoringRequest, FALLBACK_COMMENT};
use crate::workflow::grading_ctx::GradingCtx;

/// 记录的评分状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradingState {
    NotSubmitted,
    SubmittedUngraded,
    Graded,
}

impl GradingState {
    /// 只根据记录本身判断状态
    pub fn of(record: &SubmissionRecord) -> Self {
        Self::resolve(record, false)
    }

    /// 判断状态，`zero_confirmed` 表示该记录的 0 分已被人工确认
    pub fn resolve(record: &SubmissionRecord, zero_confirmed: bool) -> Self {
        if !record.resolution.is_submitted() {
            GradingState::NotSubmitted
        } else if record.score.total > 0 || zero_confirmed {
            GradingState::Graded
        } else {
            GradingState::SubmittedUngraded
        }
    }

    /// 导出时使用的状态标签
    pub fn label(self) -> &'static str {
        match self {
            GradingState::NotSubmitted => "Not submitted",
            GradingState::SubmittedUngraded => "Ungraded",
            GradingState::Graded => "Graded",
        }
    }
}

/// 自动评分的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterOutcome {
    /// 未提交，直接记 0 分
    AutoFinalized,
    /// 评分器成功给分
    Scored,
    /// 评分器失败，已回退为 0 分
    Fallback { reason: String },
}

/// 人工评分的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualOutcome {
    /// 已写入
    Graded,
    /// 总分为 0 且未确认，记录保持不变
    ConfirmationRequired,
}

/// 一次自动评分计算出的待写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: Score,
    pub comment: String,
    pub outcome: AdapterOutcome,
}

impl Evaluation {
    fn auto_finalized() -> Self {
        Self {
            score: Score::zero(),
            comment: String::new(),
            outcome: AdapterOutcome::AutoFinalized,
        }
    }

    fn fallback(reason: impl Into<String>) -> Self {
        Self {
            score: Score::zero(),
            comment: FALLBACK_COMMENT.to_string(),
            outcome: AdapterOutcome::Fallback {
                reason: reason.into(),
            },
        }
    }

    /// 把分数和评语一起写入记录
    ///
    /// `prior` 是发出请求前记录的状态。已评分的记录遇到回退结果时保持不变，
    /// 只把回退原因交给调用方。
    pub fn apply(self, record: &mut SubmissionRecord, prior: GradingState) -> AdapterOutcome {
        if prior == GradingState::Graded && matches!(self.outcome, AdapterOutcome::Fallback { .. }) {
            warn!("{} ⚠️ 评分器失败，保留原有评分 {}", GradingCtx::from(&*record), record.score.total);
            return self.outcome;
        }
        record.set_grade(self.score, self.comment);
        self.outcome
    }
}

/// 评分状态机
///
/// - 持有注入的评分器和只读的作业题目
/// - 只处理单条记录
/// - 不负责持久化
#[derive(Clone)]
pub struct GradingFlow {
    adapter: Arc<dyn ScoringAdapter>,
    prompts: Arc<AssignmentPromptSet>,
    scale: ScoringScale,
}

impl GradingFlow {
    /// 创建新的评分状态机
    pub fn new(
        adapter: Arc<dyn ScoringAdapter>,
        prompts: Arc<AssignmentPromptSet>,
        scale: ScoringScale,
    ) -> Self {
        Self {
            adapter,
            prompts,
            scale,
        }
    }

    pub fn scale(&self) -> ScoringScale {
        self.scale
    }

    /// 为已提交的记录构建评分请求，未提交返回 `None`
    ///
    /// 题目集中没有该作业时只发送作业编号，并记警告。
    pub fn request_for(&self, record: &SubmissionRecord) -> Option<ScoringRequest> {
        let text = record.resolution.text()?;
        if !self.prompts.contains(&record.assignment_id) {
            warn!(
                "{} ⚠️ 题目集中没有作业 {}，只发送作业编号",
                GradingCtx::from(record),
                record.assignment_id
            );
        }
        Some(ScoringRequest {
            student_name: record.student_name.clone(),
            submission_text: text.to_string(),
            assignment_context: self.prompts.context_for(&record.assignment_id).to_string(),
        })
    }

    /// 使用评分器给单条记录评分
    ///
    /// 未提交的记录直接记 0 分；评分器的任何失败都回退为 0 分和默认评语，
    /// 但已评分的记录（包括 `zero_confirmed` 的 0 分）保持不变。
    pub async fn score_with_adapter(
        &self,
        record: &mut SubmissionRecord,
        zero_confirmed: bool,
    ) -> AdapterOutcome {
        let prior = GradingState::resolve(record, zero_confirmed);
        let ctx = GradingCtx::from(&*record);
        let evaluation = match self.request_for(record) {
            Some(request) => self.evaluate(&ctx, request).await,
            None => {
                info!("{} 未提交，自动记 0 分", ctx);
                Evaluation::auto_finalized()
            }
        };
        evaluation.apply(record, prior)
    }

    /// 未提交记录的终结结果
    pub fn finalize_not_submitted(&self, record: &mut SubmissionRecord) -> AdapterOutcome {
        Evaluation::auto_finalized().apply(record, GradingState::NotSubmitted)
    }

    /// 调用评分器并计算待写入结果，不修改任何记录
    pub async fn evaluate(&self, ctx: &GradingCtx, request: ScoringRequest) -> Evaluation {
        info!("{} 🤖 正在自动评分...", ctx);

        let rubric = match self.adapter.score(&request).await {
            Ok(rubric) => rubric,
            Err(e) => {
                warn!("{} ⚠️ 评分器调用失败，回退为 0 分: {}", ctx, e);
                return Evaluation::fallback(e.to_string());
            }
        };

        match self.check_rubric(ctx, &rubric) {
            Ok(score) => {
                info!(
                    "{} ✓ 评分完成: {} / {}",
                    ctx,
                    score.total,
                    self.scale.max_total()
                );
                Evaluation {
                    score,
                    comment: rubric.comment,
                    outcome: AdapterOutcome::Scored,
                }
            }
            Err(e) => {
                warn!("{} ⚠️ 评分器返回的分数无效，回退为 0 分: {}", ctx, e);
                Evaluation::fallback(format!("分数无效: {}", e))
            }
        }
    }

    /// 按当前评分尺度检查评分器返回的分数
    fn check_rubric(&self, ctx: &GradingCtx, rubric: &RubricScore) -> Result<Score, ValidationError> {
        let total = validate_breakdown(&rubric.breakdown, &self.scale.maxima())?;
        if total != rubric.total {
            warn!(
                "{} 总分 {} 与明细之和 {} 不一致，使用明细之和",
                ctx, rubric.total, total
            );
        }
        Ok(Score::from_breakdown(rubric.breakdown))
    }

    /// 人工评分
    ///
    /// 每项必须在 `[0, criteria_max[i]]` 内。总分为 0 时需要调用方传入
    /// `confirm_zero = true`，否则返回 [`ManualOutcome::ConfirmationRequired`]
    /// 且记录保持不变。已评分的记录可以重复评分，以最后一次为准。
    ///
    /// 不需要评分器实例。
    pub fn score_manually(
        record: &mut SubmissionRecord,
        breakdown: [i32; CRITERIA_COUNT],
        comment: &str,
        criteria_max: [i32; CRITERIA_COUNT],
        confirm_zero: bool,
    ) -> Result<ManualOutcome, GraderError> {
        let ctx = GradingCtx::from(&*record);

        if !record.resolution.is_submitted() {
            return Err(ValidationError::NotSubmitted {
                student: record.student_name.clone(),
            }
            .into());
        }

        let total = validate_breakdown(&breakdown, &criteria_max)?;

        if total == 0 && !confirm_zero {
            warn!("{} 人工评分总分为 0，等待确认", ctx);
            return Ok(ManualOutcome::ConfirmationRequired);
        }

        record.set_grade(Score { total, breakdown }, comment);
        info!("{} ✓ 人工评分: {}", ctx, total);
        Ok(ManualOutcome::Graded)
    }

    /// 跳过当前记录，不做任何修改
    pub fn skip(record: &SubmissionRecord) -> GradingState {
        let state = GradingState::of(record);
        info!("{} ⏭️ 跳过 ({})", GradingCtx::from(record), state.label());
        state
    }
}
