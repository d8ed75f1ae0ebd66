//! 评分会话 - 编排层
//!
//! 一个会话对应"一门课程的一份作业"：
//!
//! 1. 抽取页面标记，和名单对账生成全部记录
//! 2. 用游标逐条浏览，支持人工评分、自动评分和跳过
//! 3. 整批保存为 JSON，或导出 CSV
//!
//! 人工确认过的 0 分只保存在会话内，不写入文件。

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{AppResult, GraderError};
use crate::infrastructure::{render_csv, write_csv, BatchStore};
use crate::models::{AssignmentPromptSet, Course, ScoringScale, SubmissionRecord, CRITERIA_COUNT};
use crate::services::{extract_or_empty, reconcile};
use crate::utils::logging::{log_extraction, log_session_start, truncate_text};
use crate::workflow::{AdapterOutcome, GradingFlow, GradingState, ManualOutcome};

/// 预览时每份提交显示的最大字符数
pub const PREVIEW_CHARS: usize = 500;

/// 会话统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    pub submitted: usize,
    pub not_submitted: usize,
    pub graded: usize,
}

/// 评分会话
#[derive(Debug, Clone)]
pub struct GradingSession {
    course_slug: String,
    assignment_id: String,
    records: Vec<SubmissionRecord>,
    cursor: usize,
    confirmed_zero: BTreeSet<u32>,
}

impl GradingSession {
    /// 从页面标记开始一个新会话
    ///
    /// 课程必须有学生，作业必须在题目集中；标记无法抽取时所有学生按未提交处理。
    pub fn start(
        course: &Course,
        prompts: &AssignmentPromptSet,
        assignment_id: &str,
        markup: &str,
    ) -> AppResult<Self> {
        if !course.has_students() {
            return Err(GraderError::UnknownCourse(course.id.clone()));
        }
        if !prompts.contains(assignment_id) {
            warn!(
                "⚠️ 可用作业: {}",
                prompts.assignment_ids().collect::<Vec<_>>().join(", ")
            );
            return Err(GraderError::UnknownAssignment(assignment_id.to_string()));
        }

        let roster = course.roster();
        log_session_start(&course.label(), assignment_id, roster.len());

        let keys: Vec<String> = roster.iter().map(|e| e.match_key.clone()).collect();
        let extracted = extract_or_empty(markup, &keys);
        let records = reconcile(&roster, &extracted, assignment_id);

        let session = Self::from_records(course.output_slug(), assignment_id, records);
        let stats = session.stats();
        log_extraction(stats.total, stats.submitted);

        Ok(session)
    }

    /// 用已有的记录恢复会话
    pub fn from_records(
        course_slug: impl Into<String>,
        assignment_id: impl Into<String>,
        records: Vec<SubmissionRecord>,
    ) -> Self {
        Self {
            course_slug: course_slug.into(),
            assignment_id: assignment_id.into(),
            records,
            cursor: 0,
            confirmed_zero: BTreeSet::new(),
        }
    }

    pub fn course_slug(&self) -> &str {
        &self.course_slug
    }

    pub fn assignment_id(&self) -> &str {
        &self.assignment_id
    }

    pub fn records(&self) -> &[SubmissionRecord] {
        &self.records
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&SubmissionRecord> {
        self.records.get(self.cursor)
    }

    /// 游标后移一条，已到末尾时返回 `None`
    pub fn advance(&mut self) -> Option<&SubmissionRecord> {
        if self.cursor < self.records.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// 游标跳到指定序号的记录
    pub fn seek(&mut self, sequence_number: u32) -> AppResult<&SubmissionRecord> {
        let index = self
            .index_of(sequence_number)
            .ok_or(GraderError::RecordNotFound(sequence_number))?;
        self.cursor = index;
        Ok(&self.records[index])
    }

    /// 从当前位置起找到下一条未评分的记录并移动游标
    pub fn next_ungraded(&mut self) -> Option<&SubmissionRecord> {
        let offset = self.records[self.cursor.min(self.records.len())..]
            .iter()
            .position(|r| self.state(r) == GradingState::SubmittedUngraded)?;
        self.cursor += offset;
        self.current()
    }

    fn index_of(&self, sequence_number: u32) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.sequence_number == sequence_number)
    }

    fn state(&self, record: &SubmissionRecord) -> GradingState {
        GradingState::resolve(
            record,
            self.confirmed_zero.contains(&record.sequence_number),
        )
    }

    /// 指定位置记录的状态（包括会话内确认过的 0 分）
    pub fn state_of(&self, index: usize) -> Option<GradingState> {
        self.records.get(index).map(|r| self.state(r))
    }

    /// 人工给当前记录评分
    pub fn grade_current(
        &mut self,
        scale: ScoringScale,
        breakdown: [i32; CRITERIA_COUNT],
        comment: &str,
        confirm_zero: bool,
    ) -> AppResult<ManualOutcome> {
        let number = self
            .current()
            .map(|r| r.sequence_number)
            .ok_or(GraderError::RecordNotFound(self.cursor as u32 + 1))?;
        self.grade(scale, number, breakdown, comment, confirm_zero)
    }

    /// 人工给指定序号的记录评分，按 `scale` 的各项上限校验
    pub fn grade(
        &mut self,
        scale: ScoringScale,
        sequence_number: u32,
        breakdown: [i32; CRITERIA_COUNT],
        comment: &str,
        confirm_zero: bool,
    ) -> AppResult<ManualOutcome> {
        let index = self
            .index_of(sequence_number)
            .ok_or(GraderError::RecordNotFound(sequence_number))?;

        let outcome = GradingFlow::score_manually(
            &mut self.records[index],
            breakdown,
            comment,
            scale.maxima(),
            confirm_zero,
        )?;

        if outcome == ManualOutcome::Graded {
            if self.records[index].score.total == 0 {
                self.confirmed_zero.insert(sequence_number);
            } else {
                self.confirmed_zero.remove(&sequence_number);
            }
        }

        Ok(outcome)
    }

    /// 用评分器给当前记录评分，游标不移动
    ///
    /// 评分器失败时已评分的记录（包括确认过的 0 分）保持不变。
    pub async fn score_current(&mut self, flow: &GradingFlow) -> Option<AdapterOutcome> {
        let record = self.records.get_mut(self.cursor)?;
        let number = record.sequence_number;
        let zero_confirmed = self.confirmed_zero.contains(&number);
        let outcome = flow.score_with_adapter(record, zero_confirmed).await;
        let kept = zero_confirmed && matches!(outcome, AdapterOutcome::Fallback { .. });
        if !kept {
            self.confirmed_zero.remove(&number);
        }
        Some(outcome)
    }

    /// 跳过当前记录，记录不变，游标后移
    pub fn skip_current(&mut self) -> Option<GradingState> {
        let record = self.records.get(self.cursor)?;
        GradingFlow::skip(record);
        let state = self.state(record);
        self.advance();
        Some(state)
    }

    pub fn stats(&self) -> SessionStats {
        let mut stats = SessionStats {
            total: self.records.len(),
            ..Default::default()
        };
        for record in &self.records {
            match self.state(record) {
                GradingState::NotSubmitted => stats.not_submitted += 1,
                GradingState::SubmittedUngraded => stats.submitted += 1,
                GradingState::Graded => {
                    stats.submitted += 1;
                    stats.graded += 1;
                }
            }
        }
        stats
    }

    /// 前 `count` 条记录的预览
    pub fn preview(&self, count: usize) -> Vec<String> {
        self.records
            .iter()
            .take(count)
            .map(|r| {
                let body = match r.resolution.text() {
                    Some(text) => truncate_text(text, PREVIEW_CHARS),
                    None => "No realizó la entrega".to_string(),
                };
                format!("{}. {}\n{}", r.sequence_number, r.student_name, body)
            })
            .collect()
    }

    /// 整批保存到 `<output_dir>/<slug>/<assignment>_entregas.json`
    pub fn save(&self, store: &BatchStore) -> AppResult<PathBuf> {
        let path = store.save(&self.course_slug, &self.assignment_id, &self.records)?;
        info!("✓ 已保存 {} 条记录: {}", self.records.len(), path.display());
        Ok(path)
    }

    pub fn to_csv(&self) -> String {
        render_csv(self.records.iter().map(|r| (r, self.state(r))))
    }

    pub fn export_csv(&self, path: &Path) -> AppResult<()> {
        write_csv(path, &self.to_csv())?;
        info!("✓ CSV 已导出: {}", path.display());
        Ok(())
    }
}
