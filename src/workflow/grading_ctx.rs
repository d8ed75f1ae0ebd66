//! 评分上下文
//!
//! 封装"我正在给哪位学生的哪份作业评分"这一信息

use std::fmt::Display;

use crate::models::SubmissionRecord;

/// 评分上下文
#[derive(Debug, Clone)]
pub struct GradingCtx {
    /// 名单序号（从1开始）
    pub sequence_number: u32,

    /// 学生显示名
    pub student_name: String,

    /// 作业编号
    pub assignment_id: String,
}

impl GradingCtx {
    pub fn new(
        sequence_number: u32,
        student_name: impl Into<String>,
        assignment_id: impl Into<String>,
    ) -> Self {
        Self {
            sequence_number,
            student_name: student_name.into(),
            assignment_id: assignment_id.into(),
        }
    }
}

impl From<&SubmissionRecord> for GradingCtx {
    fn from(record: &SubmissionRecord) -> Self {
        Self::new(
            record.sequence_number,
            record.student_name.clone(),
            record.assignment_id.clone(),
        )
    }
}

impl Display for GradingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[记录 #{} 学生 {} 作业 {}]",
            self.sequence_number, self.student_name, self.assignment_id
        )
    }
}
