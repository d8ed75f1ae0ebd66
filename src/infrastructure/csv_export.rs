//! CSV 导出 - 基础设施层

use std::path::Path;

use crate::error::AppResult;
use crate::infrastructure::batch_store::write_atomic;
use crate::models::SubmissionRecord;
use crate::workflow::GradingState;

const HEADER: &str = "Name,Assignment,Status,Total,Criterion1,Criterion2,Criterion3,Criterion4,Comments\n";

fn esc(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// 每条记录一行，状态由调用方根据状态机给出
pub fn render_csv<'a>(rows: impl IntoIterator<Item = (&'a SubmissionRecord, GradingState)>) -> String {
    let mut csv = String::from(HEADER);

    for (record, state) in rows {
        let [c1, c2, c3, c4] = record.score.breakdown;
        let row = format!(
            "{},{},{},{},{},{},{},{},{}\n",
            esc(&record.student_name),
            esc(&record.assignment_id),
            state.label(),
            record.score.total,
            c1,
            c2,
            c3,
            c4,
            esc(&record.comment)
        );
        csv.push_str(&row);
    }

    csv
}

/// 只根据记录内容判断状态并导出
pub fn render_records(records: &[SubmissionRecord]) -> String {
    render_csv(records.iter().map(|r| (r, GradingState::of(r))))
}

/// 写入 CSV 文件（整文件替换）
pub fn write_csv(path: &Path, csv: &str) -> AppResult<()> {
    write_atomic(path, csv.as_bytes())
}
