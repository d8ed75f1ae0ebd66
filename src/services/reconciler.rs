//! 名单对账服务 - 业务能力层
//!
//! 把抽取结果与完整名单合并，名单中的每个学生恰好对应一条记录。

use crate::models::{Resolution, RosterEntry, SubmissionRecord};
use crate::services::extractor::SubmissionMap;

/// 按名单顺序生成评分记录
///
/// 没有抽取到内容的学生记为未提交；分数和评语全部初始化为空。
pub fn reconcile(
    roster: &[RosterEntry],
    extracted: &SubmissionMap,
    assignment_id: &str,
) -> Vec<SubmissionRecord> {
    roster
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let resolution = extracted
                .get(&entry.match_key)
                .map(|text| Resolution::Submitted(text.clone()))
                .unwrap_or(Resolution::NotSubmitted);

            SubmissionRecord::new(
                (index + 1) as u32,
                entry.display_name.clone(),
                resolution,
                assignment_id,
            )
        })
        .collect()
}
