//! 评分记录存储 - 基础设施层
//!
//! 持有输出目录，只暴露"整文件保存/读取批次"的能力

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppResult, GraderError};
use crate::models::SubmissionRecord;

/// 评分记录存储
///
/// 职责：
/// - 决定批次文件的位置
/// - 以整文件替换的方式写入，读者看不到写了一半的文件
/// - 不认识评分流程
#[derive(Debug, Clone)]
pub struct BatchStore {
    output_dir: PathBuf,
}

impl BatchStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// `<output_dir>/<slug>/<assignment>_entregas.json`
    pub fn batch_path(&self, course_slug: &str, assignment_id: &str) -> PathBuf {
        self.output_dir
            .join(course_slug)
            .join(format!("{}_entregas.json", assignment_id))
    }

    /// 保存课程作业的批次，返回写入路径
    pub fn save(
        &self,
        course_slug: &str,
        assignment_id: &str,
        records: &[SubmissionRecord],
    ) -> AppResult<PathBuf> {
        let path = self.batch_path(course_slug, assignment_id);
        save_records(&path, records)?;
        Ok(path)
    }
}

/// 把整个批次序列化为 JSON 并原子替换目标文件
pub fn save_records(path: &Path, records: &[SubmissionRecord]) -> AppResult<()> {
    let pretty = serde_json::to_string_pretty(records)
        .map_err(|e| GraderError::invalid_json(path.display().to_string(), e))?;
    write_atomic(path, pretty.as_bytes())?;
    debug!("已保存 {} 条记录: {}", records.len(), path.display());
    Ok(())
}

/// 先写临时文件再重命名到目标位置
pub fn write_atomic(path: &Path, contents: &[u8]) -> AppResult<()> {
    let display = path.display().to_string();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| GraderError::persistence(&display, e))?;
        }
    }

    let tmp = temp_path(path);
    {
        let mut f = fs::File::create(&tmp).map_err(|e| GraderError::persistence(&display, e))?;
        f.write_all(contents)
            .map_err(|e| GraderError::persistence(&display, e))?;
        f.flush().map_err(|e| GraderError::persistence(&display, e))?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(GraderError::persistence(&display, e));
    }
    Ok(())
}

fn temp_path(final_path: &Path) -> PathBuf {
    let mut tmp = final_path.to_path_buf();
    let fname = final_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("entregas.json");
    tmp.set_file_name(format!("{fname}.tmp"));
    tmp
}
