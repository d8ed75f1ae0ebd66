//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use anyhow::Result;
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 一条需要人工复查的警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingWarning {
    pub sequence_number: u32,
    pub student_name: String,
    pub assignment_id: String,
    pub reason: String,
}

impl Display for GradingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.sequence_number, self.student_name, self.assignment_id, self.reason
        )
    }
}

/// 警告写入服务
///
/// 职责：
/// - 把评分降级（回退为0分）的记录追加到警告文件
/// - 只处理单条警告
/// - 不关心流程顺序
pub struct WarnWriter {
    warn_file_path: PathBuf,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self {
            warn_file_path: PathBuf::from("warn.txt"),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 追加一条警告
    pub async fn write(&self, warning: &GradingWarning) -> Result<()> {
        debug!(
            "写入警告: 学生 {} | 作业 {} | 原因长度: {}",
            warning.student_name,
            warning.assignment_id,
            warning.reason.len()
        );

        if let Some(parent) = self.warn_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await?;

        file.write_all(format!("{}\n", warning).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
