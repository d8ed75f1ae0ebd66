use crate::error::{AppResult, GraderError};
use crate::models::prompts::AssignmentPromptSet;
use crate::models::roster::Course;
use crate::models::submission::SubmissionRecord;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 课程 slug 关键字到题目文件的映射（按顺序匹配）
static PROMPT_FILES: phf::OrderedMap<&'static str, &'static str> = phf::phf_ordered_map! {
    "programacion1" => "consignas_p1.json",
    "programacion2" => "consignas_p2.json",
};

const DEFAULT_PROMPT_FILE: &str = "consignas_p1.json";

/// 根据课程 slug 选择题目文件名
pub fn prompt_file_for_slug(slug: &str) -> &'static str {
    let slug = slug.to_lowercase();
    PROMPT_FILES
        .entries()
        .find(|(keyword, _)| slug.contains(**keyword))
        .map(|(_, file)| *file)
        .unwrap_or(DEFAULT_PROMPT_FILE)
}

/// 题目文件完整路径
pub fn prompt_path_for_course(config_dir: &Path, course: &Course) -> PathBuf {
    config_dir.join(prompt_file_for_slug(&course.slug))
}

/// 批次文件对应的题目文件路径
///
/// 批次保存在 `<out>/<slug>/<assignment>_entregas.json`，用父目录名作为课程 slug。
pub fn prompt_path_for_batch(config_dir: &Path, batch_path: &Path) -> PathBuf {
    let slug = batch_path
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    config_dir.join(prompt_file_for_slug(slug))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| GraderError::read_failed(path.display().to_string(), e))?;

    serde_json::from_str(&content).map_err(|e| GraderError::invalid_json(path.display().to_string(), e))
}

/// 加载课程名单
pub async fn load_courses(path: &Path) -> AppResult<Vec<Course>> {
    let courses: Vec<Course> = read_json(path).await?;
    tracing::info!("成功加载 {} 个课程: {}", courses.len(), path.display());
    Ok(courses)
}

/// 加载作业题目
pub async fn load_prompts(path: &Path) -> AppResult<AssignmentPromptSet> {
    let prompts: AssignmentPromptSet = read_json(path).await?;
    if prompts.is_empty() {
        tracing::warn!("题目文件为空: {}", path.display());
    }
    Ok(prompts)
}

/// 加载评分记录批次
pub async fn load_batch(path: &Path) -> AppResult<Vec<SubmissionRecord>> {
    let records: Vec<SubmissionRecord> = read_json(path).await?;
    tracing::info!("成功加载 {} 条记录: {}", records.len(), path.display());
    Ok(records)
}

/// 读取抓取的页面标记
pub async fn read_markup(path: &Path) -> AppResult<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| GraderError::read_failed(path.display().to_string(), e))
}
