//! 自动评分能力接口
//!
//! 状态机只依赖这个 trait，具体实现（LLM、测试替身）从外部注入。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;
use crate::models::CRITERIA_COUNT;

/// 评分器未给出评语或评分失败时使用的评语
pub const FALLBACK_COMMENT: &str = "Evaluación completada";

/// 发给评分器的一次请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub student_name: String,
    pub submission_text: String,
    /// 作业题目文本（没有题目时为作业编号）
    pub assignment_context: String,
}

/// 评分器返回的结构化结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScore {
    pub total: i32,
    pub breakdown: [i32; CRITERIA_COUNT],
    pub comment: String,
}

/// 自动评分适配器
#[async_trait]
pub trait ScoringAdapter: Send + Sync {
    /// 对单份提交评分
    ///
    /// # Errors
    ///
    /// 网络、超时或返回内容无法解析时返回 [`AdapterError`]。
    async fn score(&self, request: &ScoringRequest) -> Result<RubricScore, AdapterError>;
}
