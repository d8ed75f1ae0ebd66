use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::rubric::CRITERIA_COUNT;

/// 未提交作业的标记值
pub const NOT_SUBMITTED_MARKER: &str = "no realiza";

/// 学生提交的内容
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Resolution {
    /// 已提交（正文加附件链接）
    Submitted(String),
    /// 未提交
    #[default]
    NotSubmitted,
}

impl Resolution {
    /// 从原始字符串解析，`"no realiza"` 不区分大小写
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.trim().to_lowercase() == NOT_SUBMITTED_MARKER {
            Resolution::NotSubmitted
        } else {
            Resolution::Submitted(raw)
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self, Resolution::Submitted(_))
    }

    /// 提交的文本，未提交时为 `None`
    pub fn text(&self) -> Option<&str> {
        match self {
            Resolution::Submitted(text) => Some(text),
            Resolution::NotSubmitted => None,
        }
    }

    /// 持久化时使用的字符串
    pub fn as_str(&self) -> &str {
        match self {
            Resolution::Submitted(text) => text,
            Resolution::NotSubmitted => NOT_SUBMITTED_MARKER,
        }
    }
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Resolution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Resolution::from_raw(raw))
    }
}

/// 评分结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub total: i32,
    #[serde(rename = "detalle")]
    pub breakdown: [i32; CRITERIA_COUNT],
}

impl Score {
    /// 由明细构造，总分为各项之和
    pub fn from_breakdown(breakdown: [i32; CRITERIA_COUNT]) -> Self {
        Self {
            total: breakdown.iter().sum(),
            breakdown,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// 单个学生在单个作业上的评分记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// 名单中的序号（从1开始）
    #[serde(rename = "numero", default)]
    pub sequence_number: u32,
    /// 学生显示名
    #[serde(rename = "nombre")]
    pub student_name: String,
    /// 提交内容
    #[serde(rename = "resolucion", default)]
    pub resolution: Resolution,
    /// 作业编号
    #[serde(rename = "tarea", default)]
    pub assignment_id: String,
    #[serde(rename = "calificacion", default)]
    pub score: Score,
    #[serde(rename = "comentarios", default)]
    pub comment: String,
}

impl SubmissionRecord {
    /// 创建一条未评分的记录
    pub fn new(
        sequence_number: u32,
        student_name: impl Into<String>,
        resolution: Resolution,
        assignment_id: impl Into<String>,
    ) -> Self {
        Self {
            sequence_number,
            student_name: student_name.into(),
            resolution,
            assignment_id: assignment_id.into(),
            score: Score::zero(),
            comment: String::new(),
        }
    }

    /// 同时写入分数和评语
    pub fn set_grade(&mut self, score: Score, comment: impl Into<String>) {
        self.score = score;
        self.comment = comment.into();
    }
}
