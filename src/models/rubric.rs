use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 评分项数量
pub const CRITERIA_COUNT: usize = 4;

/// 评分项名称（顺序固定）
pub const CRITERIA_NAMES: [&str; CRITERIA_COUNT] = [
    "Comprensión del Problema",
    "Estructura y Organización del Código",
    "Funcionalidad y Exactitud",
    "Uso de Estrategias y Eficiencia",
];

/// 评分尺度
///
/// 两种尺度互斥，每个部署只使用其中一种。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringScale {
    /// 评分细则：8/6/6/4
    #[default]
    Rubric,
    /// 人工滑块：3/3/2/2
    Sliders,
}

impl ScoringScale {
    /// 各评分项上限
    pub fn maxima(self) -> [i32; CRITERIA_COUNT] {
        match self {
            ScoringScale::Rubric => [8, 6, 6, 4],
            ScoringScale::Sliders => [3, 3, 2, 2],
        }
    }

    /// 总分上限
    pub fn max_total(self) -> i32 {
        self.maxima().iter().sum()
    }

    /// 标准名称
    pub fn name(self) -> &'static str {
        match self {
            ScoringScale::Rubric => "rubric",
            ScoringScale::Sliders => "sliders",
        }
    }
}

impl FromStr for ScoringScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rubric" | "rubrica" => Ok(ScoringScale::Rubric),
            "sliders" | "manual" => Ok(ScoringScale::Sliders),
            other => Err(format!("未知的评分尺度: {}", other)),
        }
    }
}

/// 校验评分明细并返回总分
///
/// 每一项都必须在 `[0, maxima[i]]` 范围内。
pub fn validate_breakdown(
    breakdown: &[i32; CRITERIA_COUNT],
    maxima: &[i32; CRITERIA_COUNT],
) -> Result<i32, ValidationError> {
    for (i, (&value, &max)) in breakdown.iter().zip(maxima.iter()).enumerate() {
        if value < 0 {
            return Err(ValidationError::Negative {
                criterion: i + 1,
                value,
            });
        }
        if value > max {
            return Err(ValidationError::ExceedsMaximum {
                criterion: i + 1,
                value,
                max,
            });
        }
    }
    Ok(breakdown.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maxima() {
        assert_eq!(ScoringScale::Rubric.maxima(), [8, 6, 6, 4]);
        assert_eq!(ScoringScale::Rubric.max_total(), 24);
        assert_eq!(ScoringScale::Sliders.maxima(), [3, 3, 2, 2]);
        assert_eq!(ScoringScale::Sliders.max_total(), 10);
    }

    #[test]
    fn test_validate_breakdown_rejects_over_maximum() {
        let err = validate_breakdown(&[9, 0, 0, 0], &ScoringScale::Rubric.maxima()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ExceedsMaximum {
                criterion: 1,
                value: 9,
                max: 8
            }
        );
    }

    #[test]
    fn test_validate_breakdown_rejects_negative() {
        let err = validate_breakdown(&[1, 1, -1, 0], &ScoringScale::Sliders.maxima()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Negative {
                criterion: 3,
                value: -1
            }
        );
    }

    #[test]
    fn test_validate_breakdown_sums() {
        let total = validate_breakdown(&[2, 2, 1, 1], &ScoringScale::Sliders.maxima()).unwrap();
        assert_eq!(total, 6);
        let total = validate_breakdown(&[8, 6, 6, 4], &ScoringScale::Rubric.maxima()).unwrap();
        assert_eq!(total, 24);
    }

    #[test]
    fn test_parse_scale() {
        assert_eq!("Rubric".parse::<ScoringScale>().unwrap(), ScoringScale::Rubric);
        assert_eq!(" sliders ".parse::<ScoringScale>().unwrap(), ScoringScale::Sliders);
        assert!("otro".parse::<ScoringScale>().is_err());
    }
}
