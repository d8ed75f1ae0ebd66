use crate::error::{AppResult, GraderError};
use crate::models::ScoringScale;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 课程名单与作业题目所在目录
    pub config_dir: PathBuf,
    /// 抓取的页面标记所在目录
    pub input_dir: PathBuf,
    /// 评分记录输出目录
    pub output_dir: PathBuf,
    /// 页面标记文件名
    pub markup_file: String,
    /// 课程名单文件名
    pub roster_file: String,
    /// 警告文件路径
    pub warn_file: PathBuf,
    /// 评分尺度（每个部署固定一种）
    pub scoring_scale: ScoringScale,
    /// 同时进行的自动评分数量
    pub max_concurrent_evaluations: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次评分请求超时（秒）
    pub llm_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
            markup_file: "scrap.txt".to_string(),
            roster_file: "estudiantes.json".to_string(),
            warn_file: PathBuf::from("warn.txt"),
            scoring_scale: ScoringScale::Rubric,
            max_concurrent_evaluations: 1,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            llm_timeout_secs: 60,
        }
    }
}

impl Config {
    /// 只从环境变量加载（缺省值来自 `Default`）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取可选的 TOML 文件，再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GraderError::read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
            .map_err(|e| GraderError::Config(format!("{}: {}", path.display(), e)))
    }

    /// 从 TOML 文本读取配置
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            config_dir: std::env::var("GRADER_CONFIG_DIR").map(PathBuf::from).unwrap_or(default.config_dir),
            input_dir: std::env::var("GRADER_INPUT_DIR").map(PathBuf::from).unwrap_or(default.input_dir),
            output_dir: std::env::var("GRADER_OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            markup_file: std::env::var("GRADER_MARKUP_FILE").unwrap_or(default.markup_file),
            roster_file: std::env::var("GRADER_ROSTER_FILE").unwrap_or(default.roster_file),
            warn_file: std::env::var("GRADER_WARN_FILE").map(PathBuf::from).unwrap_or(default.warn_file),
            scoring_scale: std::env::var("SCORING_SCALE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.scoring_scale),
            max_concurrent_evaluations: std::env::var("MAX_CONCURRENT_EVALUATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_evaluations),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_timeout_secs),
        }
    }

    /// 课程名单文件完整路径
    pub fn roster_path(&self) -> PathBuf {
        self.config_dir.join(&self.roster_file)
    }

    /// 页面标记文件完整路径
    pub fn markup_path(&self) -> PathBuf {
        self.input_dir.join(&self.markup_file)
    }

    /// 自动评分需要 API 密钥
    pub fn require_api_key(&self) -> AppResult<&str> {
        if self.llm_api_key.trim().is_empty() {
            return Err(GraderError::Config(
                "未找到 OPENAI_API_KEY，请写入 .env 或使用 export".to_string(),
            ));
        }
        Ok(&self.llm_api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_partial_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            output_dir = "salida"
            scoring_scale = "sliders"
            max_concurrent_evaluations = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("salida"));
        assert_eq!(config.scoring_scale, ScoringScale::Sliders);
        assert_eq!(config.max_concurrent_evaluations, 4);
        assert_eq!(config.roster_file, "estudiantes.json");
        assert_eq!(config.llm_model_name, "gpt-4o");
    }

    #[test]
    fn test_paths() {
        let config = Config::default();
        assert_eq!(config.roster_path(), PathBuf::from("config/estudiantes.json"));
        assert_eq!(config.markup_path(), PathBuf::from("data/input/scrap.txt"));
    }

    #[test]
    fn test_require_api_key() {
        let config = Config::default();
        assert!(matches!(config.require_api_key(), Err(GraderError::Config(_))));

        let config = Config {
            llm_api_key: "sk-test".to_string(),
            ..Config::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
