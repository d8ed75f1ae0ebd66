use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum GraderError {
    /// 页面标记结构无法解析
    #[error("标记解析失败: {0}")]
    StructuralParse(String),

    /// 人工评分校验失败
    #[error("评分校验失败: {0}")]
    Validation(#[from] ValidationError),

    /// 自动评分适配器错误
    #[error("评分适配器错误: {0}")]
    Adapter(#[from] AdapterError),

    /// 写入目标不可写
    #[error("持久化失败 ({path}): {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 输入文件不存在
    #[error("输入文件不存在: {path}")]
    InputNotFound { path: String },

    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 内容不合法
    #[error("JSON解析失败 ({path}): {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 课程不存在或没有学生
    #[error("找不到课程: {0}")]
    UnknownCourse(String),

    /// 作业编号不在题目集中
    #[error("找不到作业: {0}")]
    UnknownAssignment(String),

    /// 批次中没有该序号的记录
    #[error("找不到序号为 {0} 的记录")]
    RecordNotFound(u32),
}

/// 评分明细校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 评分项为负数
    #[error("第 {criterion} 项得分 {value} 不能为负数")]
    Negative { criterion: usize, value: i32 },

    /// 评分项超过上限
    #[error("第 {criterion} 项得分 {value} 超过上限 {max}")]
    ExceedsMaximum { criterion: usize, value: i32, max: i32 },

    /// 未提交的记录不接受人工评分
    #[error("学生 {student} 未提交作业，记录已终结")]
    NotSubmitted { student: String },
}

/// 评分适配器错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// 网络或 API 调用失败
    #[error("调用失败: {0}")]
    Transport(String),

    /// 返回内容为空
    #[error("返回内容为空")]
    EmptyResponse,

    /// 返回内容无法解析
    #[error("返回内容无法解析: {0}")]
    Malformed(String),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, GraderError>;

impl GraderError {
    /// 创建持久化错误
    pub fn persistence(path: impl Into<String>, source: std::io::Error) -> Self {
        GraderError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// 创建读取错误，文件不存在时归为 `InputNotFound`
    pub fn read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            GraderError::InputNotFound { path }
        } else {
            GraderError::ReadFailed { path, source }
        }
    }

    /// 创建 JSON 解析错误
    pub fn invalid_json(path: impl Into<String>, source: serde_json::Error) -> Self {
        GraderError::InvalidJson {
            path: path.into(),
            source,
        }
    }
}
