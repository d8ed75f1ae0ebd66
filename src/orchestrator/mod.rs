//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整批记录的调度和统计，不做具体的评分判断。
//!
//! ## 模块划分
//!
//! ### `session` - 评分会话
//! - 抽取页面标记并与名单对账
//! - 游标浏览、人工评分、跳过
//! - 整批保存 JSON、导出 CSV
//!
//! ### `batch_processor` - 批量评分处理器
//! - 读取批次文件，对未评分记录调用评分器
//! - 控制并发数量（Semaphore）
//! - 支持取消，汇总警告
//!
//! ## 层次关系
//!
//! ```text
//! session / batch_processor (处理 Vec<SubmissionRecord>)
//!     ↓
//! workflow::GradingFlow (处理单条记录)
//!     ↓
//! services (能力层：extractor / reconciler / scoring / warn)
//!     ↓
//! infrastructure (基础设施：BatchStore / CSV)
//! ```

pub mod batch_processor;
pub mod session;

// 重新导出主要类型
pub use batch_processor::{BatchOptions, BatchProcessor, BatchReport};
pub use session::{GradingSession, SessionStats, PREVIEW_CHARS};
