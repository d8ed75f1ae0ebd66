//! # Submission Grader
//!
//! 从课程讨论页抓取学生提交，与名单对账后按评分量表评分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露持久化能力
//! - `BatchStore` - 整批记录的原子写入
//! - `csv_export` - 导出 CSV
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `extractor` - 从页面标记抽取提交内容
//! - `reconciler` - 与名单对账
//! - `ScoringAdapter` / `LlmScorer` - 可替换的自动评分能力
//! - `WarnWriter` - 写 warn.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条记录"的评分状态机
//! - `GradingCtx` - 上下文封装（序号 + 学生 + 作业）
//! - `GradingFlow` - 自动评分、人工评分、跳过
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 一门课程一份作业的评分会话
//! - `orchestrator/batch_processor` - 批量自动评分，管理并发
//!
//! ## 模块结构

pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AdapterError, AppResult, GraderError, ValidationError};
pub use infrastructure::BatchStore;
pub use models::{AssignmentPromptSet, Course, Resolution, Score, ScoringScale, SubmissionRecord};
pub use orchestrator::{BatchOptions, BatchProcessor, BatchReport, GradingSession};
pub use services::{LlmScorer, ScoringAdapter};
pub use workflow::{GradingCtx, GradingFlow, GradingState};
