use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use submission_grader::cli::{Cli, Command};
use submission_grader::error::GraderError;
use submission_grader::infrastructure::{render_records, save_records, write_csv};
use submission_grader::models::loaders::{
    load_batch, load_courses, load_prompts, prompt_path_for_batch, prompt_path_for_course,
    read_markup,
};
use submission_grader::models::roster::{courses_with_students, find_course};
use submission_grader::models::AssignmentPromptSet;
use submission_grader::orchestrator::{BatchOptions, BatchProcessor, GradingSession, PREVIEW_CHARS};
use submission_grader::services::{LlmScorer, WarnWriter};
use submission_grader::utils::logging;
use submission_grader::workflow::{GradingFlow, ManualOutcome};
use submission_grader::{BatchStore, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    match cli.command {
        Command::Courses => list_courses(&config).await,
        Command::Prepare {
            course,
            assignment,
            markup,
        } => prepare(&config, &course, &assignment, markup.as_deref()).await,
        Command::Evaluate {
            input,
            output,
            prompts,
            regrade,
            max_concurrent,
        } => {
            let options = BatchOptions {
                max_concurrent: max_concurrent.unwrap_or(config.max_concurrent_evaluations),
                regrade,
                cancel: None,
            };
            evaluate(&config, &input, &output, prompts.as_deref(), options).await
        }
        Command::Grade {
            input,
            number,
            scores,
            comment,
            confirm_zero,
        } => grade(&config, &input, number, &scores, &comment, confirm_zero).await,
        Command::Export { input, output } => {
            let records = load_batch(&input).await?;
            write_csv(&output, &render_records(&records))?;
            info!("✓ CSV 已导出: {}", output.display());
            Ok(())
        }
    }
}

async fn list_courses(config: &Config) -> Result<()> {
    let courses = load_courses(&config.roster_path()).await?;
    let available = courses_with_students(&courses);
    if available.is_empty() {
        warn!("⚠️ 没有包含学生的课程");
    }
    for course in available {
        println!("{}", course.label());
    }
    Ok(())
}

async fn prepare(config: &Config, course_id: &str, assignment_id: &str, markup: Option<&Path>) -> Result<()> {
    let courses = load_courses(&config.roster_path()).await?;
    let course = find_course(&courses, course_id)
        .ok_or_else(|| GraderError::UnknownCourse(course_id.to_string()))?;

    let prompts = load_prompts(&prompt_path_for_course(&config.config_dir, course)).await?;

    let markup_path = markup.map(Path::to_path_buf).unwrap_or_else(|| config.markup_path());
    let markup = read_markup(&markup_path).await?;

    let session = GradingSession::start(course, &prompts, assignment_id, &markup)?;

    for line in session.preview(3) {
        println!("{}\n", line);
    }

    let stats = session.stats();
    println!(
        "Total: {} | Entregaron: {} | No entregaron: {} | Calificados: {}",
        stats.total, stats.submitted, stats.not_submitted, stats.graded
    );
    info!("预览每份最多显示 {} 字符", PREVIEW_CHARS);

    let store = BatchStore::new(&config.output_dir);
    let existing = store.batch_path(course.output_slug(), assignment_id);
    if existing.exists() {
        warn!("⚠️ 覆盖已有的评分记录: {}", existing.display());
    }
    let path = session.save(&store)?;
    println!("{}", path.display());
    Ok(())
}

async fn evaluate(
    config: &Config,
    input: &Path,
    output: &Path,
    prompts: Option<&Path>,
    options: BatchOptions,
) -> Result<()> {
    config.require_api_key()?;
    info!(
        "📏 评分尺度: {} (满分 {})",
        config.scoring_scale.name(),
        config.scoring_scale.max_total()
    );

    let prompts = match prompts {
        Some(path) => load_prompts(path).await?,
        None => {
            let course_path = prompt_path_for_batch(&config.config_dir, input);
            if course_path.exists() {
                info!("📄 题目文件: {}", course_path.display());
                load_prompts(&course_path).await?
            } else {
                warn!("⚠️ 未找到题目文件 {}，使用作业编号作为题目", course_path.display());
                AssignmentPromptSet::default()
            }
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ 收到中断信号，等待进行中的评分完成");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let flow = GradingFlow::new(
        Arc::new(LlmScorer::new(config)),
        Arc::new(prompts),
        config.scoring_scale,
    );
    let processor = BatchProcessor::new(
        flow,
        BatchOptions {
            cancel: Some(cancel),
            ..options
        },
    )
    .with_warn_writer(WarnWriter::with_path(&config.warn_file));

    let mut records = Vec::new();
    let report = match processor.process_file(input, output, &mut records).await {
        Ok(report) => report,
        Err(e) if !records.is_empty() => {
            // 评分结果还在内存中，先写到输入文件旁边
            let recovery = input.with_extension("recuperado.json");
            save_records(&recovery, &records)
                .with_context(|| format!("无法保存评分结果: {}", recovery.display()))?;
            warn!("⚠️ 评分结果已另存至: {}", recovery.display());
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    if !report.warnings.is_empty() {
        warn!(
            "⚠️ {} 条记录需要人工复查，详见 {}",
            report.warnings.len(),
            config.warn_file.display()
        );
    }
    Ok(())
}

async fn grade(
    config: &Config,
    input: &Path,
    number: u32,
    scores: &[i32],
    comment: &str,
    confirm_zero: bool,
) -> Result<()> {
    let breakdown: [i32; 4] = scores
        .try_into()
        .map_err(|_| GraderError::Config(format!("需要 4 项评分，实际 {} 项", scores.len())))?;

    let records = load_batch(input).await?;
    let assignment_id = records
        .first()
        .map(|r| r.assignment_id.clone())
        .unwrap_or_default();
    let mut session = GradingSession::from_records("default", assignment_id, records);

    match session.grade(config.scoring_scale, number, breakdown, comment, confirm_zero)? {
        ManualOutcome::Graded => {
            save_records(input, session.records())
                .with_context(|| format!("无法保存评分结果: {}", input.display()))?;
            info!("✓ 已保存: {}", input.display());
        }
        ManualOutcome::ConfirmationRequired => {
            warn!("⚠️ 总分为 0，请加上 --confirm-zero 确认");
        }
    }
    Ok(())
}
