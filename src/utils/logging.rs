/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 `debug` 或 `info`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录会话开始信息
///
/// # 参数
/// - `course_label`: 课程标签
/// - `assignment_id`: 作业编号
/// - `students`: 学生人数
pub fn log_session_start(course_label: &str, assignment_id: &str, students: usize) {
    info!("{}", "=".repeat(60));
    info!("📝 评分会话开始");
    info!("📚 课程: {}", course_label);
    info!("📄 作业: {} | 学生 {} 人", assignment_id, students);
    info!("{}", "=".repeat(60));
}

/// 记录抽取统计
pub fn log_extraction(total: usize, submitted: usize) {
    info!("✓ 名单 {} 人，抓取到 {} 份提交", total, submitted);
    info!("   未提交: {}", total - submitted);
}

/// 记录批次开始信息
///
/// # 参数
/// - `total`: 记录总数
/// - `pending`: 需要调用评分器的记录数
/// - `max_concurrent`: 最大并发数
pub fn log_batch_start(total: usize, pending: usize, max_concurrent: usize) {
    info!("\n{}", "=".repeat(60));
    info!("🚀 开始自动评分: 共 {} 条记录，待评分 {} 条", total, pending);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `scored`: 成功评分数量
/// - `fallback`: 回退为0分的数量
/// - `auto_finalized`: 未提交自动记0分的数量
/// - `skipped`: 跳过数量
/// - `total`: 总数
pub fn print_final_stats(
    scored: usize,
    fallback: usize,
    auto_finalized: usize,
    skipped: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 评分完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已评分: {}/{}", scored, total);
    info!("⚠️ 回退为0分: {}", fallback);
    info!("🚫 未提交: {}", auto_finalized);
    info!("⏭️ 跳过: {}", skipped);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
