//! 命令行参数定义

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 顶层命令行解析器
#[derive(Debug, Parser)]
#[command(name = "grader", version, about = "抓取讨论页提交并按评分量表评分")]
pub struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 列出有学生的课程
    Courses,

    /// 抽取页面标记，与名单对账并保存评分记录
    Prepare {
        /// 课程编号
        #[arg(long)]
        course: String,
        /// 作业编号
        #[arg(long)]
        assignment: String,
        /// 页面标记文件，缺省为输入目录下的 scrap.txt
        #[arg(long)]
        markup: Option<PathBuf>,
    },

    /// 对批次文件中的未评分记录自动评分
    Evaluate {
        input: PathBuf,
        output: PathBuf,
        /// 作业题目文件，缺省为配置目录下的 consignas_p1.json
        #[arg(long)]
        prompts: Option<PathBuf>,
        /// 重新评分已评分的记录
        #[arg(long)]
        regrade: bool,
        /// 同时进行的评分请求数
        #[arg(long)]
        max_concurrent: Option<usize>,
    },

    /// 人工给批次文件中的一条记录评分
    Grade {
        input: PathBuf,
        /// 记录序号
        #[arg(long)]
        number: u32,
        /// 四项评分
        #[arg(long, num_args = 4, required = true, allow_negative_numbers = true)]
        scores: Vec<i32>,
        #[arg(long, default_value = "")]
        comment: String,
        /// 确认总分为 0
        #[arg(long)]
        confirm_zero: bool,
    },

    /// 把批次文件导出为 CSV
    Export { input: PathBuf, output: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_prepare_subcommand() {
        let cli = Cli::parse_from(["grader", "prepare", "--course", "7", "--assignment", "tarea1"]);
        match cli.command {
            Command::Prepare { course, assignment, markup } => {
                assert_eq!(course, "7");
                assert_eq!(assignment, "tarea1");
                assert!(markup.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_evaluate_with_global_flags() {
        let cli = Cli::parse_from([
            "grader", "evaluate", "in.json", "out.json", "--regrade", "--verbose",
            "--max-concurrent", "3",
        ]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Evaluate { regrade: true, max_concurrent: Some(3), .. }
        ));
    }

    #[test]
    fn parses_grade_scores() {
        let cli = Cli::parse_from([
            "grader", "grade", "b.json", "--number", "2", "--scores", "1", "-1", "2", "0",
            "--confirm-zero",
        ]);
        match cli.command {
            Command::Grade { number, scores, confirm_zero, comment, .. } => {
                assert_eq!(number, 2);
                assert_eq!(scores, vec![1, -1, 2, 0]);
                assert!(confirm_zero);
                assert_eq!(comment, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_wrong_number_of_scores() {
        let result = Cli::try_parse_from(["grader", "grade", "b.json", "--number", "2", "--scores", "1", "2"]);
        assert!(result.is_err());
    }
}
