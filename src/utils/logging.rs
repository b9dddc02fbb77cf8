use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、结果表渲染和输出文件的辅助函数
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::ResultLogRow;

/// 初始化全局日志
///
/// 由进程入口调用一次；级别默认 info，可用 RUST_LOG 覆盖。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化输出日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n评测运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 把结果表渲染为纯文本表格
///
/// # 参数
/// - `rows`: 结果表行（每道有效题目一行）
pub fn render_result_table(rows: &[ResultLogRow]) -> String {
    if rows.is_empty() {
        return "（无结果）".to_string();
    }

    let mut table = String::new();
    table.push_str(&format!(
        "{:<38} | {:<50} | 答案/错误\n",
        "Task ID", "题目"
    ));
    table.push_str(&format!("{}\n", "─".repeat(120)));

    for row in rows {
        table.push_str(&format!(
            "{:<38} | {:<50} | {}\n",
            row.task_id,
            truncate_text(&row.question, 48),
            truncate_text(&row.outcome, 60)
        ));
    }

    table
}

/// 把本次运行的状态与结果表追加到输出文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `status`: 本次运行的状态文案
/// - `rows`: 结果表行
pub fn append_run_result(log_file_path: &str, status: &str, rows: &[ResultLogRow]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    writeln!(file, "{}", status)?;
    writeln!(file)?;
    writeln!(file, "{}", render_result_table(rows))?;

    info!("结果已保存至: {}", log_file_path);
    Ok(())
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
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
