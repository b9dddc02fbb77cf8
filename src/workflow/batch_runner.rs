//! 批量作答流程 - 流程层
//!
//! 核心职责：定义"一批题目"的完整作答流程
//!
//! 流程顺序：
//! 1. 按接收顺序逐题调用代理（严格串行）
//! 2. 单题失败转为错误行，绝不中断整批
//! 3. 汇总出提交条目与结果表两份产物

use tracing::{error, info, warn};

use crate::models::{AnswerPayload, AnswerResult, Question, ResultLogRow};
use crate::services::Agent;

/// 一次批量作答的产物
///
/// `answers` 仅含作答成功的题目；`log_rows` 对每道有效题目各有一行，
/// 顺序与输入一致；`dropped` 为因字段缺失被跳过的记录数。
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub answers: Vec<AnswerPayload>,
    pub log_rows: Vec<ResultLogRow>,
    pub dropped: usize,
}

impl BatchOutcome {
    /// 整批是否没有产出任何可提交的答案
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// 对一批题目顺序执行作答
///
/// # 参数
/// - `agent`: 作答代理（独占可变借用，配额状态随调用推进）
/// - `questions`: 题目列表，顺序即处理顺序
///
/// # 返回
/// 返回 [`BatchOutcome`]，无论多少题目失败都正常返回。
pub async fn run_batch(agent: &mut dyn Agent, questions: &[Question]) -> BatchOutcome {
    let total = questions.len();
    info!("开始作答，共 {} 道题目...", total);

    let mut outcome = BatchOutcome::default();

    for (index, item) in questions.iter().enumerate() {
        // 字段缺失的记录直接跳过：不产生提交条目，也不进入结果表
        if !item.is_valid() {
            warn!(
                "跳过字段缺失的记录 (task_id: {:?}, 第 {} 条)",
                item.task_id,
                index + 1
            );
            outcome.dropped += 1;
            continue;
        }

        info!("[题目 {}/{}] task_id: {}", index + 1, total, item.task_id);

        match agent.invoke(&item.question).await {
            AnswerResult::Success { answer } => {
                outcome.answers.push(AnswerPayload {
                    task_id: item.task_id.clone(),
                    submitted_answer: answer.clone(),
                });
                outcome.log_rows.push(ResultLogRow {
                    task_id: item.task_id.clone(),
                    question: item.question.clone(),
                    outcome: answer,
                });
            }
            AnswerResult::Failure { error } => {
                // 单题失败只记录，不中断整批
                error!("[题目 {}/{}] 作答失败: {}", index + 1, total, error);
                outcome.log_rows.push(ResultLogRow {
                    task_id: item.task_id.clone(),
                    question: item.question.clone(),
                    outcome: format!("代理错误: {}", error),
                });
            }
        }
    }

    info!(
        "作答结束: 成功 {}/{}，跳过 {} 条",
        outcome.answers.len(),
        outcome.log_rows.len(),
        outcome.dropped
    );

    outcome
}
