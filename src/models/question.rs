use serde::{Deserialize, Serialize};

/// 评测题目记录
///
/// 由打分服务的 `GET /questions` 与 `GET /random-question` 接口返回，
/// 字段缺失时反序列化为空字符串（后续由批量执行器跳过）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub question: String,
    /// 题目附件文件名（如有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl Question {
    /// 判断记录是否完整（task_id 与题干都非空才能参与评测）
    pub fn is_valid(&self) -> bool {
        !self.task_id.is_empty() && !self.question.is_empty()
    }
}

/// 单道题目的作答结果
///
/// 每道题目恰好产生一个，生成后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerResult {
    /// 作答成功，携带提取后的最终答案
    Success { answer: String },
    /// 作答失败，携带可读的错误信息
    Failure { error: String },
}

/// 结果表行
///
/// 无论成功失败，每道有效题目都对应一行，用于最终展示。
#[derive(Debug, Clone, Serialize)]
pub struct ResultLogRow {
    pub task_id: String,
    pub question: String,
    /// 答案内容，或格式化后的错误标记
    pub outcome: String,
}
