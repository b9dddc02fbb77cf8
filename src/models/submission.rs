use serde::{Deserialize, Serialize};

/// 单条提交条目
///
/// 仅由作答成功的题目派生，与打分服务的提交接口字段一一对应。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub task_id: String,
    pub submitted_answer: String,
}

/// 完整提交载荷
///
/// 整批作答结束后一次性构建，不做部分提交。
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    /// 提交者用户名
    pub username: String,
    /// 代码出处链接（用于成绩归属核验）
    pub agent_code: String,
    pub answers: Vec<AnswerPayload>,
}

/// 打分服务的成功响应
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionResult {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub correct_count: u64,
    #[serde(default)]
    pub total_attempted: u64,
    #[serde(default)]
    pub message: String,
}

/// 题目附件内容
///
/// `GET /files/{task_id}` 按响应的 Content-Type 协商返回结构化 JSON、
/// 纯文本或原始字节。
#[derive(Debug, Clone)]
pub enum TaskFile {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl TaskFile {
    /// 附件内容是否为空
    pub fn is_empty(&self) -> bool {
        match self {
            TaskFile::Json(v) => v.is_null(),
            TaskFile::Text(s) => s.is_empty(),
            TaskFile::Bytes(b) => b.is_empty(),
        }
    }
}
