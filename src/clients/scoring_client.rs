//! 打分服务客户端
//!
//! 封装所有与打分服务的交互：拉取题目、拉取附件、提交答案。
//! 提交结果被归类为固定的几种状态，每种状态有独立的用户可读文案。

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{Question, SubmissionPayload, SubmissionResult, TaskFile};
use crate::utils::logging::truncate_text;

/// 打分服务客户端
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
    /// 题目与附件拉取超时
    fetch_timeout: Duration,
    /// 提交答案超时（评分过程较慢，放宽）
    submit_timeout: Duration,
}

impl ScoringClient {
    /// 创建新的打分服务客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            submit_timeout: Duration::from_secs(config.submit_timeout_secs),
        }
    }

    /// 拉取完整题目列表
    ///
    /// 列表为空视为错误：没有题目就没有本次运行。
    pub async fn get_questions(&self) -> AppResult<Vec<Question>> {
        let url = format!("{}/questions", self.base_url);
        info!("正在拉取题目列表: {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(ApiError::BadStatus {
                endpoint: url,
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            }));
        }

        let questions: Vec<Question> = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        if questions.is_empty() {
            warn!("拉取到的题目列表为空");
            return Err(AppError::api_empty_response(&url));
        }

        info!("拉取到 {} 道题目", questions.len());
        Ok(questions)
    }

    /// 拉取一道随机题目
    pub async fn get_random_question(&self) -> AppResult<Question> {
        let url = format!("{}/random-question", self.base_url);
        info!("正在拉取随机题目: {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(ApiError::BadStatus {
                endpoint: url,
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            }));
        }

        let question: Question = response
            .json()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        info!(
            "收到随机题目: {}",
            truncate_text(&question.question, 80)
        );
        Ok(question)
    }

    /// 拉取题目附件
    ///
    /// 按响应的 Content-Type 协商：JSON、纯文本或原始字节。
    pub async fn get_task_file(&self, task_id: &str) -> AppResult<TaskFile> {
        if task_id.is_empty() {
            return Err(AppError::Other("task_id 不能为空".to_string()));
        }

        let url = format!("{}/files/{}", self.base_url, task_id);
        info!("正在拉取题目附件: {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(ApiError::BadStatus {
                endpoint: url,
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            }));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let file = if content_type.contains("application/json") {
            let value: Value = response
                .json()
                .await
                .map_err(|e| AppError::api_request_failed(&url, e))?;
            TaskFile::Json(value)
        } else if content_type.contains("text/") {
            let text = response
                .text()
                .await
                .map_err(|e| AppError::api_request_failed(&url, e))?;
            TaskFile::Text(text)
        } else {
            // 其余按二进制文件处理（CSV、图片等）
            let bytes = response
                .bytes()
                .await
                .map_err(|e| AppError::api_request_failed(&url, e))?;
            TaskFile::Bytes(bytes.to_vec())
        };

        if file.is_empty() {
            warn!("附件内容为空 (task_id: {})", task_id);
            return Err(AppError::api_empty_response(&url));
        }

        Ok(file)
    }

    /// 提交整批答案并归类结果
    ///
    /// 该方法不返回 Result：所有失败形态都收敛到 [`SubmitOutcome`]，
    /// 由调用方渲染为状态文案，已生成的结果表不受影响。
    pub async fn submit_answers(&self, payload: &SubmissionPayload) -> SubmitOutcome {
        let url = format!("{}/submit", self.base_url);
        info!(
            "正在提交 {} 条答案到: {} (用户: {})",
            payload.answers.len(),
            url,
            payload.username
        );

        let response = match self
            .http
            .post(&url)
            .timeout(self.submit_timeout)
            .json(payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return SubmitOutcome::Timeout,
            Err(e) => return SubmitOutcome::Network(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return SubmitOutcome::HttpError {
                status: status.as_u16(),
                detail: extract_error_detail(&body),
            };
        }

        match response.json::<SubmissionResult>().await {
            Ok(result) => SubmitOutcome::Success(result),
            Err(e) => SubmitOutcome::Unexpected(e.to_string()),
        }
    }
}

/// 提交结果的归类
///
/// 每个变体对应一种用户可读的状态文案模板。
#[derive(Debug)]
pub enum SubmitOutcome {
    /// 服务端确认收分
    Success(SubmissionResult),
    /// 服务端返回错误状态码
    HttpError { status: u16, detail: String },
    /// 请求超时
    Timeout,
    /// 其他网络传输错误
    Network(String),
    /// 意外错误（例如成功响应体无法解析）
    Unexpected(String),
}

impl SubmitOutcome {
    /// 渲染用户可读的状态文案
    pub fn status_message(&self) -> String {
        match self {
            SubmitOutcome::Success(result) => format!(
                "提交成功！\n用户: {}\n总分: {}% ({}/{} 正确)\n消息: {}",
                result.username,
                result.score,
                result.correct_count,
                result.total_attempted,
                result.message
            ),
            SubmitOutcome::HttpError { status, detail } => {
                format!("提交失败: 服务端返回状态 {}。详情: {}", status, detail)
            }
            SubmitOutcome::Timeout => "提交失败: 请求超时。".to_string(),
            SubmitOutcome::Network(err) => format!("提交失败: 网络错误 - {}", err),
            SubmitOutcome::Unexpected(err) => {
                format!("提交过程中发生意外错误: {}", err)
            }
        }
    }
}

/// 从错误响应体中提取结构化 detail 字段
///
/// 响应体不是 JSON 或没有 detail 字段时，退回截断后的原始文本。
fn extract_error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail").map(|d| match d {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .unwrap_or_else(|| truncate_text(body, 500))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_contains_status_and_detail() {
        let outcome = SubmitOutcome::HttpError {
            status: 422,
            detail: extract_error_detail(r#"{"detail":"bad format"}"#),
        };
        let message = outcome.status_message();
        assert!(message.contains("422"));
        assert!(message.contains("bad format"));
    }

    #[test]
    fn test_timeout_message_is_fixed() {
        assert_eq!(
            SubmitOutcome::Timeout.status_message(),
            "提交失败: 请求超时。"
        );
    }

    #[test]
    fn test_success_message_contains_score_breakdown() {
        let result: SubmissionResult = serde_json::from_str(
            r#"{"username":"alice","score":80,"correct_count":4,"total_attempted":5,"message":"ok"}"#,
        )
        .unwrap();
        let message = SubmitOutcome::Success(result).status_message();
        assert!(message.contains("alice"));
        assert!(message.contains("80"));
        assert!(message.contains("4/5"));
        assert!(message.contains("ok"));
    }

    #[test]
    fn test_network_message_carries_transport_error() {
        let message = SubmitOutcome::Network("connection refused".to_string()).status_message();
        assert!(message.contains("网络错误"));
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_unexpected_message_carries_cause() {
        let message =
            SubmitOutcome::Unexpected("missing field `score`".to_string()).status_message();
        assert!(message.contains("意外错误"));
        assert!(message.contains("missing field `score`"));
    }

    #[test]
    fn test_detail_falls_back_to_raw_body() {
        assert_eq!(extract_error_detail("<html>502</html>"), "<html>502</html>");
        // 非字符串 detail 也要能展示
        assert_eq!(
            extract_error_detail(r#"{"detail":{"code":7}}"#),
            r#"{"code":7}"#
        );
    }

    #[test]
    fn test_long_raw_body_is_truncated() {
        let body = "x".repeat(600);
        let detail = extract_error_detail(&body);
        assert!(detail.chars().count() <= 503);
        assert!(detail.ends_with("..."));
    }
}
