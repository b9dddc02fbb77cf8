//! 作答代理 - 业务能力层
//!
//! 只负责"回答单个题目"的能力，不关心批量流程。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型（兼容 OpenAI API 的服务，如 Gemini）
//! - 调用前显式询问 [`QuotaTracker`]，成功后回写真实 token 用量

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::AnswerResult;
use crate::services::quota_tracker::QuotaTracker;
use crate::utils::logging::truncate_text;

/// 固定的作答格式指令
///
/// 要求模型先给出推理过程，再以 `FINAL ANSWER:` 标记收尾。
const SYSTEM_PROMPT: &str = "You are a general AI assistant. I will ask you a question. Report your thoughts, and finish your answer with the following template: FINAL ANSWER: [YOUR FINAL ANSWER]. YOUR FINAL ANSWER should be a number OR as few words as possible OR a comma separated list of numbers and/or strings. If you are asked for a number, don't use comma to write your number neither use units such as $ or percent sign unless specified otherwise. If you are asked for a string, don't use articles, neither abbreviations (e.g. for cities), and write the digits in plain text unless specified otherwise. If you are asked for a comma separated list, apply the above rules depending of whether the element to be put in the list is a number or a string.";

/// 最终答案标记
const ANSWER_MARKER: &str = "FINAL ANSWER:";

/// 从模型原始输出中提取最终答案
///
/// 包含标记时取第一个标记之后的内容并去除首尾空白，
/// 否则返回整段去除空白后的文本。
pub fn extract_final_answer(text: &str) -> String {
    match text.find(ANSWER_MARKER) {
        Some(pos) => text[pos + ANSWER_MARKER.len()..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// 作答代理能力接口
///
/// 不同实现通过 [`crate::config::AgentKind`] 选择。单题失败以
/// [`AnswerResult::Failure`] 表达，不向上抛错。
#[async_trait]
pub trait Agent: Send {
    async fn invoke(&mut self, question: &str) -> AnswerResult;
}

/// 固定答案代理（调试/兜底用）
pub struct FixedAnswerAgent;

#[async_trait]
impl Agent for FixedAnswerAgent {
    async fn invoke(&mut self, question: &str) -> AnswerResult {
        info!("收到题目 (前 50 字符): {}...", truncate_text(question, 50));
        AnswerResult::Success {
            answer: "This is a default answer.".to_string(),
        }
    }
}

/// 带限流的单次调用代理
///
/// 独占持有一个 [`QuotaTracker`]：每次调用先过频率门，再按上一次
/// 用量过 token 门，调用成功后把真实用量记回窗口。
pub struct LlmAgent {
    client: Client<OpenAIConfig>,
    model_name: String,
    quota: QuotaTracker,
}

impl LlmAgent {
    /// 创建新的作答代理
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            quota: QuotaTracker::new(config.rpm_limit, config.tpm_limit),
        }
    }

    /// 发出一次生成调用
    ///
    /// # 返回
    /// 返回 (原始响应文本, 本次调用的 token 总用量)
    async fn generate(&self, question: &str) -> AppResult<(String, u64)> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("题目长度: {} 字符", question.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(question)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(2048u32)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        let total_tokens = response
            .usage
            .as_ref()
            .map(|u| u.total_tokens as u64)
            .unwrap_or(0);

        let choice = response.choices.first().ok_or_else(|| {
            AppError::Llm(LlmError::EmptyResponse {
                model: self.model_name.clone(),
            })
        })?;

        let content = choice.message.content.clone().ok_or_else(|| {
            AppError::Llm(LlmError::EmptyContent {
                model: self.model_name.clone(),
            })
        })?;

        Ok((content, total_tokens))
    }

    /// 累计 token 用量（日志展示用）
    pub fn lifetime_tokens(&self) -> u64 {
        self.quota.lifetime_tokens()
    }
}

#[async_trait]
impl Agent for LlmAgent {
    async fn invoke(&mut self, question: &str) -> AnswerResult {
        // 先过频率门，再按上一次用量过 token 门
        self.quota.admit_call().await;
        self.quota.admit_tokens().await;

        info!("收到题目 (前 50 字符): {}...", truncate_text(question, 50));

        match self.generate(question).await {
            Ok((text, total_tokens)) => {
                self.quota.record_usage(total_tokens);
                let answer = extract_final_answer(&text);
                info!(
                    "作答完成，本次用量 {} token，答案: {}",
                    total_tokens,
                    truncate_text(&answer, 80)
                );
                AnswerResult::Success { answer }
            }
            Err(e) => AnswerResult::Failure {
                error: e.to_string(),
            },
        }
    }
}
