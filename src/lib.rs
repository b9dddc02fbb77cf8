//! # Run Agent Submit
//!
//! 一个针对问答基准的代理评测运行器：从打分服务拉取题目，
//! 调用带限流的 LLM 代理逐题作答，再把答案批量提交回去评分。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 外部服务层（Clients）
//! - `clients/` - 打分服务 HTTP 客户端（题目拉取 / 附件 / 提交归类）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 Question
//! - `QuotaTracker` - 滚动窗口限流能力（调用频率 + token 预算）
//! - `Agent` / `LlmAgent` - 单题作答能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一批题目"的完整作答流程
//! - `run_batch` - 顺序遍历、单题失败隔离、产出提交条目与结果表
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 一次评测运行的调度：拉取 → 作答 → 提交
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ScoringClient, SubmitOutcome};
pub use config::{AgentKind, Config, RunMode};
pub use error::{AppError, AppResult};
pub use models::{AnswerResult, Question, ResultLogRow};
pub use orchestrator::App;
pub use services::{Agent, FixedAnswerAgent, LlmAgent, QuotaTracker};
pub use workflow::{run_batch, BatchOutcome};
