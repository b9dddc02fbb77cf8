//! 评测运行编排 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，对外暴露两个触发动作。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动输出日志文件、创建打分服务客户端
//! 2. **全量评测**：拉取全部题目 → 逐题作答 → 组装载荷 → 提交
//! 3. **单题评测**：拉取一道随机题目，走同一条作答/提交流水线
//! 4. **状态归一**：拉取失败、空结果、提交失败都收敛为状态文案，
//!    已生成的结果表在任何分支下都原样返回
//!
//! ## 设计特点
//!
//! - 题目严格串行处理，一次运行只有一个代理实例持有配额状态
//! - 运行一旦开始没有取消机制，整批耗时可能较长
//! - 不做跨运行的结果持久化，输出文件仅作展示留痕

use anyhow::Result;
use tracing::{error, info, warn};

use crate::clients::ScoringClient;
use crate::config::{AgentKind, Config, RunMode};
use crate::models::{ResultLogRow, SubmissionPayload};
use crate::services::{Agent, FixedAnswerAgent, LlmAgent};
use crate::utils::logging;
use crate::workflow::{run_batch, BatchOutcome};

/// 应用主结构
pub struct App {
    config: Config,
    scoring: ScoringClient,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        // 初始化输出日志文件
        logging::init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let scoring = ScoringClient::new(&config);

        Ok(Self { config, scoring })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let (status, rows) = match self.config.run_mode {
            RunMode::All => self.run_and_submit_all().await,
            RunMode::One => self.run_and_submit_one().await,
        };

        // 无论提交结果如何，结果表都完整展示
        info!("\n{}", status);
        info!("\n{}", logging::render_result_table(&rows));
        logging::append_run_result(&self.config.output_log_file, &status, &rows)?;

        Ok(())
    }

    /// 动作一：拉取全部题目，逐题作答并提交
    ///
    /// # 返回
    /// 返回 (状态文案, 结果表)，任何失败分支都不会丢弃已产生的结果表。
    pub async fn run_and_submit_all(&self) -> (String, Vec<ResultLogRow>) {
        if self.config.username.trim().is_empty() {
            warn!("未配置用户名，拒绝运行");
            return (
                "请先配置用户名 (HF_USERNAME) 再运行评测。".to_string(),
                Vec::new(),
            );
        }

        // 拉取失败对整次运行是致命的：没有题目就没有批次
        let questions = match self.scoring.get_questions().await {
            Ok(q) => q,
            Err(e) => {
                error!("拉取题目失败: {}", e);
                return (format!("获取题目失败: {}", e), Vec::new());
            }
        };

        let mut agent = self.build_agent();
        let outcome = run_batch(agent.as_mut(), &questions).await;

        self.submit_outcome(outcome).await
    }

    /// 动作二：拉取一道随机题目，作答并提交
    pub async fn run_and_submit_one(&self) -> (String, Vec<ResultLogRow>) {
        if self.config.username.trim().is_empty() {
            warn!("未配置用户名，拒绝运行");
            return (
                "请先配置用户名 (HF_USERNAME) 再运行评测。".to_string(),
                Vec::new(),
            );
        }

        let question = match self.scoring.get_random_question().await {
            Ok(q) => q,
            Err(e) => {
                error!("拉取随机题目失败: {}", e);
                return (format!("获取题目失败: {}", e), Vec::new());
            }
        };

        let mut agent = self.build_agent();
        let outcome = run_batch(agent.as_mut(), std::slice::from_ref(&question)).await;

        self.submit_outcome(outcome).await
    }

    /// 按配置构建作答代理
    fn build_agent(&self) -> Box<dyn Agent> {
        match self.config.agent_kind {
            AgentKind::Fixed => Box::new(FixedAnswerAgent),
            AgentKind::Llm => Box::new(LlmAgent::new(&self.config)),
        }
    }

    /// 组装提交载荷并归类提交结果
    ///
    /// 空结果是独立的终态：跳过提交，单独给出文案。
    async fn submit_outcome(&self, outcome: BatchOutcome) -> (String, Vec<ResultLogRow>) {
        let BatchOutcome {
            answers,
            log_rows,
            dropped,
        } = outcome;

        if dropped > 0 {
            warn!("有 {} 条记录因字段缺失被跳过", dropped);
        }

        if answers.is_empty() {
            warn!("代理没有产生任何可提交的答案");
            return (
                "代理没有产生任何可提交的答案。".to_string(),
                log_rows,
            );
        }

        let payload = SubmissionPayload {
            username: self.config.username.trim().to_string(),
            agent_code: self.config.agent_code_url(),
            answers,
        };

        info!(
            "作答完成，正在以用户 '{}' 提交 {} 条答案...",
            payload.username,
            payload.answers.len()
        );

        let submit_result = self.scoring.submit_answers(&payload).await;
        (submit_result.status_message(), log_rows)
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 评测运行模式: {:?}", config.run_mode);
    info!(
        "📊 代理类型: {:?}, 限流: {} 次/分, {} token/分",
        config.agent_kind, config.rpm_limit, config.tpm_limit
    );
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerPayload;

    fn test_app(username: &str) -> App {
        let config = Config {
            username: username.to_string(),
            output_log_file: std::env::temp_dir()
                .join("run_agent_submit_test_output.txt")
                .to_string_lossy()
                .into_owned(),
            ..Config::default()
        };
        let scoring = ScoringClient::new(&config);
        App { config, scoring }
    }

    #[tokio::test]
    async fn test_empty_batch_skips_submission() {
        let app = test_app("alice");
        let rows = vec![ResultLogRow {
            task_id: "t1".to_string(),
            question: "q1".to_string(),
            outcome: "代理错误: boom".to_string(),
        }];
        let outcome = BatchOutcome {
            answers: Vec::new(),
            log_rows: rows,
            dropped: 0,
        };

        let (status, returned_rows) = app.submit_outcome(outcome).await;

        // 空结果单独成文案，且结果表原样返回
        assert!(status.contains("没有产生任何可提交的答案"));
        assert_eq!(returned_rows.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_username_refuses_to_run() {
        let app = test_app("");
        let (status, rows) = app.run_and_submit_all().await;

        assert!(status.contains("用户名"));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_payload_assembly_trims_username() {
        let app = test_app("  alice  ");
        let answers = vec![AnswerPayload {
            task_id: "t1".to_string(),
            submitted_answer: "42".to_string(),
        }];
        let payload = SubmissionPayload {
            username: app.config.username.trim().to_string(),
            agent_code: app.config.agent_code_url(),
            answers,
        };

        assert_eq!(payload.username, "alice");
        assert!(payload.agent_code.starts_with("https://huggingface.co/spaces/"));
    }
}
