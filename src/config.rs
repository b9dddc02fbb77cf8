use std::str::FromStr;

/// 作答代理类型
///
/// 通过配置选择实现，而不是继承：`Fixed` 返回固定答案（调试用），
/// `Llm` 为带限流的单次调用代理。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentKind {
    Fixed,
    Llm,
}

impl FromStr for AgentKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(AgentKind::Fixed),
            "llm" => Ok(AgentKind::Llm),
            _ => Err(()),
        }
    }
}

/// 运行模式：跑全部题目，或只跑一道随机题目
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    All,
    One,
}

impl FromStr for RunMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(RunMode::All),
            "one" => Ok(RunMode::One),
            _ => Err(()),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 打分服务配置 ---
    /// 打分服务基础 URL
    pub api_base_url: String,
    /// 提交者用户名（未配置时拒绝提交）
    pub username: String,
    /// 代码所在 Space ID，用于拼接出处链接
    pub space_id: String,
    /// 题目拉取超时（秒）
    pub fetch_timeout_secs: u64,
    /// 提交答案超时（秒）
    pub submit_timeout_secs: u64,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 限流配置 ---
    /// 每分钟最大调用次数
    pub rpm_limit: usize,
    /// 每分钟最大 token 用量
    pub tpm_limit: u64,
    // --- 运行配置 ---
    pub agent_kind: AgentKind,
    pub run_mode: RunMode,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://agents-course-unit4-scoring.hf.space".to_string(),
            username: String::new(),
            space_id: String::new(),
            fetch_timeout_secs: 15,
            submit_timeout_secs: 60,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai"
                .to_string(),
            llm_model_name: "gemini-2.5-flash-preview-05-20".to_string(),
            rpm_limit: 15,
            tpm_limit: 1_000_000,
            agent_kind: AgentKind::Llm,
            run_mode: RunMode::All,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            username: std::env::var("HF_USERNAME").unwrap_or(default.username),
            space_id: std::env::var("SPACE_ID").unwrap_or(default.space_id),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fetch_timeout_secs),
            submit_timeout_secs: std::env::var("SUBMIT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_timeout_secs),
            llm_api_key: std::env::var("LLM_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY")).unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            rpm_limit: std::env::var("RPM_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.rpm_limit),
            tpm_limit: std::env::var("TPM_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.tpm_limit),
            agent_kind: std::env::var("AGENT_KIND").ok().and_then(|v| v.parse().ok()).unwrap_or(default.agent_kind),
            run_mode: std::env::var("RUN_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.run_mode),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 拼接代码出处链接（成绩归属核验用）
    pub fn agent_code_url(&self) -> String {
        format!("https://huggingface.co/spaces/{}/tree/main", self.space_id)
    }
}
