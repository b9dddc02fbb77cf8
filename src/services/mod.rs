pub mod agent_service;
pub mod quota_tracker;

pub use agent_service::{extract_final_answer, Agent, FixedAnswerAgent, LlmAgent};
pub use quota_tracker::QuotaTracker;
