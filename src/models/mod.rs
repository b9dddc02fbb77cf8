pub mod question;
pub mod submission;

pub use question::{AnswerResult, Question, ResultLogRow};
pub use submission::{AnswerPayload, SubmissionPayload, SubmissionResult, TaskFile};
