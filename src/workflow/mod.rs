pub mod batch_runner;

pub use batch_runner::{run_batch, BatchOutcome};
