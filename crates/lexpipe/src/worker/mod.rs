pub mod job;
pub mod pool;

pub use job::{Job, JobOutcome};
pub use pool::{WorkerPool, SHUTDOWN_MESSAGE};
