pub mod combine;
pub mod config;
pub mod error;
pub mod log;
pub mod orchestrator;
pub mod task;
pub mod workflow;

pub use config::Config;
pub use error::{Error, Result, WorkflowError};
pub use orchestrator::Orchestrator;
pub use task::{Fault, Task};
