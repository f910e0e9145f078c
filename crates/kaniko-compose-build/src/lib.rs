//! kaniko-compose build execution
//!
//! Runs kaniko builds and skopeo mirror copies through a container engine,
//! streams their output to the log sink, and schedules tasks either through a
//! bounded worker pool or one at a time with fail-fast.

pub mod builder;
pub mod command;
pub mod error;
pub mod mirror;
pub mod report;
pub mod runner;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::ImageBuilder;
pub use command::{Invocation, build_invocation, mirror_invocation};
pub use error::{BuildError, Result};
pub use mirror::ImageMirror;
pub use report::{AbortReason, EXIT_FAILED, EXIT_INTERRUPTED, EXIT_OK, RunReport};
pub use runner::{ExitReport, ProcessRunner, STDERR_TAIL_LINES, TokioRunner};
pub use scheduler::Scheduler;
