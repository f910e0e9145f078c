//! データモデル
//!
//! マニフェストから導出されるビルドタスクと、その実行結果。

mod outcome;
mod task;

pub use outcome::{BuildFailure, MirrorFailure, TaskOutcome, TaskStatus};
pub use task::{BuildTask, ImageClaim, SkippedService};
