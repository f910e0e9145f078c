//! kaniko-compose core
//!
//! compose マニフェストの読み込み、ビルドタスクの導出、宛先イメージの検証、
//! および実行全体で共有される設定・ログシンクを提供します。

pub mod config;
pub mod deriver;
pub mod env;
pub mod error;
pub mod loader;
pub mod log;
pub mod model;
pub mod validator;

pub use config::{Engine, RunConfig, ScheduleMode, SnapshotMode};
pub use deriver::{Derivation, TaskDeriver, derive_tasks};
pub use env::EnvVars;
pub use error::{ComposeError, DuplicateImage, Result};
pub use loader::{Manifest, load_manifest};
pub use log::{LogHandle, LogLevel, LogLine, LogPump, LogSink, LogStream, MemorySink, TracingSink};
pub use model::{
    BuildFailure, BuildTask, ImageClaim, MirrorFailure, SkippedService, TaskOutcome, TaskStatus,
};
pub use validator::{find_duplicates, validate_destinations};
