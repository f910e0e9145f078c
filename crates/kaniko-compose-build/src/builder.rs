//! kaniko によるイメージビルド

use crate::command::build_invocation;
use crate::runner::ProcessRunner;
use kaniko_compose_core::{BuildFailure, BuildTask, LogHandle};
use std::sync::Arc;
use tracing::debug;

/// 1タスク分のビルドを実行する
#[derive(Clone)]
pub struct ImageBuilder {
    runner: Arc<dyn ProcessRunner>,
}

impl ImageBuilder {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// ビルドを実行する。起動失敗・非ゼロ終了・シグナル終了は全て BuildFailure
    pub async fn build(
        &self,
        task: &BuildTask,
        log: &LogHandle,
    ) -> std::result::Result<(), BuildFailure> {
        let invocation = build_invocation(task);
        log.info(&task.service, format!("Executing: {}", invocation));
        debug!(service = %task.service, image = %task.image, "Starting kaniko build");

        let report = match self.runner.run(&invocation, &task.service, log).await {
            Ok(report) => report,
            Err(e) => {
                log.error(&task.service, format!("Build could not start: {}", e));
                return Err(BuildFailure {
                    exit_code: None,
                    reason: e.to_string(),
                    stderr_tail: Vec::new(),
                });
            }
        };

        if report.is_success() {
            log.info(&task.service, format!("Successfully built {}", task.image));
            return Ok(());
        }

        let failure = BuildFailure {
            exit_code: report.code,
            reason: match report.code {
                Some(_) => "kaniko build failed".to_string(),
                None => "kaniko build terminated by signal".to_string(),
            },
            stderr_tail: report.stderr_tail,
        };
        log.error(&task.service, format!("Build failed: {}", failure));
        Err(failure)
    }
}
