//! skopeo によるミラーリング
//!
//! ビルド済みイメージを追加のレジストリへコピーする。
//! 個々のミラーの失敗はタスクの成否に影響しない。

use crate::command::mirror_invocation;
use crate::runner::ProcessRunner;
use kaniko_compose_core::{BuildTask, LogHandle, MirrorFailure};
use std::sync::Arc;

#[derive(Clone)]
pub struct ImageMirror {
    runner: Arc<dyn ProcessRunner>,
}

impl ImageMirror {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// 全てのミラーへ順番にコピーし、失敗したものを返す
    pub async fn mirror_all(&self, task: &BuildTask, log: &LogHandle) -> Vec<MirrorFailure> {
        if !task.needs_mirroring() {
            return Vec::new();
        }

        log.info(
            &task.service,
            format!(
                "Build successful. Mirroring to {} destinations...",
                task.mirrors.len()
            ),
        );

        let mut failures = Vec::new();
        for mirror in &task.mirrors {
            if let Err(reason) = self.mirror_one(task, mirror, log).await {
                log.error(
                    &task.service,
                    format!(
                        "Failed to mirror {} to {}: {}",
                        task.image, mirror, reason
                    ),
                );
                failures.push(MirrorFailure {
                    mirror: mirror.clone(),
                    reason,
                });
            } else {
                log.info(&task.service, format!("Successfully mirrored to {}", mirror));
            }
        }
        failures
    }

    async fn mirror_one(
        &self,
        task: &BuildTask,
        mirror: &str,
        log: &LogHandle,
    ) -> std::result::Result<(), String> {
        let invocation = mirror_invocation(task, mirror);
        log.info(&task.service, format!("Executing: {}", invocation));

        match self.runner.run(&invocation, &task.service, log).await {
            Ok(report) if report.is_success() => Ok(()),
            Ok(report) => Err(match report.code {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            }),
            Err(e) => Err(e.to_string()),
        }
    }
}
