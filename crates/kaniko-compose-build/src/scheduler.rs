//! ビルドタスクのスケジューリング
//!
//! - 並列モード: 最大 W 個のタスクを同時に実行する。1つの失敗は他に影響しない
//! - 逐次モード: 導出順に1つずつ実行し、最初のビルド失敗で残りを打ち切る
//!
//! どちらのモードでもキャンセルトークンが発火すると新しいタスクは起動されず、
//! 実行中のタスクは自然に終了するまで待つ。

use crate::builder::ImageBuilder;
use crate::mirror::ImageMirror;
use crate::report::{AbortReason, RunReport};
use crate::runner::ProcessRunner;
use futures_util::stream::{self, StreamExt};
use kaniko_compose_core::{BuildTask, LogHandle, RunConfig, ScheduleMode, TaskOutcome, TaskStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

pub const NOT_STARTED_INTERRUPTED: &str = "interrupted";
pub const NOT_STARTED_FAIL_FAST: &str = "aborted after earlier build failure";

pub struct Scheduler {
    builder: ImageBuilder,
    mirror: ImageMirror,
    mode: ScheduleMode,
    workers: usize,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        config: &RunConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            builder: ImageBuilder::new(Arc::clone(&runner)),
            mirror: ImageMirror::new(runner),
            mode: config.mode,
            workers: config.workers.max(1),
            cancel,
        }
    }

    /// 全タスクを実行する。結果はタスクと同じ順序で返る
    #[instrument(skip_all, fields(tasks = tasks.len()))]
    pub async fn run(&self, tasks: Vec<BuildTask>, log: &LogHandle) -> RunReport {
        match self.mode {
            ScheduleMode::Concurrent => self.run_concurrent(tasks, log).await,
            ScheduleMode::Sequential => self.run_sequential(tasks, log).await,
        }
    }

    async fn run_concurrent(&self, tasks: Vec<BuildTask>, log: &LogHandle) -> RunReport {
        let engine = tasks
            .first()
            .map(|t| t.config.engine.binary())
            .unwrap_or_default();
        log.run_info(format!(
            "Starting build with max {} workers using {} engine...",
            self.workers, engine
        ));

        let mut results: Vec<(usize, TaskOutcome)> = stream::iter(tasks.into_iter().enumerate())
            .map(move |(index, task)| async move {
                // buffer_unordered に取り込まれた時点で判定する
                if self.cancel.is_cancelled() {
                    return (index, not_started(task, NOT_STARTED_INTERRUPTED));
                }
                (index, self.execute(&task, log).await)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);

        let outcomes: Vec<TaskOutcome> =
            results.into_iter().map(|(_, outcome)| outcome).collect();
        // 全タスクが起動済みなら、キャンセルされていても完走扱い
        let aborted = outcomes
            .iter()
            .any(TaskOutcome::is_not_started)
            .then_some(AbortReason::Interrupted);
        RunReport::new(outcomes, aborted)
    }

    async fn run_sequential(&self, tasks: Vec<BuildTask>, log: &LogHandle) -> RunReport {
        let engine = tasks
            .first()
            .map(|t| t.config.engine.binary())
            .unwrap_or_default();
        log.run_info(format!("Starting sequential build using {} engine...", engine));

        let total = tasks.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut aborted = None;
        let mut remaining = tasks.into_iter();

        for (index, task) in remaining.by_ref().enumerate() {
            if self.cancel.is_cancelled() {
                aborted = Some(AbortReason::Interrupted);
                outcomes.push(not_started(task, NOT_STARTED_INTERRUPTED));
                break;
            }

            let outcome = self.execute(&task, log).await;
            let failed = outcome.is_build_failed();
            outcomes.push(outcome);

            if failed {
                log.run_error(format!(
                    "Build failed for {}, aborting remaining {} task(s)",
                    task.service,
                    total - index - 1
                ));
                aborted = Some(AbortReason::FailFast);
                break;
            }
        }

        let reason = match aborted {
            Some(AbortReason::FailFast) => NOT_STARTED_FAIL_FAST,
            _ => NOT_STARTED_INTERRUPTED,
        };
        outcomes.extend(remaining.map(|task| not_started(task, reason)));

        RunReport::new(outcomes, aborted)
    }

    /// ビルドし、成功した場合のみミラーリングする
    async fn execute(&self, task: &BuildTask, log: &LogHandle) -> TaskOutcome {
        debug!(service = %task.service, "Task started");

        let status = match self.builder.build(task, log).await {
            Ok(()) => TaskStatus::Built {
                mirror_failures: self.mirror.mirror_all(task, log).await,
            },
            Err(failure) => TaskStatus::BuildFailed(failure),
        };

        TaskOutcome {
            service: task.service.clone(),
            image: Some(task.image.clone()),
            status,
        }
    }
}

fn not_started(task: BuildTask, reason: &str) -> TaskOutcome {
    TaskOutcome {
        service: task.service,
        image: Some(task.image),
        status: TaskStatus::NotStarted(reason.to_string()),
    }
}
