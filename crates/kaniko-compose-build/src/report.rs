//! 実行結果の集計

use kaniko_compose_core::{SkippedService, TaskOutcome, TaskStatus};
use std::collections::HashMap;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

/// 実行が途中で打ち切られた理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// 逐次モードで最初のビルド失敗
    FailFast,
    /// Ctrl-C による中断
    Interrupted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<TaskOutcome>,
    pub aborted: Option<AbortReason>,
}

impl RunReport {
    pub fn new(outcomes: Vec<TaskOutcome>, aborted: Option<AbortReason>) -> Self {
        Self { outcomes, aborted }
    }

    /// 導出時にスキップされたサービスを結果に加える
    pub fn add_skipped(&mut self, skipped: impl IntoIterator<Item = SkippedService>) {
        self.outcomes
            .extend(skipped.into_iter().map(|s| TaskOutcome {
                service: s.service,
                image: s.image,
                status: TaskStatus::Skipped(s.reason),
            }));
    }

    /// 結果をサービスの並び順に揃える（一覧に無いサービスは末尾）
    pub fn sort_by_service_order(&mut self, services: &[String]) {
        let position: HashMap<&str, usize> = services
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        self.outcomes.sort_by_key(|o| {
            position
                .get(o.service.as_str())
                .copied()
                .unwrap_or(usize::MAX)
        });
    }

    pub fn built(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_built()).count()
    }

    pub fn build_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_build_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// 失敗したミラーの総数
    pub fn mirror_failed(&self) -> usize {
        self.outcomes.iter().map(|o| o.mirror_failures().len()).sum()
    }

    pub fn not_started(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_not_started()).count()
    }

    pub fn is_interrupted(&self) -> bool {
        self.aborted == Some(AbortReason::Interrupted)
    }

    /// プロセスの終了ステータス
    ///
    /// 中断は 130、ビルド失敗または fail-fast は 1、それ以外は 0。
    /// ミラーリングの失敗は終了ステータスに影響しない。
    pub fn exit_code(&self) -> i32 {
        match self.aborted {
            Some(AbortReason::Interrupted) => EXIT_INTERRUPTED,
            Some(AbortReason::FailFast) => EXIT_FAILED,
            None if self.build_failed() > 0 => EXIT_FAILED,
            None => EXIT_OK,
        }
    }
}
