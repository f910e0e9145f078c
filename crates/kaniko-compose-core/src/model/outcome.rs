//! タスクの実行結果

use std::fmt;

/// ビルド失敗の詳細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    /// 終了コード（シグナル終了・起動失敗時は None）
    pub exit_code: Option<i32>,
    pub reason: String,
    /// 標準エラー出力の末尾
    pub stderr_tail: Vec<String>,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "{} (exit code {})", self.reason, code),
            None => f.write_str(&self.reason),
        }
    }
}

/// ミラーリング失敗（タスク自体は成功扱い）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFailure {
    pub mirror: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Built { mirror_failures: Vec<MirrorFailure> },
    BuildFailed(BuildFailure),
    Skipped(String),
    /// 中断または fail-fast により起動されなかった
    NotStarted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub service: String,
    pub image: Option<String>,
    pub status: TaskStatus,
}

impl TaskOutcome {
    pub fn built(service: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            image: Some(image.into()),
            status: TaskStatus::Built {
                mirror_failures: Vec::new(),
            },
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self.status, TaskStatus::Built { .. })
    }

    pub fn is_build_failed(&self) -> bool {
        matches!(self.status, TaskStatus::BuildFailed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, TaskStatus::Skipped(_))
    }

    pub fn is_not_started(&self) -> bool {
        matches!(self.status, TaskStatus::NotStarted(_))
    }

    pub fn mirror_failures(&self) -> &[MirrorFailure] {
        match &self.status {
            TaskStatus::Built { mirror_failures } => mirror_failures,
            _ => &[],
        }
    }
}
