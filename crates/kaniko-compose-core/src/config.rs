//! 実行設定
//!
//! CLI や環境変数から組み立てられ、一度だけ検証される不変の設定。
//! 全てのビルドタスクが `Arc<RunConfig>` として共有します。

use crate::error::{ComposeError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_NETWORK: &str = "host";
pub const DEFAULT_KANIKO_IMAGE: &str = "gcr.io/kaniko-project/executor:latest";
pub const DEFAULT_SKOPEO_IMAGE: &str = "quay.io/skopeo/skopeo:latest";
pub const DEFAULT_RETRY: u32 = 7;

/// コンテナエンジン
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Engine {
    #[default]
    Podman,
    Docker,
}

impl Engine {
    /// 実行するバイナリ名
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Podman => "podman",
            Self::Docker => "docker",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

impl FromStr for Engine {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "podman" => Ok(Self::Podman),
            "docker" => Ok(Self::Docker),
            other => Err(ComposeError::InvalidConfig(format!(
                "unknown engine '{}' (expected podman or docker)",
                other
            ))),
        }
    }
}

/// kaniko の --snapshot-mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotMode {
    #[default]
    Full,
    Redo,
    Time,
}

impl SnapshotMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Redo => "redo",
            Self::Time => "time",
        }
    }
}

impl FromStr for SnapshotMode {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "redo" => Ok(Self::Redo),
            "time" => Ok(Self::Time),
            other => Err(ComposeError::InvalidConfig(format!(
                "unknown snapshot mode '{}' (expected full, redo or time)",
                other
            ))),
        }
    }
}

/// スケジューリング方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScheduleMode {
    /// ワーカープールで並列実行
    #[default]
    Concurrent,
    /// マニフェスト順に1つずつ実行し、最初のビルド失敗で中断
    Sequential,
}

/// 1回の実行全体で共有される設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub engine: Engine,
    pub workers: usize,
    pub mode: ScheduleMode,
    pub network: String,
    pub push: bool,
    pub dry_run: bool,
    pub builder_image: String,
    pub mirror_tool_image: String,
    pub push_retry: u32,
    pub extract_retry: u32,
    pub download_retry: u32,
    pub snapshot_mode: SnapshotMode,
    pub cache_enabled: bool,
    pub cleanup_enabled: bool,
    pub use_new_run: bool,
    pub single_snapshot: bool,
    pub log_timestamp: bool,
    /// レジストリ認証情報ディレクトリ（読み取り専用でマウント）
    pub credentials_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            workers: DEFAULT_WORKERS,
            mode: ScheduleMode::default(),
            network: DEFAULT_NETWORK.to_string(),
            push: false,
            dry_run: false,
            builder_image: DEFAULT_KANIKO_IMAGE.to_string(),
            mirror_tool_image: DEFAULT_SKOPEO_IMAGE.to_string(),
            push_retry: DEFAULT_RETRY,
            extract_retry: DEFAULT_RETRY,
            download_retry: DEFAULT_RETRY,
            snapshot_mode: SnapshotMode::default(),
            cache_enabled: false,
            cleanup_enabled: true,
            use_new_run: true,
            single_snapshot: true,
            log_timestamp: false,
            credentials_dir: PathBuf::from(".docker"),
        }
    }
}

impl RunConfig {
    /// レジストリへプッシュするか
    ///
    /// dry-run は --push より優先される。
    pub fn push_enabled(&self) -> bool {
        self.push && !self.dry_run
    }

    /// 設定値の検証
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ComposeError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.network.trim().is_empty() {
            return Err(ComposeError::InvalidConfig(
                "network mode must not be empty".to_string(),
            ));
        }
        if self.builder_image.trim().is_empty() {
            return Err(ComposeError::InvalidConfig(
                "builder image must not be empty".to_string(),
            ));
        }
        if self.mirror_tool_image.trim().is_empty() {
            return Err(ComposeError::InvalidConfig(
                "mirror tool image must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine, Engine::Podman);
        assert_eq!(config.workers, 4);
        assert!(config.cleanup_enabled);
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = RunConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ComposeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_builder_image_rejected() {
        let config = RunConfig {
            builder_image: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_push_enabled() {
        let mut config = RunConfig::default();
        assert!(!config.push_enabled());

        config.push = true;
        assert!(config.push_enabled());

        // dry-run はプッシュを抑止する
        config.dry_run = true;
        assert!(!config.push_enabled());
    }

    #[test]
    fn test_parse_engine() {
        assert_eq!("docker".parse::<Engine>().unwrap(), Engine::Docker);
        assert_eq!("Podman".parse::<Engine>().unwrap(), Engine::Podman);
        assert!("containerd".parse::<Engine>().is_err());
    }

    #[test]
    fn test_parse_snapshot_mode() {
        assert_eq!("redo".parse::<SnapshotMode>().unwrap(), SnapshotMode::Redo);
        assert_eq!(SnapshotMode::Time.as_str(), "time");
        assert!("partial".parse::<SnapshotMode>().is_err());
    }
}
