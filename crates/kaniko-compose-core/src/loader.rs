//! マニフェストローダー
//!
//! compose ファイルを読み込み、汎用の YAML 値として返します。
//! スキーマの検証は行いません（タスク導出側の責務）。

use crate::error::{ComposeError, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// 読み込み済みのマニフェスト
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: Value,
}

impl Manifest {
    /// 文字列から直接マニフェストを作成（テスト・埋め込み用）
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if content.trim().is_empty() {
            return Ok(Self {
                path,
                document: Value::Null,
            });
        }
        let document = serde_yaml::from_str(content).map_err(|e| ComposeError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// 相対パス解決の基準ディレクトリ（マニフェストのあるディレクトリ）
    pub fn base_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// compose ファイルを読み込む
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        return Err(ComposeError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ComposeError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(bytes = content.len(), "Read compose file");

    let manifest = Manifest::parse(&content, path)?;
    info!("Successfully loaded compose file: {}", path.display());
    Ok(manifest)
}
