//! ビルドタスク定義

use crate::config::RunConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// 1サービス分の解決済みビルドタスク
///
/// 作成後は変更されず、ちょうど1つのワーカーに渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    pub service: String,
    /// 絶対パスに解決されたビルドコンテキスト
    pub context: PathBuf,
    /// コンテキストからの相対パス
    pub dockerfile: String,
    /// 宛先イメージ（常に空でない）
    pub image: String,
    /// 環境変数で上書き済みのビルド引数（マニフェスト順）
    pub build_args: Vec<(String, String)>,
    pub mirrors: Vec<String>,
    pub config: Arc<RunConfig>,
}

impl BuildTask {
    /// プッシュ後にミラーリングが必要か
    pub fn needs_mirroring(&self) -> bool {
        self.config.push_enabled() && !self.mirrors.is_empty()
    }
}

/// サービスによる宛先イメージの宣言
///
/// build セクションが無くスキップされるサービスも含む（重複検出用）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageClaim {
    pub service: String,
    pub image: String,
}

/// 導出時にスキップされたサービス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedService {
    pub service: String,
    pub image: Option<String>,
    pub reason: String,
}
