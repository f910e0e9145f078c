//! ビルド引数の上書きに使う環境変数スナップショット

use std::collections::HashMap;

/// 環境変数のスナップショット
///
/// プロセス環境変数を `.env` 由来の値の上に重ねたもの。
/// 導出処理はこのスナップショットだけを参照するため、同じ入力からは常に同じタスク列が得られる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: HashMap<String, String>,
}

impl EnvVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在のプロセス環境変数から作成
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// 未設定の変数のみを補完する（既存の値は上書きしない）
    pub fn with_fallback(mut self, fallback: HashMap<String, String>) -> Self {
        for (key, value) in fallback {
            self.vars.entry(key).or_insert(value);
        }
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
