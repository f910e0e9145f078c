//! サービス定義の読み取り
//!
//! スキーマを持たない YAML 値から、タスク導出に必要なフィールドだけを寛容に取り出す。

use serde_yaml::Value;

pub(crate) const DEFAULT_CONTEXT: &str = ".";
pub(crate) const DEFAULT_DOCKERFILE: &str = "Dockerfile";
pub(crate) const MIRRORS_KEY: &str = "x-mirrors";

/// 1サービス分の生の定義
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ServiceDefinition {
    pub image: ImageEntry,
    pub build: BuildSection,
    pub mirrors: Vec<Value>,
}

/// `image` の値
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ImageEntry {
    Missing,
    /// 文字列・数値以外
    Invalid,
    Present(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BuildSection {
    Missing,
    Invalid,
    Present(BuildConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BuildConfig {
    pub context: String,
    pub dockerfile: String,
    /// (名前, マニフェスト上の既定値)
    pub args: Vec<(String, String)>,
}

impl ServiceDefinition {
    /// サービス値を読み取る。空（null・空マップ・空文字列）の場合は None
    pub fn from_value(value: &Value) -> Option<Self> {
        if is_empty(value) {
            return None;
        }

        let image = match value.get("image") {
            None => ImageEntry::Missing,
            Some(v) if is_empty(v) => ImageEntry::Missing,
            Some(v @ (Value::String(_) | Value::Number(_))) => {
                ImageEntry::Present(scalar_to_string(v))
            }
            Some(_) => ImageEntry::Invalid,
        };

        let build = match value.get("build") {
            None => BuildSection::Missing,
            Some(v) if is_empty(v) => BuildSection::Missing,
            Some(v) => parse_build(v),
        };

        let mirrors = match value.get(MIRRORS_KEY) {
            Some(Value::Sequence(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(single) => vec![single.clone()],
        };

        Some(Self {
            image,
            build,
            mirrors,
        })
    }
}

fn parse_build(value: &Value) -> BuildSection {
    match value {
        // compose の短縮形: build: ./dir
        Value::String(context) => BuildSection::Present(BuildConfig {
            context: context.clone(),
            dockerfile: DEFAULT_DOCKERFILE.to_string(),
            args: Vec::new(),
        }),
        Value::Mapping(_) => {
            let context = value
                .get("context")
                .filter(|v| !is_empty(v))
                .map(scalar_to_string)
                .unwrap_or_else(|| DEFAULT_CONTEXT.to_string());
            let dockerfile = value
                .get("dockerfile")
                .filter(|v| !is_empty(v))
                .map(scalar_to_string)
                .unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string());
            let args = value.get("args").map(parse_args).unwrap_or_default();

            BuildSection::Present(BuildConfig {
                context,
                dockerfile,
                args,
            })
        }
        _ => BuildSection::Invalid,
    }
}

/// build.args はマップ形式とリスト形式（"KEY=value" / "KEY"）の両方を受け付ける
fn parse_args(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| (scalar_to_string(k), scalar_to_string(v)))
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .map(scalar_to_string)
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once('=') {
                Some((key, default)) => (key.to_string(), default.to_string()),
                None => (item, String::new()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// YAML 値をテキストに変換する
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Mapping(m) => m.is_empty(),
        Value::Sequence(s) => s.is_empty(),
        _ => false,
    }
}
