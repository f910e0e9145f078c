pub mod error;

pub use error::*;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// compose ファイルの探索候補（優先順）
pub const COMPOSE_FILE_CANDIDATES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// 候補が1つも無い場合に使うファイル名
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

pub const ENV_FILE_NAME: &str = ".env";

/// compose ファイルのパスを決定する
///
/// 以下の優先順位:
/// 1. 明示的な指定（--compose-file / COMPOSE_FILE）
/// 2. `dir` 内の候補: docker-compose.yml, docker-compose.yaml, compose.yml, compose.yaml
/// 3. `dir/docker-compose.yml`（存在しなければ読み込み時に NotFound となる）
pub fn resolve_compose_file(explicit: Option<&Path>, dir: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    COMPOSE_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| dir.join(DEFAULT_COMPOSE_FILE))
}

/// カレントディレクトリを基準に compose ファイルを決定する
pub fn find_compose_file(explicit: Option<&Path>) -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    Ok(resolve_compose_file(explicit, &current_dir))
}

/// レジストリ認証情報ディレクトリ
///
/// `DOCKER_CONFIG` が設定されていればそれを、なければ `~/.docker` を使用。
pub fn docker_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("DOCKER_CONFIG").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::home_dir()
        .map(|home| home.join(".docker"))
        .ok_or(ConfigError::HomeDirNotFound)
}

/// .env ファイルを読み込む
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vars = parse_env(&content);
    info!(
        env_file = %path.display(),
        variable_count = vars.len(),
        "Loaded variables from .env file"
    );
    Ok(vars)
}

/// `dir/.env` があれば読み込む。無ければ空
pub fn load_dotenv(dir: &Path) -> Result<HashMap<String, String>> {
    let path = dir.join(ENV_FILE_NAME);
    if !path.exists() {
        debug!(path = %path.display(), "No .env file");
        return Ok(HashMap::new());
    }
    load_env_file(&path)
}

/// KEY=VALUE 形式の行を読み取る
///
/// 空行・`#` で始まる行・`=` を含まない行は無視する。`export ` 接頭辞は取り除く。
pub fn parse_env(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            debug!(line = %line, "Ignoring malformed .env line");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), strip_quotes(value.trim()).to_string());
    }

    vars
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}
