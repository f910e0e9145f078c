#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// 偽のコンテナエンジン
///
/// 受け取った引数を1行ずつ `FAKE_ENGINE_LOG` に追記し、
/// 引数に `FAKE_ENGINE_FAIL` が含まれていれば終了コード1で失敗する。
#[allow(dead_code)]
const FAKE_ENGINE: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_ENGINE_LOG"
if [ -n "$FAKE_ENGINE_FAIL" ]; then
  case "$*" in
    *"$FAKE_ENGINE_FAIL"*)
      echo "error: simulated failure" >&2
      exit 1
      ;;
  esac
fi
echo "INFO step done"
exit 0
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_compose(&self, content: &str) {
        fs::write(self.root.path().join("docker-compose.yml"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, content: &str) {
        fs::write(self.root.path().join(name), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    fn bin_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    /// 偽エンジンが受け取った呼び出し（1行1呼び出し）
    #[allow(dead_code)]
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.root.path().join("engine.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// `podman` と `docker` の偽物を PATH の先頭に置く
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn install_fake_engine(&self) {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.bin_dir();
        fs::create_dir_all(&bin).unwrap();
        for name in ["podman", "docker"] {
            let path = bin.join(name);
            fs::write(&path, FAKE_ENGINE).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    /// プロジェクトディレクトリで実行するコマンド
    pub fn command(&self) -> Command {
        let path = format!(
            "{}:{}",
            self.bin_dir().display(),
            std::env::var("PATH").unwrap_or_default()
        );

        let mut cmd = Command::cargo_bin("kaniko-compose").unwrap();
        cmd.current_dir(self.path())
            .env("PATH", path)
            .env("NO_COLOR", "1")
            .env("RUST_LOG", "info")
            .env("FAKE_ENGINE_LOG", self.root.path().join("engine.log"))
            .env_remove("FAKE_ENGINE_FAIL")
            .env_remove("COMPOSE_FILE")
            .env_remove("KANIKO_IMAGE")
            .arg("--docker-config")
            .arg(self.root.path().join(".docker"));
        cmd
    }
}
