//! 外部コマンドの組み立て
//!
//! kaniko（ビルド）と skopeo（ミラーリング）をコンテナエンジン経由で起動する
//! コマンドラインを、タスクと実行設定だけから決定的に生成します。

use kaniko_compose_core::BuildTask;
use std::fmt;

/// kaniko コンテナ内のビルドコンテキストのマウント先
pub const WORKSPACE_MOUNT: &str = "/workspace";
/// kaniko が認証情報を読む場所
pub const KANIKO_DOCKER_CONFIG: &str = "/kaniko/.docker";
/// skopeo が認証情報を読む場所
pub const SKOPEO_DOCKER_CONFIG: &str = "/root/.docker";

/// 起動するプログラムと引数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 指定した引数の直後の値
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for Invocation {
    /// シェルに貼り付けて再実行できる形式
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// 必要な場合のみシングルクォートで囲む
fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

fn volume(host: impl fmt::Display, container: &str, read_only: bool) -> String {
    if read_only {
        format!("{}:{}:ro", host, container)
    } else {
        format!("{}:{}", host, container)
    }
}

/// kaniko によるビルドコマンド
pub fn build_invocation(task: &BuildTask) -> Invocation {
    let config = &task.config;

    let mut invocation = Invocation::new(config.engine.binary())
        .arg("run")
        .arg(format!("--network={}", config.network))
        .arg("--rm")
        .arg("-v")
        .arg(volume(task.context.display(), WORKSPACE_MOUNT, false))
        .arg("-v")
        .arg(volume(
            config.credentials_dir.display(),
            KANIKO_DOCKER_CONFIG,
            true,
        ))
        .arg(config.builder_image.as_str())
        .arg("--context")
        .arg(WORKSPACE_MOUNT)
        .arg("--dockerfile")
        .arg(format!("{}/{}", WORKSPACE_MOUNT, task.dockerfile))
        .arg(format!("--push-retry={}", config.push_retry))
        .arg(format!("--image-fs-extract-retry={}", config.extract_retry))
        .arg(format!("--image-download-retry={}", config.download_retry))
        .arg(format!("--snapshot-mode={}", config.snapshot_mode.as_str()));

    if config.use_new_run {
        invocation = invocation.arg("--use-new-run");
    }
    if config.log_timestamp {
        invocation = invocation.arg("--log-timestamp");
    }
    invocation = invocation.arg(format!("--cache={}", config.cache_enabled));
    if config.cleanup_enabled {
        invocation = invocation.arg("--cleanup");
    }
    if config.single_snapshot {
        invocation = invocation.arg("--single-snapshot");
    }

    invocation = if config.push_enabled() {
        invocation.arg("--destination").arg(task.image.as_str())
    } else {
        invocation.arg("--no-push")
    };

    for (key, value) in &task.build_args {
        invocation = invocation
            .arg("--build-arg")
            .arg(format!("{}={}", key, value));
    }

    invocation
}

/// skopeo によるミラーリングコマンド
pub fn mirror_invocation(task: &BuildTask, mirror: &str) -> Invocation {
    let config = &task.config;

    Invocation::new(config.engine.binary())
        .arg("run")
        .arg(format!("--network={}", config.network))
        .arg("--rm")
        .arg("-v")
        .arg(volume(
            config.credentials_dir.display(),
            SKOPEO_DOCKER_CONFIG,
            true,
        ))
        .arg(config.mirror_tool_image.as_str())
        .args(["copy", "--all"])
        .arg(format!("docker://{}", task.image))
        .arg(format!("docker://{}", mirror))
}
