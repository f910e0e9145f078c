mod run;
mod summary;

use clap::Parser;
use colored::Colorize;
use kaniko_compose_build::{BuildError, EXIT_FAILED};
use kaniko_compose_config::ConfigError;
use kaniko_compose_core::config::{
    DEFAULT_NETWORK, DEFAULT_RETRY, DEFAULT_SKOPEO_IMAGE, DEFAULT_WORKERS,
};
use kaniko_compose_core::{ComposeError, Engine, SnapshotMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kaniko-compose")]
#[command(version)]
#[command(
    about = "Build every service of a compose file with kaniko and mirror the results with skopeo",
    long_about = None
)]
pub struct Cli {
    /// compose ファイルのパス（省略時はカレントディレクトリから探索）
    #[arg(short = 'f', long, env = "COMPOSE_FILE")]
    pub compose_file: Option<PathBuf>,

    /// コンテナエンジン (podman, docker)
    #[arg(long, default_value = "podman")]
    pub engine: Engine,

    /// 同時に実行するビルド数
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// 1つずつ順番にビルドし、最初の失敗で中断する
    #[arg(long)]
    pub sequential: bool,

    /// ビルドコンテナのネットワークモード
    #[arg(long, default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// ビルド後にレジストリへプッシュする
    #[arg(short = 'p', long, visible_alias = "deploy", short_alias = 'd')]
    pub push: bool,

    /// プッシュせずにビルドのみ行う（--push より優先）
    #[arg(long, visible_alias = "dry")]
    pub dry_run: bool,

    /// kaniko executor イメージ
    #[arg(long, env = "KANIKO_IMAGE")]
    pub kaniko_image: Option<String>,

    /// skopeo イメージ
    #[arg(long, default_value = DEFAULT_SKOPEO_IMAGE)]
    pub skopeo_image: String,

    /// kaniko --push-retry
    #[arg(long, default_value_t = DEFAULT_RETRY)]
    pub push_retry: u32,

    /// kaniko --image-fs-extract-retry
    #[arg(long, default_value_t = DEFAULT_RETRY)]
    pub extract_retry: u32,

    /// kaniko --image-download-retry
    #[arg(long, default_value_t = DEFAULT_RETRY)]
    pub download_retry: u32,

    /// kaniko --snapshot-mode (full, redo, time)
    #[arg(long, default_value = "full")]
    pub snapshot_mode: SnapshotMode,

    /// kaniko のレイヤーキャッシュを有効にする
    #[arg(long)]
    pub cache: bool,

    /// kaniko --cleanup を付けない
    #[arg(long)]
    pub no_cleanup: bool,

    /// kaniko --use-new-run を付けない
    #[arg(long)]
    pub no_use_new_run: bool,

    /// kaniko --single-snapshot を付けない
    #[arg(long)]
    pub no_single_snapshot: bool,

    /// kaniko のログにタイムスタンプを付ける
    #[arg(long)]
    pub log_timestamp: bool,

    /// レジストリ認証情報ディレクトリ（省略時は $DOCKER_CONFIG または ~/.docker）
    #[arg(long)]
    pub docker_config: Option<PathBuf>,

    /// ビルド対象のサービス（複数指定可。省略時は全サービス）
    #[arg(short, long = "service", value_name = "SERVICE")]
    pub services: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ログは stderr、サマリーは stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let code = match run::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "✗".red().bold(), user_message(&e));
            EXIT_FAILED
        }
    };
    std::process::exit(code);
}

fn user_message(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<ComposeError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<ConfigError>() {
        e.user_message()
    } else if let Some(e) = err.downcast_ref::<BuildError>() {
        e.user_message()
    } else {
        format!("{:#}", err)
    }
}
