use crate::Cli;
use crate::summary;
use anyhow::Result;
use kaniko_compose_build::{EXIT_INTERRUPTED, EXIT_OK, RunReport, Scheduler, TokioRunner};
use kaniko_compose_config as config;
use kaniko_compose_core::config::DEFAULT_KANIKO_IMAGE;
use kaniko_compose_core::{
    ComposeError, Derivation, EnvVars, LogHandle, LogPump, RunConfig, ScheduleMode,
    SkippedService, TracingSink, derive_tasks, load_manifest, validate_destinations,
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const NOT_SELECTED: &str = "not selected";

/// 1回分の実行。終了ステータスを返す
pub async fn run(cli: Cli) -> Result<i32> {
    let compose_file = config::find_compose_file(cli.compose_file.as_deref())?;
    let manifest = load_manifest(&compose_file)?;

    let dotenv = config::load_dotenv(&manifest.base_dir())?;
    let credentials_dir = match &cli.docker_config {
        Some(dir) => dir.clone(),
        None => config::docker_config_dir()?,
    };
    let run_config = run_config(&cli, &dotenv, credentials_dir);
    run_config.validate()?;
    debug!(?run_config, "Run configuration");

    let env = EnvVars::from_process().with_fallback(dotenv);

    let (log, pump) = LogPump::spawn(TracingSink);
    log.run_info(format!(
        "kaniko-compose v{} ({})",
        env!("CARGO_PKG_VERSION"),
        compose_file.display()
    ));

    let result = execute(&cli, &manifest, Arc::new(run_config), &env, &log).await;
    // 残りのログを全て書き出してからサマリーを表示する
    pump.finish(log).await;

    let report = result?;
    summary::print(&report);
    Ok(report.exit_code())
}

async fn execute(
    cli: &Cli,
    manifest: &kaniko_compose_core::Manifest,
    run_config: Arc<RunConfig>,
    env: &EnvVars,
    log: &LogHandle,
) -> Result<RunReport> {
    let derivation = derive_tasks(manifest, Arc::clone(&run_config), env, log)?;
    validate_destinations(&derivation.claims, log)?;

    let Derivation {
        tasks,
        mut skipped,
        services,
        ..
    } = derivation;
    let (tasks, unselected) = select_services(tasks, &skipped, &cli.services)?;
    skipped.extend(unselected);

    if tasks.is_empty() {
        log.run_info("Nothing to do.");
        let mut report = RunReport::default();
        report.add_skipped(skipped);
        report.sort_by_service_order(&services);
        return Ok(report);
    }

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        let log = log.clone();
        tokio::spawn(async move {
            if watch_interrupts(tokio::signal::ctrl_c, cancel, log).await {
                warn!("Forced quit");
                std::process::exit(EXIT_INTERRUPTED);
            }
        })
    };

    let scheduler = Scheduler::new(Arc::new(TokioRunner::new()), &run_config, cancel);
    let mut report = scheduler.run(tasks, log).await;
    report.add_skipped(skipped);
    report.sort_by_service_order(&services);

    // ウォッチャーが持つ LogHandle を解放する
    watcher.abort();
    let _ = watcher.await;

    if report.exit_code() == EXIT_OK {
        log.run_info(format!("Finished: {} image(s) built", report.built()));
    } else {
        log.run_error(format!(
            "Finished with errors: {} built, {} failed, {} not started",
            report.built(),
            report.build_failed(),
            report.not_started()
        ));
    }
    Ok(report)
}

/// 1回目の割り込みで新規タスクの起動を止め、2回目が届いたら true を返す
async fn watch_interrupts<F, Fut>(
    mut next_signal: F,
    cancel: CancellationToken,
    log: LogHandle,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    log.run_warn(
        "Interrupted. Waiting for running builds to finish (press Ctrl-C again to force quit)...",
    );
    cancel.cancel();

    next_signal().await.is_ok()
}

fn run_config(cli: &Cli, dotenv: &HashMap<String, String>, credentials_dir: PathBuf) -> RunConfig {
    // --kaniko-image / KANIKO_IMAGE > .env の KANIKO_IMAGE > 既定値
    let builder_image = cli
        .kaniko_image
        .clone()
        .or_else(|| dotenv.get("KANIKO_IMAGE").cloned())
        .unwrap_or_else(|| DEFAULT_KANIKO_IMAGE.to_string());

    RunConfig {
        engine: cli.engine,
        workers: cli.workers,
        mode: if cli.sequential {
            ScheduleMode::Sequential
        } else {
            ScheduleMode::Concurrent
        },
        network: cli.network.clone(),
        push: cli.push,
        dry_run: cli.dry_run,
        builder_image,
        mirror_tool_image: cli.skopeo_image.clone(),
        push_retry: cli.push_retry,
        extract_retry: cli.extract_retry,
        download_retry: cli.download_retry,
        snapshot_mode: cli.snapshot_mode,
        cache_enabled: cli.cache,
        cleanup_enabled: !cli.no_cleanup,
        use_new_run: !cli.no_use_new_run,
        single_snapshot: !cli.no_single_snapshot,
        log_timestamp: cli.log_timestamp,
        credentials_dir,
    }
}

/// --service で指定されたタスクのみ残す。指定が無ければ全て
fn select_services(
    tasks: Vec<kaniko_compose_core::BuildTask>,
    skipped: &[SkippedService],
    selected: &[String],
) -> Result<(Vec<kaniko_compose_core::BuildTask>, Vec<SkippedService>)> {
    if selected.is_empty() {
        return Ok((tasks, Vec::new()));
    }

    let known: HashSet<&str> = tasks
        .iter()
        .map(|t| t.service.as_str())
        .chain(skipped.iter().map(|s| s.service.as_str()))
        .collect();
    if let Some(unknown) = selected.iter().find(|s| !known.contains(s.as_str())) {
        return Err(ComposeError::UnknownService(unknown.clone()).into());
    }

    let (tasks, unselected): (Vec<_>, Vec<_>) = tasks
        .into_iter()
        .partition(|t| selected.contains(&t.service));
    let unselected = unselected
        .into_iter()
        .map(|t| SkippedService {
            service: t.service,
            image: Some(t.image),
            reason: NOT_SELECTED.to_string(),
        })
        .collect();
    Ok((tasks, unselected))
}
