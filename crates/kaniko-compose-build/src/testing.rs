//! テスト用の ProcessRunner

use crate::command::Invocation;
use crate::error::{BuildError, Result};
use crate::runner::{ExitReport, ProcessRunner};
use async_trait::async_trait;
use kaniko_compose_core::{LogHandle, LogStream};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type Script = Box<dyn Fn(&Invocation) -> Option<ExitReport> + Send + Sync>;

/// 呼び出しを記録し、スクリプトに従って終了結果を返す
///
/// スクリプトが None を返した場合は起動失敗として扱う。
pub struct ScriptedRunner {
    script: Script,
    delay: Duration,
    calls: Mutex<Vec<(String, Invocation)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(script: impl Fn(&Invocation) -> Option<ExitReport> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// 全ての呼び出しが成功する
    pub fn succeeding() -> Self {
        Self::new(|_| Some(ExitReport::success()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// (サービス, 呼び出し) を呼び出し順に返す
    pub fn calls(&self) -> Vec<(String, Invocation)> {
        self.calls.lock().unwrap().clone()
    }

    /// 同時に実行中だった呼び出しの最大数
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn services_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|(service, _)| service).collect()
    }

    /// kaniko の呼び出しのみ
    pub fn build_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .map(|(_, inv)| inv)
            .filter(|inv| inv.has_arg("--context"))
            .collect()
    }

    /// skopeo の呼び出しのみ
    pub fn mirror_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .map(|(_, inv)| inv)
            .filter(|inv| inv.has_arg("copy"))
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        service: &str,
        log: &LogHandle,
    ) -> Result<ExitReport> {
        self.calls
            .lock()
            .unwrap()
            .push((service.to_string(), invocation.clone()));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match (self.script)(invocation) {
            Some(report) => {
                for line in &report.stderr_tail {
                    log.output(service, LogStream::Stderr, line.as_str());
                }
                Ok(report)
            }
            None => Err(BuildError::Spawn {
                program: invocation.program.clone(),
                message: "No such file or directory (os error 2)".to_string(),
            }),
        }
    }
}
