//! 外部プロセスの実行
//!
//! stdout / stderr それぞれに専用のリーダータスクを割り当て、
//! 各行をサービス名付きで即座にログシンクへ送ります。

use crate::command::Invocation;
use crate::error::{BuildError, Result};
use async_trait::async_trait;
use kaniko_compose_core::{LogHandle, LogStream};
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// 失敗時に保持する stderr の行数
pub const STDERR_TAIL_LINES: usize = 20;

/// プロセスの終了結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitReport {
    /// シグナルで終了した場合は None
    pub code: Option<i32>,
    pub stderr_tail: Vec<String>,
}

impl ExitReport {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            stderr_tail: Vec::new(),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            code: Some(code),
            stderr_tail: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// 外部プロセスを起動して終了を待つ
///
/// 出力行は `log` へ送られる。起動できなかった場合のみ Err を返す。
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation, service: &str, log: &LogHandle)
    -> Result<ExitReport>;
}

/// tokio::process による実装
#[derive(Debug, Clone, Default)]
pub struct TokioRunner;

impl TokioRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        service: &str,
        log: &LogHandle,
    ) -> Result<ExitReport> {
        debug!(service = %service, program = %invocation.program, "Spawning process");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::Spawn {
                program: invocation.program.clone(),
                message: e.to_string(),
            })?;

        let stdout = child.stdout.take().map(|out| {
            tokio::spawn(relay_lines(
                out,
                service.to_string(),
                LogStream::Stdout,
                log.clone(),
                0,
            ))
        });
        let stderr = child.stderr.take().map(|err| {
            tokio::spawn(relay_lines(
                err,
                service.to_string(),
                LogStream::Stderr,
                log.clone(),
                STDERR_TAIL_LINES,
            ))
        });

        let status = child.wait().await?;

        // 両方のリーダーが読み終えるまで待つ
        if let Some(reader) = stdout {
            let _ = reader.await;
        }
        let stderr_tail = match stderr {
            Some(reader) => reader.await.unwrap_or_default(),
            None => Vec::new(),
        };

        debug!(service = %service, status = %status, "Process exited");
        Ok(ExitReport {
            code: status.code(),
            stderr_tail,
        })
    }
}

/// 1行ずつ読み取ってログへ送り、末尾 `keep` 行を返す
async fn relay_lines<R>(
    reader: R,
    service: String,
    stream: LogStream,
    log: LogHandle,
    keep: usize,
) -> Vec<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut tail = VecDeque::with_capacity(keep);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                log.output(&service, stream, line);

                if keep > 0 {
                    if tail.len() == keep {
                        tail.pop_front();
                    }
                    tail.push_back(line.to_string());
                }
            }
            Err(e) => {
                debug!(service = %service, stream = stream.as_str(), error = %e, "Stream read failed");
                break;
            }
        }
    }

    tail.into()
}
