//! ログシンク
//!
//! 全てのコンポーネントは `LogHandle` 経由でログ行を送信し、
//! 単一のポンプタスクがシンクを排他的に所有して書き出します。
//! これにより並行実行中の複数タスクの出力が行の途中で混ざることはありません。

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// 外部プロセスの出力ストリーム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// 1行分のログ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    /// 発生元サービス（実行全体に関する行は None）
    pub service: Option<String>,
    /// 外部プロセス出力の場合のみ設定される
    pub stream: Option<LogStream>,
    pub message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, service: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level,
            service: service.map(str::to_string),
            stream: None,
            message: message.into(),
        }
    }

    /// 外部プロセスの出力行
    pub fn output(service: &str, stream: LogStream, message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            service: Some(service.to_string()),
            stream: Some(stream),
            message: message.into(),
        }
    }
}

/// ログ行の書き出し先
pub trait LogSink: Send + 'static {
    fn write(&mut self, line: &LogLine);
}

/// tracing へ転送するシンク
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&mut self, line: &LogLine) {
        let service = line.service.as_deref().unwrap_or("-");
        match (line.level, line.stream) {
            (_, Some(stream)) => {
                tracing::info!(service, stream = stream.as_str(), "[{}] {}", service, line.message)
            }
            (LogLevel::Info, None) => tracing::info!(service, "{}", line.message),
            (LogLevel::Warn, None) => tracing::warn!(service, "{}", line.message),
            (LogLevel::Error, None) => tracing::error!(service, "{}", line.message),
        }
    }
}

/// メモリに蓄積するシンク（テスト・サマリー用）
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// 指定サービス・ストリームのメッセージのみを取り出す
    pub fn messages_for(&self, service: &str, stream: Option<LogStream>) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.service.as_deref() == Some(service) && l.stream == stream)
            .map(|l| l.message)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, line: &LogLine) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.clone());
        }
    }
}

/// ログ送信ハンドル（複製してワーカーやストリームリーダーへ渡す）
#[derive(Debug, Clone)]
pub struct LogHandle {
    tx: mpsc::UnboundedSender<LogLine>,
}

impl LogHandle {
    /// ハンドルと受信側を作成（ポンプを使わずに直接受け取る場合）
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LogLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, line: LogLine) {
        // ポンプ終了後の送信は破棄する
        let _ = self.tx.send(line);
    }

    pub fn info(&self, service: &str, message: impl Into<String>) {
        self.emit(LogLine::new(LogLevel::Info, Some(service), message));
    }

    pub fn warn(&self, service: &str, message: impl Into<String>) {
        self.emit(LogLine::new(LogLevel::Warn, Some(service), message));
    }

    pub fn error(&self, service: &str, message: impl Into<String>) {
        self.emit(LogLine::new(LogLevel::Error, Some(service), message));
    }

    /// 特定サービスに紐付かない行
    pub fn run_info(&self, message: impl Into<String>) {
        self.emit(LogLine::new(LogLevel::Info, None, message));
    }

    pub fn run_warn(&self, message: impl Into<String>) {
        self.emit(LogLine::new(LogLevel::Warn, None, message));
    }

    pub fn run_error(&self, message: impl Into<String>) {
        self.emit(LogLine::new(LogLevel::Error, None, message));
    }

    pub fn output(&self, service: &str, stream: LogStream, message: impl Into<String>) {
        self.emit(LogLine::output(service, stream, message));
    }
}

/// シンクを排他的に所有してログ行を書き出すタスク
pub struct LogPump<S: LogSink> {
    task: JoinHandle<S>,
}

impl<S: LogSink> LogPump<S> {
    /// ポンプタスクを起動する（tokio ランタイム内で呼ぶこと）
    pub fn spawn(mut sink: S) -> (LogHandle, Self) {
        let (handle, mut rx) = LogHandle::channel();
        let task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                sink.write(&line);
            }
            sink
        });
        (handle, Self { task })
    }

    /// 残りの行を書き出してシンクを返す
    ///
    /// 渡したハンドル以外の複製が全て破棄されている必要がある。
    pub async fn finish(self, handle: LogHandle) -> Option<S> {
        drop(handle);
        self.task.await.ok()
    }
}
