//! CLI channel: interactive terminal chat.
//!
//! Reads lines from stdin and writes replies to stdout. Any reader and writer
//! can stand in for the terminal, which is how the tests drive it.
//!
//! The terminal is read on a dedicated OS thread rather than a runtime task,
//! so a pending read never holds the process open after the session ends.

use async_trait::async_trait;
use parley_core::channel::{Channel, ChannelMessage};
use parley_core::error::ChannelError;
use std::io::BufRead;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

type Output = Box<dyn AsyncWrite + Unpin + Send>;
type Inbox = mpsc::Sender<Result<ChannelMessage, ChannelError>>;

enum Input {
    /// Read on a background thread with blocking I/O.
    Blocking(Box<dyn std::io::Read + Send>),
    /// Read on a runtime task.
    Async(Box<dyn AsyncRead + Unpin + Send>),
}

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    input: std::sync::Mutex<Option<Input>>,
    output: tokio::sync::Mutex<Output>,
}

impl CliChannel {
    pub fn new() -> Self {
        Self::with_blocking_io(std::io::stdin(), io::stdout())
    }

    /// Use `reader` for input and `writer` for output instead of the terminal.
    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::from_parts(Input::Async(Box::new(reader)), writer)
    }

    /// Like [`with_io`](Self::with_io), but `reader` is a blocking source
    /// read on its own thread.
    pub fn with_blocking_io<R, W>(reader: R, writer: W) -> Self
    where
        R: std::io::Read + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::from_parts(Input::Blocking(Box::new(reader)), writer)
    }

    fn from_parts<W>(input: Input, writer: W) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            input: std::sync::Mutex::new(Some(input)),
            output: tokio::sync::Mutex::new(Box::new(writer)),
        }
    }

    /// Write `text` without a trailing newline (e.g. `"You: "`).
    pub async fn prompt(&self, text: &str) -> Result<(), ChannelError> {
        let mut out = self.output.lock().await;
        out.write_all(text.as_bytes()).await.map_err(delivery_failed)?;
        out.flush().await.map_err(delivery_failed)
    }

    fn take_input(&self) -> Option<Input> {
        match self.input.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn delivery_failed(e: io::Error) -> ChannelError {
    ChannelError::DeliveryFailed {
        channel: "cli".into(),
        reason: e.to_string(),
    }
}

/// A message for a non-blank line, trimmed.
fn message(line: &str) -> Option<ChannelMessage> {
    let line = line.trim();
    (!line.is_empty()).then(|| ChannelMessage {
        channel: "cli".into(),
        content: line.to_string(),
    })
}

fn read_blocking(reader: Box<dyn std::io::Read + Send>, tx: Inbox) {
    for line in std::io::BufReader::new(reader).lines() {
        match line {
            Ok(line) => {
                let Some(msg) = message(&line) else { continue };
                if tx.blocking_send(Ok(msg)).is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(ChannelError::ConnectionLost(e.to_string())));
                return;
            }
        }
    }
    debug!("CLI input closed");
}

async fn read_async(reader: Box<dyn AsyncRead + Unpin + Send>, tx: Inbox) {
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(msg) = message(&line) else { continue };
                if tx.send(Ok(msg)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("CLI input closed");
                break;
            }
            Err(e) => {
                let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                break;
            }
        }
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    /// Yields one message per non-blank line, trimmed. The input can only be
    /// started once.
    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let input = self
            .take_input()
            .ok_or_else(|| ChannelError::NotConfigured("cli input already started".into()))?;
        let (tx, rx) = mpsc::channel(32);

        match input {
            Input::Blocking(reader) => {
                // Detached: the thread may stay parked in a read until exit.
                std::thread::Builder::new()
                    .name("parley-stdin".into())
                    .spawn(move || read_blocking(reader, tx))
                    .map_err(|e| ChannelError::ConnectionLost(format!("cannot read input: {e}")))?;
            }
            Input::Async(reader) => {
                tokio::spawn(read_async(reader, tx));
            }
        }

        Ok(rx)
    }

    async fn send(&self, content: &str) -> Result<(), ChannelError> {
        let mut out = self.output.lock().await;
        out.write_all(content.as_bytes()).await.map_err(delivery_failed)?;
        out.write_all(b"\n").await.map_err(delivery_failed)?;
        out.flush().await.map_err(delivery_failed)
    }
}
