//! Command channel: the write-then-wait protocol spoken over the engine pipes.
//!
//! The engine never acknowledges a command, so `send` pauses for a settle
//! delay after each write instead of reading a reply. Only `query` reads: it
//! discards stale output, then collects whatever shows up within a short
//! quiet window.
//! One caller per channel; nothing here serialises concurrent senders.

use std::time::Duration;

use serde::Serialize;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    process::{ChildStdin, ChildStdout},
    time,
};
use tracing::{debug, warn};

use crate::{error::Result, history::HistoryLog};

/// Pause applied after each command: `base` plus `per_kb` for every started
/// kilobyte of command text. A zero `per_kb` gives a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettleDelay {
    pub base: Duration,
    pub per_kb: Duration,
}

impl SettleDelay {
    pub const fn fixed(base: Duration) -> Self {
        Self {
            base,
            per_kb: Duration::ZERO,
        }
    }

    pub fn for_len(&self, len: usize) -> Duration {
        let kb = len.div_ceil(1024) as u32;
        self.base + self.per_kb * kb
    }
}

impl Default for SettleDelay {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(20))
    }
}

pub struct CommandChannel {
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    history: HistoryLog,
    delay: SettleDelay,
    query_window: Duration,
}

impl CommandChannel {
    pub fn new(
        stdin: ChildStdin,
        stdout: ChildStdout,
        history: HistoryLog,
        delay: SettleDelay,
        query_window: Duration,
    ) -> Self {
        Self {
            stdin: Some(stdin),
            stdout: Some(stdout),
            history,
            delay,
            query_window,
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Send with the default settle delay for this command's length.
    pub async fn send(&mut self, command: &str) -> Result<()> {
        let delay = self.delay.for_len(command.len());
        self.send_with_delay(command, delay).await
    }

    /// Write `command` plus a newline, log it, then sleep for `delay`.
    /// Never reads engine output. A no-op once the input pipe is closed.
    pub async fn send_with_delay(&mut self, command: &str, delay: Duration) -> Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Ok(());
        };
        debug!(command, "send");
        let mut line = String::with_capacity(command.len() + 1);
        line.push_str(command);
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        self.history.record(command);
        if !delay.is_zero() {
            time::sleep(delay).await;
        }
        Ok(())
    }

    /// Send `command`, then return what the engine printed in response: stdout
    /// output until it goes quiet for one query window (or closes the pipe).
    /// Output left over from earlier sends is discarded before the write.
    pub async fn query(&mut self, command: &str) -> Result<String> {
        let stale = self.read_available(Duration::ZERO).await?;
        if !stale.is_empty() {
            debug!(bytes = stale.len(), "discarded output ahead of query");
        }

        self.send(command).await?;
        let out = self.read_available(self.query_window).await?;
        let reply = String::from_utf8_lossy(&out).into_owned();
        debug!(command, reply = %reply.trim_end(), "query");
        Ok(reply)
    }

    /// Read stdout until no byte arrives within `window` or the pipe closes.
    /// A zero window collects only what is already buffered.
    async fn read_available(&mut self, window: Duration) -> Result<Vec<u8>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match time::timeout(window, stdout.read(&mut buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => out.extend_from_slice(&buf[..n]),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => break,
            }
        }
        Ok(out)
    }

    pub async fn set(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("set {}", arg)).await
    }

    pub async fn unset(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("unset {}", arg)).await
    }

    pub async fn plot(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("plot {}", arg)).await
    }

    pub async fn splot(&mut self, arg: &str) -> Result<()> {
        self.send(&format!("splot {}", arg)).await
    }

    /// Close stdin, stdout and the history log. Each step runs regardless of
    /// the others; calling this twice is harmless.
    pub fn close(&mut self) {
        if let Some(stdin) = self.stdin.take() {
            drop(stdin);
            debug!("engine stdin closed");
        }
        if let Some(stdout) = self.stdout.take() {
            drop(stdout);
            debug!("engine stdout closed");
        }
        self.history.close();
    }

    pub fn is_closed(&self) -> bool {
        self.stdin.is_none()
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        if !self.is_closed() {
            warn!("command channel dropped without close");
        }
        self.close();
    }
}
