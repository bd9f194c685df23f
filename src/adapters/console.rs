//! Line-mode console front-end.
//!
//! Prints the review prompt and reads one line per decision. Generic over
//! the reader and writer so tests can drive it with in-memory buffers.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::warn;

use crate::workflow::review::{ReviewPrompt, Reviewer};

/// Console reviewer over an arbitrary line source and sink.
pub struct ConsoleReviewer<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    retry_notice: AtomicBool,
}

impl ConsoleReviewer<BufReader<Stdin>, Stdout> {
    /// Reviewer bound to the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleReviewer<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Reviewer over `input` and `output`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            retry_notice: AtomicBool::new(false),
        }
    }

    /// Write `text` without a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub async fn print(&self, text: &str) -> anyhow::Result<()> {
        let mut out = self.output.lock().await;
        out.write_all(text.as_bytes())
            .await
            .context("failed to write to console")?;
        out.flush().await.context("failed to flush console")?;
        Ok(())
    }

    /// Show `prompt` and read one trimmed line.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or when the input is closed.
    pub async fn ask(&self, prompt: &str) -> anyhow::Result<String> {
        self.print(prompt).await?;
        let mut line = String::new();
        let read = self
            .input
            .lock()
            .await
            .read_line(&mut line)
            .await
            .context("failed to read from console")?;
        if read == 0 {
            anyhow::bail!("console input closed");
        }
        Ok(line.trim().to_owned())
    }

    /// Consume the reviewer, returning the writer (for inspecting test output).
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }
}

#[async_trait]
impl<R, W> Reviewer for ConsoleReviewer<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn review(&self, prompt: &ReviewPrompt) -> anyhow::Result<String> {
        let mut text = String::new();
        if self.retry_notice.swap(false, Ordering::Relaxed) {
            text.push_str("Please answer 'y' or 'n'.\n");
        } else {
            text.push_str("\n[Human Review Required]\n");
            text.push_str(&format!("Extracted email: {}\n", prompt.extracted));
            text.push_str(&format!("Validation result: {}\n", prompt.validation));
        }
        text.push_str(prompt.question());
        self.ask(&text).await
    }

    fn unrecognized(&self, response: &str) {
        warn!(response, "unrecognized review response");
        self.retry_notice.store(true, Ordering::Relaxed);
    }
}
