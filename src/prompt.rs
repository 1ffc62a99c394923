//! Interactive prompts raised by the controller
//!
//! Destructive operations ask for confirmation first, and the administrative
//! triggers report their outcome through a blocking alert. The host decides
//! how these reach the user.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks a yes/no question. Only an explicit yes confirms.
    async fn confirm(&self, message: &str) -> bool;

    /// Shows a message the user has to acknowledge.
    async fn alert(&self, message: &str);
}

/// Line-oriented stdin, shared between the command loop and the prompter
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl ConsoleInput {
    pub fn stdin() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// Next line of input, `None` once stdin is closed or unreadable
    pub async fn next_line(&self) -> Option<String> {
        line_or_end(self.lines.lock().await.next_line().await)
    }
}

fn line_or_end(read: std::io::Result<Option<String>>) -> Option<String> {
    match read {
        Ok(line) => line,
        Err(err) => {
            warn!(error = %err, "Cannot read from stdin, treating it as closed");
            None
        }
    }
}

/// [`Prompter`] that talks to the terminal
pub struct TerminalPrompter {
    input: ConsoleInput,
}

impl TerminalPrompter {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

/// Accepts `y` and `yes` in any case; everything else declines
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn print(text: &str) {
    let mut stdout = tokio::io::stdout();
    // A closed stdout leaves nothing to report to
    let _ = stdout.write_all(text.as_bytes()).await;
    let _ = stdout.flush().await;
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, message: &str) -> bool {
        print(&format!("{} [y/N] ", message)).await;
        match self.input.next_line().await {
            Some(answer) => is_affirmative(&answer),
            None => false,
        }
    }

    async fn alert(&self, message: &str) {
        print(&format!("!! {}\n", message)).await;
    }
}
