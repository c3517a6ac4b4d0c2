//! Line-based operator prompts

use async_trait::async_trait;
use chatlink_auth::{AuthError, AuthResult, LoginMode, Prompter, SecretString};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Prompter over stdin
pub type StdinPrompter = LinePrompter<BufReader<Stdin>>;

/// Prompter reading answers line by line; labels go to stderr.
#[derive(Debug)]
pub struct LinePrompter<R> {
    lines: Mutex<Lines<R>>,
}

impl StdinPrompter {
    /// Prompt on the process's stdin
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LinePrompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Read answers from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    async fn read_line(&self, label: &str) -> AuthResult<String> {
        eprint!("{label}: ");
        let _ = std::io::stderr().flush();

        match self.lines.lock().await.next_line().await {
            Ok(Some(line)) => Ok(line.trim().to_string()),
            Ok(None) => Err(AuthError::prompt("input closed")),
            Err(e) => Err(AuthError::prompt(e.to_string())),
        }
    }
}

/// Accepts a menu number or the mode name
fn parse_mode(answer: &str) -> Option<LoginMode> {
    let answer = answer.trim();
    if let Ok(index) = answer.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| LoginMode::ALL.get(i))
            .copied();
    }
    LoginMode::ALL
        .iter()
        .find(|mode| mode.to_string().eq_ignore_ascii_case(answer))
        .copied()
}

#[async_trait]
impl<R> Prompter for LinePrompter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn select_mode(&self) -> AuthResult<LoginMode> {
        loop {
            for (i, mode) in LoginMode::ALL.iter().enumerate() {
                eprintln!("  {}) {}", i + 1, mode);
            }
            let answer = self.read_line("Login with").await?;
            match parse_mode(&answer) {
                Some(mode) => return Ok(mode),
                None => eprintln!("'{answer}' is not one of the listed options"),
            }
        }
    }

    async fn input(&self, label: &str) -> AuthResult<String> {
        self.read_line(label).await
    }

    async fn secret(&self, label: &str) -> AuthResult<SecretString> {
        self.read_line(label).await.map(SecretString::new)
    }
}
