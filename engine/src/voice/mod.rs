//! Voice adapters
//!
//! Text-mode stand-ins for speech recognition and synthesis:
//!
//! - `ConsoleInput` reads one utterance per line (blank line = silence)
//! - `ConsoleOutput` prints replies
//! - `CommandSpeaker` prints, then pipes the reply into an external TTS
//!   program such as `espeak-ng -v mr`

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::voice::{Utterance, VoiceInput, VoiceOutput};
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::process::Command;

/// Line-based utterance source
pub struct ConsoleInput<R> {
    reader: R,
    prompt: Option<String>,
}

impl ConsoleInput<BufReader<Stdin>> {
    /// Read from the process's standard input, prompting before each line
    pub fn stdin() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            prompt: Some("\nबोला > ".to_string()),
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> ConsoleInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> VoiceInput for ConsoleInput<R> {
    async fn listen(&mut self) -> Result<Utterance, EngineError> {
        if let Some(prompt) = &self.prompt {
            print!("{}", prompt);
            std::io::stdout().flush()?;
        }

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(EngineError::InputClosed);
        }

        let utterance = Utterance::from_text(line);
        if let Utterance::Text(text) = &utterance {
            tracing::debug!(component = "voice", "Heard: {}", text);
        }
        Ok(utterance)
    }
}

/// Prints replies to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }

    fn print(&self, text: &str) {
        println!("\n🔊 {}", text);
    }
}

#[async_trait]
impl VoiceOutput for ConsoleOutput {
    async fn speak(&self, text: &str) -> Result<(), EngineError> {
        self.print(text);
        Ok(())
    }
}

/// Prints replies, then speaks them through an external TTS program.
///
/// The reply is written to the program's stdin. A failing or slow program
/// only costs the audio; the printed text is always there.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    console: ConsoleOutput,
}

impl CommandSpeaker {
    /// Build from a whitespace-separated command line (no shell involved).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the command line is empty.
    pub fn from_command_line(command_line: &str, timeout: Duration) -> Result<Self, EngineError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| EngineError::Config("tts_command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
            console: ConsoleOutput::new(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn synthesize(&self, text: &str) -> Result<(), EngineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Voice(format!("Failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                EngineError::Voice(format!(
                    "{} timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })??;

        if output.status.success() {
            Ok(())
        } else {
            Err(EngineError::Voice(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

#[async_trait]
impl VoiceOutput for CommandSpeaker {
    async fn speak(&self, text: &str) -> Result<(), EngineError> {
        self.console.print(text);
        self.synthesize(text).await
    }
}
