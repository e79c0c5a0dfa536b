//! Image-to-ANSI transcoding through an external program.
//!
//! Each supported tool is described by a [`Transcoder`] value: the program
//! name, its fixed arguments and how it wants the image delivered. The
//! selection happens once at startup and the chosen value is injected into
//! the transform stage.

use std::process::Stdio;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{AppError, TranscodeError};

/// How the transcoder program receives the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Image bytes are piped to the program's standard input.
    Stdin,
    /// Image bytes are written to a temporary file whose path is appended
    /// to the argument list. The file is removed after the run.
    TempFile,
}

/// An external image-to-ANSI transcoder invocation.
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: String,
    args: Vec<String>,
    input: InputMode,
}

impl Transcoder {
    pub fn new(program: impl Into<String>, args: &[&str], input: InputMode) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            input,
        }
    }

    pub fn viu() -> Self {
        Self::new("viu", &["-w", "40", "-t"], InputMode::Stdin)
    }

    pub fn pixterm() -> Self {
        Self::new("pixterm", &["-tc", "30", "-s", "2"], InputMode::TempFile)
    }

    pub fn img2txt() -> Self {
        Self::new("img2txt", &["-d", "none", "-W", "30", "-f", "ansi"], InputMode::TempFile)
    }

    /// Resolve the `--transcoder` flag. Unknown names are fatal.
    pub fn from_name(name: &str) -> Result<Self, AppError> {
        match name {
            "viu" => Ok(Self::viu()),
            "pixterm" => Ok(Self::pixterm()),
            "img2txt" => Ok(Self::img2txt()),
            other => Err(AppError::configuration(format!(
                "--transcoder takes one of viu, pixterm, img2txt (got '{other}')"
            ))),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the transcoder over one image and collect the rendered frame
    /// from its standard output.
    pub async fn render(&self, raw: Bytes) -> Result<Bytes, TranscodeError> {
        debug!(program = %self.program, input_len = raw.len(), "transcoding");

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        // Some tools pick their escape sequences from terminal capability
        // variables; viu keys off COLORTERM. Clear it so the output renders
        // on any terminal the slideshow is later viewed in.
        command.env("COLORTERM", "");
        command.stdout(Stdio::piped());
        command.stderr(Stdio::inherit());

        let output = match self.input {
            InputMode::Stdin => {
                command.arg("-");
                command.stdin(Stdio::piped());
                let mut child = command.spawn().map_err(|source| TranscodeError::Spawn {
                    program: self.program.clone(),
                    source,
                })?;
                // Feed stdin from its own task so a program that interleaves
                // reading and writing cannot deadlock against us.
                let stdin = child.stdin.take();
                let writer = tokio::spawn(async move {
                    if let Some(mut stdin) = stdin {
                        let _ = stdin.write_all(&raw).await;
                        let _ = stdin.shutdown().await;
                    }
                });
                let output = child.wait_with_output().await?;
                let _ = writer.await;
                output
            }
            InputMode::TempFile => {
                let tmp = tempfile::NamedTempFile::new()?;
                tokio::fs::write(tmp.path(), &raw).await?;
                command.arg(tmp.path());
                let child = command.spawn().map_err(|source| TranscodeError::Spawn {
                    program: self.program.clone(),
                    source,
                })?;
                // tmp must outlive the child; it is unlinked on drop.
                let output = child.wait_with_output().await?;
                drop(tmp);
                output
            }
        };

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                program: self.program.clone(),
                status: output.status,
            });
        }

        Ok(Bytes::from(output.stdout))
    }
}
