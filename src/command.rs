use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::climate::FanCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub status: CommandStatus,
    pub message: String,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

/// Hands fan commands to the actuator process through a plain file holding
/// nothing but the last command.
#[derive(Debug, Clone)]
pub struct CommandWriter {
    path: PathBuf,
}

impl CommandWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the command file. Failures are reported in the outcome,
    /// not returned as errors.
    pub async fn write(&self, command: FanCommand) -> CommandOutcome {
        match fs::write(&self.path, command.as_str()).await {
            Ok(()) => {
                info!(%command, path = %self.path.display(), "wrote fan command");
                CommandOutcome {
                    status: CommandStatus::Success,
                    message: format!("Kipas {command}"),
                }
            }
            Err(e) => {
                warn!(%command, path = %self.path.display(), error = %e, "failed to write fan command");
                CommandOutcome {
                    status: CommandStatus::Error,
                    message: e.to_string(),
                }
            }
        }
    }

    /// The command currently waiting in the file, if the file exists and
    /// holds a known command.
    pub async fn read(&self) -> io::Result<Option<FanCommand>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content.parse().ok()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_exact_command() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CommandWriter::new(dir.path().join("command.txt"));

        let outcome = writer.write(FanCommand::On).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.message, "Kipas ON");
        assert_eq!(std::fs::read_to_string(writer.path()).unwrap(), "ON");
    }

    #[tokio::test]
    async fn off_overwrites_without_residue() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CommandWriter::new(dir.path().join("command.txt"));

        writer.write(FanCommand::Off).await;
        writer.write(FanCommand::On).await;
        writer.write(FanCommand::Off).await;

        assert_eq!(std::fs::read_to_string(writer.path()).unwrap(), "OFF");
        assert_eq!(writer.read().await.unwrap(), Some(FanCommand::Off));
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CommandWriter::new(dir.path().join("command.txt"));

        assert_eq!(writer.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CommandWriter::new(dir.path().join("missing").join("command.txt"));

        let outcome = writer.write(FanCommand::On).await;

        assert_eq!(outcome.status, CommandStatus::Error);
        assert!(!outcome.message.is_empty());
    }
}
