//! Completion cue, fired after each final answer.

use std::sync::Arc;

use async_trait::async_trait;
use sous_config::NotificationConfig;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification command is empty")]
    EmptyCommand,

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
    },
}

/// Something that tells the operator a final answer is ready.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self) -> Result<(), NotifyError>;
}

/// Runs an external command, e.g. a media player with a short sound.
pub struct CommandNotifier {
    argv: Vec<String>,
}

impl CommandNotifier {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self) -> Result<(), NotifyError> {
        let (program, args) = self.argv.split_first().ok_or(NotifyError::EmptyCommand)?;
        debug!(program = %program, "Running completion cue");

        let status = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|source| NotifyError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::Exit {
                program: program.clone(),
                status,
            })
        }
    }
}

pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Pick the notifier the configuration asks for.
pub fn from_config(config: &NotificationConfig) -> Arc<dyn Notifier> {
    if config.enabled {
        Arc::new(CommandNotifier::new(config.command.clone()))
    } else {
        Arc::new(NoopNotifier)
    }
}

/// Fire the cue on its own task. Failures are logged and go nowhere else.
pub fn spawn_notify(notifier: Arc<dyn Notifier>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify().await {
            warn!(error = %e, "Completion cue failed");
        }
    })
}
