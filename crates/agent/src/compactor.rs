//! Context compaction: replace a long history with a summary of itself.

use sous_core::error::Error;
use sous_core::message::{Conversation, Message};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::turn::TurnRunner;

/// The instruction appended to the history when asking for a summary.
pub const SUMMARY_PROMPT: &str = "Please summarize the active conversation so that you can pick up \
your work from here. Include the original user instructions so that you do not lose the context \
of the task at hand. Include the previous tool calls and their results in this summary.";

/// Decides when to compact and produces the summary.
#[derive(Debug, Clone, Copy)]
pub struct ContextCompactor {
    threshold: usize,
}

impl ContextCompactor {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether a history of `len` messages should be compacted.
    pub fn needs_compaction(&self, len: usize) -> bool {
        len > self.threshold
    }

    /// Ask the backend to summarize `conversation`.
    ///
    /// Works on a copy: the caller's history is untouched whatever the
    /// outcome. The summary comes back as a `user` message with no tool
    /// calls, ready to stand in as the whole history.
    pub async fn compact(
        &self,
        runner: &TurnRunner,
        cancel: &CancellationToken,
        conversation: &Conversation,
    ) -> Result<Message, Error> {
        let mut messages = conversation.messages().to_vec();
        messages.push(Message::user(SUMMARY_PROMPT));

        info!(messages = conversation.len(), "Compacting conversation");
        let reply = runner.run_turn(cancel, &messages).await?;

        let summary = reply.content.trim();
        if summary.is_empty() {
            return Err(Error::Compaction("backend returned an empty summary".into()));
        }

        Ok(Message::user(summary))
    }
}
