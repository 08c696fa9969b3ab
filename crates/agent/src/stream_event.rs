//! Agent-level display events.
//!
//! `AgentStreamEvent` is what the conversation loop tells the operator
//! surface while it works: reasoning and answer text as it streams, tool
//! activity, compaction progress, and notices. The surface decides how to
//! render each channel.

use serde::{Deserialize, Serialize};
use sous_core::provider::Usage;

/// Events emitted by the agent while a session runs.
///
/// - `reasoning`   — streamed text inside a reasoning segment
/// - `answer`      — streamed answer text
/// - `tool_call`   — the agent is invoking a tool
/// - `tool_result` — tool execution completed
/// - `compacting` / `compacted` — history summarization
/// - `done`        — one turn finished
/// - `notice`      — informational message (e.g. a cancelled turn)
/// - `error`       — a recoverable failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Text inside a reasoning segment.
    Reasoning { content: String },

    /// Answer text.
    Answer { content: String },

    /// The agent is calling a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },

    /// Tool execution completed.
    ToolResult {
        name: String,
        output: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// History is being summarized.
    Compacting { messages: usize },

    /// History was replaced by its summary.
    Compacted { summary: String },

    /// One streamed turn finished.
    Done {
        usage: Option<Usage>,
        tool_calls: usize,
    },

    Notice { message: String },

    Error { message: String },
}

impl AgentStreamEvent {
    /// Short event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Reasoning { .. } => "reasoning",
            Self::Answer { .. } => "answer",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Compacting { .. } => "compacting",
            Self::Compacted { .. } => "compacted",
            Self::Done { .. } => "done",
            Self::Notice { .. } => "notice",
            Self::Error { .. } => "error",
        }
    }
}

/// Where display events go.
///
/// `emit` is synchronous and must not block for long: it runs inside the
/// streaming loop between fragments.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AgentStreamEvent);
}

impl<F> EventSink for F
where
    F: Fn(AgentStreamEvent) + Send + Sync,
{
    fn emit(&self, event: AgentStreamEvent) {
        self(event)
    }
}

/// A sink that drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AgentStreamEvent) {}
}
