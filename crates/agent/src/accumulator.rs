//! Streamed response accumulation.
//!
//! Folds the fragments of one streamed turn into a single assistant
//! [`Message`], classifying text as reasoning or answer on the way.

use sous_config::AgentConfig;
use sous_core::message::{Message, MessageToolCall};
use sous_core::provider::{Fragment, Usage};

use crate::stream_event::AgentStreamEvent;

/// Whether streamed text currently belongs to a reasoning segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReasoningState {
    #[default]
    Normal,
    Reasoning,
}

/// Accumulates one turn's fragments.
///
/// A fragment whose trimmed text equals a marker only switches state.
/// Markers embedded in longer text are split out the same way. Marker text
/// is never displayed, and reasoning text is only kept in the persisted
/// content when `persist_reasoning` is set (wrapped in its markers).
/// If either marker is empty, reasoning detection is off and all text is
/// answer text.
#[derive(Debug)]
pub struct ResponseAccumulator {
    open: String,
    close: String,
    persist_reasoning: bool,
    state: ReasoningState,
    content: String,
    tool_calls: Vec<MessageToolCall>,
    usage: Option<Usage>,
    finished: bool,
}

impl ResponseAccumulator {
    pub fn new(open: impl Into<String>, close: impl Into<String>, persist_reasoning: bool) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            persist_reasoning,
            state: ReasoningState::Normal,
            content: String::new(),
            tool_calls: Vec::new(),
            usage: None,
            finished: false,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            &config.reasoning_open,
            &config.reasoning_close,
            config.persist_reasoning,
        )
    }

    /// Take one fragment, returning the display events it produced.
    pub fn push(&mut self, fragment: Fragment) -> Vec<AgentStreamEvent> {
        let mut events = Vec::new();
        if let Some(text) = fragment.content.as_deref() {
            self.push_text(text, &mut events);
        }
        self.tool_calls.extend(fragment.tool_calls);
        if fragment.usage.is_some() {
            self.usage = fragment.usage;
        }
        if fragment.done {
            self.finished = true;
        }
        events
    }

    fn push_text(&mut self, text: &str, events: &mut Vec<AgentStreamEvent>) {
        if self.open.is_empty() || self.close.is_empty() {
            self.commit(text, events);
            return;
        }

        let trimmed = text.trim();
        if trimmed == self.open {
            self.enter_reasoning();
            return;
        }
        if trimmed == self.close {
            self.leave_reasoning();
            return;
        }

        let mut rest = text;
        while !rest.is_empty() {
            let marker = match self.state {
                ReasoningState::Normal => self.open.clone(),
                ReasoningState::Reasoning => self.close.clone(),
            };
            let Some(pos) = rest.find(&marker) else {
                self.commit(rest, events);
                break;
            };
            self.commit(&rest[..pos], events);
            rest = &rest[pos + marker.len()..];
            match self.state {
                ReasoningState::Normal => self.enter_reasoning(),
                ReasoningState::Reasoning => self.leave_reasoning(),
            }
        }
    }

    fn enter_reasoning(&mut self) {
        if self.state == ReasoningState::Normal {
            self.state = ReasoningState::Reasoning;
            if self.persist_reasoning {
                self.content.push_str(&self.open);
            }
        }
    }

    fn leave_reasoning(&mut self) {
        if self.state == ReasoningState::Reasoning {
            self.state = ReasoningState::Normal;
            if self.persist_reasoning {
                self.content.push_str(&self.close);
            }
        }
    }

    fn commit(&mut self, text: &str, events: &mut Vec<AgentStreamEvent>) {
        if text.is_empty() {
            return;
        }
        match self.state {
            ReasoningState::Reasoning => {
                if self.persist_reasoning {
                    self.content.push_str(text);
                }
                events.push(AgentStreamEvent::Reasoning {
                    content: text.to_string(),
                });
            }
            ReasoningState::Normal => {
                self.content.push_str(text);
                events.push(AgentStreamEvent::Answer {
                    content: text.to_string(),
                });
            }
        }
    }

    pub fn state(&self) -> ReasoningState {
        self.state
    }

    /// Content committed so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_calls(&self) -> &[MessageToolCall] {
        &self.tool_calls
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    /// Whether the terminal fragment has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_message(self) -> Message {
        let mut message = Message::assistant(self.content);
        message.tool_calls = self.tool_calls;
        message
    }
}
