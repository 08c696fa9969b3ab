//! Provider trait — the abstraction over chat-completion backends.
//!
//! A Provider knows how to send a conversation plus the tool catalog to a
//! model and get the answer back, either as one complete message or as a
//! stream of [`Fragment`]s. The wire format is entirely the implementation's
//! business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::message::{Message, MessageToolCall};
use crate::tool::ToolDefinition;

/// One request to the backend: the full transcript plus the tool catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "qwen3:14b", "gpt-4o")
    pub model: String,

    /// The conversation messages, in transcript order
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

pub fn default_temperature() -> f32 {
    0.7
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One incremental unit of a streamed response.
///
/// A stream is zero or more fragments with `done == false` followed by
/// exactly one with `done == true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fragment {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Tool calls completed by this fragment, in arrival order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// Whether this is the terminal fragment
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the terminal fragment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Fragment {
    /// A non-terminal content fragment.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// The terminal fragment.
    pub fn done() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }
}

/// Receiving half of a fragment stream.
pub type FragmentStream = mpsc::Receiver<Result<Fragment, ProviderError>>;

/// The core Provider trait.
///
/// The conversation loop only ever calls [`Provider::stream`]; backends that
/// cannot stream implement [`Provider::complete`] and inherit the default
/// single-fragment stream.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Send a request and get a stream of response fragments.
    ///
    /// Implementations must stop producing fragments once `cancel` fires.
    /// Default implementation calls `complete()` and wraps the result as a
    /// single terminal fragment.
    async fn stream(
        &self,
        request: ProviderRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, ProviderError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let (_tx, rx) = mpsc::channel(1);
                return Ok(rx);
            }
            response = self.complete(request) => response?,
        };
        let (tx, rx) = mpsc::channel(1);
        let _ = tx
            .send(Ok(Fragment {
                content: Some(response.message.content),
                tool_calls: response.message.tool_calls,
                done: true,
                usage: response.usage,
            }))
            .await;
        Ok(rx)
    }
}
