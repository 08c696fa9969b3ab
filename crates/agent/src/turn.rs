//! One streamed turn against the backend.

use std::sync::Arc;

use sous_config::AppConfig;
use sous_core::error::{Error, ProviderError};
use sous_core::message::Message;
use sous_core::provider::{Provider, ProviderRequest};
use sous_core::tool::ToolRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::accumulator::ResponseAccumulator;
use crate::active_request::ActiveRequest;
use crate::stream_event::{AgentStreamEvent, EventSink};

/// Runs single streamed request/response cycles.
///
/// Every call registers its own request in the shared [`ActiveRequest`]
/// slot, so an interrupt cancels exactly the turn in flight.
pub struct TurnRunner {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    active: ActiveRequest,
    sink: Arc<dyn EventSink>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    reasoning_open: String,
    reasoning_close: String,
    persist_reasoning: bool,
}

impl TurnRunner {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        active: ActiveRequest,
        sink: Arc<dyn EventSink>,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            active,
            sink,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            reasoning_open: config.agent.reasoning_open.clone(),
            reasoning_close: config.agent.reasoning_close.clone(),
            persist_reasoning: config.agent.persist_reasoning,
        }
    }

    /// Stream one response for `messages` and fold it into an assistant message.
    ///
    /// Returns [`Error::Cancelled`] carrying the content committed so far if
    /// the request is interrupted or `cancel` fires. Transport failures come
    /// back as [`Error::Provider`].
    pub async fn run_turn(
        &self,
        cancel: &CancellationToken,
        messages: &[Message],
    ) -> Result<Message, Error> {
        let guard = self.active.begin(cancel);
        let token = guard.token().clone();

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.list(),
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            messages = messages.len(),
            "Starting turn"
        );

        let mut stream = tokio::select! {
            biased;
            _ = token.cancelled() => {
                return Err(Error::Cancelled { partial: String::new() });
            }
            stream = self.provider.stream(request, token.clone()) => stream?,
        };

        let mut acc = ResponseAccumulator::new(
            &self.reasoning_open,
            &self.reasoning_close,
            self.persist_reasoning,
        );

        while !acc.is_finished() {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                next = stream.recv() => Some(next),
            };

            let fragment = match next {
                None => return Err(cancelled(&acc)),
                Some(None) if token.is_cancelled() => return Err(cancelled(&acc)),
                Some(None) => {
                    return Err(ProviderError::StreamInterrupted(
                        "stream closed before the final fragment".into(),
                    )
                    .into());
                }
                Some(Some(Err(e))) => return Err(e.into()),
                Some(Some(Ok(fragment))) => fragment,
            };

            if token.is_cancelled() {
                return Err(cancelled(&acc));
            }

            for event in acc.push(fragment) {
                self.sink.emit(event);
            }
        }

        drop(guard);

        info!(
            tool_calls = acc.tool_calls().len(),
            total_tokens = acc.usage().map(|u| u.total_tokens),
            "Turn complete"
        );
        self.sink.emit(AgentStreamEvent::Done {
            usage: acc.usage().cloned(),
            tool_calls: acc.tool_calls().len(),
        });

        Ok(acc.into_message())
    }
}

fn cancelled(acc: &ResponseAccumulator) -> Error {
    debug!(partial_len = acc.content().len(), "Turn cancelled");
    Error::Cancelled {
        partial: acc.content().to_string(),
    }
}
