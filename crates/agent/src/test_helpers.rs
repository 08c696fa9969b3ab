//! Shared test helpers: scripted providers, inputs, sinks and tools.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sous_core::error::{ProviderError, ToolError};
use sous_core::message::MessageToolCall;
use sous_core::provider::{
    Fragment, FragmentStream, Provider, ProviderRequest, ProviderResponse,
};
use sous_core::tool::{ParameterSchema, Tool, ToolArgs, ToolRegistry};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::loop_runner::InputSource;
use crate::stream_event::{AgentStreamEvent, EventSink};

/// One scripted reply.
pub enum Step {
    /// Deliver these fragments, then close the stream.
    Fragments(Vec<Fragment>),
    /// Deliver these fragments, then hold the stream open until cancelled.
    Stall(Vec<Fragment>),
    /// Fail the request outright.
    Fail(ProviderError),
}

/// A mock provider that replays a sequence of scripted streams.
///
/// Each call to `stream` consumes the next step and records the request.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured(
            "scripted provider only streams".into(),
        ))
    }

    async fn stream(
        &self,
        request: ProviderRequest,
        cancel: CancellationToken,
    ) -> Result<FragmentStream, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            None => Err(ProviderError::NotConfigured("script exhausted".into())),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Fragments(fragments)) => {
                let (tx, rx) = mpsc::channel(fragments.len().max(1));
                for fragment in fragments {
                    let _ = tx.try_send(Ok(fragment));
                }
                Ok(rx)
            }
            Some(Step::Stall(fragments)) => {
                let (tx, rx) = mpsc::channel(fragments.len().max(1));
                tokio::spawn(async move {
                    for fragment in fragments {
                        if tx.send(Ok(fragment)).await.is_err() {
                            return;
                        }
                    }
                    cancel.cancelled().await;
                });
                Ok(rx)
            }
        }
    }
}

/// A plain text reply streamed piece by piece.
pub fn text_step(pieces: &[&str]) -> Step {
    let mut fragments: Vec<Fragment> = pieces.iter().map(|p| Fragment::text(*p)).collect();
    fragments.push(Fragment::done());
    Step::Fragments(fragments)
}

/// A reply that only requests tool calls.
pub fn tool_step(calls: Vec<MessageToolCall>) -> Step {
    Step::Fragments(vec![Fragment {
        tool_calls: calls,
        done: true,
        ..Fragment::default()
    }])
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

/// Input that replays fixed lines, then ends.
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// A sink that records every event.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<AgentStreamEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<AgentStreamEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn answer_text(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AgentStreamEvent::Answer { content } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn reasoning_text(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AgentStreamEvent::Reasoning { content } => Some(content),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: AgentStreamEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Echoes its `text` argument.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("text", "Text to echo")
    }
    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        Ok(args.string("text")?.to_string())
    }
}

/// Fails with its `text` argument as partial output.
pub struct FailTool;

#[async_trait]
impl Tool for FailTool {
    fn name(&self) -> &str {
        "fail"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("text", "Partial output")
    }
    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "fail".into(),
            reason: "boom".into(),
            output: args.string("text")?.to_string(),
        })
    }
}

pub fn test_registry() -> ToolRegistry {
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(EchoTool), Box::new(FailTool)];
    ToolRegistry::from_tools(tools)
        .ok()
        .expect("test tools have unique names")
}
