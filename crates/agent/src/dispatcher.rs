//! Tool dispatch: resolve, decode, execute, fold.

use std::sync::Arc;

use sous_core::message::{Message, MessageToolCall};
use sous_core::tool::{ToolArgs, ToolRegistry, ToolResult};
use tracing::{debug, warn};

use crate::stream_event::{AgentStreamEvent, EventSink};

/// Executes the tool calls of one assistant message.
pub struct ToolDispatcher {
    tools: Arc<ToolRegistry>,
    sink: Arc<dyn EventSink>,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<ToolRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self { tools, sink }
    }

    /// Run one call by name with its raw argument string.
    ///
    /// An unknown name is not an error: the model gets a plain
    /// "not found" output and can correct itself.
    pub async fn execute(&self, name: &str, raw_arguments: &str) -> ToolResult {
        let Some(tool) = self.tools.resolve(name) else {
            warn!(tool = %name, "Model requested an unknown tool");
            return ToolResult::success(name, format!("tool '{name}' not found"));
        };

        let args = match ToolArgs::decode(raw_arguments, &tool.parameters()) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %name, error = %e, "Rejected tool arguments");
                return ToolResult::failure(name, &e);
            }
        };

        match tool.execute(args).await {
            Ok(output) => {
                debug!(tool = %name, bytes = output.len(), "Tool succeeded");
                ToolResult::success(name, output)
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool failed");
                ToolResult::failure(name, &e)
            }
        }
    }

    /// Run every call in order, one after another.
    pub async fn dispatch_all(&self, calls: &[MessageToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            self.sink.emit(AgentStreamEvent::ToolCall {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            });

            let result = self.execute(&call.name, &call.arguments).await;

            self.sink.emit(AgentStreamEvent::ToolResult {
                name: result.tool_name.clone(),
                output: result.output.clone(),
                error: result.error.clone(),
            });
            results.push(result);
        }
        results
    }

    /// Fold the results of one assistant message into a single `tool` message.
    ///
    /// The content is a JSON array with one `{"tool", "result"}` entry per
    /// call, in call order. The message answers the first call's id.
    ///
    /// Backends that require one `tool` message per call id (strict OpenAI
    /// endpoints) will reject a folded reply to several calls; the single
    /// message keeps every result in one place for local backends, which is
    /// the trade taken here.
    pub fn fold_results(calls: &[MessageToolCall], results: &[ToolResult]) -> Message {
        let entries: Vec<serde_json::Value> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "tool": r.tool_name,
                    "result": r.content(),
                })
            })
            .collect();

        let tool_call_id = calls
            .first()
            .map(|c| c.id.clone())
            .filter(|id| !id.is_empty());

        Message::tool_result(tool_call_id, serde_json::Value::Array(entries).to_string())
    }
}
