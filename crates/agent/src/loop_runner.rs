//! The conversation loop implementation.

use std::sync::Arc;

use async_trait::async_trait;
use sous_config::AppConfig;
use sous_core::error::Error;
use sous_core::message::{Conversation, Message};
use sous_core::provider::Provider;
use sous_core::tool::ToolRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::active_request::{ActiveRequest, InterruptHandle};
use crate::compactor::ContextCompactor;
use crate::dispatcher::ToolDispatcher;
use crate::notify::{self, Notifier};
use crate::stream_event::{AgentStreamEvent, EventSink};
use crate::turn::TurnRunner;

/// Where user input comes from, one line at a time.
#[async_trait]
pub trait InputSource: Send {
    /// The next line, or `None` at end of input.
    async fn next_line(&mut self) -> Option<String>;
}

/// The conversation loop that orchestrates turns, tools and compaction.
pub struct AgentLoop {
    /// Streams one response per turn
    runner: TurnRunner,

    /// Executes requested tool calls
    dispatcher: ToolDispatcher,

    /// Keeps the history bounded
    compactor: ContextCompactor,

    /// Completion cue after final answers
    notifier: Arc<dyn Notifier>,

    /// Display channel
    sink: Arc<dyn EventSink>,

    /// The in-flight request slot, shared with interrupt handles
    active: ActiveRequest,

    conversation: Conversation,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &AppConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let active = ActiveRequest::new();
        Self {
            runner: TurnRunner::new(
                provider,
                Arc::clone(&tools),
                active.clone(),
                Arc::clone(&sink),
                config,
            ),
            dispatcher: ToolDispatcher::new(tools, Arc::clone(&sink)),
            compactor: ContextCompactor::new(config.agent.compaction_threshold),
            notifier: notify::from_config(&config.notification),
            sink,
            active,
            conversation: Conversation::new(),
        }
    }

    /// Replace the completion cue.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// A handle for signal handlers: cancels the turn in flight, or reports idle.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.active.handle()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Drive turns until input ends or the transport fails.
    ///
    /// A turn that ends with tool calls is followed straight away by another
    /// turn carrying the folded results; only a turn without tool calls goes
    /// back to the operator for input. An interrupted turn leaves the history
    /// as it was before that turn.
    pub async fn run(
        &mut self,
        cancel: &CancellationToken,
        input: &mut dyn InputSource,
    ) -> Result<(), Error> {
        info!(conversation_id = %self.conversation.id, "Conversation loop started");
        let mut read_input = true;

        loop {
            if self.compactor.needs_compaction(self.conversation.len())
                && self.compact(cancel).await.is_err()
            {
                // Interrupted summary: hand control back to the operator
                read_input = true;
            }

            if read_input {
                let Some(line) = input.next_line().await else {
                    info!(
                        conversation_id = %self.conversation.id,
                        messages = self.conversation.len(),
                        "Input closed, ending conversation"
                    );
                    return Ok(());
                };
                self.conversation.push(Message::user(line))?;
            }

            let message = match self
                .runner
                .run_turn(cancel, self.conversation.messages())
                .await
            {
                Ok(message) => message,
                Err(Error::Cancelled { partial }) => {
                    debug!(partial_len = partial.len(), "Turn discarded after cancellation");
                    self.sink.emit(AgentStreamEvent::Notice {
                        message: "Request cancelled".into(),
                    });
                    read_input = true;
                    continue;
                }
                Err(Error::Provider(source)) => {
                    let transcript = self.conversation.dump();
                    error!(error = %source, transcript = %transcript, "Turn failed");
                    return Err(Error::TurnFailed { source, transcript });
                }
                Err(e) => return Err(e),
            };

            let calls = message.tool_calls.clone();
            self.conversation.push(message)?;

            if calls.is_empty() {
                notify::spawn_notify(Arc::clone(&self.notifier));
                read_input = true;
                continue;
            }

            debug!(tool_count = calls.len(), "Executing tool calls");
            let results = self.dispatcher.dispatch_all(&calls).await;
            self.conversation
                .push(ToolDispatcher::fold_results(&calls, &results))?;
            read_input = false;
        }
    }

    /// Summarize the history in place. Failure leaves it untouched.
    ///
    /// Only an interrupted summary is reported back, as `Err(Interrupted)`;
    /// other failures are shown and swallowed.
    async fn compact(&mut self, cancel: &CancellationToken) -> Result<(), Interrupted> {
        let before = self.conversation.len();
        self.sink
            .emit(AgentStreamEvent::Compacting { messages: before });

        match self
            .compactor
            .compact(&self.runner, cancel, &self.conversation)
            .await
        {
            Ok(summary) => {
                info!(before, "Conversation compacted to a single summary");
                self.sink.emit(AgentStreamEvent::Compacted {
                    summary: summary.content.clone(),
                });
                self.conversation.replace_with_summary(summary);
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                debug!(messages = before, "Compaction cancelled, keeping full history");
                self.sink.emit(AgentStreamEvent::Notice {
                    message: "Compaction cancelled".into(),
                });
                Err(Interrupted)
            }
            Err(e) => {
                warn!(error = %e, messages = before, "Compaction failed, keeping full history");
                self.sink.emit(AgentStreamEvent::Error {
                    message: format!("Compaction failed: {e}"),
                });
                Ok(())
            }
        }
    }
}

/// The operator interrupted a request outside a regular turn.
#[derive(Debug)]
struct Interrupted;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::notify::NotifyError;
    use crate::stream_event::NullSink;
    use crate::test_helpers::{
        CollectingSink, ScriptedInput, ScriptedProvider, Step, make_tool_call, test_registry,
        text_step, tool_step,
    };
    use sous_core::error::ProviderError;
    use sous_core::message::Role;
    use sous_core::provider::Fragment;

    #[derive(Default)]
    struct CountingNotifier {
        count: Mutex<usize>,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self) -> Result<(), NotifyError> {
            *self.count.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn agent(provider: Arc<ScriptedProvider>, config: &AppConfig) -> AgentLoop {
        AgentLoop::new(provider, Arc::new(test_registry()), config, Arc::new(NullSink))
    }

    #[tokio::test]
    async fn text_turns_prompt_for_input_each_time() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_step(&["Hi!"]),
            text_step(&["Bye!"]),
        ]));
        let notifier = Arc::new(CountingNotifier::default());
        let mut agent = agent(provider.clone(), &AppConfig::default())
            .with_notifier(notifier.clone());
        let mut input = ScriptedInput::new(["hello", "goodbye"]);

        agent.run(&CancellationToken::new(), &mut input).await.unwrap();

        let roles: Vec<_> = agent.conversation().messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(provider.requests().len(), 2);
        assert_eq!(input.remaining(), 0);

        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(*notifier.count.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn tool_calls_continue_without_prompting() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_step(vec![
                make_tool_call("echo", serde_json::json!({"text": "a"})),
                make_tool_call("doesNotExist", serde_json::json!({})),
                make_tool_call("echo", serde_json::json!({"text": "c"})),
            ]),
            text_step(&["All done."]),
        ]));
        let mut agent = agent(provider.clone(), &AppConfig::default());
        let mut input = ScriptedInput::new(["do three things"]);

        agent.run(&CancellationToken::new(), &mut input).await.unwrap();

        let messages = agent.conversation().messages();
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );

        let folded: serde_json::Value = serde_json::from_str(&messages[2].content).unwrap();
        let entries = folded.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1]["result"], "tool 'doesNotExist' not found");
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("call_echo"));

        // The second request carried the tool results and was not preceded by input.
        assert_eq!(provider.requests()[1].messages.len(), 3);
        assert_eq!(provider.requests()[1].tools.len(), 2);
    }

    #[tokio::test]
    async fn long_history_is_compacted_to_single_summary() {
        let mut config = AppConfig::default();
        config.agent.compaction_threshold = 3;

        let provider = Arc::new(ScriptedProvider::new(vec![
            text_step(&["one"]),
            text_step(&["two"]),
            text_step(&["User wants two answers; both given."]),
            text_step(&["three"]),
        ]));
        let sink = Arc::new(CollectingSink::default());
        let mut agent = AgentLoop::new(
            provider.clone(),
            Arc::new(test_registry()),
            &config,
            sink.clone(),
        );
        let mut input = ScriptedInput::new(["first", "second", "third"]);

        agent.run(&CancellationToken::new(), &mut input).await.unwrap();

        let messages = agent.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "User wants two answers; both given.");
        assert_eq!(messages[1].content, "third");
        assert_eq!(messages[2].content, "three");

        let summary_request = &provider.requests()[2];
        assert_eq!(summary_request.messages.len(), 5);
        assert!(
            sink.events()
                .iter()
                .any(|e| matches!(e, AgentStreamEvent::Compacted { .. }))
        );
    }

    #[tokio::test]
    async fn failed_compaction_keeps_history() {
        let mut config = AppConfig::default();
        config.agent.compaction_threshold = 2;

        let provider = Arc::new(ScriptedProvider::new(vec![
            text_step(&["one"]),
            text_step(&["two"]),
            Step::Fragments(vec![Fragment::done()]),
            text_step(&["three"]),
        ]));
        let mut agent = agent(provider, &config);
        let mut input = ScriptedInput::new(["first", "second", "third"]);

        agent.run(&CancellationToken::new(), &mut input).await.unwrap();
        assert_eq!(agent.conversation().len(), 6);
    }

    #[tokio::test]
    async fn cancelled_turn_leaves_no_assistant_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Step::Stall(vec![Fragment::text("partial ")]),
            text_step(&["fresh answer"]),
        ]));
        let config = AppConfig::default();
        let interrupter: Arc<Mutex<Option<InterruptHandle>>> = Arc::new(Mutex::new(None));
        let slot = interrupter.clone();
        let sink = move |event: AgentStreamEvent| {
            if let AgentStreamEvent::Answer { content } = &event
                && content == "partial "
                && let Some(handle) = slot.lock().unwrap().as_ref()
            {
                handle.interrupt();
            }
        };
        let mut agent = AgentLoop::new(
            provider,
            Arc::new(test_registry()),
            &config,
            Arc::new(sink),
        );
        *interrupter.lock().unwrap() = Some(agent.interrupt_handle());
        let mut input = ScriptedInput::new(["slow question", "again"]);

        agent.run(&CancellationToken::new(), &mut input).await.unwrap();

        let contents: Vec<_> = agent
            .conversation()
            .messages()
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            contents,
            vec![
                (Role::User, "slow question"),
                (Role::User, "again"),
                (Role::Assistant, "fresh answer"),
            ]
        );
    }

    #[tokio::test]
    async fn interrupted_compaction_after_tools_waits_for_input() {
        let mut config = AppConfig::default();
        config.agent.compaction_threshold = 2;

        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_step(vec![make_tool_call("echo", serde_json::json!({"text": "a"}))]),
            Step::Stall(vec![Fragment::text("summary so far")]),
            text_step(&["after"]),
        ]));
        let interrupter: Arc<Mutex<Option<InterruptHandle>>> = Arc::new(Mutex::new(None));
        let slot = interrupter.clone();
        let sink = move |event: AgentStreamEvent| {
            if let AgentStreamEvent::Answer { content } = &event
                && content == "summary so far"
                && let Some(handle) = slot.lock().unwrap().as_ref()
            {
                handle.interrupt();
            }
        };
        let mut agent = AgentLoop::new(
            provider.clone(),
            Arc::new(test_registry()),
            &config,
            Arc::new(sink),
        )
        .with_notifier(Arc::new(crate::notify::NoopNotifier));
        *interrupter.lock().unwrap() = Some(agent.interrupt_handle());
        let mut input = ScriptedInput::new(["go", "next"]);

        agent.run(&CancellationToken::new(), &mut input).await.unwrap();

        // The request after the interrupted summary was driven by new input
        let third = &provider.requests()[2];
        let last = third.messages.last().unwrap();
        assert_eq!((last.role, last.content.as_str()), (Role::User, "next"));

        let roles: Vec<_> = agent.conversation().messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn transport_failure_returns_transcript() {
        let provider = Arc::new(ScriptedProvider::new(vec![Step::Fail(
            ProviderError::ApiError {
                status_code: 500,
                message: "boom".into(),
            },
        )]));
        let mut agent = agent(provider, &AppConfig::default());
        let mut input = ScriptedInput::new(["hello"]);

        let err = agent
            .run(&CancellationToken::new(), &mut input)
            .await
            .unwrap_err();
        match err {
            Error::TurnFailed { source, transcript } => {
                assert!(matches!(source, ProviderError::ApiError { status_code: 500, .. }));
                assert!(transcript.contains("hello"));
            }
            other => panic!("expected TurnFailed, got {other}"),
        }
        assert_eq!(agent.conversation().len(), 1);
    }

    #[tokio::test]
    async fn empty_input_ends_immediately() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut agent = agent(provider.clone(), &AppConfig::default());
        let mut input = ScriptedInput::new(Vec::<String>::new());

        agent.run(&CancellationToken::new(), &mut input).await.unwrap();
        assert!(agent.conversation().is_empty());
        assert!(provider.requests().is_empty());
    }
}
