//! The conversation loop — the heart of Sous.
//!
//! Each iteration of the loop:
//!
//! 1. **Compacts** the history into a single summary once it grows past the
//!    configured threshold
//! 2. **Reads** a line of user input, unless the previous turn asked for tools
//! 3. **Streams** one response from the provider, splitting reasoning from
//!    answer text as it arrives
//! 4. **If tool calls**: executes them in order, folds the results into one
//!    `tool` message, and loops back to step 3 without prompting
//! 5. **If text only**: fires the completion cue and goes back to step 2
//!
//! Every streamed request is registered as the single active request, so an
//! operator interrupt cancels the turn in flight (or, with nothing running,
//! tells the caller to shut down).

pub mod accumulator;
pub mod active_request;
pub mod compactor;
pub mod dispatcher;
pub mod loop_runner;
pub mod notify;
pub mod stream_event;
pub mod turn;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use accumulator::{ReasoningState, ResponseAccumulator};
pub use active_request::{ActiveGuard, ActiveRequest, Interrupt, InterruptHandle};
pub use compactor::{ContextCompactor, SUMMARY_PROMPT};
pub use dispatcher::ToolDispatcher;
pub use loop_runner::{AgentLoop, InputSource};
pub use notify::{CommandNotifier, NoopNotifier, Notifier, NotifyError};
pub use stream_event::{AgentStreamEvent, EventSink, NullSink};
pub use turn::TurnRunner;
