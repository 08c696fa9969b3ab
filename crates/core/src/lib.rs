//! # Sous Core
//!
//! Domain types, traits, and error definitions for the Sous conversational
//! agent. This crate has **no I/O of its own** — it defines the model that the
//! transport, tool and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the conversation loop is a trait here:
//! - [`Provider`] — the streaming chat backend
//! - [`Tool`] — a callable local capability
//!
//! Implementations live in their own crates, so the loop can be tested with
//! scripted providers and in-memory tools.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ConversationError, Error, ProviderError, RegistryError, Result, ToolError};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Fragment, FragmentStream, Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{
    ArgValue, ParamKind, ParameterSchema, ParameterSpec, Tool, ToolArgs, ToolDefinition,
    ToolRegistry, ToolResult,
};
