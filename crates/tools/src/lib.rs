//! Built-in tool implementations for Sous.
//!
//! Tools give the agent the ability to act on the operator's machine:
//! read, write, create, and search files, list directories, and run shell
//! commands. Tool names and parameter names are the ones the model sees.

pub mod file_list;
pub mod file_read;
pub mod file_search;
pub mod file_write;
pub mod shell;

use sous_core::error::RegistryError;
use sous_core::tool::{Tool, ToolRegistry};

/// Create the default tool registry with all built-in tools.
pub fn default_registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::from_tools([
        Box::new(file_read::ReadFileTool) as Box<dyn Tool>,
        Box::new(file_write::WriteFileTool::edit()),
        Box::new(file_write::WriteFileTool::create()),
        Box::new(file_search::SearchFileTool),
        Box::new(file_list::ListFilesTool),
        Box::new(shell::ShellTool),
    ])
}

/// Map an I/O failure onto a tool failure.
pub(crate) fn io_failure(tool_name: &str, path: &str, e: std::io::Error) -> sous_core::ToolError {
    sous_core::ToolError::ExecutionFailed {
        tool_name: tool_name.into(),
        reason: format!("{path}: {e}"),
        output: String::new(),
    }
}
