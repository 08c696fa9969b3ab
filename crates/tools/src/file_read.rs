//! `readFile` — return a file's contents verbatim.

use async_trait::async_trait;
use sous_core::error::ToolError;
use sous_core::tool::{ParameterSchema, Tool, ToolArgs};

use crate::io_failure;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "readFile"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the given path."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("filePath", "The file path to read")
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let path = args.string("filePath")?;
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_failure(self.name(), path, e))
    }
}
