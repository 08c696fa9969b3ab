//! `writeFile` and `createFile` — write content to a file.
//!
//! Both overwrite an existing file and create missing parent directories;
//! they differ only in name and confirmation text.

use std::path::Path;

use async_trait::async_trait;
use sous_core::error::ToolError;
use sous_core::tool::{ParameterSchema, Tool, ToolArgs};
use tracing::debug;

use crate::io_failure;

pub struct WriteFileTool {
    name: &'static str,
    description: &'static str,
    confirmation: &'static str,
}

impl WriteFileTool {
    /// The `writeFile` tool.
    pub fn edit() -> Self {
        Self {
            name: "writeFile",
            description: "Write content to an existing file, replacing its contents.",
            confirmation: "File edited successfully",
        }
    }

    /// The `createFile` tool.
    pub fn create() -> Self {
        Self {
            name: "createFile",
            description: "Create a file with the given content. Overwrites the file if it already exists.",
            confirmation: "File created successfully",
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("filePath", "The file path to write to")
            .required("content", "The content to write")
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let path = args.string("filePath")?;
        let content = args.string("content")?;

        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_failure(self.name, path, e))?;
        }

        tokio::fs::write(path, content)
            .await
            .map_err(|e| io_failure(self.name, path, e))?;

        debug!(tool = self.name, path, bytes = content.len(), "Wrote file");
        Ok(self.confirmation.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definitions() {
        assert_eq!(WriteFileTool::edit().name(), "writeFile");
        assert_eq!(WriteFileTool::create().name(), "createFile");
        let schema = WriteFileTool::edit().parameters().to_json_schema();
        assert_eq!(schema["required"], serde_json::json!(["filePath", "content"]));
    }

    #[tokio::test]
    async fn write_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("out.txt");
        std::fs::write(&file_path, "old contents that are longer").unwrap();

        let output = WriteFileTool::edit()
            .execute(ToolArgs::from_pairs([
                ("filePath", file_path.to_str().unwrap()),
                ("content", "new"),
            ]))
            .await
            .unwrap();

        assert_eq!(output, "File edited successfully");
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "new");
    }

    #[tokio::test]
    async fn create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("sub").join("dir").join("file.txt");

        let output = WriteFileTool::create()
            .execute(ToolArgs::from_pairs([
                ("filePath", file_path.to_str().unwrap()),
                ("content", "nested"),
            ]))
            .await
            .unwrap();

        assert_eq!(output, "File created successfully");
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "nested");
    }

    #[tokio::test]
    async fn missing_content_argument() {
        let result = WriteFileTool::create()
            .execute(ToolArgs::from_pairs([("filePath", "/tmp/x")]))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn write_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let target = blocker.join("child.txt");

        let result = WriteFileTool::edit()
            .execute(ToolArgs::from_pairs([
                ("filePath", target.to_str().unwrap()),
                ("content", "x"),
            ]))
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }
}
