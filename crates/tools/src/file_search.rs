//! `searchFile` — lines of a file containing a query string.

use async_trait::async_trait;
use sous_core::error::ToolError;
use sous_core::tool::{ParameterSchema, Tool, ToolArgs};

use crate::io_failure;

pub struct SearchFileTool;

#[async_trait]
impl Tool for SearchFileTool {
    fn name(&self) -> &str {
        "searchFile"
    }

    fn description(&self) -> &str {
        "Search a file for a string and return every line that contains it."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("filePath", "The file path to search")
            .required("query", "The text to look for (case-sensitive)")
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let path = args.string("filePath")?;
        let query = args.string("query")?;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| io_failure(self.name(), path, e))?;

        Ok(matching_lines(&content, query))
    }
}

fn matching_lines(content: &str, query: &str) -> String {
    content
        .lines()
        .filter(|line| line.contains(query))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_substring_and_case_sensitive() {
        let content = "fn main() {\n    println!(\"Main\");\n}\nfn helper() {}\n";
        assert_eq!(matching_lines(content, "fn "), "fn main() {\nfn helper() {}");
        assert_eq!(matching_lines(content, "Main"), "    println!(\"Main\");");
        assert_eq!(matching_lines(content, "absent"), "");
    }

    #[tokio::test]
    async fn search_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("todo.md");
        std::fs::write(&file_path, "- buy milk\n- fix bug\n- buy bread\n").unwrap();

        let output = SearchFileTool
            .execute(ToolArgs::from_pairs([
                ("filePath", file_path.to_str().unwrap()),
                ("query", "buy"),
            ]))
            .await
            .unwrap();
        assert_eq!(output, "- buy milk\n- buy bread");
    }

    #[tokio::test]
    async fn search_missing_file_fails() {
        let result = SearchFileTool
            .execute(ToolArgs::from_pairs([
                ("filePath", "/nonexistent/sous/file.txt"),
                ("query", "x"),
            ]))
            .await;
        assert!(matches!(result, Err(ToolError::ExecutionFailed { .. })));
    }
}
