//! `listFiles` — directory entries, one per line.

use async_trait::async_trait;
use sous_core::error::ToolError;
use sous_core::tool::{ParameterSchema, Tool, ToolArgs};

use crate::io_failure;

pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "listFiles"
    }

    fn description(&self) -> &str {
        "List the entries of a directory. Directories are suffixed with '/'."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required("dirPath", "The directory to list")
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let dir = args.string("dirPath")?;
        let fail = |e| io_failure(self.name(), dir, e);

        let mut entries = tokio::fs::read_dir(dir).await.map_err(fail)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(fail)? {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await.map_err(fail)?.is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        Ok(names.join("\n"))
    }
}
