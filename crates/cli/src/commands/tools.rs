//! `sous tools` — print the tool catalog the model is offered.

use sous_core::tool::ToolDefinition;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = sous_tools::default_registry()?;
    println!("{}", serde_json::to_string_pretty(&catalog(&registry.list()))?);
    Ok(())
}

fn catalog(definitions: &[ToolDefinition]) -> serde_json::Value {
    definitions
        .iter()
        .map(|d| {
            serde_json::json!({
                "name": d.name,
                "description": d.description,
                "parameters": d.parameters.to_json_schema(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_builtin() {
        let registry = sous_tools::default_registry().unwrap();
        let value = catalog(&registry.list());
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), registry.len());
        assert_eq!(entries[0]["name"], "readFile");
        assert_eq!(entries[0]["parameters"]["type"], "object");
    }
}
