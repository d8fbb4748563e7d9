//! Builtin tools

pub mod file;
pub mod search;
pub mod shell;

use std::sync::Arc;

use moon_foundation::Tool;

pub use file::FileTool;
pub use search::SearchTool;
pub use shell::ShellTool;

/// All builtin tools
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ShellTool::new()),
        Arc::new(FileTool::new()),
        Arc::new(SearchTool::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_names() {
        let tools = all_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();

        assert!(names.contains(&"run_shell_command"));
        assert!(names.contains(&"file_tool"));
        assert!(names.contains(&"search_tool"));
    }

    #[test]
    fn test_all_schemas_are_objects() {
        for tool in all_tools() {
            let schema = tool.schema();
            assert_eq!(schema.parameters.schema_type, "object");
            assert!(schema.parameters.properties.is_object());
            assert!(!schema.description.is_empty());
        }
    }
}
