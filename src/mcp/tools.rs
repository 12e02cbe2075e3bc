//! MCP tool definitions.

use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
    #[serde(rename = "outputSchema")]
    pub output_schema: serde_json::Value,
}

fn no_args() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

fn task_record_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "title": { "type": "string" },
            "state": { "type": "string" },
            "type": { "type": "string" }
        },
        "required": ["id", "title", "state", "type"]
    })
}

fn task_detail_schema() -> serde_json::Value {
    let mut schema = task_record_schema();
    schema["properties"]["description"] = json!({ "type": "string" });
    schema["required"] = json!(["id", "title", "state", "type", "description"]);
    schema
}

/// Object schema with a single required property.
fn wrapped(key: &str, inner: serde_json::Value) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    properties.insert(key.to_string(), inner);
    json!({
        "type": "object",
        "properties": properties,
        "required": [key]
    })
}

fn task_list(key: &str) -> serde_json::Value {
    wrapped(key, json!({ "type": "array", "items": task_record_schema() }))
}

/// Get all available MCP tools.
pub fn get_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_page".to_string(),
            title: "Get Confluence Page".to_string(),
            description: "Retrieve a specific Confluence page by its ID.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pageId": {
                        "type": "string",
                        "description": "The ID of the Confluence page."
                    }
                },
                "required": ["pageId"]
            }),
            output_schema: wrapped("page", json!({ "type": "object" })),
        },
        ToolDefinition {
            name: "search_confluence".to_string(),
            title: "Search Confluence".to_string(),
            description: "Search Confluence content using CQL (Confluence Query Language).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cql": {
                        "type": "string",
                        "description": "CQL search query (e.g., 'type=page AND space=DEMO')."
                    }
                },
                "required": ["cql"]
            }),
            output_schema: wrapped("results", json!({ "type": "object" })),
        },
        ToolDefinition {
            name: "list_spaces".to_string(),
            title: "List Confluence Spaces".to_string(),
            description: "List all available Confluence spaces.".to_string(),
            input_schema: no_args(),
            output_schema: wrapped("spaces", json!({ "type": "array" })),
        },
        ToolDefinition {
            name: "create_page".to_string(),
            title: "Create Confluence Page".to_string(),
            description: "Creates a new Confluence page. Content must be in Confluence Storage Format (XML-based).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "spaceKey": {
                        "type": "string",
                        "description": "The key of the space for the new page."
                    },
                    "title": {
                        "type": "string",
                        "description": "The title for the new page."
                    },
                    "content": {
                        "type": "string",
                        "description": "Page content in Confluence Storage Format (XML-based)."
                    },
                    "parentId": {
                        "type": "string",
                        "description": "ID of the parent page (optional)."
                    }
                },
                "required": ["spaceKey", "title", "content"]
            }),
            output_schema: wrapped("page", json!({ "type": "object" })),
        },
        ToolDefinition {
            name: "update_page".to_string(),
            title: "Update Confluence Page".to_string(),
            description: "Updates an existing Confluence page. Content must be in Confluence Storage Format (XML-based).".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pageId": {
                        "type": "string",
                        "description": "The ID of the page to update."
                    },
                    "title": {
                        "type": "string",
                        "description": "The new title for the page."
                    },
                    "content": {
                        "type": "string",
                        "description": "New page content in Confluence Storage Format (XML-based)."
                    }
                },
                "required": ["pageId", "title", "content"]
            }),
            output_schema: wrapped("page", json!({ "type": "object" })),
        },
        ToolDefinition {
            name: "getTasks".to_string(),
            title: "Get Tasks".to_string(),
            description: "Returns all active tasks (type Task, not Closed or Removed).".to_string(),
            input_schema: no_args(),
            output_schema: task_list("tasks"),
        },
        ToolDefinition {
            name: "getTaskDescription".to_string(),
            title: "Get Task Description".to_string(),
            description: "Returns the details and description of a specific task.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "taskId": {
                        "type": "integer",
                        "description": "The ID of the task."
                    }
                },
                "required": ["taskId"]
            }),
            output_schema: task_detail_schema(),
        },
        ToolDefinition {
            name: "getChildTasks".to_string(),
            title: "Get Child Tasks".to_string(),
            description: "Returns a list of child tasks for a given parent task.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "parentId": {
                        "type": "integer",
                        "description": "The ID of the parent task."
                    }
                },
                "required": ["parentId"]
            }),
            output_schema: task_list("childTasks"),
        },
        ToolDefinition {
            name: "countAllTasks".to_string(),
            title: "Count All Tasks".to_string(),
            description: "Returns the total count of all tasks ever created in the project, in any state.".to_string(),
            input_schema: no_args(),
            output_schema: wrapped("count", json!({ "type": "integer" })),
        },
        ToolDefinition {
            name: "getTasksByType".to_string(),
            title: "Get Tasks By Type".to_string(),
            description: "Returns a list of tasks of a specific type. The possible types are 'Epic', 'User Story' and 'Task'.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "taskType": {
                        "type": "string",
                        "description": "The type of the task. Can be 'Epic', 'User Story' or 'Task'.",
                        "enum": ["Epic", "User Story", "Task"]
                    }
                },
                "required": ["taskType"]
            }),
            output_schema: task_list("tasks"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_catalog() {
        let names: HashSet<String> = get_tools().into_iter().map(|t| t.name).collect();
        let expected = [
            "getTasks",
            "getTaskDescription",
            "getChildTasks",
            "countAllTasks",
            "getTasksByType",
            "get_page",
            "search_confluence",
            "list_spaces",
            "create_page",
            "update_page",
        ];
        assert_eq!(names.len(), expected.len());
        for name in expected {
            assert!(names.contains(name), "missing tool {}", name);
        }
    }

    #[test]
    fn test_schema_serializes_camel_case() {
        let tools = serde_json::to_value(get_tools()).unwrap();
        assert!(tools[0].get("inputSchema").is_some());
    }

    #[test]
    fn test_task_list_output() {
        let schema = task_list("childTasks");
        assert_eq!(schema["required"][0], "childTasks");
        assert_eq!(schema["properties"]["childTasks"]["type"], "array");
    }

    #[test]
    fn test_detail_schema_requires_description() {
        let schema = task_detail_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 5);
        assert_eq!(schema["properties"]["description"]["type"], "string");
    }
}
