//! Agent tools: local functions the pipeline's agents may invoke.
//!
//! Provides:
//!   1. equipment_selector - Required/alternative equipment for a muscle group
//!
//! Each tool is described to the model by a `ToolDefinition` (name,
//! description, JSON schema of its arguments) and dispatched through the
//! `ToolRegistry`. Tool failures are returned to the model as error results;
//! they never abort the step.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::decision_log::DecisionLog;
use crate::equipment;
use crate::workspace::Workspace;

pub const EQUIPMENT_SELECTOR: &str = "equipment_selector";

/// Result of a tool operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(data: impl Serialize) -> Self {
        Self {
            success: true,
            data: Some(serde_json::to_value(data).unwrap_or_default()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }

    /// The text handed back to the model as the tool's output.
    pub fn to_content(&self) -> String {
        match (&self.data, &self.error) {
            (Some(data), _) if self.success => data.to_string(),
            (_, Some(err)) => serde_json::json!({ "error": err }).to_string(),
            _ => "{}".to_string(),
        }
    }
}

/// A tool as advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Arguments of `equipment_selector`.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct EquipmentSelectorArgs {
    /// Target muscle group, e.g. "chest" or "legs".
    #[serde(default)]
    pub muscle: Option<String>,
}

type ToolHandler = Arc<dyn Fn(serde_json::Value, &DecisionLog) -> ToolResult + Send + Sync>;

struct RegisteredTool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

/// Name → tool lookup used by the agent caller to execute tool calls.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<RegisteredTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool wired to `workspace`.
    pub fn for_workspace(workspace: &Workspace) -> Self {
        let mut registry = Self::new();
        registry.register_equipment_selector(workspace.equipment_db_path());
        registry
    }

    pub fn register<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(serde_json::Value, &DecisionLog) -> ToolResult + Send + Sync + 'static,
    {
        self.tools.insert(
            definition.name.clone(),
            Arc::new(RegisteredTool {
                definition,
                handler: Arc::new(handler),
            }),
        );
    }

    pub fn register_equipment_selector(&mut self, table_path: PathBuf) {
        let definition = ToolDefinition {
            name: EQUIPMENT_SELECTOR.to_string(),
            description: "Return equipment recommendations for a muscle. Returns status, \
                muscle, required and alternatives."
                .to_string(),
            parameters: parameters_schema::<EquipmentSelectorArgs>(),
        };
        self.register(definition, move |args, log| {
            let args: EquipmentSelectorArgs = match serde_json::from_value(args) {
                Ok(a) => a,
                Err(e) => return ToolResult::error(format!("Invalid arguments: {}", e)),
            };
            let recommendation = equipment::lookup(&table_path, args.muscle.as_deref(), log);
            ToolResult::success(recommendation)
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Definitions for the given tool names, skipping unknown ones.
    pub fn definitions(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| t.definition.clone())
            .collect()
    }

    /// Execute a tool call. `arguments` may be a JSON object or a JSON string
    /// holding one (OpenAI-style function calls send the latter).
    pub fn call(&self, name: &str, arguments: serde_json::Value, log: &DecisionLog) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            log.warning(format!("Model requested unknown tool '{}'", name));
            return ToolResult::error(format!("Unknown tool: {}", name));
        };

        let arguments = match arguments {
            serde_json::Value::String(raw) if raw.trim().is_empty() => serde_json::json!({}),
            serde_json::Value::String(raw) => match serde_json::from_str(&raw) {
                Ok(v) => v,
                Err(e) => return ToolResult::error(format!("Invalid arguments JSON: {}", e)),
            },
            serde_json::Value::Null => serde_json::json!({}),
            other => other,
        };

        log.debug(format!("Tool call {}({})", name, arguments));
        (tool.handler)(arguments, log)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// JSON schema of a tool's argument type, without the `$schema` marker
/// (several chat APIs reject it).
fn parameters_schema<T: JsonSchema>() -> serde_json::Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    value
}
