//! Translation of action schemas into JSON-Schema tool definitions.

use super::action::Action;
use super::schema::{FieldKind, FieldSpec, InputSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Protocol-neutral description of a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of type `object` for the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: &InputSchema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: parameters_schema(schema),
        }
    }

    /// OpenAI-style `{"type":"function","function":{...}}`.
    pub fn to_openai_function(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }

    /// MCP `tools/list` entry.
    pub fn to_mcp_tool(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.parameters,
        })
    }
}

/// Tool definition for a single action.
pub fn to_tool_definition<C>(action: &dyn Action<C>) -> ToolDefinition {
    ToolDefinition::new(action.name(), action.description(), &action.schema())
}

/// `{"type":"object","properties":{...},"required":[...]}` with required
/// names in declaration order.
pub fn parameters_schema(schema: &InputSchema) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in schema.fields() {
        properties.insert(field.name.to_string(), property(field));
        if field.required {
            required.push(Value::String(field.name.to_string()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn property(field: &FieldSpec) -> Value {
    let mut prop = kind_schema(&field.kind);
    if let Value::Object(map) = &mut prop {
        if !field.description.is_empty() {
            map.insert("description".into(), Value::String(field.description.into()));
        }
        if let Some(default) = &field.default {
            map.insert("default".into(), default.clone());
        }
    }
    prop
}

fn kind_schema(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Enum(members) => json!({"type": "string", "enum": members}),
        FieldKind::Array(Some(item)) => json!({"type": "array", "items": kind_schema(item)}),
        other => json!({"type": other.json_type()}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> InputSchema {
        InputSchema::new()
            .required("protocolName", FieldKind::String, "Protocol to look up")
            .field(
                FieldSpec::optional("label", FieldKind::one_of(&["Meme", "AI"]), "Category")
                    .with_default(json!("Meme")),
            )
            .required("amount", FieldKind::Number, "")
            .optional("tokens", FieldKind::array_of(FieldKind::String), "Addresses")
    }

    #[test]
    fn renders_properties_and_required_in_declaration_order() {
        let params = parameters_schema(&schema());

        assert_eq!(params["type"], "object");
        assert_eq!(params["required"], json!(["protocolName", "amount"]));
        assert_eq!(
            params["properties"]["protocolName"],
            json!({"type": "string", "description": "Protocol to look up"})
        );
        assert_eq!(
            params["properties"]["label"],
            json!({"type": "string", "enum": ["Meme", "AI"], "description": "Category", "default": "Meme"})
        );
        assert_eq!(params["properties"]["amount"], json!({"type": "number"}));
        assert_eq!(
            params["properties"]["tokens"]["items"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn empty_schema_has_empty_properties() {
        let params = parameters_schema(&InputSchema::new());
        assert_eq!(params, json!({"type": "object", "properties": {}, "required": []}));
    }

    #[test]
    fn front_end_renderings() {
        let def = ToolDefinition::new("DEFILLAMA_GET_PROTOCOL_TVL", "TVL lookup", &schema());

        let openai = def.to_openai_function();
        assert_eq!(openai["type"], "function");
        assert_eq!(openai["function"]["name"], "DEFILLAMA_GET_PROTOCOL_TVL");
        assert_eq!(openai["function"]["parameters"], def.parameters);

        let mcp = def.to_mcp_tool();
        assert_eq!(mcp["description"], "TVL lookup");
        assert_eq!(mcp["inputSchema"], def.parameters);
    }
}
