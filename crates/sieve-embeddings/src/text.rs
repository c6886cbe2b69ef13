use serde_json::{Map, Value};

/// Flatten a tool descriptor into the text handed to the oracle
///
/// Name (with `_` separators turned into spaces), then the description,
/// then each parameter name followed by its description when present.
pub fn tool_text(name: &str, description: &str, input_schema: &Map<String, Value>) -> String {
    let mut parts = vec![name.replace('_', " ").trim().to_owned()];

    if !description.is_empty() {
        parts.push(description.to_owned());
    }

    if let Some(Value::Object(properties)) = input_schema.get("properties") {
        for (param, info) in properties {
            let mut param_text = param.replace('_', " ");
            if let Some(desc) = info.get("description").and_then(Value::as_str).filter(|d| !d.is_empty()) {
                param_text.push_str(": ");
                param_text.push_str(desc);
            }
            parts.push(param_text);
        }
    }

    parts.join(" ")
}
