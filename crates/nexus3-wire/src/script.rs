//! Script API types.

use serde::{Deserialize, Serialize};

/// Scripting language of a stored script.
///
/// Nexus 3 only ships the Groovy engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    #[default]
    Groovy,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Groovy => "groovy",
        }
    }
}

/// A named script persisted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Unique name on the server.
    pub name: String,
    /// Source text. Never interpreted client-side.
    pub content: String,
    /// Language tag.
    #[serde(rename = "type", default)]
    pub kind: ScriptType,
}

impl Script {
    /// Build a Groovy script.
    pub fn groovy(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            kind: ScriptType::Groovy,
        }
    }
}

/// Body returned by `POST /script/{name}/run`.
///
/// The server uses the same shape for failures, with `result` holding the
/// text of the exception raised by the script engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResult {
    /// Echo of the executed script name.
    #[serde(default)]
    pub name: String,
    /// Return value of the script, serialized to text.
    pub result: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_wire_shape() {
        let script = Script::groovy("hello", "return 'hi'");
        let value = serde_json::to_value(&script).unwrap();
        assert_eq!(value["name"], "hello");
        assert_eq!(value["content"], "return 'hi'");
        assert_eq!(value["type"], "groovy");
    }

    #[test]
    fn test_script_missing_type_defaults_to_groovy() {
        let script: Script =
            serde_json::from_str(r#"{"name": "a", "content": "return 1"}"#).unwrap();
        assert_eq!(script.kind, ScriptType::Groovy);
    }

    #[test]
    fn test_script_result_requires_result_field() {
        assert!(serde_json::from_str::<ScriptResult>(r#"{"name": "x"}"#).is_err());

        let ok: ScriptResult = serde_json::from_str(r#"{"name":"x","result":"boom"}"#).unwrap();
        assert_eq!(ok.result, "boom");
    }
}
