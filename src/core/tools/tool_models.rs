//! Function-calling declarations shared by every action handler.
//!
//! A handler advertises its functions as [`FunctionDef`] schemas (the JSON
//! Schema subset agents understand) and executes calls by name through
//! [`FunctionCallHandler`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

/// A function an agent can call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    /// Name used in calls.
    pub name: String,

    /// What the function does; agents pick functions by this text.
    pub description: String,

    pub parameters: FunctionParameters,
}

/// JSON Schema for a function's arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionParameters {
    /// Always "object".
    #[serde(rename = "type")]
    pub param_type: String,

    // Sorted so the printed declarations are stable.
    pub properties: BTreeMap<String, PropertyDef>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl FunctionParameters {
    pub fn object() -> Self {
        Self {
            param_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Adds a property; `required` also lists it under `required`.
    pub fn property(mut self, name: &str, property: PropertyDef, required: bool) -> Self {
        self.properties.insert(name.to_string(), property);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

/// Schema for a single argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDef {
    /// JSON Schema type: "string", "boolean", ...
    #[serde(rename = "type")]
    pub prop_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertyDef {
    pub fn string(description: &str) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: Some(description.to_string()),
            enum_values: None,
        }
    }

    pub fn boolean(description: &str) -> Self {
        Self {
            prop_type: "boolean".to_string(),
            description: Some(description.to_string()),
            enum_values: None,
        }
    }
}

/// Executes function calls by name.
///
/// `Err` is reserved for calls that cannot be dispatched at all (unknown
/// function, missing argument). Failures of the operation itself come back as
/// `Ok` with `"success": false` so an agent can read and react to them.
#[async_trait]
pub trait FunctionCallHandler: Send + Sync {
    async fn handle_function_call(
        &self,
        name: &str,
        args: &serde_json::Value,
    ) -> Result<serde_json::Value, String>;

    /// Names of the functions this handler accepts.
    fn supported_functions(&self) -> Vec<String>;

    /// Declarations for every supported function.
    fn function_defs(&self) -> Vec<FunctionDef>;
}
