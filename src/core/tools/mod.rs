pub mod tool_models;

pub use tool_models::{FunctionCallHandler, FunctionDef, FunctionParameters, PropertyDef};
