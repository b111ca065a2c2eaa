//! Pluggable request body validation.
//!
//! The dispatcher is decoupled from any specific validation library through
//! the [`BodyValidator`] strategy trait. The stock implementation,
//! [`SchemaValidator`], compiles a JSON Schema once at registration time and
//! reports failures as a field-path error tree.

use jsonschema::JSONSchema;
use serde_json::{Map, Value};
use thiserror::Error;

/// Structured validation failure: a nested object keyed by the failing
/// field path, with human-readable messages at the leaves.
///
/// An error at the instance root lands under the key `_root`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorTree(Value);

impl ErrorTree {
    /// Build a tree from `(json_pointer, message)` pairs as produced by a
    /// schema validator (e.g. `"/user/age"` → `"2 is less than 18"`).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut root = Map::new();
        for (pointer, message) in entries {
            let segments: Vec<&str> = pointer.split('/').skip(1).filter(|s| !s.is_empty()).collect();
            if segments.is_empty() {
                root.insert("_root".to_string(), Value::String(message));
            } else {
                insert_path(&mut root, &segments, message);
            }
        }
        ErrorTree(Value::Object(root))
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.as_object().map(Map::is_empty).unwrap_or(true)
    }
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str], message: String) {
    match segments {
        [] => {}
        [leaf] => {
            map.insert((*leaf).to_string(), Value::String(message));
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            // A leaf message already recorded at an intermediate node is
            // replaced by the deeper tree.
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, message);
            }
        }
    }
}

/// Declarative check applied to a parsed JSON request body before the
/// handler is invoked.
pub trait BodyValidator: Send + Sync {
    /// `Ok(())` if the body is acceptable, otherwise the error tree that
    /// becomes the `error` field of the 400 response.
    fn validate(&self, body: &Value) -> Result<(), ErrorTree>;
}

/// The schema document itself failed to compile.
#[derive(Debug, Clone, Error)]
#[error("invalid schema: {0}")]
pub struct SchemaCompileError(String);

/// JSON Schema backed [`BodyValidator`].
///
/// The schema is compiled once at construction; per-request validation runs
/// against the compiled form only.
pub struct SchemaValidator {
    schema: Value,
    compiled: JSONSchema,
}

impl SchemaValidator {
    /// Compile a JSON Schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompileError`] if the document is not a valid schema.
    pub fn new(schema: Value) -> Result<Self, SchemaCompileError> {
        let compiled =
            JSONSchema::compile(&schema).map_err(|e| SchemaCompileError(e.to_string()))?;
        Ok(Self { schema, compiled })
    }

    /// The raw schema document.
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish()
    }
}

impl BodyValidator for SchemaValidator {
    fn validate(&self, body: &Value) -> Result<(), ErrorTree> {
        match self.compiled.validate(body) {
            Ok(()) => Ok(()),
            Err(errors) => {
                let entries: Vec<(String, String)> = errors
                    .map(|e| (e.instance_path.to_string(), e.to_string()))
                    .collect();
                Err(ErrorTree::from_entries(entries))
            }
        }
    }
}
