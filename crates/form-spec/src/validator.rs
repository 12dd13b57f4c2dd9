use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Retrieve, Uri};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::schema::{deref_schema, join_pointer, resolve_ref, schema_id, value_to_display};

/// Base URI the engine gives documents that have no `$id` of their own.
const DEFAULT_BASE: &str = "json-schema:///";

static META_SCHEMA: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    let meta: Value = serde_json::from_str(include_str!("../schemas/draft-07.json"))
        .expect("draft-07 meta-schema is valid JSON");
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .should_validate_formats(true)
        .build(&meta)
        .expect("draft-07 meta-schema compiles")
});

/// One violation reported while validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    /// JSON pointer into the validated document.
    pub path: String,
    pub keyword: String,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(path: impl Into<String>, keyword: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            keyword: keyword.to_string(),
            message: message.into(),
        }
    }
}

/// Outcome of validating one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Joins error messages for display in error types.
pub fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| {
            let path = if error.path.is_empty() { "/" } else { &error.path };
            format!("{} ({}): {}", path, error.keyword, error.message)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Owns the schema registry and compiles validators against it.
///
/// Registered schemas are available to `$ref`s by identifier. Registration
/// replaces any schema with the same identifier.
#[derive(Debug, Default)]
pub struct ValidatorFactory {
    schemas: BTreeMap<String, Value>,
}

/// A compiled validator for one schema document.
pub struct Validator {
    schema: Value,
    compiled: jsonschema::Validator,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Serves registered schemas to the engine when it meets a `$ref`.
struct RegistryRetriever {
    schemas: BTreeMap<String, Value>,
}

impl Retrieve for RegistryRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri = uri.as_str().trim_end_matches('#');
        self.schemas
            .get(uri)
            .or_else(|| {
                uri.strip_prefix(DEFAULT_BASE)
                    .and_then(|id| self.schemas.get(id))
            })
            .cloned()
            .ok_or_else(|| format!("schema '{uri}' is not registered").into())
    }
}

impl ValidatorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema`, replacing any schema that shares its identifier.
    ///
    /// Schemas without `$id` are keyed by their canonical JSON text. The
    /// schema must compile; compile failures are returned unchanged.
    pub fn register_schema(&mut self, schema: Value) -> Result<&Value, SchemaError> {
        let key = registry_key(&schema);
        let mut registry = self.schemas.clone();
        registry.remove(&key);
        compile_against(&schema, &registry)?;

        if self.schemas.remove(&key).is_some() {
            tracing::debug!(id = %key, "replacing registered schema");
        } else {
            tracing::debug!(id = %key, "registering schema");
        }
        Ok(self.schemas.entry(key).or_insert(schema))
    }

    /// Drops a registered schema, returning it when present.
    pub fn remove_schema(&mut self, id: &str) -> Option<Value> {
        let removed = self.schemas.remove(id);
        if removed.is_some() {
            tracing::debug!(id, "removed schema");
        }
        removed
    }

    /// Looks up a registered schema by identifier.
    pub fn schema(&self, id: &str) -> Option<&Value> {
        self.schemas.get(id)
    }

    /// Registered schemas keyed by identifier.
    pub fn registry(&self) -> &BTreeMap<String, Value> {
        &self.schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Compiles `schema` into a validator.
    pub fn compile(&self, schema: &Value) -> Result<Validator, SchemaError> {
        compile_against(schema, &self.schemas)
    }

    /// Checks `schema` and returns the sub-schema at `reference`.
    ///
    /// Each non-empty `/` segment descends into `properties`, following
    /// `$ref`s on the way; a leading `#` is ignored. A missing segment yields
    /// `Ok(None)`.
    pub fn get_schema<'a>(
        &'a self,
        schema: &'a Value,
        reference: &str,
    ) -> Result<Option<&'a Value>, SchemaError> {
        let problems = meta_errors(schema);
        if !problems.is_empty() {
            return Err(SchemaError::Compile(problems));
        }

        let (mut current, mut document) = (schema, schema);
        for segment in reference
            .trim_start_matches('#')
            .split('/')
            .filter(|segment| !segment.is_empty())
        {
            let (owner, owner_document) = deref_schema(current, document, &self.schemas);
            match owner
                .get("properties")
                .and_then(|properties| properties.get(segment))
            {
                Some(found) => (current, document) = (found, owner_document),
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

impl Validator {
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn validate(&self, data: &Value) -> ValidationResult {
        ValidationResult::from_errors(self.errors(data))
    }

    pub fn is_valid(&self, data: &Value) -> bool {
        self.compiled.is_valid(data)
    }

    /// Like [`Validator::validate`] but as a `Result` for `?` chains.
    pub fn check(&self, data: &Value) -> Result<(), SchemaError> {
        let errors = self.errors(data);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Validation(errors))
        }
    }

    fn errors(&self, data: &Value) -> Vec<ValidationError> {
        self.compiled.iter_errors(data).flat_map(report).collect()
    }
}

fn compile_against(
    schema: &Value,
    registry: &BTreeMap<String, Value>,
) -> Result<Validator, SchemaError> {
    let problems = meta_errors(schema);
    if !problems.is_empty() {
        tracing::debug!(problems = problems.len(), "schema failed the meta-schema check");
        return Err(SchemaError::Compile(problems));
    }
    if let Some(target) = unresolved_ref(schema, schema, registry) {
        tracing::debug!(target, "schema has an unresolved reference");
        return Err(SchemaError::UnresolvedRef(target.to_string()));
    }

    let compiled = jsonschema::options()
        .with_draft(Draft::Draft7)
        .should_validate_formats(true)
        .with_retriever(RegistryRetriever {
            schemas: registry.clone(),
        })
        .build(schema)
        .map_err(|err| {
            tracing::debug!(error = %err, "schema compile failed");
            SchemaError::Compile(report(err))
        })?;

    Ok(Validator {
        schema: schema.clone(),
        compiled,
    })
}

/// Every violation of the Draft-07 meta-schema found in `schema`.
fn meta_errors(schema: &Value) -> Vec<ValidationError> {
    META_SCHEMA.iter_errors(schema).flat_map(report).collect()
}

/// First `$ref` in `node` that resolves neither locally nor in the registry.
fn unresolved_ref<'a>(
    node: &'a Value,
    document: &Value,
    registry: &BTreeMap<String, Value>,
) -> Option<&'a str> {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str)
                && resolve_ref(reference, document, registry).is_none()
            {
                return Some(reference);
            }
            map.iter()
                .filter(|(key, _)| !matches!(key.as_str(), "enum" | "const" | "default" | "examples"))
                .find_map(|(_, child)| unresolved_ref(child, document, registry))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|child| unresolved_ref(child, document, registry)),
        _ => None,
    }
}

/// Maps one engine error into per-field violations.
///
/// `required` and `additionalProperties` point at the offending property
/// rather than its parent object.
fn report(error: jsonschema::ValidationError<'_>) -> Vec<ValidationError> {
    let path = error.instance_path.to_string();
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .unwrap_or("schema");

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = value_to_display(property);
            vec![ValidationError::new(
                format!("{path}{}", join_pointer([&name])),
                keyword,
                format!("missing required property '{name}'"),
            )]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|name| {
                ValidationError::new(
                    format!("{path}{}", join_pointer([name])),
                    keyword,
                    format!("property '{name}' is not allowed"),
                )
            })
            .collect(),
        _ => vec![ValidationError::new(path, keyword, error.to_string())],
    }
}

fn registry_key(schema: &Value) -> String {
    match schema_id(schema) {
        Some(id) => id.trim_end_matches('#').to_string(),
        None => schema.to_string(),
    }
}
