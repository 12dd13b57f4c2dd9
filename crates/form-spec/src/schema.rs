use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive and structural type names accepted by the `type` keyword.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Object,
    Array,
}

impl SchemaType {
    pub const ALL: [SchemaType; 7] = [
        SchemaType::String,
        SchemaType::Number,
        SchemaType::Integer,
        SchemaType::Boolean,
        SchemaType::Null,
        SchemaType::Object,
        SchemaType::Array,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a `type` name is not one of the seven JSON Schema types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown schema type '{0}'")]
pub struct UnknownSchemaType(pub String);

impl FromStr for SchemaType {
    type Err = UnknownSchemaType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        SchemaType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| UnknownSchemaType(name.to_string()))
    }
}

/// Reads the `type` keyword of a schema fragment in authoring order.
///
/// Unknown names are skipped; a missing keyword yields an empty list.
pub fn schema_types(schema: &Value) -> Vec<SchemaType> {
    schema.get("type").map(type_names).unwrap_or_default()
}

/// Reads the value of a `type` keyword: a single name or a list of names.
pub fn type_names(kind: &Value) -> Vec<SchemaType> {
    match kind {
        Value::String(name) => name.parse().into_iter().collect(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|name| name.parse().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Returns the schema identifier (`$id`, falling back to the legacy `id`).
pub fn schema_id(schema: &Value) -> Option<&str> {
    schema
        .get("$id")
        .or_else(|| schema.get("id"))
        .and_then(Value::as_str)
}

/// Longest `$ref` chain followed before giving up on a schema.
const MAX_REF_HOPS: usize = 32;

static NO_SCHEMAS: BTreeMap<String, Value> = BTreeMap::new();

/// Finds the sub-schema describing the data at `pointer`.
///
/// Object segments descend through `properties` (then `additionalProperties`),
/// numeric segments through `items`. Local `$ref`s are followed.
pub fn sub_schema<'a>(schema: &'a Value, pointer: &str) -> Option<&'a Value> {
    sub_schema_in(schema, schema, pointer, &NO_SCHEMAS).map(|(found, _)| found)
}

/// Like [`sub_schema`], following `$ref`s into `document` and `registry`.
///
/// Returns the sub-schema together with the document it belongs to.
pub fn sub_schema_in<'a>(
    schema: &'a Value,
    document: &'a Value,
    pointer: &str,
    registry: &'a BTreeMap<String, Value>,
) -> Option<(&'a Value, &'a Value)> {
    let (mut current, mut document) = deref_schema(schema, document, registry);
    for segment in pointer_segments(pointer) {
        let next = child_schema(current, &segment)?;
        (current, document) = deref_schema(next, document, registry);
    }
    Some((current, document))
}

fn child_schema<'a>(schema: &'a Value, segment: &str) -> Option<&'a Value> {
    if let Some(found) = schema.get("properties").and_then(|props| props.get(segment)) {
        return Some(found);
    }
    match schema.get("items") {
        Some(Value::Array(tuple)) => tuple.get(segment.parse::<usize>().ok()?),
        Some(items) if segment.parse::<usize>().is_ok() => Some(items),
        _ => schema
            .get("additionalProperties")
            .filter(|extra| extra.is_object()),
    }
}

/// Resolves `$ref` values: `#`, `#/pointer`, `<id>` and `<id>#/pointer`.
///
/// Returns the target together with the document it belongs to, so nested
/// local references resolve against the right root.
pub fn resolve_ref<'a>(
    reference: &str,
    document: &'a Value,
    registry: &'a BTreeMap<String, Value>,
) -> Option<(&'a Value, &'a Value)> {
    let (id, fragment) = reference.split_once('#').unwrap_or((reference, ""));
    let target_doc = if id.is_empty() || schema_id(document) == Some(id) {
        document
    } else {
        registry.get(id)?
    };
    let pointer = join_pointer(pointer_segments(fragment));
    target_doc.pointer(&pointer).map(|found| (found, target_doc))
}

/// Follows a chain of `$ref`s starting at `schema`.
///
/// A reference that does not resolve stops the walk at the referring schema.
pub fn deref_schema<'a>(
    schema: &'a Value,
    document: &'a Value,
    registry: &'a BTreeMap<String, Value>,
) -> (&'a Value, &'a Value) {
    let (mut schema, mut document) = (schema, document);
    for _ in 0..MAX_REF_HOPS {
        let Some(reference) = schema.get("$ref").and_then(Value::as_str) else {
            break;
        };
        match resolve_ref(reference, document, registry) {
            Some(found) => (schema, document) = found,
            None => break,
        }
    }
    (schema, document)
}

/// Splits a JSON pointer into unescaped segments, ignoring a leading `#`.
pub fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .trim_start_matches('#')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Builds a JSON pointer from segments, escaping `~` and `/`.
pub fn join_pointer<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|segment| format!("/{}", segment.as_ref().replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Text form used for labels and string coercion of scalar values.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Equality with numbers compared by value, so `1` equals `1.0`.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_types_reads_single_and_list_forms() {
        assert_eq!(
            schema_types(&json!({ "type": "integer" })),
            vec![SchemaType::Integer]
        );
        assert_eq!(
            schema_types(&json!({ "type": ["string", "bogus", "null"] })),
            vec![SchemaType::String, SchemaType::Null]
        );
        assert!(schema_types(&json!({})).is_empty());
    }

    #[test]
    fn sub_schema_walks_properties_and_items() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } },
                "address": {
                    "type": "object",
                    "properties": { "city": { "type": "string", "title": "City" } }
                }
            }
        });
        assert_eq!(
            sub_schema(&schema, "/address/city").and_then(|s| s.get("title")),
            Some(&json!("City"))
        );
        assert_eq!(
            sub_schema(&schema, "/tags/3"),
            Some(&json!({ "type": "string" }))
        );
        assert!(sub_schema(&schema, "/missing").is_none());
    }

    #[test]
    fn sub_schema_follows_refs() {
        let schema = json!({
            "definitions": {
                "address": {
                    "type": "object",
                    "properties": { "city": { "$ref": "#/definitions/name" } }
                },
                "name": { "type": "string", "minLength": 1 }
            },
            "properties": { "home": { "$ref": "#/definitions/address" } }
        });
        assert_eq!(
            sub_schema(&schema, "/home/city"),
            Some(&json!({ "type": "string", "minLength": 1 }))
        );

        let mut registry = BTreeMap::new();
        registry.insert(
            "urn:shared".to_string(),
            json!({ "$id": "urn:shared", "definitions": { "zip": { "type": "string" } } }),
        );
        let remote = json!({ "properties": { "zip": { "$ref": "urn:shared#/definitions/zip" } } });
        let (found, document) =
            sub_schema_in(&remote, &remote, "/zip", &registry).expect("registered ref");
        assert_eq!(found, &json!({ "type": "string" }));
        assert_eq!(schema_id(document), Some("urn:shared"));
    }

    #[test]
    fn unresolvable_refs_stop_at_the_referring_schema() {
        let schema = json!({ "properties": { "a": { "$ref": "#/definitions/none" } } });
        assert_eq!(
            sub_schema(&schema, "/a"),
            Some(&json!({ "$ref": "#/definitions/none" }))
        );
        let looped = json!({ "definitions": { "a": { "$ref": "#/definitions/a" } }, "$ref": "#/definitions/a" });
        let extra = BTreeMap::new();
        let (found, _) = deref_schema(&looped, &looped, &extra);
        assert_eq!(found, &json!({ "$ref": "#/definitions/a" }));
    }

    #[test]
    fn values_compare_numbers_by_value() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!({ "a": [2] }), &json!({ "a": [2.0] })));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn pointers_escape_and_unescape() {
        let pointer = join_pointer(["a/b", "c~d"]);
        assert_eq!(pointer, "/a~1b/c~0d");
        assert_eq!(pointer_segments(&pointer), vec!["a/b", "c~d"]);
        assert_eq!(pointer_segments("#/x//y"), vec!["x", "y"]);
    }
}
