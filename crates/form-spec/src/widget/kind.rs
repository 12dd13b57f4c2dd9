use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout::LayoutNode;
use crate::schema::{SchemaType, schema_types};

/// Widget identifiers understood by the renderers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WidgetKind {
    Button,
    Submit,
    Checkbox,
    Checkboxes,
    CheckboxesInline,
    Radios,
    RadiosInline,
    Select,
    Range,
    Number,
    Integer,
    Text,
    Textarea,
    Date,
    DatetimeLocal,
    Email,
    Url,
    Color,
    Password,
    Hidden,
    Section,
    Fieldset,
    Flex,
    Array,
    Ref,
    OneOf,
    None,
    /// A layout `type` with no built-in meaning, passed through to the host.
    Custom(String),
}

const NAMED: [(WidgetKind, &str); 27] = [
    (WidgetKind::Button, "button"),
    (WidgetKind::Submit, "submit"),
    (WidgetKind::Checkbox, "checkbox"),
    (WidgetKind::Checkboxes, "checkboxes"),
    (WidgetKind::CheckboxesInline, "checkboxes-inline"),
    (WidgetKind::Radios, "radios"),
    (WidgetKind::RadiosInline, "radios-inline"),
    (WidgetKind::Select, "select"),
    (WidgetKind::Range, "range"),
    (WidgetKind::Number, "number"),
    (WidgetKind::Integer, "integer"),
    (WidgetKind::Text, "text"),
    (WidgetKind::Textarea, "textarea"),
    (WidgetKind::Date, "date"),
    (WidgetKind::DatetimeLocal, "datetime-local"),
    (WidgetKind::Email, "email"),
    (WidgetKind::Url, "url"),
    (WidgetKind::Color, "color"),
    (WidgetKind::Password, "password"),
    (WidgetKind::Hidden, "hidden"),
    (WidgetKind::Section, "section"),
    (WidgetKind::Fieldset, "fieldset"),
    (WidgetKind::Flex, "flex"),
    (WidgetKind::Array, "array"),
    (WidgetKind::Ref, "$ref"),
    (WidgetKind::OneOf, "one-of"),
    (WidgetKind::None, "none"),
];

impl WidgetKind {
    pub fn as_str(&self) -> &str {
        match self {
            WidgetKind::Custom(name) => name,
            known => NAMED
                .iter()
                .find(|(kind, _)| kind == known)
                .map(|(_, name)| *name)
                .unwrap_or("none"),
        }
    }

    /// Containers hold child nodes rather than a value of their own.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            WidgetKind::Section | WidgetKind::Fieldset | WidgetKind::Flex | WidgetKind::Array
        )
    }

    pub fn is_checkbox_list(&self) -> bool {
        matches!(self, WidgetKind::Checkboxes | WidgetKind::CheckboxesInline)
    }

    pub fn is_single_choice(&self) -> bool {
        matches!(
            self,
            WidgetKind::Radios | WidgetKind::RadiosInline | WidgetKind::Select
        )
    }

    fn inline_variant(self) -> Self {
        match self {
            WidgetKind::Checkboxes => WidgetKind::CheckboxesInline,
            WidgetKind::Radios => WidgetKind::RadiosInline,
            other => other,
        }
    }
}

impl FromStr for WidgetKind {
    type Err = Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(NAMED
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(kind, _)| kind.clone())
            .unwrap_or_else(|| WidgetKind::Custom(name.to_string())))
    }
}

impl From<String> for WidgetKind {
    fn from(name: String) -> Self {
        match name.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<WidgetKind> for String {
    fn from(kind: WidgetKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const WIDGET_POINTERS: [&str; 5] = [
    "/x-schema-form/type",
    "/x-schema-form/widget/component",
    "/x-schema-form/widget",
    "/widget/component",
    "/widget",
];

const SCHEMA_INLINE_POINTERS: [&str; 9] = [
    "/inline",
    "/x-schema-form/inline",
    "/x-schema-form/options/inline",
    "/x-schema-form/widget/inline",
    "/x-schema-form/widget/component/inline",
    "/x-schema-form/widget/component/options/inline",
    "/widget/inline",
    "/widget/component/inline",
    "/widget/component/options/inline",
];

/// Picks the widget for a schema fragment placed by `node`.
///
/// An explicit layout `type` wins, then widget hints embedded in the schema,
/// then the schema's own `type`, `format`, `enum` and bounds.
pub fn resolve_widget(schema: &Value, node: &LayoutNode) -> WidgetKind {
    if let Some(kind) = &node.widget {
        return with_inline(kind.clone(), schema, node);
    }
    if let Some(name) = WIDGET_POINTERS
        .iter()
        .find_map(|pointer| schema.pointer(pointer).and_then(Value::as_str))
    {
        return with_inline(WidgetKind::from(name.to_string()), schema, node);
    }

    let has = |key: &str| schema.get(key).is_some();
    let types = schema_types(schema);
    let primary = if types.len() > 1 {
        if types.contains(&SchemaType::Object) && has("properties") {
            Some(SchemaType::Object)
        } else if types.contains(&SchemaType::Array) && (has("items") || has("additionalItems")) {
            Some(SchemaType::Array)
        } else {
            [
                SchemaType::String,
                SchemaType::Number,
                SchemaType::Integer,
                SchemaType::Boolean,
            ]
            .into_iter()
            .find(|kind| types.contains(kind))
        }
    } else {
        types.first().copied()
    };

    match primary {
        Some(SchemaType::Boolean) => return WidgetKind::Checkbox,
        Some(SchemaType::Object) if has("properties") || has("additionalProperties") => {
            return WidgetKind::Section;
        }
        Some(SchemaType::Object) if has("$ref") => return WidgetKind::Ref,
        Some(SchemaType::Array) => {
            let items = schema
                .get("items")
                .or_else(|| schema.get("additionalItems"));
            let enumerated = items.is_some_and(|items| items.get("enum").is_some());
            let single = schema.get("maxItems").and_then(Value::as_u64) == Some(1);
            return if enumerated && !single {
                with_inline(WidgetKind::Checkboxes, schema, node)
            } else {
                WidgetKind::Array
            };
        }
        Some(SchemaType::Null) => return WidgetKind::None,
        _ => {}
    }

    if let Some(kind) = primary {
        if node.options.title_map.is_some() || has("enum") {
            return WidgetKind::Select;
        }
        match kind {
            SchemaType::Number | SchemaType::Integer => {
                let stepped = kind == SchemaType::Integer || has("multipleOf");
                return if stepped && has("minimum") && has("maximum") {
                    WidgetKind::Range
                } else if kind == SchemaType::Integer {
                    WidgetKind::Integer
                } else {
                    WidgetKind::Number
                };
            }
            SchemaType::String => {
                return match schema.get("format").and_then(Value::as_str) {
                    Some("color") => WidgetKind::Color,
                    Some("date") => WidgetKind::Date,
                    Some("date-time") => WidgetKind::DatetimeLocal,
                    Some("email") => WidgetKind::Email,
                    Some("uri") => WidgetKind::Url,
                    _ => WidgetKind::Text,
                };
            }
            _ => {}
        }
    }

    if has("$ref") {
        return WidgetKind::Ref;
    }
    if schema.get("oneOf").is_some_and(Value::is_array)
        || schema.get("anyOf").is_some_and(Value::is_array)
    {
        return WidgetKind::OneOf;
    }
    tracing::warn!(key = ?node.key, %schema, "unable to determine widget for schema");
    WidgetKind::None
}

fn with_inline(kind: WidgetKind, schema: &Value, node: &LayoutNode) -> WidgetKind {
    if !(kind.as_str().starts_with("checkbox") || kind.as_str().starts_with("radio")) {
        return kind;
    }
    let inline = node.options.inline
        || SCHEMA_INLINE_POINTERS
            .iter()
            .find_map(|pointer| schema.pointer(pointer))
            .and_then(Value::as_bool)
            == Some(true);
    if inline { kind.inline_variant() } else { kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(schema: Value) -> WidgetKind {
        resolve_widget(&schema, &LayoutNode::default())
    }

    #[test]
    fn names_round_trip_through_strings() {
        assert_eq!("radios-inline".parse(), Ok(WidgetKind::RadiosInline));
        assert_eq!(WidgetKind::Ref.to_string(), "$ref");
        assert_eq!(
            WidgetKind::from("star-rating".to_string()),
            WidgetKind::Custom("star-rating".into())
        );
        let parsed: WidgetKind = serde_json::from_value(json!("textarea")).expect("kind");
        assert_eq!(parsed, WidgetKind::Textarea);
    }

    #[test]
    fn resolves_from_schema_type() {
        assert_eq!(resolve(json!({ "type": "boolean" })), WidgetKind::Checkbox);
        assert_eq!(
            resolve(json!({ "type": "object", "properties": {} })),
            WidgetKind::Section
        );
        assert_eq!(resolve(json!({ "type": "null" })), WidgetKind::None);
        assert_eq!(resolve(json!({ "type": "string" })), WidgetKind::Text);
        assert_eq!(
            resolve(json!({ "type": "string", "format": "date" })),
            WidgetKind::Date
        );
        assert_eq!(
            resolve(json!({ "type": "string", "enum": ["a"] })),
            WidgetKind::Select
        );
        assert_eq!(resolve(json!({ "type": "number" })), WidgetKind::Number);
        assert_eq!(
            resolve(json!({ "type": "integer", "minimum": 0, "maximum": 5 })),
            WidgetKind::Range
        );
        assert_eq!(
            resolve(json!({ "type": "number", "minimum": 0, "maximum": 5 })),
            WidgetKind::Number
        );
    }

    #[test]
    fn arrays_of_enums_become_checkboxes() {
        let schema = json!({ "type": "array", "items": { "enum": ["a", "b"] } });
        assert_eq!(resolve(schema), WidgetKind::Checkboxes);
        let single = json!({ "type": "array", "maxItems": 1, "items": { "enum": ["a"] } });
        assert_eq!(resolve(single), WidgetKind::Array);
    }

    #[test]
    fn multiple_types_pick_most_inclusive() {
        assert_eq!(
            resolve(json!({ "type": ["null", "integer", "string"] })),
            WidgetKind::Text
        );
        assert_eq!(
            resolve(json!({ "type": ["null", "integer"] })),
            WidgetKind::Integer
        );
    }

    #[test]
    fn schema_and_layout_hints_win() {
        assert_eq!(
            resolve(json!({ "type": "string", "x-schema-form": { "type": "textarea" } })),
            WidgetKind::Textarea
        );
        assert_eq!(
            resolve(json!({ "type": "string", "widget": { "component": "radios", "inline": true } })),
            WidgetKind::RadiosInline
        );
        let node: LayoutNode =
            serde_json::from_value(json!({ "key": "x", "type": "radios", "inline": true }))
                .expect("node");
        assert_eq!(
            resolve_widget(&json!({ "type": "string" }), &node),
            WidgetKind::RadiosInline
        );
    }

    #[test]
    fn falls_back_to_ref_one_of_and_none() {
        assert_eq!(resolve(json!({ "$ref": "#/definitions/a" })), WidgetKind::Ref);
        assert_eq!(resolve(json!({ "oneOf": [{}] })), WidgetKind::OneOf);
        assert_eq!(resolve(json!({})), WidgetKind::None);
    }
}
