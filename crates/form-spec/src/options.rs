use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::title_map::TitleMapSource;

/// Display and behaviour flags recognised on a layout node.
///
/// Every field defaults to "unset" (or `false`); [`WidgetOptions::inherit_schema`]
/// fills unset fields from the schema fragment the node is bound to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub notitle: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_list: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_map: Option<TitleMapSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub display_flex: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(rename = "flex-flow", default, skip_serializing_if = "Option::is_none")]
    pub flex_flow: Option<String>,
    #[serde(rename = "flex-direction", default, skip_serializing_if = "Option::is_none")]
    pub flex_direction: Option<String>,
    #[serde(rename = "flex-wrap", default, skip_serializing_if = "Option::is_none")]
    pub flex_wrap: Option<String>,
    #[serde(rename = "justify-content", default, skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<String>,
    #[serde(rename = "align-items", default, skip_serializing_if = "Option::is_none")]
    pub align_items: Option<String>,
    #[serde(rename = "align-content", default, skip_serializing_if = "Option::is_none")]
    pub align_content: Option<String>,
}

impl WidgetOptions {
    /// Fills unset fields from a schema fragment. Values already set win.
    pub fn inherit_schema(&mut self, schema: &Value) {
        let text = |key: &str| schema.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| schema.get(key).and_then(Value::as_f64);

        self.title = self.title.take().or_else(|| text("title"));
        self.description = self.description.take().or_else(|| text("description"));
        self.enum_list = self
            .enum_list
            .take()
            .or_else(|| schema.get("enum").and_then(Value::as_array).cloned());
        self.enum_names = self.enum_names.take().or_else(|| {
            schema.get("enumNames").and_then(Value::as_array).map(|names| {
                names
                    .iter()
                    .map(crate::schema::value_to_display)
                    .collect()
            })
        });
        self.minimum = self.minimum.or_else(|| number("minimum"));
        self.maximum = self.maximum.or_else(|| number("maximum"));
        self.multiple_of = self.multiple_of.or_else(|| number("multipleOf"));
        self.step = self.step.or(self.multiple_of);
        if schema.get("readOnly").and_then(Value::as_bool) == Some(true) {
            self.readonly = true;
        }
    }

    /// Overlays `other` on top of `self`: set fields in `other` win.
    pub fn merged_with(&self, other: &WidgetOptions) -> WidgetOptions {
        WidgetOptions {
            title: other.title.clone().or_else(|| self.title.clone()),
            description: other.description.clone().or_else(|| self.description.clone()),
            html_class: other.html_class.clone().or_else(|| self.html_class.clone()),
            placeholder: other.placeholder.clone().or_else(|| self.placeholder.clone()),
            readonly: self.readonly || other.readonly,
            required: self.required || other.required,
            notitle: self.notitle || other.notitle,
            inline: self.inline || other.inline,
            enum_list: other.enum_list.clone().or_else(|| self.enum_list.clone()),
            enum_names: other.enum_names.clone().or_else(|| self.enum_names.clone()),
            title_map: other.title_map.clone().or_else(|| self.title_map.clone()),
            minimum: other.minimum.or(self.minimum),
            maximum: other.maximum.or(self.maximum),
            step: other.step.or(self.step),
            multiple_of: other.multiple_of.or(self.multiple_of),
            condition: other.condition.clone().or_else(|| self.condition.clone()),
            display_flex: self.display_flex || other.display_flex,
            display: other.display.clone().or_else(|| self.display.clone()),
            flex_flow: other.flex_flow.clone().or_else(|| self.flex_flow.clone()),
            flex_direction: other
                .flex_direction
                .clone()
                .or_else(|| self.flex_direction.clone()),
            flex_wrap: other.flex_wrap.clone().or_else(|| self.flex_wrap.clone()),
            justify_content: other
                .justify_content
                .clone()
                .or_else(|| self.justify_content.clone()),
            align_items: other.align_items.clone().or_else(|| self.align_items.clone()),
            align_content: other
                .align_content
                .clone()
                .or_else(|| self.align_content.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_and_kebab_names() {
        let options: WidgetOptions = serde_json::from_value(json!({
            "title": "Colour",
            "htmlClass": "wide",
            "enum": ["r", "g"],
            "enumNames": ["Red", "Green"],
            "flex-flow": "row wrap",
            "displayFlex": true
        }))
        .expect("options");
        assert_eq!(options.html_class.as_deref(), Some("wide"));
        assert_eq!(options.enum_list, Some(vec![json!("r"), json!("g")]));
        assert_eq!(options.flex_flow.as_deref(), Some("row wrap"));
        assert!(options.display_flex);
        assert!(!options.required);
    }

    #[test]
    fn inherit_schema_keeps_explicit_values() {
        let mut options = WidgetOptions {
            title: Some("Custom".into()),
            ..Default::default()
        };
        options.inherit_schema(&json!({
            "title": "Schema title",
            "description": "From schema",
            "minimum": 1,
            "maximum": 9,
            "multipleOf": 0.5,
            "readOnly": true,
            "enum": [1, 2],
            "enumNames": ["one", "two"]
        }));
        assert_eq!(options.title.as_deref(), Some("Custom"));
        assert_eq!(options.description.as_deref(), Some("From schema"));
        assert_eq!((options.minimum, options.maximum), (Some(1.0), Some(9.0)));
        assert_eq!(options.step, Some(0.5));
        assert!(options.readonly);
        assert_eq!(
            options.enum_names,
            Some(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn merged_with_prefers_overlay() {
        let base = WidgetOptions {
            html_class: Some("base".into()),
            placeholder: Some("type here".into()),
            ..Default::default()
        };
        let overlay = WidgetOptions {
            html_class: Some("overlay".into()),
            readonly: true,
            ..Default::default()
        };
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.html_class.as_deref(), Some("overlay"));
        assert_eq!(merged.placeholder.as_deref(), Some("type here"));
        assert!(merged.readonly);
    }
}
