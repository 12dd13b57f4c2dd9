use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::options::WidgetOptions;
use crate::schema::value_to_display;

/// One label/value pair offered by a choice widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TitleMapItem {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub checked: bool,
}

impl TitleMapItem {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            checked: false,
        }
    }

    fn from_value(value: &Value) -> Self {
        Self::new(value_to_display(value), value.clone())
    }
}

/// Author-supplied labels for a choice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TitleMapSource {
    /// `[{ "name": .., "value": .. }]`
    Items(Vec<TitleMapItem>),
    /// Labels parallel to the enum list (`enumNames`).
    Names(Vec<String>),
    /// `{ "<value>": "<label>" }`, in authoring order.
    Keyed(Map<String, Value>),
}

/// Whether the widget picks one value or a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceMode {
    Single,
    Multiple,
}

/// Builds the ordered choice list for a widget.
///
/// An explicit title map decides order and labels; enum values it does not
/// mention are appended in enum order. Duplicate values keep their first
/// entry. Optional single-choice fields get a leading blank entry unless an
/// entry already carries a null value.
pub fn build_title_map(
    title_map: Option<&TitleMapSource>,
    enum_list: Option<&[Value]>,
    field_required: bool,
    mode: ChoiceMode,
) -> Vec<TitleMapItem> {
    let mut items: Vec<TitleMapItem> = Vec::new();
    let push = |item: TitleMapItem, items: &mut Vec<TitleMapItem>| {
        if !items.iter().any(|existing| existing.value == item.value) {
            items.push(TitleMapItem {
                checked: false,
                ..item
            });
        }
    };

    match (title_map, enum_list) {
        (Some(TitleMapSource::Items(entries)), _) => {
            for entry in entries {
                push(entry.clone(), &mut items);
            }
        }
        (Some(TitleMapSource::Names(names)), Some(values)) => {
            for (index, value) in values.iter().enumerate() {
                let item = match names.get(index) {
                    Some(name) => TitleMapItem::new(name.clone(), value.clone()),
                    None => TitleMapItem::from_value(value),
                };
                push(item, &mut items);
            }
        }
        (Some(TitleMapSource::Names(names)), None) => {
            for name in names {
                push(
                    TitleMapItem::new(name.clone(), Value::String(name.clone())),
                    &mut items,
                );
            }
        }
        (Some(TitleMapSource::Keyed(entries)), values) => {
            for (key, label) in entries {
                let value = values
                    .and_then(|values| values.iter().find(|value| value_to_display(value) == *key))
                    .cloned()
                    .unwrap_or_else(|| Value::String(key.clone()));
                push(TitleMapItem::new(value_to_display(label), value), &mut items);
            }
        }
        (None, _) => {}
    }

    for value in enum_list.unwrap_or_default() {
        push(TitleMapItem::from_value(value), &mut items);
    }

    let has_empty_value = items.iter().any(|item| item.value.is_null());
    if !field_required && mode == ChoiceMode::Single && !has_empty_value {
        items.insert(0, TitleMapItem::new("", Value::Null));
    }

    items
}

/// Builds the choice list described by a widget's options.
///
/// `titleMap` wins over `enumNames`; both pair with `enum`.
pub fn title_map_for(options: &WidgetOptions, mode: ChoiceMode) -> Vec<TitleMapItem> {
    let names = options.enum_names.clone().map(TitleMapSource::Names);
    let source = options.title_map.as_ref().or(names.as_ref());
    build_title_map(
        source,
        options.enum_list.as_deref(),
        options.required,
        mode,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(items: &[TitleMapItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    #[test]
    fn enum_only_uses_value_text() {
        let values = [json!("red"), json!(2), json!(true)];
        let items = build_title_map(None, Some(&values), true, ChoiceMode::Single);
        assert_eq!(names(&items), vec!["red", "2", "true"]);
        assert_eq!(items[1].value, json!(2));
    }

    #[test]
    fn explicit_items_keep_order_and_append_missing_enum_values() {
        let source: TitleMapSource = serde_json::from_value(json!([
            { "name": "Blue", "value": "b" },
            { "name": "Extra", "value": "x" },
            { "name": "Red", "value": "r" }
        ]))
        .expect("title map");
        let values = [json!("r"), json!("g"), json!("b")];
        let items = build_title_map(Some(&source), Some(&values), true, ChoiceMode::Multiple);
        assert_eq!(names(&items), vec!["Blue", "Extra", "Red", "g"]);
    }

    #[test]
    fn enum_names_pair_by_index() {
        let source = TitleMapSource::Names(vec!["One".into(), "Two".into(), "Three".into()]);
        let values = [json!(1), json!(2)];
        let items = build_title_map(Some(&source), Some(&values), true, ChoiceMode::Single);
        assert_eq!(names(&items), vec!["One", "Two"]);

        let values = [json!(1), json!(2), json!(3), json!(4)];
        let items = build_title_map(Some(&source), Some(&values), true, ChoiceMode::Single);
        assert_eq!(names(&items), vec!["One", "Two", "Three", "4"]);
    }

    #[test]
    fn keyed_map_resolves_typed_enum_values() {
        let source: TitleMapSource =
            serde_json::from_value(json!({ "2": "Two", "1": "One" })).expect("keyed");
        let values = [json!(1), json!(2)];
        let items = build_title_map(Some(&source), Some(&values), true, ChoiceMode::Single);
        assert_eq!(names(&items), vec!["Two", "One"]);
        assert_eq!(items[0].value, json!(2));
    }

    #[test]
    fn optional_single_choice_gets_blank_entry() {
        let values = [json!("a"), json!("b")];
        let items = build_title_map(None, Some(&values), false, ChoiceMode::Single);
        assert_eq!(items[0], TitleMapItem::new("", Value::Null));
        assert_eq!(items.len(), 3);

        let multi = build_title_map(None, Some(&values), false, ChoiceMode::Multiple);
        assert_eq!(multi.len(), 2);

        let with_null = [Value::Null, json!("a")];
        let items = build_title_map(None, Some(&with_null), false, ChoiceMode::Single);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn empty_inputs_yield_empty_list() {
        assert!(build_title_map(None, None, true, ChoiceMode::Single).is_empty());
    }

    #[test]
    fn duplicates_keep_first_entry() {
        let values = [json!("a"), json!("a"), json!("b")];
        let items = build_title_map(None, Some(&values), true, ChoiceMode::Multiple);
        assert_eq!(names(&items), vec!["a", "b"]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let source = TitleMapSource::Names(vec!["Low".into(), "High".into()]);
        let values = [json!("lo"), json!("hi")];
        let first = build_title_map(Some(&source), Some(&values), false, ChoiceMode::Single);
        let second = build_title_map(Some(&source), Some(&values), false, ChoiceMode::Single);
        assert_eq!(first, second);
    }
}
