use serde_json::Value;

use crate::coerce::{coerce, to_schema_type};
use crate::options::WidgetOptions;
use crate::schema::{SchemaType, values_equal};
use crate::title_map::{ChoiceMode, TitleMapItem, title_map_for};

/// Multi-select checkbox list bound to an array value.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckboxGroup {
    items: Vec<TitleMapItem>,
}

impl CheckboxGroup {
    /// Checkbox lists never offer a blank entry.
    pub fn new(options: &WidgetOptions) -> Self {
        Self {
            items: title_map_for(options, ChoiceMode::Multiple),
        }
    }

    /// Marks the items whose values appear in `current`.
    pub fn bind(&mut self, current: &Value) {
        let selected = current.as_array().map(Vec::as_slice).unwrap_or_default();
        for item in &mut self.items {
            item.checked = selected.iter().any(|value| values_equal(value, &item.value));
        }
    }

    /// Sets one item's flag and returns the resulting array value.
    pub fn toggle(&mut self, value: &Value, checked: bool) -> Value {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| values_equal(&item.value, value))
        {
            item.checked = checked;
        }
        self.value()
    }

    /// Checked values in list order.
    pub fn value(&self) -> Value {
        Value::Array(
            self.items
                .iter()
                .filter(|item| item.checked)
                .map(|item| item.value.clone())
                .collect(),
        )
    }

    pub fn items(&self) -> &[TitleMapItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TitleMapItem> {
        self.items
    }
}

/// Single-choice list shared by radio buttons and selects.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioGroup {
    items: Vec<TitleMapItem>,
    types: Vec<SchemaType>,
}

impl RadioGroup {
    pub fn new(options: &WidgetOptions, types: &[SchemaType]) -> Self {
        Self {
            items: title_map_for(options, ChoiceMode::Single),
            types: types.to_vec(),
        }
    }

    /// Coerces a raw control value and accepts it only if it is offered.
    pub fn select(&self, raw: &Value) -> Option<Value> {
        let value = if self.types.is_empty() {
            raw.clone()
        } else {
            to_schema_type(raw, &self.types)
        };
        self.items
            .iter()
            .find(|item| values_equal(&item.value, &value))
            .map(|item| item.value.clone())
    }

    pub fn items(&self) -> &[TitleMapItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TitleMapItem> {
        self.items
    }
}

/// Reads a single checkbox's state from its bound value.
pub fn checkbox_value(current: &Value) -> bool {
    coerce(current, SchemaType::Boolean).and_then(|flag| flag.as_bool()) == Some(true)
}
