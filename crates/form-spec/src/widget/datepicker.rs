use serde_json::Value;

use crate::date::{ParsedDate, parse_date, parse_date_value};
use crate::widget::WidgetKind;

/// Date input bound to an ISO string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatePicker {
    /// Store full timestamps instead of calendar dates.
    pub with_time: bool,
}

impl DatePicker {
    pub fn date() -> Self {
        Self { with_time: false }
    }

    pub fn date_time() -> Self {
        Self { with_time: true }
    }

    /// Picker for the date widgets; other widgets get `None`.
    pub fn for_widget(kind: &WidgetKind) -> Option<Self> {
        match kind {
            WidgetKind::Date => Some(Self::date()),
            WidgetKind::DatetimeLocal => Some(Self::date_time()),
            _ => None,
        }
    }

    pub fn display(&self, value: &Value) -> Option<ParsedDate> {
        parse_date_value(value)
    }

    /// Stored text for a date.
    pub fn format(&self, date: &ParsedDate) -> String {
        if self.with_time {
            date.to_iso_string()
        } else {
            date.to_iso_date()
        }
    }

    /// Parses typed text; unparseable text clears the value.
    pub fn update(&self, text: &str) -> Value {
        parse_date(Some(text))
            .map(|date| Value::String(self.format(&date)))
            .unwrap_or(Value::Null)
    }
}
