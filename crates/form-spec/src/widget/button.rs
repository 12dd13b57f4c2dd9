use serde::Serialize;

use crate::options::WidgetOptions;
use crate::widget::WidgetKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub submit: bool,
}

impl Button {
    /// Returns `None` for widgets that are not buttons.
    pub fn from_options(kind: &WidgetKind, options: &WidgetOptions) -> Option<Self> {
        let submit = match kind {
            WidgetKind::Submit => true,
            WidgetKind::Button => false,
            _ => return None,
        };
        let label = options
            .title
            .clone()
            .unwrap_or_else(|| if submit { "Submit" } else { "Button" }.to_string());
        Some(Self { label, submit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_default_by_kind() {
        let options = WidgetOptions::default();
        assert_eq!(
            Button::from_options(&WidgetKind::Submit, &options),
            Some(Button {
                label: "Submit".into(),
                submit: true
            })
        );
        let titled = WidgetOptions {
            title: Some("Reset".into()),
            ..WidgetOptions::default()
        };
        let button = Button::from_options(&WidgetKind::Button, &titled).expect("button");
        assert_eq!(button.label, "Reset");
        assert!(!button.submit);
        assert!(Button::from_options(&WidgetKind::Text, &options).is_none());
    }
}
