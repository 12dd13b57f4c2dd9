use serde::Serialize;

use crate::options::WidgetOptions;
use crate::widget::WidgetKind;

/// CSS flexbox properties for a container node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlexStyle {
    pub display: String,
    pub flex_direction: String,
    pub flex_wrap: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_content: Option<String>,
}

impl FlexStyle {
    /// Flex applies to `flex` nodes and to nodes asking for `display: flex`.
    ///
    /// `flex-flow` is split into direction and wrap first; explicit
    /// `flex-direction`/`flex-wrap` fill what it leaves unset.
    pub fn resolve(kind: &WidgetKind, options: &WidgetOptions) -> Option<Self> {
        let active = *kind == WidgetKind::Flex
            || options.display_flex
            || options.display.as_deref() == Some("flex");
        if !active {
            return None;
        }

        let mut flow = options
            .flex_flow
            .as_deref()
            .unwrap_or_default()
            .split_whitespace();
        let flow_direction = flow.next().map(str::to_string);
        let flow_wrap = flow.next().map(str::to_string);

        Some(Self {
            display: "flex".to_string(),
            flex_direction: flow_direction
                .or_else(|| options.flex_direction.clone())
                .unwrap_or_else(|| "column".to_string()),
            flex_wrap: flow_wrap
                .or_else(|| options.flex_wrap.clone())
                .unwrap_or_else(|| "nowrap".to_string()),
            justify_content: options.justify_content.clone(),
            align_items: options.align_items.clone(),
            align_content: options.align_content.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: serde_json::Value) -> WidgetOptions {
        serde_json::from_value(value).expect("options")
    }

    #[test]
    fn inactive_without_flex_hint() {
        assert!(FlexStyle::resolve(&WidgetKind::Section, &WidgetOptions::default()).is_none());
    }

    #[test]
    fn defaults_to_column_nowrap() {
        let style = FlexStyle::resolve(&WidgetKind::Flex, &WidgetOptions::default())
            .expect("flex");
        assert_eq!(style.flex_direction, "column");
        assert_eq!(style.flex_wrap, "nowrap");
    }

    #[test]
    fn flex_flow_wins_over_explicit_properties() {
        let style = FlexStyle::resolve(
            &WidgetKind::Section,
            &options(json!({
                "displayFlex": true,
                "flex-flow": "row wrap",
                "flex-direction": "column-reverse",
                "justify-content": "space-between"
            })),
        )
        .expect("flex");
        assert_eq!(style.flex_direction, "row");
        assert_eq!(style.flex_wrap, "wrap");
        assert_eq!(style.justify_content.as_deref(), Some("space-between"));

        let explicit = FlexStyle::resolve(
            &WidgetKind::Fieldset,
            &options(json!({ "display": "flex", "flex-direction": "row" })),
        )
        .expect("flex");
        assert_eq!(explicit.flex_direction, "row");
        assert_eq!(explicit.flex_wrap, "nowrap");
    }
}
