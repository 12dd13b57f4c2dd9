use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::options::WidgetOptions;

/// CSS framework the host renders with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Framework {
    #[serde(rename = "bootstrap-3")]
    Bootstrap3,
    #[default]
    #[serde(rename = "bootstrap-4")]
    Bootstrap4,
    #[serde(rename = "material")]
    Material,
    #[serde(rename = "none")]
    None,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Bootstrap3 => "bootstrap-3",
            Framework::Bootstrap4 => "bootstrap-4",
            Framework::Material => "material",
            Framework::None => "none",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form-wide settings applied when building a render plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default)]
    pub framework: Framework,
    /// Validate the data and attach errors to the plan.
    #[serde(default = "default_validate")]
    pub validate: bool,
    /// Options merged under every layout node.
    #[serde(default)]
    pub default_options: WidgetOptions,
}

fn default_validate() -> bool {
    true
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            framework: Framework::default(),
            validate: default_validate(),
            default_options: WidgetOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let config: FormConfig = serde_json::from_value(json!({})).expect("config");
        assert_eq!(config, FormConfig::default());
        assert_eq!(config.framework, Framework::Bootstrap4);
        assert!(config.validate);
    }

    #[test]
    fn reads_framework_and_default_options() {
        let config: FormConfig = serde_json::from_value(json!({
            "framework": "material",
            "validate": false,
            "defaultOptions": { "notitle": true }
        }))
        .expect("config");
        assert_eq!(config.framework.to_string(), "material");
        assert!(!config.validate);
        assert!(config.default_options.notitle);
    }
}
