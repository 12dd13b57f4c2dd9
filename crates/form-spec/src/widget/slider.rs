use serde_json::Value;

use crate::coerce::{number_value, to_schema_type};
use crate::options::WidgetOptions;
use crate::schema::SchemaType;

/// Range control bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for Slider {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            step: 1.0,
        }
    }
}

impl Slider {
    pub fn from_options(options: &WidgetOptions) -> Self {
        let fallback = Self::default();
        let min = options.minimum.unwrap_or(fallback.min);
        Self {
            min,
            max: options.maximum.unwrap_or(fallback.max).max(min),
            step: options
                .step
                .filter(|step| *step > 0.0)
                .unwrap_or(fallback.step),
        }
    }

    /// Coerces a control value, snaps it to the step grid and clamps it.
    ///
    /// Values that do not coerce to a number are returned as coerced.
    pub fn update(&self, raw: &Value, types: &[SchemaType]) -> Value {
        let types = if types.is_empty() {
            &[SchemaType::Number][..]
        } else {
            types
        };
        let coerced = to_schema_type(raw, types);
        let Some(number) = coerced.as_f64() else {
            return coerced;
        };

        let snapped = self.min + ((number - self.min) / self.step).round() * self.step;
        let mut clamped = snapped.clamp(self.min, self.max);
        if types.contains(&SchemaType::Integer) && !types.contains(&SchemaType::Number) {
            clamped = clamped.round();
        }
        number_value(clamped).unwrap_or(coerced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_without_bounds() {
        let slider = Slider::from_options(&WidgetOptions::default());
        assert_eq!(slider, Slider::default());
        assert_eq!(slider.update(&json!("42"), &[]), json!(42));
        assert_eq!(slider.update(&json!(250), &[]), json!(100));
        assert_eq!(slider.update(&json!(-3), &[]), json!(0));
    }

    #[test]
    fn snaps_to_step_from_minimum() {
        let mut options: WidgetOptions =
            serde_json::from_value(json!({ "minimum": 1, "maximum": 10, "multipleOf": 0.5 }))
                .expect("options");
        options.inherit_schema(&json!({}));
        let slider = Slider::from_options(&options);
        assert_eq!(slider.step, 0.5);
        assert_eq!(slider.update(&json!(3.3), &[SchemaType::Number]), json!(3.5));
        assert_eq!(slider.update(&json!("4"), &[SchemaType::Integer]), json!(4));
    }

    #[test]
    fn non_numeric_values_pass_through() {
        let slider = Slider::default();
        assert_eq!(
            slider.update(&json!(""), &[SchemaType::Number, SchemaType::Null]),
            Value::Null
        );
    }
}
