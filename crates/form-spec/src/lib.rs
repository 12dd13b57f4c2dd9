#![allow(missing_docs)]

pub mod coerce;
pub mod condition;
pub mod config;
pub mod date;
pub mod error;
pub mod layout;
pub mod options;
pub mod render;
pub mod schema;
pub mod title_map;
pub mod validator;
pub mod widget;

pub use coerce::{coerce_to_schema, to_json_type, to_schema_type};
pub use condition::{Condition, Expr, evaluate_condition};
pub use config::{FormConfig, Framework};
pub use date::{ParsedDate, ordinal_suffix, parse_date, parse_date_value};
pub use error::{FormError, SchemaError};
pub use layout::{LayoutItem, LayoutNode};
pub use options::WidgetOptions;
pub use render::{
    RenderNode, RenderPlan, build_render_plan, build_render_plan_with, render_json_ui, render_text,
};
pub use schema::SchemaType;
pub use title_map::{ChoiceMode, TitleMapItem, TitleMapSource, build_title_map};
pub use validator::{ValidationError, ValidationResult, Validator, ValidatorFactory};
pub use widget::{
    Button, CheckboxGroup, DatePicker, FlexStyle, RadioGroup, Slider, WidgetKind, checkbox_value,
    resolve_widget,
};
