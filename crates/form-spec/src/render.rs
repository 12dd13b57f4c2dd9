use std::collections::BTreeMap;

use handlebars::Handlebars;
use serde_json::{Map, Value, json};

use crate::condition::evaluate_condition;
use crate::config::{FormConfig, Framework};
use crate::date::ParsedDate;
use crate::error::FormError;
use crate::layout::{LayoutItem, LayoutNode, REST_KEY, key_to_pointer};
use crate::options::WidgetOptions;
use crate::schema::{
    deref_schema, join_pointer, pointer_segments, schema_types, sub_schema_in, value_to_display,
};
use crate::title_map::TitleMapItem;
use crate::validator::{ValidationError, ValidationResult, ValidatorFactory};
use crate::widget::{
    Button, CheckboxGroup, DatePicker, FlexStyle, RadioGroup, Slider, WidgetKind, resolve_widget,
};

/// One placed widget in the render plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub key: Option<String>,
    /// Absolute JSON pointer of the bound data; `None` for pure containers.
    pub pointer: Option<String>,
    pub widget: WidgetKind,
    pub title: Option<String>,
    pub options: WidgetOptions,
    pub visible: bool,
    pub value: Option<Value>,
    pub title_map: Option<Vec<TitleMapItem>>,
    pub flex: Option<FlexStyle>,
    pub button: Option<Button>,
    /// Bounds of a `range` widget.
    pub slider: Option<Slider>,
    /// Parsed value of a `date` or `datetime-local` widget.
    pub date: Option<ParsedDate>,
    pub errors: Vec<ValidationError>,
    pub items: Vec<RenderNode>,
}

/// Framework-agnostic widget tree for one form.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub framework: Framework,
    /// Present when the config asked for validation.
    pub validation: Option<ValidationResult>,
    pub nodes: Vec<RenderNode>,
}

impl RenderPlan {
    /// Depth-first search for the node bound to `pointer`.
    pub fn find(&self, pointer: &str) -> Option<&RenderNode> {
        fn search<'a>(nodes: &'a [RenderNode], pointer: &str) -> Option<&'a RenderNode> {
            nodes.iter().find_map(|node| {
                if node.pointer.as_deref() == Some(pointer) {
                    Some(node)
                } else {
                    search(&node.items, pointer)
                }
            })
        }
        search(&self.nodes, pointer)
    }
}

/// Build the render plan from a schema, an optional layout, and form data.
///
/// Without a layout every top-level property is placed in authoring order.
pub fn build_render_plan(
    schema: &Value,
    layout: Option<&[LayoutItem]>,
    data: &Value,
    config: &FormConfig,
) -> Result<RenderPlan, FormError> {
    build_render_plan_with(&ValidatorFactory::new(), schema, layout, data, config)
}

/// Like [`build_render_plan`], resolving `$ref`s against `factory`'s registry
/// for both validation and layout.
pub fn build_render_plan_with(
    factory: &ValidatorFactory,
    schema: &Value,
    layout: Option<&[LayoutItem]>,
    data: &Value,
    config: &FormConfig,
) -> Result<RenderPlan, FormError> {
    let validation = if config.validate {
        Some(factory.compile(schema)?.validate(data))
    } else {
        None
    };

    let nodes = {
        let mut templates = Handlebars::new();
        templates.register_escape_fn(handlebars::no_escape);
        let registry = factory.registry();
        let builder = PlanBuilder {
            data,
            config,
            registry,
            templates,
            errors: validation
                .as_ref()
                .map(|result| result.errors.as_slice())
                .unwrap_or_default(),
        };
        let everything = [LayoutItem::Key(REST_KEY.to_string())];
        let (schema, document) = deref_schema(schema, schema, registry);
        let root = Scope {
            pointer: String::new(),
            schema,
            document,
            data_index: Vec::new(),
        };
        builder.items(layout.unwrap_or(&everything), &root)?
    };
    tracing::debug!(
        nodes = nodes.len(),
        framework = %config.framework,
        validated = validation.is_some(),
        "built render plan"
    );

    Ok(RenderPlan {
        framework: config.framework,
        validation,
        nodes,
    })
}

struct PlanBuilder<'a> {
    data: &'a Value,
    config: &'a FormConfig,
    registry: &'a BTreeMap<String, Value>,
    templates: Handlebars<'static>,
    errors: &'a [ValidationError],
}

struct Scope<'s> {
    pointer: String,
    /// Schema of the bound data, with `$ref`s already followed.
    schema: &'s Value,
    /// Document that `schema` belongs to, for resolving its local `$ref`s.
    document: &'s Value,
    data_index: Vec<usize>,
}

impl<'a> PlanBuilder<'a> {
    fn items(&self, items: &[LayoutItem], scope: &Scope<'a>) -> Result<Vec<RenderNode>, FormError> {
        let mut placed = Vec::new();
        placed_keys(items, &mut placed);

        let mut nodes = Vec::new();
        for item in items {
            match item {
                LayoutItem::Key(key) if key == REST_KEY => {
                    let Some(properties) = scope.schema.get("properties").and_then(Value::as_object)
                    else {
                        continue;
                    };
                    for name in properties.keys() {
                        if !placed.iter().any(|key| key == name) {
                            nodes.push(self.node(&LayoutNode::for_key(property_key(name)), scope)?);
                        }
                    }
                }
                LayoutItem::Key(key) => nodes.push(self.node(&LayoutNode::for_key(key.clone()), scope)?),
                LayoutItem::Node(node) => nodes.push(self.node(node, scope)?),
            }
        }
        Ok(nodes)
    }

    fn node(&self, layout: &LayoutNode, scope: &Scope<'a>) -> Result<RenderNode, FormError> {
        let mut options = self.config.default_options.merged_with(&layout.options);
        let Some(key) = layout.key.as_deref() else {
            return self.container(layout, options, scope);
        };

        let relative = key_to_pointer(key);
        let (schema, document) =
            sub_schema_in(scope.schema, scope.document, &relative, self.registry)
                .ok_or_else(|| FormError::UnknownKey(key.to_string()))?;
        let pointer = format!("{}{relative}", scope.pointer);
        options.inherit_schema(schema);
        if is_required(scope, &relative, self.registry) {
            options.required = true;
        }

        let widget = resolve_widget(schema, layout);
        let value = self.data.pointer(&pointer).cloned();
        let bound = value.clone().unwrap_or(Value::Null);

        let title_map = if widget.is_checkbox_list() {
            if options.enum_list.is_none() {
                options.enum_list = schema
                    .get("items")
                    .map(|items| deref_schema(items, document, self.registry).0)
                    .and_then(|items| items.get("enum"))
                    .and_then(Value::as_array)
                    .cloned();
            }
            let mut group = CheckboxGroup::new(&options);
            group.bind(&bound);
            Some(group.into_items())
        } else if widget.is_single_choice() {
            Some(RadioGroup::new(&options, &schema_types(schema)).into_items())
        } else {
            None
        };

        let title = self.title(options.title.as_deref(), &bound, key, &scope.data_index)?;
        let slider = (widget == WidgetKind::Range).then(|| Slider::from_options(&options));
        let date = DatePicker::for_widget(&widget).and_then(|picker| picker.display(&bound));

        let inner = Scope {
            pointer: pointer.clone(),
            schema,
            document,
            data_index: scope.data_index.clone(),
        };
        let items = if widget == WidgetKind::Array {
            self.array_items(layout, &inner, &bound)?
        } else if widget.is_container() {
            let everything = [LayoutItem::Key(REST_KEY.to_string())];
            let children = if layout.items.is_empty() {
                &everything[..]
            } else {
                &layout.items
            };
            self.items(children, &inner)?
        } else {
            Vec::new()
        };

        Ok(RenderNode {
            key: Some(key.to_string()),
            visible: evaluate_condition(&options, self.data, &scope.data_index),
            errors: self
                .errors
                .iter()
                .filter(|error| error.path == pointer)
                .cloned()
                .collect(),
            pointer: Some(pointer),
            flex: FlexStyle::resolve(&widget, &options),
            button: Button::from_options(&widget, &options),
            slider,
            date,
            widget,
            title,
            options,
            value,
            title_map,
            items,
        })
    }

    fn container(
        &self,
        layout: &LayoutNode,
        options: WidgetOptions,
        scope: &Scope<'a>,
    ) -> Result<RenderNode, FormError> {
        let widget = layout.widget.clone().unwrap_or(WidgetKind::Section);
        let title = self.title(options.title.as_deref(), &Value::Null, "", &scope.data_index)?;
        Ok(RenderNode {
            key: None,
            pointer: None,
            visible: evaluate_condition(&options, self.data, &scope.data_index),
            flex: FlexStyle::resolve(&widget, &options),
            button: Button::from_options(&widget, &options),
            slider: None,
            date: None,
            items: self.items(&layout.items, scope)?,
            widget,
            title,
            options,
            value: None,
            title_map: None,
            errors: Vec::new(),
        })
    }

    /// One child per existing element, laid out with the array node's items.
    fn array_items(
        &self,
        layout: &LayoutNode,
        scope: &Scope<'a>,
        bound: &Value,
    ) -> Result<Vec<RenderNode>, FormError> {
        let Some(elements) = bound.as_array() else {
            return Ok(Vec::new());
        };
        if scope.schema.get("items").is_none() {
            return Ok(Vec::new());
        }

        (0..elements.len())
            .map(|index| {
                let element = LayoutNode {
                    key: Some(format!("[{index}]")),
                    items: layout.items.clone(),
                    ..LayoutNode::default()
                };
                let mut data_index = scope.data_index.clone();
                data_index.push(index);
                let element_scope = Scope {
                    pointer: scope.pointer.clone(),
                    schema: scope.schema,
                    document: scope.document,
                    data_index,
                };
                self.node(&element, &element_scope)
            })
            .collect()
    }

    /// Titles may use `{{idx}}` (1-based), `{{index}}`, `{{value}}`, `{{key}}`
    /// and `{{model.<path>}}`.
    fn title(
        &self,
        title: Option<&str>,
        value: &Value,
        key: &str,
        data_index: &[usize],
    ) -> Result<Option<String>, FormError> {
        let Some(template) = title else {
            return Ok(None);
        };
        if !template.contains("{{") {
            return Ok(Some(template.to_string()));
        }
        let context = json!({
            "idx": data_index.last().map(|index| index + 1),
            "index": data_index.last(),
            "value": value,
            "key": key,
            "model": self.data,
        });
        self.templates
            .render_template(template, &context)
            .map(Some)
            .map_err(|err| FormError::Template {
                template: template.to_string(),
                message: err.to_string(),
            })
    }
}

fn placed_keys<'i>(items: &'i [LayoutItem], placed: &mut Vec<&'i str>) {
    for item in items {
        match item {
            LayoutItem::Key(key) if key != REST_KEY => placed.push(key),
            LayoutItem::Key(_) => {}
            LayoutItem::Node(node) => match node.key.as_deref() {
                Some(key) => placed.push(key),
                None => placed_keys(&node.items, placed),
            },
        }
    }
}

/// Quotes property names that would otherwise parse as paths.
fn property_key(name: &str) -> String {
    if name.contains(['.', '[', ']']) {
        format!("['{name}']")
    } else {
        name.to_string()
    }
}

fn is_required(scope: &Scope<'_>, relative: &str, registry: &BTreeMap<String, Value>) -> bool {
    let mut segments = pointer_segments(relative);
    let Some(name) = segments.pop() else {
        return false;
    };
    sub_schema_in(scope.schema, scope.document, &join_pointer(segments), registry)
        .and_then(|(owner, _)| owner.get("required"))
        .and_then(Value::as_array)
        .is_some_and(|required| required.iter().any(|entry| entry.as_str() == Some(&name)))
}

/// Render the plan as a structured JSON-friendly value.
pub fn render_json_ui(plan: &RenderPlan) -> Value {
    let (valid, errors) = match &plan.validation {
        Some(result) => (Value::Bool(result.valid), json!(result.errors)),
        None => (Value::Null, Value::Array(Vec::new())),
    };
    json!({
        "framework": plan.framework.as_str(),
        "valid": valid,
        "errors": errors,
        "nodes": plan.nodes.iter().map(node_json).collect::<Vec<_>>(),
    })
}

fn node_json(node: &RenderNode) -> Value {
    let mut map = Map::new();
    if let Some(key) = &node.key {
        map.insert("key".into(), Value::String(key.clone()));
    }
    if let Some(pointer) = &node.pointer {
        map.insert("pointer".into(), Value::String(pointer.clone()));
    }
    map.insert("widget".into(), Value::String(node.widget.to_string()));
    map.insert(
        "title".into(),
        node.title.clone().map(Value::String).unwrap_or(Value::Null),
    );
    if let Some(description) = &node.options.description {
        map.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(placeholder) = &node.options.placeholder {
        map.insert("placeholder".into(), Value::String(placeholder.clone()));
    }
    if let Some(class) = &node.options.html_class {
        map.insert("htmlClass".into(), Value::String(class.clone()));
    }
    map.insert("required".into(), Value::Bool(node.options.required));
    map.insert("readonly".into(), Value::Bool(node.options.readonly));
    map.insert("notitle".into(), Value::Bool(node.options.notitle));
    map.insert("visible".into(), Value::Bool(node.visible));
    if let Some(value) = &node.value {
        map.insert("value".into(), value.clone());
    }
    if let Some(items) = &node.title_map {
        map.insert("titleMap".into(), json!(items));
    }
    if let Some(slider) = &node.slider {
        map.insert(
            "range".into(),
            json!({
                "min": slider.min,
                "max": slider.max,
                "step": slider.step,
            }),
        );
    }
    if let Some(date) = &node.date {
        let picker = DatePicker::for_widget(&node.widget).unwrap_or_default();
        map.insert(
            "date".into(),
            json!({
                "value": picker.format(date),
                "long": date.to_long_string(),
            }),
        );
    }
    if let Some(flex) = &node.flex {
        map.insert("flex".into(), json!(flex));
    }
    if let Some(button) = &node.button {
        map.insert("button".into(), json!(button));
    }
    if !node.errors.is_empty() {
        map.insert("errors".into(), json!(node.errors));
    }
    if !node.items.is_empty() {
        map.insert(
            "items".into(),
            Value::Array(node.items.iter().map(node_json).collect()),
        );
    }
    Value::Object(map)
}

/// Render the plan as human-friendly text.
pub fn render_text(plan: &RenderPlan) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Framework: {}", plan.framework));
    match &plan.validation {
        Some(result) if result.valid => lines.push("Validation: valid".to_string()),
        Some(result) => lines.push(format!("Validation: {} error(s)", result.errors.len())),
        None => lines.push("Validation: skipped".to_string()),
    }
    lines.push("Widgets:".to_string());
    for node in &plan.nodes {
        node_lines(node, 1, &mut lines);
    }
    lines.join("\n")
}

fn node_lines(node: &RenderNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let label = node
        .title
        .clone()
        .or_else(|| node.key.clone())
        .unwrap_or_else(|| node.widget.to_string());
    let mut entry = format!("{indent}- {label} [{}]", node.widget);
    if let Some(pointer) = &node.pointer {
        entry.push_str(&format!(" ({pointer})"));
    }
    if node.options.required {
        entry.push_str(" [required]");
    }
    if !node.visible {
        entry.push_str(" [hidden]");
    }
    if let Some(date) = &node.date {
        entry.push_str(&format!(" = {}", date.to_long_string()));
    } else if let Some(value) = node.value.as_ref().filter(|_| node.items.is_empty()) {
        entry.push_str(&format!(" = {}", value_to_display(value)));
    }
    lines.push(entry);

    if let Some(items) = &node.title_map {
        let choices = items
            .iter()
            .map(|item| {
                let mark = if item.checked { "*" } else { "" };
                format!("{mark}{}", item.name)
            })
            .collect::<Vec<_>>();
        lines.push(format!("{indent}  choices: {}", choices.join(", ")));
    }
    for error in &node.errors {
        lines.push(format!("{indent}  ! {}", error.message));
    }
    for child in &node.items {
        node_lines(child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_flag_follows_owner_schema() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "address": {
                    "type": "object",
                    "required": ["city"],
                    "properties": { "city": { "type": "string" } }
                }
            }
        });
        let scope = Scope {
            pointer: String::new(),
            schema: &schema,
            document: &schema,
            data_index: Vec::new(),
        };
        let registry = BTreeMap::new();
        assert!(is_required(&scope, "/name", &registry));
        assert!(is_required(&scope, "/address/city", &registry));
        assert!(!is_required(&scope, "/address", &registry));
    }

    #[test]
    fn dotted_property_names_are_quoted() {
        assert_eq!(property_key("name"), "name");
        assert_eq!(property_key("a.b"), "['a.b']");
        assert_eq!(key_to_pointer(&property_key("a.b")), "/a.b");
    }

    #[test]
    fn placed_keys_skip_rest_and_descend_into_groups() {
        let items: Vec<LayoutItem> = serde_json::from_value(json!([
            "*",
            "a",
            { "type": "fieldset", "items": ["b", { "key": "c" }] }
        ]))
        .expect("layout");
        let mut placed = Vec::new();
        placed_keys(&items, &mut placed);
        assert_eq!(placed, vec!["a", "b", "c"]);
    }
}
