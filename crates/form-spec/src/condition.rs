use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::is_truthy;
use crate::options::WidgetOptions;

const ARRAY_INDEX_TOKEN: &str = "[arrayIndex]";

/// Visibility rule attached to a layout node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Condition {
    /// Object path into the form data, e.g. `model.contact.email` or
    /// `items[arrayIndex].enabled`; visible when the value is truthy.
    Path(String),
    Expr(Expr),
}

/// Small boolean expression language for conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    LiteralBool { value: bool },
    Eq { path: String, value: Value },
    Truthy { path: String },
    And { expressions: Vec<Expr> },
    Or { expressions: Vec<Expr> },
    Not { expression: Box<Expr> },
}

impl Expr {
    pub fn evaluate(&self, data: &Value, data_index: &[usize]) -> bool {
        match self {
            Expr::LiteralBool { value } => *value,
            Expr::Eq { path, value } => lookup_path(data, path, data_index) == Some(value),
            Expr::Truthy { path } => lookup_path(data, path, data_index).is_some_and(is_truthy),
            Expr::And { expressions } => expressions
                .iter()
                .all(|expr| expr.evaluate(data, data_index)),
            Expr::Or { expressions } => expressions
                .iter()
                .any(|expr| expr.evaluate(data, data_index)),
            Expr::Not { expression } => !expression.evaluate(data, data_index),
        }
    }
}

impl Condition {
    pub fn evaluate(&self, data: &Value, data_index: &[usize]) -> bool {
        match self {
            Condition::Path(path) => lookup_path(data, path, data_index).is_some_and(is_truthy),
            Condition::Expr(expr) => expr.evaluate(data, data_index),
        }
    }
}

/// Decides whether a node with these options is visible.
///
/// Nodes without a condition are always visible.
pub fn evaluate_condition(options: &WidgetOptions, data: &Value, data_index: &[usize]) -> bool {
    let Some(condition) = &options.condition else {
        return true;
    };
    let visible = condition.evaluate(data, data_index);
    tracing::trace!(?condition, ?data_index, visible, "evaluated condition");
    visible
}

/// Resolves an object path against the data.
///
/// `[arrayIndex]` is replaced by the innermost data index. A leading `model`
/// segment refers to the data root when the data has no `model` key.
pub fn lookup_path<'a>(data: &'a Value, path: &str, data_index: &[usize]) -> Option<&'a Value> {
    let path = match data_index.last() {
        Some(index) => path.replace(ARRAY_INDEX_TOKEN, &format!("[{index}]")),
        None => path.to_string(),
    };
    let segments = parse_object_path(&path);
    if let Some(found) = walk(data, &segments) {
        return Some(found);
    }
    match segments.split_first() {
        Some((first, rest)) if first == "model" => walk(data, rest),
        _ => None,
    }
}

/// Splits `a.b[0]['c d']` into `["a", "b", "0", "c d"]`.
pub fn parse_object_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '.' => flush(&mut current, &mut segments),
            '[' => {
                flush(&mut current, &mut segments);
                let mut inner = String::new();
                for next in chars.by_ref() {
                    if next == ']' {
                        break;
                    }
                    inner.push(next);
                }
                let inner = inner.trim().trim_matches(|c| c == '\'' || c == '"');
                segments.push(inner.to_string());
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut segments);
    segments
}

fn flush(current: &mut String, segments: &mut Vec<String>) {
    if !current.is_empty() {
        segments.push(std::mem::take(current));
    }
}

fn walk<'a>(data: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(data, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
