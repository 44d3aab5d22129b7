use std::collections::HashMap;

use serde_json::Value;

use super::ast::Expr;
use super::parser::parse_source;
use super::registry;
use crate::errors::{IndexError, Result};
use crate::model::DocumentContext;

/// Read-only binding resolution for expression evaluation
///
/// Implementations expose named roots (`document`, `metadata`, `models`)
/// and never offer mutation; the trait is the whole reachable surface of
/// an expression besides the fixed function table.
pub trait Scope {
    /// Resolve a dotted path to a value, or None when unbound
    fn resolve(&self, path: &[String]) -> Option<Value>;
}

impl Scope for DocumentContext {
    fn resolve(&self, path: &[String]) -> Option<Value> {
        let (root, rest) = path.split_first()?;
        let (key, nested) = rest.split_first()?;
        let base = match root.as_str() {
            "document" => self.property(key)?,
            "metadata" => self.metadata(key)?,
            _ => return None,
        };
        descend(base, nested)
    }
}

fn descend(value: &Value, path: &[String]) -> Option<Value> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current.clone())
}

/// Expression evaluator with a per-pass parse cache
///
/// Template trees are immutable during a reconciliation pass, so each
/// distinct expression string is parsed at most once per evaluator.
#[derive(Debug, Default)]
pub struct Evaluator {
    cache: HashMap<String, Expr>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate an expression against a scope, yielding zero or more values
    ///
    /// A scalar result yields one value, a list fans out to one value per
    /// element, and null or an empty string yields none.
    ///
    /// # Errors
    /// `IndexError::Evaluation` on parse failure, missing binding,
    /// disallowed call, or a result that cannot be materialized as values.
    pub fn evaluate(&mut self, expression: &str, scope: &dyn Scope) -> Result<Vec<String>> {
        let expr = match self.cache.get(expression) {
            Some(cached) => cached.clone(),
            None => {
                let parsed = parse_source(expression).map_err(|cause| wrap(expression, cause))?;
                self.cache.insert(expression.to_string(), parsed.clone());
                parsed
            }
        };

        let value = eval_expr(&expr, scope).map_err(|cause| wrap(expression, cause))?;
        flatten(&value).map_err(|cause| wrap(expression, cause))
    }
}

fn wrap(expression: &str, cause: String) -> IndexError {
    IndexError::Evaluation {
        expression: expression.to_string(),
        cause,
    }
}

fn eval_expr(expr: &Expr, scope: &dyn Scope) -> std::result::Result<Value, String> {
    match expr {
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Int(n) => Ok(Value::Number((*n).into())),
        Expr::Attr(path) => scope
            .resolve(path)
            .ok_or_else(|| format!("missing binding `{}`", path.join("."))),
        Expr::Call { name, args } => {
            let values: std::result::Result<Vec<Value>, String> =
                args.iter().map(|a| eval_expr(a, scope)).collect();
            registry::call_function(name, &values?)
        }
        Expr::Concat(lhs, rhs) => {
            let lhs = scalar(&eval_expr(lhs, scope)?)?;
            let rhs = scalar(&eval_expr(rhs, scope)?)?;
            Ok(Value::String(format!("{}{}", lhs, rhs)))
        }
    }
}

/// Stringify a scalar for concatenation; lists do not concatenate
fn scalar(value: &Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) => Err("cannot concatenate a list".to_string()),
        Value::Object(_) => Err("cannot concatenate an object".to_string()),
    }
}

/// Materialize an evaluation result as index values
///
/// Empty strings are dropped: an instance node keyed by the empty string
/// is meaningless and would collide with the synthetic root's value.
fn flatten(value: &Value) -> std::result::Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Number(n) => Ok(vec![n.to_string()]),
        Value::Bool(b) => Ok(vec![b.to_string()]),
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                out.extend(flatten(item)?);
            }
            Ok(out)
        }
        Value::Object(_) => Err("cannot materialize an object value".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> DocumentContext {
        DocumentContext::new("doc-1")
            .with_property("label", "invoice-2020")
            .with_property("created", "2020-07-01T10:00:00Z")
            .with_metadata("year", "2020")
            .with_metadata("tags", json!(["alpha", "beta"]))
            .with_metadata("empty", "")
    }

    #[test]
    fn test_attribute_access() {
        let mut eval = Evaluator::new();
        assert_eq!(
            eval.evaluate("metadata.year", &ctx()).unwrap(),
            vec!["2020"]
        );
        assert_eq!(
            eval.evaluate("document.label", &ctx()).unwrap(),
            vec!["invoice-2020"]
        );
    }

    #[test]
    fn test_multi_valued_fan_out() {
        let mut eval = Evaluator::new();
        assert_eq!(
            eval.evaluate("metadata.tags", &ctx()).unwrap(),
            vec!["alpha", "beta"]
        );
    }

    #[test]
    fn test_empty_values_yield_nothing() {
        let mut eval = Evaluator::new();
        assert!(eval.evaluate("metadata.empty", &ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_binding_is_an_error() {
        let mut eval = Evaluator::new();
        let err = eval.evaluate("metadata.missing", &ctx()).unwrap_err();
        assert_eq!(err.code(), "ERR_EVALUATION");
        assert!(err.to_string().contains("missing binding"));
    }

    #[test]
    fn test_function_call_and_concat() {
        let mut eval = Evaluator::new();
        assert_eq!(
            eval.evaluate("\"FY-\" + metadata.year", &ctx()).unwrap(),
            vec!["FY-2020"]
        );
        assert_eq!(
            eval.evaluate("year(document.created)", &ctx()).unwrap(),
            vec!["2020"]
        );
        assert_eq!(
            eval.evaluate("upper(first(metadata.tags))", &ctx()).unwrap(),
            vec!["ALPHA"]
        );
    }

    #[test]
    fn test_disallowed_function_is_an_error() {
        let mut eval = Evaluator::new();
        let err = eval.evaluate("eval(\"code\")", &ctx()).unwrap_err();
        assert!(err.to_string().contains("allow-list"));
    }

    #[test]
    fn test_parse_cache_is_reused() {
        let mut eval = Evaluator::new();
        eval.evaluate("metadata.year", &ctx()).unwrap();
        eval.evaluate("metadata.year", &ctx()).unwrap();
        assert_eq!(eval.cache.len(), 1);
    }

    #[test]
    fn test_concat_of_list_is_an_error() {
        let mut eval = Evaluator::new();
        assert!(eval.evaluate("metadata.tags + \"x\"", &ctx()).is_err());
    }
}
