//! Fixed allow-list registries
//!
//! The original system resolved expressions against open tables of
//! functions, models, and validators. Here each table is a closed match:
//! nothing outside it is reachable from an expression, and the tables are
//! not extensible at runtime (the model registry's choice sets are
//! registered once at startup by the host).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use super::interp::Scope;

// ===== Function table (AVAILABLE_FUNCTIONS) =====

/// Invoke an allow-listed function
///
/// Errors are plain causes; the evaluator wraps them with the offending
/// expression.
pub(crate) fn call_function(name: &str, args: &[Value]) -> Result<Value, String> {
    match name {
        "upper" => unary_str(name, args).map(|s| Value::String(s.to_uppercase())),
        "lower" => unary_str(name, args).map(|s| Value::String(s.to_lowercase())),
        "trim" => unary_str(name, args).map(|s| Value::String(s.trim().to_string())),
        "slice" => {
            if args.len() != 3 {
                return Err(arity(name, 3, args.len()));
            }
            let s = as_str(name, &args[0])?;
            let start = as_int(name, &args[1])?.max(0) as usize;
            let end = as_int(name, &args[2])?.max(0) as usize;
            let chars: Vec<char> = s.chars().collect();
            let start = start.min(chars.len());
            let end = end.clamp(start, chars.len());
            Ok(Value::String(chars[start..end].iter().collect()))
        }
        "first" => {
            if args.len() != 1 {
                return Err(arity(name, 1, args.len()));
            }
            match &args[0] {
                Value::Array(items) => Ok(items.first().cloned().unwrap_or(Value::Null)),
                other => Ok(other.clone()),
            }
        }
        "coalesce" => {
            for arg in args {
                match arg {
                    Value::Null => continue,
                    Value::String(s) if s.is_empty() => continue,
                    other => return Ok(other.clone()),
                }
            }
            Ok(Value::Null)
        }
        "join" => {
            if args.len() != 2 {
                return Err(arity(name, 2, args.len()));
            }
            let sep = as_str(name, &args[1])?;
            match &args[0] {
                Value::Array(items) => {
                    let parts: Result<Vec<String>, String> =
                        items.iter().map(|v| as_str(name, v)).collect();
                    Ok(Value::String(parts?.join(&sep)))
                }
                other => as_str(name, other).map(Value::String),
            }
        }
        "year" => date_part(name, args, |d| format!("{:04}", d.0)),
        "month" => date_part(name, args, |d| format!("{:02}", d.1)),
        "today" => {
            if !args.is_empty() {
                return Err(arity(name, 0, args.len()));
            }
            Ok(Value::String(Utc::now().date_naive().to_string()))
        }
        _ => Err(format!("function `{}` is not in the allow-list", name)),
    }
}

fn unary_str(name: &str, args: &[Value]) -> Result<String, String> {
    if args.len() != 1 {
        return Err(arity(name, 1, args.len()));
    }
    as_str(name, &args[0])
}

fn arity(name: &str, want: usize, got: usize) -> String {
    format!("{}() takes {} argument(s), got {}", name, want, got)
}

fn as_str(name: &str, value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!(
            "{}() expects a scalar, got {}",
            name,
            kind_of(other)
        )),
    }
}

fn as_int(name: &str, value: &Value) -> Result<i64, String> {
    value
        .as_i64()
        .ok_or_else(|| format!("{}() expects an integer, got {}", name, kind_of(value)))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Extract (year, month) from an ISO date or RFC3339 timestamp string
fn date_part(
    name: &str,
    args: &[Value],
    fmt: impl Fn((i32, u32)) -> String,
) -> Result<Value, String> {
    use chrono::Datelike;

    if args.len() != 1 {
        return Err(arity(name, 1, args.len()));
    }
    let s = as_str(name, &args[0])?;
    let parsed = DateTime::parse_from_rfc3339(&s)
        .map(|dt| (dt.year(), dt.month()))
        .or_else(|_| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map(|d| (d.year(), d.month()))
        });
    match parsed {
        Ok(pair) => Ok(Value::String(fmt(pair))),
        Err(_) => Err(format!("{}() cannot parse `{}` as a date", name, s)),
    }
}

// ===== Validator table (AVAILABLE_VALIDATORS) =====

/// Whether a lookup string names an allow-listed validator
pub fn is_validator(name: &str) -> bool {
    matches!(name, "iso_date" | "uppercase" | "digits")
}

/// Apply a validator to raw input
///
/// Returns `Some(transformed)` when the validator produced a non-empty
/// replacement, `None` when the raw value should be kept as-is.
pub fn apply_validator(name: &str, raw: &str) -> Option<String> {
    match name {
        "iso_date" => {
            let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y"))
                .or_else(|_| NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y"));
            parsed.ok().map(|d| d.to_string())
        }
        "uppercase" => Some(raw.to_uppercase()),
        "digits" => {
            let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.is_empty() {
                None
            } else {
                Some(digits)
            }
        }
        _ => None,
    }
}

// ===== Model table (AVAILABLE_MODELS) =====

/// Enumerable choice sets reachable from lookup expressions
///
/// Providers are registered once at startup; expressions reach them as
/// `models.<name>`. There is no way to register providers from an
/// expression.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    providers: BTreeMap<String, Vec<String>>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in choice sets
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            "languages",
            ["deu", "eng", "fra", "ita", "por", "spa"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        registry
    }

    /// Register (or replace) a choice set
    pub fn register(&mut self, name: impl Into<String>, choices: Vec<String>) {
        self.providers.insert(name.into(), choices);
    }

    /// Get a choice set by name
    pub fn choices(&self, name: &str) -> Option<&[String]> {
        self.providers.get(name).map(|v| v.as_slice())
    }

    /// Whether a provider with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

/// Scope exposing the model registry to lookup expressions
pub struct ModelScope<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> ModelScope<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }
}

impl Scope for ModelScope<'_> {
    fn resolve(&self, path: &[String]) -> Option<Value> {
        match path {
            [root, name] if root == "models" => self.registry.choices(name).map(|choices| {
                Value::Array(choices.iter().cloned().map(Value::String).collect())
            }),
            _ => None,
        }
    }
}
