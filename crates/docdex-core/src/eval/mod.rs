//! Restricted expression evaluation
//!
//! Index templates and metadata defaults are user-authored strings. They
//! are never handed to a general-purpose interpreter: the language is a
//! closed grammar (literals, dotted attribute access, `+` concatenation,
//! calls into a fixed function table) lexed and parsed with `chumsky` and
//! interpreted over a read-only [`Scope`].
//!
//! A single expression may yield several values (a multi-valued metadata
//! field fans out to one instance node per value); [`Evaluator::evaluate`]
//! therefore returns a `Vec<String>`, possibly empty.

mod ast;
mod interp;
mod lexer;
mod parser;
pub mod registry;
mod tokens;

pub use ast::Expr;
pub use interp::{Evaluator, Scope};
pub use parser::parse_expression;
pub use registry::{ModelRegistry, ModelScope};

use crate::errors::Result;

/// One-shot evaluation without a parse cache
///
/// Reconciliation passes should hold an [`Evaluator`] instead so each
/// template expression is parsed once per pass.
pub fn evaluate(expression: &str, scope: &dyn Scope) -> Result<Vec<String>> {
    Evaluator::new().evaluate(expression, scope)
}
