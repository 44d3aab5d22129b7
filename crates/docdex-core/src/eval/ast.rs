/// Parsed expression tree
///
/// The grammar is deliberately closed: there is no assignment, no control
/// flow, and calls resolve only against the fixed function table in
/// [`super::registry`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String literal
    Str(String),
    /// Integer literal (function arguments such as slice bounds)
    Int(i64),
    /// Dotted attribute access, e.g. `metadata.year`
    Attr(Vec<String>),
    /// Allow-listed function call, e.g. `upper(metadata.category)`
    Call { name: String, args: Vec<Expr> },
    /// String concatenation via `+`
    Concat(Box<Expr>, Box<Expr>),
}
