use chumsky::prelude::*;
use chumsky::Stream;

use super::ast::Expr;
use super::lexer::lexer;
use super::tokens::Token;

/// Parse an expression source string into an [`Expr`]
///
/// Returns the joined lexer/parser error messages on failure; the caller
/// wraps them into `IndexError::Evaluation` together with the offending
/// expression.
pub(crate) fn parse_source(source: &str) -> Result<Expr, String> {
    let (tokens, lex_errs) = lexer().parse_recovery(source);
    if !lex_errs.is_empty() {
        return Err(join_errors(&lex_errs));
    }

    let tokens = tokens.unwrap_or_default();
    let eoi = source.len()..source.len() + 1;
    let stream = Stream::from_iter(eoi, tokens.into_iter());

    expr_parser()
        .then_ignore(end())
        .parse(stream)
        .map_err(|errs| join_errors(&errs))
}

/// Public parse entry point used outside the evaluator
pub fn parse_expression(source: &str) -> crate::errors::Result<Expr> {
    parse_source(source).map_err(|cause| crate::errors::IndexError::Evaluation {
        expression: source.to_string(),
        cause,
    })
}

fn join_errors<T: std::fmt::Display>(errs: &[T]) -> String {
    errs.iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn expr_parser() -> impl Parser<Token, Expr, Error = Simple<Token>> {
    recursive(|expr| {
        let ident = select! { Token::Ident(s) => s };
        let string = select! { Token::Str(s) => s };
        let integer = select! { Token::Int(n) => n };

        let call = ident
            .clone()
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(name, args)| Expr::Call { name, args });

        let path = ident
            .separated_by(just(Token::Dot))
            .at_least(1)
            .map(Expr::Attr);

        let atom = choice::<_, Simple<Token>>((
            string.map(Expr::Str),
            integer.map(Expr::Int),
            call,
            path,
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        atom.clone()
            .then(just(Token::Plus).ignore_then(atom).repeated())
            .foldl(|lhs, rhs| Expr::Concat(Box::new(lhs), Box::new(rhs)))
    })
}
