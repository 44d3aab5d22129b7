use chumsky::prelude::*;

use super::tokens::Token;

pub(crate) fn lexer(
) -> impl Parser<char, Vec<(Token, std::ops::Range<usize>)>, Error = Simple<char>> {
    let integer = text::int(10).try_map(|s: String, span| {
        s.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| Simple::custom(span, "invalid integer literal"))
    });

    let string = just('"')
        .ignore_then(filter(|c| *c != '"').repeated().collect::<String>())
        .then_ignore(just('"'))
        .map(Token::Str);

    let ident = text::ident().map(Token::Ident);

    let op = choice::<_, Simple<char>>((
        just('.').to(Token::Dot),
        just(',').to(Token::Comma),
        just('+').to(Token::Plus),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
    ));

    let token = integer.or(string).or(ident).or(op);

    token
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}
