//! Monkey Parser - pest grammar plus a Pratt pass for operator precedence
//!
//! Converts Monkey source code into a [`Program`] with source location tracking.
//! This parser is purely syntactic: macros are neither collected nor expanded here.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use pest::{
    error::{Error, InputLocation},
    iterators::Pair,
    pratt_parser::{Assoc, Op, PrattParser},
    Parser,
};
use pest_derive::Parser;

use crate::ast::{
    Block, Expr, Expression, InfixOp, PrefixOp, Program, Span, Spanned, Statement, Stmt,
};
use crate::engine::SourceContext;
use crate::{err_ctx, MonkeyError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct MonkeyParser;

/// Lowest to highest binding power.
static PRATT_PARSER: Lazy<PrattParser<Rule>> = Lazy::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::eq, Assoc::Left) | Op::infix(Rule::not_eq, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left) | Op::infix(Rule::gt, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left) | Op::infix(Rule::div, Assoc::Left))
        .op(Op::prefix(Rule::not) | Op::prefix(Rule::neg))
        .op(Op::postfix(Rule::call_args) | Op::postfix(Rule::index))
});

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse Monkey source code into a program.
pub fn parse(source: &SourceContext) -> Result<Program, MonkeyError> {
    let text = source.content.as_str();
    let whole = Span::new(0, text.len());
    if text.trim().is_empty() {
        return Ok(Program {
            statements: vec![],
            span: whole,
        });
    }

    let mut pairs = MonkeyParser::parse(Rule::program, text).map_err(convert_parse_error)?;
    let Some(program) = pairs.next() else {
        return Err(err_ctx!(Internal, whole, "grammar produced no program"));
    };

    let statements = program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(build_statement)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program {
        statements,
        span: whole,
    })
}

/// Parse a source string that has no file behind it (tests, one-liners).
pub fn parse_str(text: &str) -> Result<Program, MonkeyError> {
    parse(&SourceContext::from_file("<input>", text))
}

// ============================================================================
// STATEMENT BUILDERS
// ============================================================================

fn build_statement(pair: Pair<Rule>) -> Result<Statement, MonkeyError> {
    let span = get_span(&pair);
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();

    let stmt = match rule {
        Rule::let_statement => {
            let name = next_pair(&mut inner, span, "binding name")?.as_str().to_string();
            let value = build_expression(next_pair(&mut inner, span, "bound expression")?)?;
            Stmt::Let { name, value }
        }
        Rule::return_statement => {
            let value = build_expression(next_pair(&mut inner, span, "returned expression")?)?;
            Stmt::Return(value)
        }
        Rule::expression_statement => {
            let expr = build_expression(next_pair(&mut inner, span, "expression")?)?;
            Stmt::Expression(expr)
        }
        rule => return Err(unsupported_rule(rule, span)),
    };
    Ok(Spanned::new(stmt, span))
}

fn build_block(pair: Pair<Rule>) -> Result<Block, MonkeyError> {
    let span = get_span(&pair);
    let statements = pair
        .into_inner()
        .map(build_statement)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Block { statements, span })
}

// ============================================================================
// EXPRESSION BUILDERS
// ============================================================================

fn build_expression(pair: Pair<Rule>) -> Result<Expression, MonkeyError> {
    PRATT_PARSER
        .map_primary(build_primary)
        .map_prefix(|op, right| {
            let right = right?;
            let operator = match op.as_rule() {
                Rule::not => PrefixOp::Not,
                Rule::neg => PrefixOp::Negate,
                rule => return Err(unsupported_rule(rule, get_span(&op))),
            };
            let span = get_span(&op).to(right.span);
            Ok(Spanned::new(
                Expr::Prefix {
                    operator,
                    right: Box::new(right),
                },
                span,
            ))
        })
        .map_infix(|left, op, right| {
            let (left, right) = (left?, right?);
            let operator = match op.as_rule() {
                Rule::add => InfixOp::Add,
                Rule::sub => InfixOp::Sub,
                Rule::mul => InfixOp::Mul,
                Rule::div => InfixOp::Div,
                Rule::lt => InfixOp::Lt,
                Rule::gt => InfixOp::Gt,
                Rule::eq => InfixOp::Eq,
                Rule::not_eq => InfixOp::NotEq,
                rule => return Err(unsupported_rule(rule, get_span(&op))),
            };
            let span = left.span.to(right.span);
            Ok(Spanned::new(
                Expr::Infix {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                },
                span,
            ))
        })
        .map_postfix(|left, op| {
            let left = left?;
            let span = left.span.to(get_span(&op));
            let expr = match op.as_rule() {
                Rule::call_args => Expr::Call {
                    function: Box::new(left),
                    arguments: build_expression_list(op)?,
                },
                Rule::index => {
                    let op_span = get_span(&op);
                    let index = op
                        .into_inner()
                        .next()
                        .ok_or_else(|| missing(op_span, "index expression"))?;
                    Expr::Index {
                        left: Box::new(left),
                        index: Box::new(build_expression(index)?),
                    }
                }
                rule => return Err(unsupported_rule(rule, get_span(&op))),
            };
            Ok(Spanned::new(expr, span))
        })
        .parse(pair.into_inner())
}

fn build_primary(pair: Pair<Rule>) -> Result<Expression, MonkeyError> {
    let span = get_span(&pair);

    let expr = match pair.as_rule() {
        Rule::expression => return build_expression(pair),

        Rule::integer => {
            let text = pair.as_str();
            let value = text.parse::<i64>().map_err(|_| {
                err_ctx!(Parse, span, "integer literal out of range: {}", text)
                    .with_help("integers are signed 64-bit")
            })?;
            Expr::Integer(value)
        }

        Rule::boolean => Expr::Boolean(pair.as_str() == "true"),

        Rule::string => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| missing(span, "string contents"))?;
            Expr::Str(unescape_string(inner.as_str(), span)?)
        }

        Rule::identifier => Expr::Identifier(pair.as_str().to_string()),

        Rule::if_expression => {
            let mut inner = pair.into_inner();
            let condition = build_expression(next_pair(&mut inner, span, "if condition")?)?;
            let consequence = build_block(next_pair(&mut inner, span, "if consequence")?)?;
            let alternative = inner.next().map(build_block).transpose()?;
            Expr::If {
                condition: Box::new(condition),
                consequence,
                alternative,
            }
        }

        Rule::function_literal => {
            let (parameters, body) = build_callable(pair, "fn")?;
            Expr::Function { parameters, body }
        }

        Rule::macro_literal => {
            let (parameters, body) = build_callable(pair, "macro")?;
            Expr::Macro { parameters, body }
        }

        Rule::array_literal => Expr::Array(build_expression_list(pair)?),

        Rule::hash_literal => {
            let pairs = pair
                .into_inner()
                .map(|hash_pair| {
                    let pair_span = get_span(&hash_pair);
                    let mut inner = hash_pair.into_inner();
                    let key = build_expression(next_pair(&mut inner, pair_span, "hash key")?)?;
                    let value =
                        build_expression(next_pair(&mut inner, pair_span, "hash value")?)?;
                    Ok((key, value))
                })
                .collect::<Result<Vec<_>, MonkeyError>>()?;
            Expr::Hash(pairs)
        }

        rule => return Err(unsupported_rule(rule, span)),
    };
    Ok(Spanned::new(expr, span))
}

/// Parameters and body shared by `fn` and `macro` literals.
fn build_callable(pair: Pair<Rule>, keyword: &str) -> Result<(Vec<String>, Block), MonkeyError> {
    let span = get_span(&pair);
    let mut inner = pair.into_inner();
    let params_pair = next_pair(&mut inner, span, "parameter list")?;

    let mut seen = HashSet::new();
    let mut parameters = Vec::new();
    for param in params_pair.into_inner() {
        let name = param.as_str().to_string();
        if !seen.insert(name.clone()) {
            return Err(err_ctx!(
                Parse,
                get_span(&param),
                "duplicate parameter `{}` in {} literal",
                name,
                keyword
            ));
        }
        parameters.push(name);
    }

    let body = build_block(next_pair(&mut inner, span, "body")?)?;
    Ok((parameters, body))
}

fn build_expression_list(pair: Pair<Rule>) -> Result<Vec<Expression>, MonkeyError> {
    pair.into_inner().map(build_expression).collect()
}

// ============================================================================
// HELPERS
// ============================================================================

fn get_span(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end())
}

fn next_pair<'i>(
    inner: &mut pest::iterators::Pairs<'i, Rule>,
    span: Span,
    element: &str,
) -> Result<Pair<'i, Rule>, MonkeyError> {
    inner.next().ok_or_else(|| missing(span, element))
}

fn missing(span: Span, element: &str) -> MonkeyError {
    err_ctx!(Parse, span, "missing {}", element)
}

fn unsupported_rule(rule: Rule, span: Span) -> MonkeyError {
    err_ctx!(Internal, span, "parser has no case for grammar rule {:?}", rule)
}

fn unescape_string(raw: &str, span: Span) -> Result<String, MonkeyError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                return Err(err_ctx!(Parse, span, "unknown escape sequence `\\{}`", other)
                    .with_help("supported escapes are \\\" \\\\ \\n \\t"))
            }
            None => return Err(err_ctx!(Parse, span, "unterminated escape sequence")),
        }
    }
    Ok(out)
}

fn convert_parse_error(e: Error<Rule>) -> MonkeyError {
    let span = match e.location {
        InputLocation::Pos(pos) => Span::new(pos, pos),
        InputLocation::Span((start, end)) => Span::new(start, end),
    };
    let message = match &e.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let expected = positives
                .iter()
                .map(|r| format!("{:?}", r))
                .collect::<Vec<_>>()
                .join(", ");
            format!("unexpected input, expected one of: {}", expected)
        }
        variant => variant.message().to_string(),
    };
    err_ctx!(Parse, span, "{}", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_handles_known_sequences() {
        let span = Span::default();
        assert_eq!(unescape_string(r#"a\"b\\c\nd"#, span).unwrap(), "a\"b\\c\nd");
        assert!(unescape_string(r"\q", span).is_err());
    }

    #[test]
    fn pratt_binds_multiplication_tighter() {
        let program = parse_str("1 + 2 * 3").unwrap();
        assert_eq!(program.to_string(), "(1 + (2 * 3));");
    }
}
