/*! Parse textual IR into the block-structured AST.
 *
 * Optimiser tests and the command line tool start from text. This parser reads the surface syntax
 * printed by `yulir-emit` back into memory, keeping byte spans on every node.
 */

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::path::Path;
use thiserror::Error;
use yulir_core::ast::{
    Assignment, Block, Case, Expression, ForLoop, FunctionCall, FunctionDefinition, Identifier,
    If, Literal, LiteralKind, Span, Statement, Switch, VariableDeclaration,
};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct YulParser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("Unexpected {found:?} while reading {context}")]
    UnexpectedRule { context: &'static str, found: Rule },

    #[error("Missing {what} in {context}")]
    Missing {
        what: &'static str,
        context: &'static str,
    },

    #[error("Invalid escape sequence in string literal: {0}")]
    InvalidEscape(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a top-level `{ ... }` block.
pub fn parse(input: &str) -> ParseResult<Block> {
    let mut pairs = YulParser::parse(Rule::program, input).map_err(Box::new)?;
    let program = pairs.next().ok_or(ParseError::Missing {
        what: "block",
        context: "program",
    })?;
    let block = program
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::block)
        .ok_or(ParseError::Missing {
            what: "block",
            context: "program",
        })?;
    build_block(block)
}

pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<Block> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&source)
}

pub fn check(input: &str) -> bool {
    parse(input).is_ok()
}

fn span_of(pair: &Pair<'_, Rule>) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end())
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_function
            | Rule::kw_let
            | Rule::kw_if
            | Rule::kw_switch
            | Rule::kw_case
            | Rule::kw_default
            | Rule::kw_for
    )
}

/// Inner pairs without keyword tokens.
fn children<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

fn next_child<'i>(
    iter: &mut impl Iterator<Item = Pair<'i, Rule>>,
    what: &'static str,
    context: &'static str,
) -> ParseResult<Pair<'i, Rule>> {
    iter.next().ok_or(ParseError::Missing { what, context })
}

fn build_block(pair: Pair<'_, Rule>) -> ParseResult<Block> {
    let span = span_of(&pair);
    let statements = children(pair)
        .map(build_statement)
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(Block { span, statements })
}

fn build_statement(pair: Pair<'_, Rule>) -> ParseResult<Statement> {
    let span = span_of(&pair);
    match pair.as_rule() {
        Rule::block => Ok(Statement::Block(build_block(pair)?)),
        Rule::function_definition => build_function_definition(pair).map(Statement::FunctionDefinition),
        Rule::variable_declaration => {
            let mut variables = Vec::new();
            let mut value = None;
            for child in children(pair) {
                match child.as_rule() {
                    Rule::identifier => variables.push(build_identifier(child)),
                    _ => value = Some(build_expression(child)?),
                }
            }
            Ok(Statement::VariableDeclaration(VariableDeclaration {
                span,
                variables,
                value,
            }))
        }
        Rule::assignment => {
            let mut variable_names = Vec::new();
            let mut value = None;
            for child in children(pair) {
                match child.as_rule() {
                    Rule::identifier if value.is_none() => {
                        variable_names.push(build_identifier(child))
                    }
                    _ => value = Some(build_expression(child)?),
                }
            }
            // The last identifier may have been the assigned value itself.
            let value = match value {
                Some(value) => value,
                None => {
                    let last = variable_names.pop().ok_or(ParseError::Missing {
                        what: "value",
                        context: "assignment",
                    })?;
                    Expression::Identifier(last)
                }
            };
            Ok(Statement::Assignment(Assignment {
                span,
                variable_names,
                value,
            }))
        }
        Rule::expression_statement => {
            let mut inner = children(pair);
            let call = next_child(&mut inner, "call", "expression statement")?;
            Ok(Statement::ExpressionStatement(build_expression(call)?))
        }
        Rule::if_statement => {
            let mut inner = children(pair);
            let condition = build_expression(next_child(&mut inner, "condition", "if")?)?;
            let body = build_block(next_child(&mut inner, "body", "if")?)?;
            Ok(Statement::If(If {
                span,
                condition,
                body,
            }))
        }
        Rule::switch_statement => {
            let mut inner = children(pair);
            let expression = build_expression(next_child(&mut inner, "expression", "switch")?)?;
            let cases = inner.map(build_case).collect::<ParseResult<Vec<_>>>()?;
            Ok(Statement::Switch(Switch {
                span,
                expression,
                cases,
            }))
        }
        Rule::for_loop => {
            let mut inner = children(pair);
            let pre = build_block(next_child(&mut inner, "init block", "for")?)?;
            let condition = build_expression(next_child(&mut inner, "condition", "for")?)?;
            let post = build_block(next_child(&mut inner, "post block", "for")?)?;
            let body = build_block(next_child(&mut inner, "body", "for")?)?;
            Ok(Statement::ForLoop(ForLoop {
                span,
                pre,
                condition,
                post,
                body,
            }))
        }
        Rule::break_statement => Ok(Statement::Break(span)),
        Rule::continue_statement => Ok(Statement::Continue(span)),
        Rule::leave_statement => Ok(Statement::Leave(span)),
        found => Err(ParseError::UnexpectedRule {
            context: "statement",
            found,
        }),
    }
}

fn build_function_definition(pair: Pair<'_, Rule>) -> ParseResult<FunctionDefinition> {
    let span = span_of(&pair);
    let mut inner = children(pair);
    let name = next_child(&mut inner, "name", "function definition")?
        .as_str()
        .to_string();
    let parameters = next_child(&mut inner, "parameters", "function definition")?
        .into_inner()
        .map(build_identifier)
        .collect();
    let return_variables = next_child(&mut inner, "return variables", "function definition")?
        .into_inner()
        .map(build_identifier)
        .collect();
    let body = build_block(next_child(&mut inner, "body", "function definition")?)?;
    Ok(FunctionDefinition {
        span,
        name,
        parameters,
        return_variables,
        body,
    })
}

fn build_case(pair: Pair<'_, Rule>) -> ParseResult<Case> {
    let span = span_of(&pair);
    match pair.as_rule() {
        Rule::case_clause => {
            let mut inner = children(pair);
            let value = build_literal(next_child(&mut inner, "value", "case")?)?;
            let body = build_block(next_child(&mut inner, "body", "case")?)?;
            Ok(Case {
                span,
                value: Some(value),
                body,
            })
        }
        Rule::default_clause => {
            let mut inner = children(pair);
            let body = build_block(next_child(&mut inner, "body", "default")?)?;
            Ok(Case {
                span,
                value: None,
                body,
            })
        }
        found => Err(ParseError::UnexpectedRule {
            context: "switch case",
            found,
        }),
    }
}

fn build_identifier(pair: Pair<'_, Rule>) -> Identifier {
    Identifier {
        span: span_of(&pair),
        name: pair.as_str().to_string(),
    }
}

fn build_expression(pair: Pair<'_, Rule>) -> ParseResult<Expression> {
    match pair.as_rule() {
        Rule::function_call => {
            let span = span_of(&pair);
            let mut inner = pair.into_inner();
            let function_name = build_identifier(next_child(&mut inner, "name", "call")?);
            let arguments = inner
                .map(build_expression)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expression::FunctionCall(FunctionCall {
                span,
                function_name,
                arguments,
            }))
        }
        Rule::identifier => Ok(Expression::Identifier(build_identifier(pair))),
        _ => build_literal(pair).map(Expression::Literal),
    }
}

fn build_literal(pair: Pair<'_, Rule>) -> ParseResult<Literal> {
    let span = span_of(&pair);
    let (kind, value) = match pair.as_rule() {
        Rule::hex_number | Rule::decimal_number => (LiteralKind::Number, pair.as_str().to_string()),
        Rule::bool_literal => (LiteralKind::Boolean, pair.as_str().to_string()),
        Rule::string_literal => {
            let raw = pair
                .into_inner()
                .next()
                .map(|inner| inner.as_str())
                .unwrap_or_default();
            (LiteralKind::String, unescape(raw)?)
        }
        found => {
            return Err(ParseError::UnexpectedRule {
                context: "literal",
                found,
            })
        }
    };
    Ok(Literal { span, kind, value })
}

fn unescape(raw: &str) -> ParseResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('x') => {
                let digits: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&digits, 16)
                    .map_err(|_| ParseError::InvalidEscape(format!("\\x{}", digits)))?;
                out.push(char::from(byte));
            }
            Some(other) => return Err(ParseError::InvalidEscape(format!("\\{}", other))),
            None => return Err(ParseError::InvalidEscape("\\".to_string())),
        }
    }
    Ok(out)
}
