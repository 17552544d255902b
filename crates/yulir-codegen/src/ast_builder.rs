//! Shorthands for assembling generated IR before it is printed.

use yulir_core::ast::{
    Assignment, Block, Expression, FunctionDefinition, Identifier, Span, Statement,
    VariableDeclaration,
};
use yulir_emit::YulPrinter;

pub fn identifiers<S: AsRef<str>>(names: &[S]) -> Vec<Identifier> {
    names.iter().map(|name| Identifier::new(name.as_ref())).collect()
}

pub fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(name, arguments)
}

pub fn ident(name: &str) -> Expression {
    Expression::identifier(name)
}

pub fn num(value: impl ToString) -> Expression {
    Expression::number(value.to_string())
}

pub fn hex(value: u64) -> Expression {
    Expression::number(format!("{:#x}", value))
}

pub fn expr_stmt(expression: Expression) -> Statement {
    Statement::ExpressionStatement(expression)
}

pub fn assign<S: AsRef<str>>(names: &[S], value: Expression) -> Statement {
    Statement::Assignment(Assignment {
        span: Span::default(),
        variable_names: identifiers(names),
        value,
    })
}

pub fn declare(name: &str, value: Expression) -> Statement {
    Statement::VariableDeclaration(VariableDeclaration {
        span: Span::default(),
        variables: vec![Identifier::new(name)],
        value: Some(value),
    })
}

pub fn function<P: AsRef<str>, R: AsRef<str>>(
    name: &str,
    parameters: &[P],
    returns: &[R],
    body: Vec<Statement>,
) -> FunctionDefinition {
    FunctionDefinition {
        span: Span::default(),
        name: name.to_string(),
        parameters: identifiers(parameters),
        return_variables: identifiers(returns),
        body: Block::new(body),
    }
}

/// Text of a generated function, laid out by the shared printer.
pub fn render_function(definition: FunctionDefinition) -> String {
    YulPrinter::new().print_statement(&Statement::FunctionDefinition(definition))
}
