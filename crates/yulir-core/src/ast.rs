//! Block-structured IR produced by lowering and rewritten by the optimiser.

use serde::{Deserialize, Serialize};

/// Byte range in the text the node was parsed from. Synthesized nodes use the default span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    Number,
    Boolean,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub span: Span,
    pub kind: LiteralKind,
    pub value: String,
}

impl Literal {
    pub fn number(value: impl Into<String>) -> Self {
        Self {
            span: Span::default(),
            kind: LiteralKind::Number,
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            span: Span::default(),
            kind: LiteralKind::Boolean,
            value: if value { "true" } else { "false" }.to_string(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            span: Span::default(),
            kind: LiteralKind::String,
            value: value.into(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub span: Span,
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            span: Span::default(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub span: Span,
    pub function_name: Identifier,
    pub arguments: Vec<Expression>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self {
            span: Span::default(),
            function_name: Identifier::new(name),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    FunctionCall(FunctionCall),
    Identifier(Identifier),
    Literal(Literal),
}

impl Expression {
    pub fn call(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall::new(name, arguments))
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    pub fn number(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::number(value))
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::FunctionCall(call) => call.span,
            Expression::Identifier(identifier) => identifier.span,
            Expression::Literal(literal) => literal.span,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expression::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub span: Span,
    pub variables: Vec<Identifier>,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub span: Span,
    pub variable_names: Vec<Identifier>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct If {
    pub span: Span,
    pub condition: Expression,
    pub body: Block,
}

/// A `case` arm. `value` is `None` for the `default` arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub span: Span,
    pub value: Option<Literal>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub span: Span,
    pub expression: Expression,
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForLoop {
    pub span: Span,
    pub pre: Block,
    pub condition: Expression,
    pub post: Block,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub span: Span,
    pub name: String,
    pub parameters: Vec<Identifier>,
    pub return_variables: Vec<Identifier>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    ExpressionStatement(Expression),
    Assignment(Assignment),
    VariableDeclaration(VariableDeclaration),
    FunctionDefinition(FunctionDefinition),
    If(If),
    Switch(Switch),
    ForLoop(ForLoop),
    Break(Span),
    Continue(Span),
    Leave(Span),
    Block(Block),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub span: Span,
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            span: Span::default(),
            statements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
