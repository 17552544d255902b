use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitResult, Emitter};
use colored::Colorize;
use std::io::Write;
use yulir_core::ast::{
    Block, Case, Expression, ForLoop, FunctionDefinition, Identifier, If, Literal, LiteralKind,
    Statement, Switch,
};

/// Prints IR in its surface syntax. Empty blocks print as `{ }`, everything else one statement
/// per line.
#[derive(Debug, Clone)]
pub struct YulPrinter {
    config: EmitterConfig,
}

impl YulPrinter {
    pub fn new() -> Self {
        Self {
            config: EmitterConfig::plain(),
        }
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn print_block(&self, block: &Block) -> String {
        let mut out = String::new();
        let mut ctx = EmitContext::from_config(&self.config);
        self.write_block(&mut out, block, &mut ctx);
        out
    }

    pub fn print_statement(&self, statement: &Statement) -> String {
        let mut out = String::new();
        let mut ctx = EmitContext::from_config(&self.config);
        self.write_statement(&mut out, statement, &mut ctx);
        out
    }

    pub fn print_expression(&self, expression: &Expression) -> String {
        let mut out = String::new();
        self.write_expression(&mut out, expression);
        out
    }

    fn keyword(&self, ctx: &EmitContext, word: &str) -> String {
        if ctx.use_colors {
            word.bright_magenta().bold().to_string()
        } else {
            word.to_string()
        }
    }

    fn write_block(&self, out: &mut String, block: &Block, ctx: &mut EmitContext) {
        if block.statements.is_empty() {
            out.push_str("{ }");
            return;
        }
        out.push_str("{\n");
        ctx.indent();
        for statement in &block.statements {
            out.push_str(&ctx.get_indent());
            self.write_statement(out, statement, ctx);
            out.push('\n');
        }
        ctx.dedent();
        out.push_str(&ctx.get_indent());
        out.push('}');
    }

    fn write_statement(&self, out: &mut String, statement: &Statement, ctx: &mut EmitContext) {
        match statement {
            Statement::ExpressionStatement(expression) => self.write_expression(out, expression),
            Statement::Assignment(assignment) => {
                write_names(out, &assignment.variable_names);
                out.push_str(" := ");
                self.write_expression(out, &assignment.value);
            }
            Statement::VariableDeclaration(declaration) => {
                out.push_str(&self.keyword(ctx, "let"));
                out.push(' ');
                write_names(out, &declaration.variables);
                if let Some(value) = &declaration.value {
                    out.push_str(" := ");
                    self.write_expression(out, value);
                }
            }
            Statement::FunctionDefinition(function) => self.write_function(out, function, ctx),
            Statement::If(if_statement) => self.write_if(out, if_statement, ctx),
            Statement::Switch(switch) => self.write_switch(out, switch, ctx),
            Statement::ForLoop(for_loop) => self.write_for_loop(out, for_loop, ctx),
            Statement::Break(_) => out.push_str(&self.keyword(ctx, "break")),
            Statement::Continue(_) => out.push_str(&self.keyword(ctx, "continue")),
            Statement::Leave(_) => out.push_str(&self.keyword(ctx, "leave")),
            Statement::Block(block) => self.write_block(out, block, ctx),
        }
    }

    fn write_function(&self, out: &mut String, function: &FunctionDefinition, ctx: &mut EmitContext) {
        out.push_str(&self.keyword(ctx, "function"));
        out.push(' ');
        out.push_str(&function.name);
        out.push('(');
        write_names(out, &function.parameters);
        out.push(')');
        if !function.return_variables.is_empty() {
            out.push_str(" -> ");
            write_names(out, &function.return_variables);
        }
        out.push(' ');
        self.write_block(out, &function.body, ctx);
    }

    fn write_if(&self, out: &mut String, if_statement: &If, ctx: &mut EmitContext) {
        out.push_str(&self.keyword(ctx, "if"));
        out.push(' ');
        self.write_expression(out, &if_statement.condition);
        out.push(' ');
        self.write_block(out, &if_statement.body, ctx);
    }

    fn write_switch(&self, out: &mut String, switch: &Switch, ctx: &mut EmitContext) {
        out.push_str(&self.keyword(ctx, "switch"));
        out.push(' ');
        self.write_expression(out, &switch.expression);
        for case in &switch.cases {
            out.push('\n');
            out.push_str(&ctx.get_indent());
            self.write_case(out, case, ctx);
        }
    }

    fn write_case(&self, out: &mut String, case: &Case, ctx: &mut EmitContext) {
        match &case.value {
            Some(value) => {
                out.push_str(&self.keyword(ctx, "case"));
                out.push(' ');
                write_literal(out, value);
            }
            None => out.push_str(&self.keyword(ctx, "default")),
        }
        out.push(' ');
        self.write_block(out, &case.body, ctx);
    }

    fn write_for_loop(&self, out: &mut String, for_loop: &ForLoop, ctx: &mut EmitContext) {
        out.push_str(&self.keyword(ctx, "for"));
        out.push(' ');
        self.write_block(out, &for_loop.pre, ctx);
        out.push(' ');
        self.write_expression(out, &for_loop.condition);
        out.push(' ');
        self.write_block(out, &for_loop.post, ctx);
        out.push(' ');
        self.write_block(out, &for_loop.body, ctx);
    }

    fn write_expression(&self, out: &mut String, expression: &Expression) {
        match expression {
            Expression::FunctionCall(call) => {
                out.push_str(&call.function_name.name);
                out.push('(');
                for (i, argument) in call.arguments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_expression(out, argument);
                }
                out.push(')');
            }
            Expression::Identifier(identifier) => out.push_str(&identifier.name),
            Expression::Literal(literal) => write_literal(out, literal),
        }
    }
}

impl Default for YulPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for YulPrinter {
    type Item = Block;

    fn emit<W: Write>(
        &self,
        item: &Self::Item,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let mut out = String::new();
        self.write_block(&mut out, item, context);
        writer.write_all(out.as_bytes())?;
        Ok(())
    }
}

fn write_names(out: &mut String, names: &[Identifier]) {
    for (i, identifier) in names.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&identifier.name);
    }
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal.kind {
        LiteralKind::Number | LiteralKind::Boolean => out.push_str(&literal.value),
        LiteralKind::String => {
            out.push('"');
            for c in literal.value.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c if c.is_ascii_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
    }
}
