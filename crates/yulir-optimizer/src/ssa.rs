use std::collections::{BTreeMap, BTreeSet};
use yulir_core::ast::{Block, Expression, FunctionDefinition, Statement};

/// Finds variables whose value never changes after their declaration.
///
/// Names are assumed to be unique in the block. A name declared more than once is not tracked,
/// neither is any name that is the target of an assignment. Declarations without a value count as
/// binding zero, and so do function return variables.
#[derive(Debug, Default)]
pub struct SSAValueTracker {
    /// Value of every declaration seen so far. `None` stands for zero initialisation.
    values: BTreeMap<String, Option<Expression>>,
    declared_twice: BTreeSet<String>,
    assigned: BTreeSet<String>,
}

impl SSAValueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ssa_variables(block: &Block) -> BTreeSet<String> {
        let mut tracker = Self::new();
        tracker.visit_block(block);
        tracker.values.into_keys().collect()
    }

    /// The defining expression of an SSA variable, or `None` for zero initialised ones.
    pub fn values(block: &Block) -> BTreeMap<String, Option<Expression>> {
        let mut tracker = Self::new();
        tracker.visit_block(block);
        tracker.values
    }

    fn visit_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.visit_statement(statement);
        }
    }

    fn visit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VariableDeclaration(declaration) => {
                let value = if declaration.variables.len() == 1 {
                    declaration.value.clone()
                } else {
                    None
                };
                let zero_initialised = declaration.value.is_none();
                for variable in &declaration.variables {
                    if zero_initialised || declaration.variables.len() == 1 {
                        self.declare(&variable.name, value.clone());
                    } else {
                        // A component of a multi-value declaration has no expression of its own.
                        self.declared_twice.insert(variable.name.clone());
                        self.values.remove(&variable.name);
                    }
                }
            }
            Statement::Assignment(assignment) => {
                for variable in &assignment.variable_names {
                    self.assigned.insert(variable.name.clone());
                    self.values.remove(&variable.name);
                }
            }
            Statement::FunctionDefinition(function) => self.visit_function(function),
            Statement::If(if_statement) => self.visit_block(&if_statement.body),
            Statement::Switch(switch) => {
                for case in &switch.cases {
                    self.visit_block(&case.body);
                }
            }
            Statement::ForLoop(for_loop) => {
                self.visit_block(&for_loop.pre);
                self.visit_block(&for_loop.post);
                self.visit_block(&for_loop.body);
            }
            Statement::Block(block) => self.visit_block(block),
            Statement::ExpressionStatement(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Leave(_) => {}
        }
    }

    fn visit_function(&mut self, function: &FunctionDefinition) {
        for variable in &function.return_variables {
            self.declare(&variable.name, None);
        }
        self.visit_block(&function.body);
    }

    fn declare(&mut self, name: &str, value: Option<Expression>) {
        if self.assigned.contains(name) || self.declared_twice.contains(name) {
            return;
        }
        if self.values.remove(name).is_some() {
            self.declared_twice.insert(name.to_string());
        } else {
            self.values.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yulir_core::ast::{Assignment, Identifier, Span, VariableDeclaration};

    fn declare(names: &[&str], value: Option<Expression>) -> Statement {
        Statement::VariableDeclaration(VariableDeclaration {
            span: Span::default(),
            variables: names.iter().map(|n| Identifier::new(*n)).collect(),
            value,
        })
    }

    fn assign(name: &str) -> Statement {
        Statement::Assignment(Assignment {
            span: Span::default(),
            variable_names: vec![Identifier::new(name)],
            value: Expression::number("1"),
        })
    }

    #[test]
    fn test_assigned_and_redeclared_names_are_excluded() {
        let block = Block::new(vec![
            declare(&["a"], Some(Expression::number("1"))),
            declare(&["b"], None),
            declare(&["c"], Some(Expression::number("2"))),
            assign("c"),
            declare(&["d"], Some(Expression::number("3"))),
            Statement::Block(Block::new(vec![declare(&["d"], None)])),
            declare(&["e", "f"], Some(Expression::call("g", vec![]))),
            declare(&["h", "i"], None),
        ]);
        let ssa: Vec<String> = SSAValueTracker::ssa_variables(&block).into_iter().collect();
        assert_eq!(ssa, vec!["a", "b", "h", "i"]);

        let values = SSAValueTracker::values(&block);
        assert_eq!(values["a"], Some(Expression::number("1")));
        assert_eq!(values["b"], None);
    }

    #[test]
    fn test_assignment_before_declaration_still_excludes() {
        let block = Block::new(vec![
            Statement::Block(Block::new(vec![assign("x")])),
            declare(&["x"], Some(Expression::number("1"))),
        ]);
        assert!(SSAValueTracker::ssa_variables(&block).is_empty());
    }
}
