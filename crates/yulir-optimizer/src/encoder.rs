use crate::prover::{Formula, Prover, Sort};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;
use yulir_core::ast::{Expression, FunctionCall};
use yulir_core::{value_of_literal, Dialect, Instruction};

/// Translates IR expressions into integer formulas.
///
/// Only `lt`, `gt`, `eq`, `iszero` and `add` are modelled, and `add` ignores the 256 bit
/// wraparound. Everything else becomes a fresh unconstrained variable, which can only make
/// proofs fail, never succeed wrongly.
pub struct FormulaEncoder<'a> {
    dialect: &'a Dialect,
    ssa_variables: BTreeSet<String>,
    variables: BTreeMap<String, Formula>,
    counter: usize,
}

impl<'a> FormulaEncoder<'a> {
    pub fn new(dialect: &'a Dialect, ssa_variables: BTreeSet<String>) -> Self {
        Self {
            dialect,
            ssa_variables,
            variables: BTreeMap::new(),
            counter: 0,
        }
    }

    pub fn is_ssa_variable(&self, name: &str) -> bool {
        self.ssa_variables.contains(name)
    }

    /// Binds the SSA variable `name` to a new prover variable `yul_<name>` and returns it.
    pub fn bind_variable<P: Prover + ?Sized>(&mut self, prover: &mut P, name: &str) -> Formula {
        let variable = prover.new_variable(&format!("yul_{}", name), Sort::Int);
        self.variables.insert(name.to_string(), variable.clone());
        variable
    }

    pub fn encode<P: Prover + ?Sized>(&mut self, prover: &mut P, expression: &Expression) -> Formula {
        match expression {
            Expression::FunctionCall(call) => {
                match self
                    .dialect
                    .builtin(&call.function_name.name)
                    .and_then(|builtin| builtin.instruction)
                {
                    Some(instruction) => self.encode_builtin(prover, instruction, call),
                    None => self.new_variable(prover),
                }
            }
            Expression::Identifier(identifier) => {
                match self.variables.get(&identifier.name) {
                    Some(variable) if self.ssa_variables.contains(&identifier.name) => {
                        variable.clone()
                    }
                    _ => self.new_variable(prover),
                }
            }
            Expression::Literal(literal) => match value_of_literal(literal) {
                Ok(value) => Formula::int(BigInt::from(value)),
                Err(err) => {
                    trace!(%err, "literal not encodable");
                    self.new_variable(prover)
                }
            },
        }
    }

    fn encode_builtin<P: Prover + ?Sized>(
        &mut self,
        prover: &mut P,
        instruction: Instruction,
        call: &FunctionCall,
    ) -> Formula {
        let mut arguments: Vec<Formula> = call
            .arguments
            .iter()
            .map(|argument| self.encode(prover, argument))
            .collect();
        let as_word = |condition: Formula| Formula::ite(condition, Formula::int(1), Formula::int(0));

        match (instruction, arguments.len()) {
            (Instruction::Lt, 2) => {
                let b = arguments.remove(1);
                let a = arguments.remove(0);
                as_word(a.lt(b))
            }
            (Instruction::Gt, 2) => {
                let b = arguments.remove(1);
                let a = arguments.remove(0);
                as_word(a.gt(b))
            }
            (Instruction::Eq, 2) => {
                let b = arguments.remove(1);
                let a = arguments.remove(0);
                as_word(a.equals(b))
            }
            (Instruction::IsZero, 1) => as_word(arguments.remove(0).equals(Formula::int(0))),
            // TODO: reduce modulo 2^256 once the prover interface carries bit-vector sorts.
            (Instruction::Add, 2) => {
                let b = arguments.remove(1);
                let a = arguments.remove(0);
                a.add(b)
            }
            _ => self.new_variable(prover),
        }
    }

    fn new_variable<P: Prover + ?Sized>(&mut self, prover: &mut P) -> Formula {
        let name = format!("expr_{}", self.counter);
        self.counter += 1;
        prover.new_variable(&name, Sort::Int)
    }
}
