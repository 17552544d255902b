//! A prover that decides satisfiability by evaluation.
//!
//! Assertions of the form `var = term` define `var` (the first such assertion wins). Every other
//! assertion, and any later definition of the same variable, is a constraint. A constraint whose
//! value is fixed by the definitions alone is either true in every model or in none, so a false
//! one proves unsatisfiability. Anything that depends on an undefined variable is left open.

use crate::prover::{CheckResult, Formula, Prover, Sort};
use num_bigint::BigInt;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Int(BigInt),
    Bool(bool),
}

#[derive(Debug)]
pub struct EvalProver {
    /// Assertions per scope. The first frame is never popped.
    frames: Vec<Vec<Formula>>,
    checks: usize,
}

impl EvalProver {
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
            checks: 0,
        }
    }

    /// Number of open scopes above the base frame.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn assertion_count(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    pub fn checks_performed(&self) -> usize {
        self.checks
    }
}

impl Default for EvalProver {
    fn default() -> Self {
        Self::new()
    }
}

impl Prover for EvalProver {
    fn new_variable(&mut self, name: &str, sort: Sort) -> Formula {
        Formula::var(name, sort)
    }

    fn assert(&mut self, formula: Formula) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(formula);
        }
    }

    fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        } else {
            warn!("pop without matching push");
        }
    }

    fn check(&mut self, assumptions: &[Formula]) -> CheckResult {
        self.checks += 1;

        let mut definitions: BTreeMap<&str, &Formula> = BTreeMap::new();
        let mut constraints: Vec<&Formula> = Vec::new();
        for formula in self.frames.iter().flatten().chain(assumptions) {
            match formula {
                Formula::Eq(lhs, rhs) => match lhs.as_ref() {
                    Formula::Var { name, .. } if !definitions.contains_key(name.as_str()) => {
                        definitions.insert(name.as_str(), rhs.as_ref());
                    }
                    _ => constraints.push(formula),
                },
                _ => constraints.push(formula),
            }
        }

        let evaluator = Evaluator {
            definitions: &definitions,
        };

        // A definition whose term cannot be evaluated leaves its variable unconstrained.
        let mut open = definitions
            .values()
            .any(|term| evaluator.value(term).is_none());
        for constraint in constraints {
            match evaluator.value(constraint) {
                Some(Value::Bool(false)) => {
                    trace!(%constraint, "constraint is false under the definitions");
                    return CheckResult::Unsatisfiable;
                }
                Some(Value::Bool(true)) => {}
                _ => open = true,
            }
        }

        if open {
            CheckResult::Unknown
        } else {
            CheckResult::Satisfiable
        }
    }
}

struct Evaluator<'a> {
    definitions: &'a BTreeMap<&'a str, &'a Formula>,
}

impl Evaluator<'_> {
    fn value(&self, formula: &Formula) -> Option<Value> {
        self.evaluate(formula, &mut BTreeSet::new())
    }

    /// `path` holds the variables being expanded, so cyclic definitions evaluate to `None`.
    fn evaluate(&self, formula: &Formula, path: &mut BTreeSet<String>) -> Option<Value> {
        match formula {
            Formula::Int(value) => Some(Value::Int(value.clone())),
            Formula::Bool(value) => Some(Value::Bool(*value)),
            Formula::Var { name, .. } => {
                let term = self.definitions.get(name.as_str())?;
                if !path.insert(name.clone()) {
                    return None;
                }
                let value = self.evaluate(term, path);
                path.remove(name);
                value
            }
            Formula::Add(a, b) => match (self.evaluate(a, path)?, self.evaluate(b, path)?) {
                (Value::Int(a), Value::Int(b)) => Some(Value::Int(a + b)),
                _ => None,
            },
            Formula::Lt(a, b) => match (self.evaluate(a, path)?, self.evaluate(b, path)?) {
                (Value::Int(a), Value::Int(b)) => Some(Value::Bool(a < b)),
                _ => None,
            },
            Formula::Gt(a, b) => match (self.evaluate(a, path)?, self.evaluate(b, path)?) {
                (Value::Int(a), Value::Int(b)) => Some(Value::Bool(a > b)),
                _ => None,
            },
            Formula::Eq(a, b) => {
                let a = self.evaluate(a, path)?;
                let b = self.evaluate(b, path)?;
                Some(Value::Bool(a == b))
            }
            Formula::Not(inner) => match self.evaluate(inner, path)? {
                Value::Bool(value) => Some(Value::Bool(!value)),
                Value::Int(_) => None,
            },
            Formula::Ite {
                condition,
                then,
                otherwise,
            } => match self.evaluate(condition, path)? {
                Value::Bool(true) => self.evaluate(then, path),
                Value::Bool(false) => self.evaluate(otherwise, path),
                Value::Int(_) => None,
            },
        }
    }
}
