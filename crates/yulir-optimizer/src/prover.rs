//! The interface the simplifier needs from a theorem prover.

use num_bigint::BigInt;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Int,
    Bool,
}

/// A term over unbounded integers and booleans.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Int(BigInt),
    Bool(bool),
    Var { name: String, sort: Sort },
    Add(Box<Formula>, Box<Formula>),
    Lt(Box<Formula>, Box<Formula>),
    Gt(Box<Formula>, Box<Formula>),
    Eq(Box<Formula>, Box<Formula>),
    Not(Box<Formula>),
    Ite {
        condition: Box<Formula>,
        then: Box<Formula>,
        otherwise: Box<Formula>,
    },
}

impl Formula {
    pub fn int(value: impl Into<BigInt>) -> Self {
        Formula::Int(value.into())
    }

    pub fn var(name: impl Into<String>, sort: Sort) -> Self {
        Formula::Var {
            name: name.into(),
            sort,
        }
    }

    pub fn add(self, other: Formula) -> Self {
        Formula::Add(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: Formula) -> Self {
        Formula::Lt(Box::new(self), Box::new(other))
    }

    pub fn gt(self, other: Formula) -> Self {
        Formula::Gt(Box::new(self), Box::new(other))
    }

    pub fn equals(self, other: Formula) -> Self {
        Formula::Eq(Box::new(self), Box::new(other))
    }

    pub fn not_equals(self, other: Formula) -> Self {
        Formula::Not(Box::new(self.equals(other)))
    }

    pub fn negate(self) -> Self {
        Formula::Not(Box::new(self))
    }

    pub fn ite(condition: Formula, then: Formula, otherwise: Formula) -> Self {
        Formula::Ite {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn sort(&self) -> Sort {
        match self {
            Formula::Int(_) | Formula::Add(..) => Sort::Int,
            Formula::Bool(_) | Formula::Lt(..) | Formula::Gt(..) | Formula::Eq(..) | Formula::Not(_) => {
                Sort::Bool
            }
            Formula::Var { sort, .. } => *sort,
            Formula::Ite { then, .. } => then.sort(),
        }
    }

    /// Names of all variables occurring in the formula.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Formula::Int(_) | Formula::Bool(_) => {}
            Formula::Var { name, .. } => {
                names.insert(name.clone());
            }
            Formula::Add(a, b) | Formula::Lt(a, b) | Formula::Gt(a, b) | Formula::Eq(a, b) => {
                a.collect_variables(names);
                b.collect_variables(names);
            }
            Formula::Not(inner) => inner.collect_variables(names),
            Formula::Ite {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_variables(names);
                then.collect_variables(names);
                otherwise.collect_variables(names);
            }
        }
    }
}

/// SMT-LIB style rendering, used in logs.
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Int(value) => write!(f, "{}", value),
            Formula::Bool(value) => write!(f, "{}", value),
            Formula::Var { name, .. } => f.write_str(name),
            Formula::Add(a, b) => write!(f, "(+ {} {})", a, b),
            Formula::Lt(a, b) => write!(f, "(< {} {})", a, b),
            Formula::Gt(a, b) => write!(f, "(> {} {})", a, b),
            Formula::Eq(a, b) => write!(f, "(= {} {})", a, b),
            Formula::Not(inner) => write!(f, "(not {})", inner),
            Formula::Ite {
                condition,
                then,
                otherwise,
            } => write!(f, "(ite {} {} {})", condition, then, otherwise),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckResult {
    Satisfiable,
    Unsatisfiable,
    /// The prover gave up. Callers must treat this like `Satisfiable`.
    Unknown,
}

/// An incremental prover session with a stack of assertion scopes.
pub trait Prover {
    fn new_variable(&mut self, name: &str, sort: Sort) -> Formula;

    fn assert(&mut self, formula: Formula);

    fn push(&mut self);

    fn pop(&mut self);

    /// Satisfiability of all current assertions together with `assumptions`.
    fn check(&mut self, assumptions: &[Formula]) -> CheckResult;
}

/// An assertion scope that is popped when the guard is dropped.
pub struct ProverScope<'a, P: Prover + ?Sized> {
    prover: &'a mut P,
}

impl<'a, P: Prover + ?Sized> ProverScope<'a, P> {
    pub fn new(prover: &'a mut P) -> Self {
        prover.push();
        Self { prover }
    }
}

impl<P: Prover + ?Sized> Deref for ProverScope<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.prover
    }
}

impl<P: Prover + ?Sized> DerefMut for ProverScope<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.prover
    }
}

impl<P: Prover + ?Sized> Drop for ProverScope<'_, P> {
    fn drop(&mut self) {
        self.prover.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_variables() {
        let x = Formula::var("yul_x", Sort::Int);
        let formula = Formula::ite(x.clone().lt(Formula::int(10)), Formula::int(1), Formula::int(0))
            .not_equals(Formula::int(0));
        assert_eq!(
            formula.to_string(),
            "(not (= (ite (< yul_x 10) 1 0) 0))"
        );
        assert_eq!(formula.sort(), Sort::Bool);
        assert_eq!(
            formula.variables().into_iter().collect::<Vec<_>>(),
            vec!["yul_x".to_string()]
        );
        assert_eq!(x.add(Formula::int(1)).sort(), Sort::Int);
    }
}
