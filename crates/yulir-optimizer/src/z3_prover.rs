//! Z3-backed [`Prover`].
//!
//! Formulas are translated to Z3's integer and boolean theories, so unlike
//! [`EvalProver`](crate::EvalProver) this backend can reason about variables without a concrete
//! value. That is what lets an assumption such as `x < 10` prove `x < 20` inside a nested body.
//!
//! Only available with the `smt` feature.

use crate::prover::{CheckResult, Formula, Prover, Sort};
use num_bigint::{BigInt, Sign};
use tracing::{trace, warn};
use z3::ast::{Bool, Int};
use z3::{SatResult, Solver};

/// An incremental Z3 session. Scopes map directly onto Z3's `push`/`pop`.
pub struct Z3Prover {
    solver: Solver,
    depth: usize,
    checks: usize,
}

impl Z3Prover {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            depth: 0,
            checks: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn checks_performed(&self) -> usize {
        self.checks
    }

    fn translate_bool(&self, formula: &Formula) -> Bool {
        match formula {
            Formula::Bool(value) => Bool::from_bool(*value),
            Formula::Var {
                name,
                sort: Sort::Bool,
            } => Bool::new_const(name.as_str()),
            Formula::Lt(a, b) => self.translate_int(a).lt(&self.translate_int(b)),
            Formula::Gt(a, b) => self.translate_int(a).gt(&self.translate_int(b)),
            Formula::Eq(a, b) => match (a.sort(), b.sort()) {
                (Sort::Bool, Sort::Bool) => self.translate_bool(a).eq(&self.translate_bool(b)),
                _ => self.translate_int(a).eq(&self.translate_int(b)),
            },
            Formula::Not(inner) => self.translate_bool(inner).not(),
            Formula::Ite {
                condition,
                then,
                otherwise,
            } if then.sort() == Sort::Bool => self
                .translate_bool(condition)
                .ite(&self.translate_bool(then), &self.translate_bool(otherwise)),
            // Integer-valued terms used as conditions follow the EVM convention.
            _ => self.translate_int(formula).eq(&Int::from_i64(0)).not(),
        }
    }

    fn translate_int(&self, formula: &Formula) -> Int {
        match formula {
            Formula::Int(value) => int_constant(value),
            Formula::Var {
                name,
                sort: Sort::Int,
            } => Int::new_const(name.as_str()),
            Formula::Add(a, b) => self.translate_int(a) + self.translate_int(b),
            Formula::Ite {
                condition,
                then,
                otherwise,
            } if then.sort() == Sort::Int => self
                .translate_bool(condition)
                .ite(&self.translate_int(then), &self.translate_int(otherwise)),
            _ => self
                .translate_bool(formula)
                .ite(&Int::from_i64(1), &Int::from_i64(0)),
        }
    }
}

impl Default for Z3Prover {
    fn default() -> Self {
        Self::new()
    }
}

impl Prover for Z3Prover {
    fn new_variable(&mut self, name: &str, sort: Sort) -> Formula {
        Formula::var(name, sort)
    }

    fn assert(&mut self, formula: Formula) {
        trace!(%formula, depth = self.depth, "assert");
        let translated = self.translate_bool(&formula);
        self.solver.assert(&translated);
    }

    fn push(&mut self) {
        self.solver.push();
        self.depth += 1;
    }

    fn pop(&mut self) {
        if self.depth == 0 {
            warn!("pop without a matching push ignored");
            return;
        }
        self.solver.pop(1);
        self.depth -= 1;
    }

    fn check(&mut self, assumptions: &[Formula]) -> CheckResult {
        self.checks += 1;
        self.push();
        for assumption in assumptions {
            self.assert(assumption.clone());
        }
        let result = match self.solver.check() {
            SatResult::Sat => CheckResult::Satisfiable,
            SatResult::Unsat => CheckResult::Unsatisfiable,
            SatResult::Unknown => CheckResult::Unknown,
        };
        self.pop();
        trace!(?result, "check");
        result
    }
}

/// `value` as a Z3 integer numeral. Values beyond `i64` are assembled from 64-bit limbs.
fn int_constant(value: &BigInt) -> Int {
    if let Ok(small) = i64::try_from(value) {
        return Int::from_i64(small);
    }
    let (sign, limbs) = value.to_u64_digits();
    let half = Int::from_u64(1 << 32);
    let magnitude = limbs
        .iter()
        .rev()
        .fold(Int::from_u64(0), |acc, limb| acc * half.clone() * half.clone() + Int::from_u64(*limb));
    match sign {
        Sign::Minus => Int::from_i64(0) - magnitude,
        Sign::NoSign | Sign::Plus => magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_about_free_variables() {
        let mut prover = Z3Prover::new();
        let x = prover.new_variable("x", Sort::Int);
        prover.assert(x.clone().lt(Formula::int(10)));

        assert_eq!(
            prover.check(&[x.clone().lt(Formula::int(20)).negate()]),
            CheckResult::Unsatisfiable
        );
        assert_eq!(
            prover.check(&[x.clone().lt(Formula::int(5))]),
            CheckResult::Satisfiable
        );
        assert_eq!(prover.depth(), 0);
        assert_eq!(prover.checks_performed(), 2);
    }

    #[test]
    fn test_scopes_retract_assertions() {
        let mut prover = Z3Prover::new();
        let x = prover.new_variable("x", Sort::Int);
        prover.push();
        prover.assert(x.clone().equals(Formula::int(3)));
        assert_eq!(
            prover.check(&[x.clone().equals(Formula::int(4))]),
            CheckResult::Unsatisfiable
        );
        prover.pop();
        assert_eq!(
            prover.check(&[x.equals(Formula::int(4))]),
            CheckResult::Satisfiable
        );
    }

    #[test]
    fn test_word_sized_constants() {
        let mut prover = Z3Prover::new();
        let max = (BigInt::from(1) << 256) - 1;
        let x = prover.new_variable("x", Sort::Int);
        prover.assert(x.clone().equals(Formula::int(max.clone())));

        assert_eq!(
            prover.check(&[x.clone().add(Formula::int(1)).gt(Formula::int(max))]),
            CheckResult::Satisfiable
        );
        assert_eq!(
            prover.check(&[x.lt(Formula::int(0))]),
            CheckResult::Unsatisfiable
        );
    }
}
