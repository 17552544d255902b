use pretty_assertions::assert_eq;
use yulir_core::ast::{Block, Statement};
use yulir_core::{Dialect, EvmVersion};
use yulir_emit::YulPrinter;
use yulir_optimizer::{
    CheckResult, EvalProver, Formula, OptimiserStepContext, OptimiserSuite, Prover,
    ReasoningBasedSimplifier, ReasoningBasedSimplifierStep, SimplifierStats, Sort,
};
use yulir_parser::parse;

fn simplify(source: &str) -> (String, SimplifierStats) {
    let dialect = Dialect::evm(EvmVersion::London);
    let mut block = parse(source).unwrap();
    let stats = ReasoningBasedSimplifier::run(&dialect, &mut block);
    (YulPrinter::new().print_block(&block), stats)
}

/// Forwards to [`EvalProver`] and keeps count of scope operations.
#[derive(Default)]
struct RecordingProver {
    inner: EvalProver,
    depth: usize,
    max_depth: usize,
    pushes: usize,
    pops: usize,
    checks: Vec<CheckResult>,
}

impl Prover for RecordingProver {
    fn new_variable(&mut self, name: &str, sort: Sort) -> Formula {
        self.inner.new_variable(name, sort)
    }

    fn assert(&mut self, formula: Formula) {
        self.inner.assert(formula)
    }

    fn push(&mut self) {
        self.pushes += 1;
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.inner.push()
    }

    fn pop(&mut self) {
        assert!(self.depth > 0, "pop without push");
        self.pops += 1;
        self.depth -= 1;
        self.inner.pop()
    }

    fn check(&mut self, assumptions: &[Formula]) -> CheckResult {
        let result = self.inner.check(assumptions);
        self.checks.push(result);
        result
    }
}

#[test]
fn test_conditions_on_known_values_become_constants() {
    let (output, stats) = simplify(
        "{
    let x := 5
    if lt(x, 10) {
        sstore(0, x)
    }
    if gt(x, 10) {
        sstore(1, x)
    }
    let y := calldataload(0)
    if lt(y, 10) {
        sstore(2, y)
    }
}",
    );
    assert_eq!(
        output,
        "{
    let x := 5
    if 1 {
        sstore(0, x)
    }
    if 0 {
        sstore(1, x)
    }
    let y := calldataload(0)
    if lt(y, 10) {
        sstore(2, y)
    }
}"
    );
    assert_eq!(
        stats,
        SimplifierStats {
            rewritten_to_true: 1,
            rewritten_to_false: 1
        }
    );
}

#[test]
fn test_sum_of_single_assignment_variables() {
    let (output, stats) = simplify(
        "{
    let a := 2
    let b := 3
    if lt(add(a, b), 10) {
        let c := mload(a)
        sstore(b, c)
    }
}",
    );
    assert_eq!(
        output,
        "{
    let a := 2
    let b := 3
    if 1 {
        let c := mload(a)
        sstore(b, c)
    }
}"
    );
    assert_eq!(stats.total(), 1);
}

#[test]
fn test_assumptions_do_not_leak_out_of_bodies() {
    let (output, _) = simplify(
        "{
    let x := 5
    if lt(x, 3) {
        if gt(x, 4) {
            sstore(0, 0)
        }
    }
    if gt(x, 3) {
        sstore(1, 0)
    }
}",
    );
    assert_eq!(
        output,
        "{
    let x := 5
    if 0 {
        if 0 {
            sstore(0, 0)
        }
    }
    if 1 {
        sstore(1, 0)
    }
}"
    );
}

#[test]
fn test_unmodelled_operations_are_left_alone() {
    let source = "{
    function f(a) -> r {
        r := a
    }
    let x := 5
    if mul(x, 2) {
        sstore(0, 0)
    }
    if f(x) {
        sstore(1, 0)
    }
    if lt(unknown, 1) {
        sstore(2, 0)
    }
}";
    let (output, stats) = simplify(source);
    assert_eq!(output, source);
    assert_eq!(stats.total(), 0);
}

#[test]
fn test_reassigned_and_unvalued_variables_stay_unconstrained() {
    let source = "{
    let x := 5
    x := 20
    if lt(x, 10) {
        sstore(0, 0)
    }
    let a, b := f()
    if lt(a, 1) {
        sstore(1, 0)
    }
    let c
    if c {
        sstore(2, 0)
    }
    function f() -> p, q { }
}";
    let (output, stats) = simplify(source);
    assert_eq!(output, source);
    assert_eq!(stats, SimplifierStats::default());
}

#[test]
fn test_walk_reaches_functions_switches_and_loops() {
    let (output, stats) = simplify(
        "{
    function h() -> r {
        let k := 1
        if k {
            r := 2
        }
    }
    switch calldataload(0)
    case 0 {
        let z := iszero(0)
        if eq(z, 1) {
            sstore(0, 0)
        }
    }
    default {
        for { } 1 { } {
            let w := 0
            if w {
                break
            }
        }
    }
}",
    );
    assert_eq!(
        output,
        "{
    function h() -> r {
        let k := 1
        if 1 {
            r := 2
        }
    }
    switch calldataload(0)
    case 0 {
        let z := iszero(0)
        if 1 {
            sstore(0, 0)
        }
    }
    default {
        for { } 1 { } {
            let w := 0
            if 0 {
                break
            }
        }
    }
}"
    );
    assert_eq!(stats.rewritten_to_true, 2);
    assert_eq!(stats.rewritten_to_false, 1);
}

#[test]
fn test_prover_scopes_are_balanced() {
    let dialect = Dialect::evm(EvmVersion::London);
    let mut block = parse(
        "{
    let x := 5
    if lt(x, 10) {
        if gt(x, 1) {
            if eq(x, 7) {
                sstore(0, 0)
            }
        }
    }
    if lt(calldataload(0), 1) { }
}",
    )
    .unwrap();

    let mut prover = RecordingProver::default();
    ReasoningBasedSimplifier::run_with_prover(&dialect, &mut block, &mut prover);

    // Two hypothetical scopes and one body scope per `if`.
    assert_eq!(prover.pushes, 12);
    assert_eq!(prover.pops, prover.pushes);
    assert_eq!(prover.depth, 0);
    assert_eq!(prover.max_depth, 3);
    assert_eq!(prover.checks.len(), 8);
    assert_eq!(prover.inner.depth(), 0);
}

#[test]
fn test_rewritten_literal_keeps_condition_span() {
    let dialect = Dialect::evm(EvmVersion::London);
    let mut block = parse("{\n    let x := 5\n    if lt(x, 10) { }\n}").unwrap();
    let span_of_condition = |block: &Block| match &block.statements[1] {
        Statement::If(if_statement) => if_statement.condition.span(),
        other => panic!("expected if, found {:?}", other),
    };
    let before = span_of_condition(&block);
    ReasoningBasedSimplifier::run(&dialect, &mut block);
    assert_eq!(span_of_condition(&block), before);
}

#[test]
fn test_step_accumulates_statistics_in_a_suite() {
    let context = OptimiserStepContext::new(Dialect::evm(EvmVersion::London));
    let mut block = parse("{\n    let x := 1\n    if x { }\n}").unwrap();

    let mut suite = OptimiserSuite::new();
    suite.enable_statistics();
    suite.register_step(ReasoningBasedSimplifierStep::new());
    suite.run_all(&context, &mut block).unwrap();

    assert_eq!(suite.statistics()[0].name, "ReasoningBasedSimplifier");
    assert_eq!(
        suite.statistics()[0].summary.as_deref(),
        Some("1 condition(s) always true, 0 always false")
    );
    assert_eq!(
        YulPrinter::new().print_block(&block),
        "{\n    let x := 1\n    if 1 { }\n}"
    );
}

/// Gives up on every query.
struct UndecidedProver;

impl Prover for UndecidedProver {
    fn new_variable(&mut self, name: &str, sort: Sort) -> Formula {
        Formula::var(name, sort)
    }

    fn assert(&mut self, _formula: Formula) {}

    fn push(&mut self) {}

    fn pop(&mut self) {}

    fn check(&mut self, _assumptions: &[Formula]) -> CheckResult {
        CheckResult::Unknown
    }
}

#[test]
fn test_unknown_answers_never_rewrite() {
    let source = "{
    let x := 5
    if lt(x, 10) {
        sstore(0, x)
    }
    if gt(x, 10) {
        sstore(1, x)
    }
}";
    let dialect = Dialect::evm(EvmVersion::London);
    let mut block = parse(source).unwrap();
    let stats = ReasoningBasedSimplifier::run_with_prover(&dialect, &mut block, &mut UndecidedProver);

    assert_eq!(YulPrinter::new().print_block(&block), source);
    assert_eq!(stats, SimplifierStats::default());
}

const GUARDED_BY_OUTER_BRANCH: &str = "{
    let x := calldataload(0)
    if lt(x, 10) {
        if lt(x, 20) {
            sstore(0, 1)
        }
    }
    if lt(x, x) {
        sstore(1, 1)
    }
}";

#[test]
fn test_evaluator_cannot_use_branch_assumptions() {
    let dialect = Dialect::evm(EvmVersion::London);
    let mut block = parse(GUARDED_BY_OUTER_BRANCH).unwrap();
    let mut prover = EvalProver::new();
    let stats = ReasoningBasedSimplifier::run_with_prover(&dialect, &mut block, &mut prover);

    assert_eq!(YulPrinter::new().print_block(&block), GUARDED_BY_OUTER_BRANCH);
    assert_eq!(stats.total(), 0);
}

#[cfg(feature = "smt")]
#[test]
fn test_branch_assumption_proves_nested_condition() {
    let (output, stats) = simplify(GUARDED_BY_OUTER_BRANCH);
    assert_eq!(
        output,
        "{
    let x := calldataload(0)
    if lt(x, 10) {
        if 1 {
            sstore(0, 1)
        }
    }
    if 0 {
        sstore(1, 1)
    }
}"
    );
    assert_eq!(
        stats,
        SimplifierStats {
            rewritten_to_true: 1,
            rewritten_to_false: 1
        }
    );
}

#[cfg(feature = "smt")]
#[test]
fn test_branch_assumption_does_not_reach_siblings() {
    let (output, stats) = simplify(
        "{
    let x := calldataload(0)
    if lt(x, 10) {
        sstore(0, 1)
    }
    if lt(x, 20) {
        sstore(1, 1)
    }
}",
    );
    assert_eq!(
        output,
        "{
    let x := calldataload(0)
    if lt(x, 10) {
        sstore(0, 1)
    }
    if lt(x, 20) {
        sstore(1, 1)
    }
}"
    );
    assert_eq!(stats.total(), 0);
}
