/*! Internal dispatch bookkeeping.
 *
 * A function needs to be reachable through an internal dispatch function when it is referenced
 * by name outside of a direct call and some call through a pointer of the same arity exists.
 * Neither fact is known when the reference is seen, so references are staged, turned into
 * candidates, and promoted into the dispatch map once a pointer call of their arity shows up.
 */

use crate::ast_builder::{assign, call, expr_stmt, function, ident};
use crate::names::{function_name, internal_dispatch_function_name, suffixed_variable_names};
use crate::{precondition, Result};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use tracing::{debug, trace};
use yulir_core::ast::{Block, Case, Expression, FunctionDefinition as IrFunction, Literal, Span, Statement, Switch};
use yulir_core::frontend::{FunctionDefinition, NodeId};
use yulir_core::Arity;

/// Shared handle to a frontend function. Equality and order follow the function's identity.
#[derive(Clone)]
pub struct FunctionRef(Rc<FunctionDefinition>);

impl FunctionRef {
    pub fn new(function: FunctionDefinition) -> Self {
        Self(Rc::new(function))
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }
}

impl Deref for FunctionRef {
    type Target = FunctionDefinition;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<FunctionDefinition> for FunctionRef {
    fn from(function: FunctionDefinition) -> Self {
        Self::new(function)
    }
}

impl From<Rc<FunctionDefinition>> for FunctionRef {
    fn from(function: Rc<FunctionDefinition>) -> Self {
        Self(function)
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for FunctionRef {}

impl PartialOrd for FunctionRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FunctionRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.name, self.0.id)
    }
}

pub type FunctionSet = BTreeSet<FunctionRef>;

/// Arity to the functions callable through that arity's dispatcher.
///
/// A key with an empty set is meaningful: a pointer call of that arity exists although no
/// function was ever assigned to such a pointer. The call fails at runtime but must compile.
pub type InternalDispatchMap = BTreeMap<Arity, FunctionSet>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    /// Nothing recorded since the last consumption.
    Idle,
    /// References, pointer calls or queued functions were recorded since the last promotion.
    Collecting,
    /// A promotion ran with an empty generation queue. The maps may be consumed.
    ReadyToConsume,
}

/// Issued by a promotion that left nothing to lower.
///
/// Consuming the dispatch state takes one by value, so the maps cannot be handed out by code
/// that never observed the fixed point. A token goes stale if more work is recorded after it
/// was issued; `consume` rejects it then.
#[derive(Debug)]
#[must_use = "the dispatch state can only be consumed with this token"]
pub struct DispatchFixedPoint {
    _private: (),
}

#[derive(Debug)]
pub struct DispatchTableBuilder {
    dispatch: InternalDispatchMap,
    candidates: InternalDispatchMap,
    pending_references: BTreeMap<NodeId, FunctionRef>,
    phase: DispatchPhase,
}

impl DispatchTableBuilder {
    pub fn new() -> Self {
        Self {
            dispatch: InternalDispatchMap::new(),
            candidates: InternalDispatchMap::new(),
            pending_references: BTreeMap::new(),
            phase: DispatchPhase::Idle,
        }
    }

    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    pub fn dispatch(&self) -> &InternalDispatchMap {
        &self.dispatch
    }

    pub fn candidates(&self) -> &InternalDispatchMap {
        &self.candidates
    }

    pub fn pending_reference_count(&self) -> usize {
        self.pending_references.len()
    }

    pub fn is_clean(&self) -> bool {
        self.dispatch.is_empty() && self.candidates.is_empty() && self.pending_references.is_empty()
    }

    /// Records that work was added after the last promotion.
    pub(crate) fn touch(&mut self) {
        self.phase = DispatchPhase::Collecting;
    }

    /// Seeds the candidate pool, typically with functions whose pointers were created by another
    /// object of the same contract.
    pub fn set_candidates(&mut self, candidates: InternalDispatchMap) -> Result<()> {
        precondition(self.is_clean(), || {
            "Dispatch candidates can only be seeded into a clean dispatch state.".to_string()
        })?;
        self.candidates = candidates;
        if !self.candidates.is_empty() {
            self.touch();
        }
        Ok(())
    }

    /// Stages `function`, referenced by name in `expression`, until the next promotion.
    /// Returns the name of the dispatcher for the function's arity.
    pub fn collect_reference(&mut self, expression: NodeId, function: &FunctionRef) -> Result<String> {
        precondition(!self.pending_references.contains_key(&expression), || {
            format!(
                "Expression {} already holds a dispatchable reference.",
                expression
            )
        })?;
        trace!(expression = %expression, function = ?function, "collected dispatchable reference");
        self.pending_references.insert(expression, function.clone());
        self.touch();
        Ok(internal_dispatch_function_name(function.arity()))
    }

    /// Drops the staged reference of `expression`, which turned out to be a direct call.
    pub fn forget_reference(&mut self, expression: NodeId) -> Result<()> {
        precondition(self.pending_references.remove(&expression).is_some(), || {
            format!(
                "Expression {} has no dispatchable reference to forget.",
                expression
            )
        })?;
        self.touch();
        Ok(())
    }

    /// Notes a call through a pointer of `arity`. Repeated registration only returns the name.
    pub fn register_dispatch(&mut self, arity: Arity) -> String {
        if !self.dispatch.contains_key(&arity) {
            debug!(%arity, "registered internal dispatch");
            self.dispatch.insert(arity, FunctionSet::new());
            self.touch();
        }
        internal_dispatch_function_name(arity)
    }

    /// Moves staged references into the candidate pool or the dispatch map and promotes
    /// candidates whose arity gained a dispatch entry.
    ///
    /// Returns the functions that became dispatchable; the caller must queue them for
    /// generation, since their bodies may hold further references.
    pub fn promote(&mut self) -> Result<Vec<FunctionRef>> {
        let mut newly_dispatchable = Vec::new();

        for (arity, functions) in self.dispatch.iter_mut() {
            let Some(candidates) = self.candidates.remove(arity) else {
                continue;
            };
            precondition(functions.is_empty(), || {
                format!(
                    "Arity {} has both dispatch members and candidates before promotion.",
                    arity
                )
            })?;
            debug!(%arity, count = candidates.len(), "promoted dispatch candidates");
            newly_dispatchable.extend(candidates.iter().cloned());
            *functions = candidates;
        }

        for function in std::mem::take(&mut self.pending_references).into_values() {
            let arity = function.arity();
            let in_dispatch = self.dispatch.contains_key(&arity);
            precondition(!(in_dispatch && self.candidates.contains_key(&arity)), || {
                format!("Arity {} is both dispatched and a candidate.", arity)
            })?;

            if let Some(functions) = self.dispatch.get_mut(&arity) {
                if functions.insert(function.clone()) {
                    newly_dispatchable.push(function);
                }
            } else {
                self.candidates.entry(arity).or_default().insert(function);
            }
        }

        self.check_partition()?;
        Ok(newly_dispatchable)
    }

    pub(crate) fn mark_ready_to_consume(&mut self) -> DispatchFixedPoint {
        self.phase = DispatchPhase::ReadyToConsume;
        DispatchFixedPoint { _private: () }
    }

    /// Hands out the final dispatch map and the leftover candidates and resets both.
    pub fn consume(
        &mut self,
        _fixed_point: DispatchFixedPoint,
    ) -> Result<(InternalDispatchMap, InternalDispatchMap)> {
        precondition(self.pending_references.is_empty(), || {
            "References must be promoted before the internal dispatch map is consumed.".to_string()
        })?;
        precondition(self.phase == DispatchPhase::ReadyToConsume, || {
            "Internal dispatch map consumed before promotion reached a fixed point.".to_string()
        })?;
        self.phase = DispatchPhase::Idle;
        Ok((
            std::mem::take(&mut self.dispatch),
            std::mem::take(&mut self.candidates),
        ))
    }

    fn check_partition(&self) -> Result<()> {
        match self
            .dispatch
            .keys()
            .find(|arity| self.candidates.contains_key(arity))
        {
            Some(arity) => Err(crate::CodegenError::PreconditionViolation(format!(
                "Arity {} is a key of both the dispatch and the candidate map.",
                arity
            ))),
            None => Ok(()),
        }
    }
}

impl Default for DispatchTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// IR of the dispatcher for `arity` over `functions`.
///
/// The dispatcher takes the function identity followed by the arguments and switches over the
/// identity. Unknown identities, including the uninitialised pointer 0, hit `invalid()`.
pub fn dispatch_function_definition(arity: Arity, functions: &FunctionSet) -> Result<IrFunction> {
    let inputs = suffixed_variable_names("in_", 0, arity.inputs);
    let outputs = suffixed_variable_names("out_", 0, arity.outputs);

    let mut cases = Vec::with_capacity(functions.len() + 1);
    for function in functions {
        precondition(function.arity() == arity, || {
            format!(
                "A single dispatch function can only handle functions of one arity: {} has {}, expected {}.",
                function_name(function),
                function.arity(),
                arity
            )
        })?;
        precondition(!function.is_constructor(), || {
            format!("Constructor {} cannot be called internally.", function.name)
        })?;
        precondition(function.id() != NodeId::UNINITIALIZED_FUNCTION, || {
            "Unexpected function ID: 0".to_string()
        })?;

        let arguments: Vec<Expression> = inputs.iter().map(|name| ident(name)).collect();
        let forward = call(&function_name(function), arguments);
        let statement = if outputs.is_empty() {
            expr_stmt(forward)
        } else {
            assign(&outputs, forward)
        };
        cases.push(Case {
            span: Span::default(),
            value: Some(Literal::number(function.id().to_string())),
            body: Block::new(vec![statement]),
        });
    }
    cases.push(Case {
        span: Span::default(),
        value: None,
        body: Block::new(vec![expr_stmt(call("invalid", vec![]))]),
    });

    let mut parameters = vec!["fun".to_string()];
    parameters.extend(inputs);

    Ok(function(
        &internal_dispatch_function_name(arity),
        &parameters,
        &outputs,
        vec![Statement::Switch(Switch {
            span: Span::default(),
            expression: ident("fun"),
            cases,
        })],
    ))
}
