/*! Fixed-point driver for lowering one contract.
 *
 * Lowering a function can queue more functions and discover more pointer calls, and promoting
 * references can queue more functions again. The driver alternates draining the queue and
 * promoting until neither produces new work, then synthesizes the dispatchers.
 */

use crate::context::IRGenerationContext;
use crate::dispatch::{DispatchFixedPoint, FunctionRef, InternalDispatchMap};
use crate::Result;
use tracing::debug;
use yulir_core::frontend::ContractDefinition;

/// Produces the IR text of one function body.
///
/// Implementations report every function they reference through the context: direct calls via
/// `enqueue_function`, references by value via `collect_dispatchable_reference`, and calls
/// through pointers via `register_internal_dispatch`.
pub trait FunctionLowering {
    fn lower_function(
        &mut self,
        context: &mut IRGenerationContext,
        function: &FunctionRef,
    ) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct GeneratedObject {
    pub name: String,
    /// Generated functions, dispatchers and helpers, ordered by name.
    pub code: String,
    pub dispatch: InternalDispatchMap,
    pub leftover_candidates: InternalDispatchMap,
}

pub struct ObjectGenerator<L: FunctionLowering> {
    context: IRGenerationContext,
    lowering: L,
}

impl<L: FunctionLowering> ObjectGenerator<L> {
    pub fn new(context: IRGenerationContext, lowering: L) -> Self {
        Self { context, lowering }
    }

    pub fn context(&self) -> &IRGenerationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut IRGenerationContext {
        &mut self.context
    }

    pub fn lowering(&self) -> &L {
        &self.lowering
    }

    pub fn into_parts(self) -> (IRGenerationContext, L) {
        (self.context, self.lowering)
    }

    /// Lowers queued functions and promotes references until the queue stays empty.
    /// Returns the number of functions lowered and the token for consuming the dispatch state.
    pub fn generate_queued_functions(&mut self) -> Result<(usize, DispatchFixedPoint)> {
        let mut generated = 0;
        loop {
            while !self.context.function_generation_queue_empty() {
                let function = self.context.dequeue_function()?;
                let name = self.context.function_name(&function);
                if !self.context.function_collector_mut().reserve(&name) {
                    continue;
                }

                self.context.clear_local_variables();
                match self.lowering.lower_function(&mut self.context, &function) {
                    Ok(code) => self.context.function_collector_mut().define(&name, code)?,
                    Err(err) => {
                        self.context.function_collector_mut().release(&name);
                        return Err(err);
                    }
                }
                generated += 1;
            }

            if let Some(fixed_point) = self.context.promote_references()? {
                return Ok((generated, fixed_point));
            }
        }
    }

    /// Consumes the dispatch state and emits one dispatcher per arity.
    /// Returns the dispatch map and the candidates that were never promoted.
    pub fn generate_internal_dispatch_functions(
        &mut self,
        fixed_point: DispatchFixedPoint,
    ) -> Result<(InternalDispatchMap, InternalDispatchMap)> {
        let (dispatch, leftover) = self.context.consume_internal_dispatch_map(fixed_point)?;
        for (arity, functions) in &dispatch {
            self.context.internal_dispatch(*arity, functions)?;
        }
        Ok((dispatch, leftover))
    }

    /// Generates an object from its entry functions.
    pub fn generate_object(&mut self, name: &str, entries: &[FunctionRef]) -> Result<GeneratedObject> {
        for function in entries {
            self.context.enqueue_function(function);
        }
        let (generated, fixed_point) = self.generate_queued_functions()?;
        let (dispatch, leftover_candidates) =
            self.generate_internal_dispatch_functions(fixed_point)?;
        let code = self.context.function_collector_mut().take_requested_functions()?;
        debug!(
            object = name,
            functions = generated,
            dispatchers = dispatch.len(),
            "generated object"
        );
        Ok(GeneratedObject {
            name: name.to_string(),
            code,
            dispatch,
            leftover_candidates,
        })
    }

    /// Generates the creation object and then the runtime object of `contract`.
    ///
    /// Pointers created during construction can be stored and called later, so every function
    /// the creation object dispatched or kept as a candidate is offered to the runtime object
    /// as a candidate.
    pub fn generate_contract(
        &mut self,
        contract: &ContractDefinition,
        creation_entries: &[FunctionRef],
        runtime_entries: &[FunctionRef],
    ) -> Result<(GeneratedObject, GeneratedObject)> {
        self.context.set_most_derived_contract(contract.clone());

        let creation_name = self.context.creation_object_name(contract);
        let creation = self.generate_object(&creation_name, creation_entries)?;

        let mut candidates = creation.leftover_candidates.clone();
        for (arity, functions) in &creation.dispatch {
            if !functions.is_empty() {
                candidates
                    .entry(*arity)
                    .or_default()
                    .extend(functions.iter().cloned());
            }
        }
        self.context.set_internal_dispatch_candidates(candidates)?;

        let runtime_name = self.context.runtime_object_name(contract);
        let runtime = self.generate_object(&runtime_name, runtime_entries)?;
        Ok((creation, runtime))
    }
}
