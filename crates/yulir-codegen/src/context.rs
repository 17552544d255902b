use crate::abi::ABIFunctions;
use crate::ast_builder::render_function;
use crate::collector::MultiUseFunctionCollector;
use crate::dispatch::{
    dispatch_function_definition, DispatchFixedPoint, DispatchPhase, DispatchTableBuilder, FunctionRef, FunctionSet,
    InternalDispatchMap,
};
use crate::names;
use crate::utils::YulUtilFunctions;
use crate::variable::IRVariable;
use crate::{precondition, CodegenError, Result};
use num_bigint::BigUint;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};
use yulir_core::frontend::{CallExpression, ContractDefinition, NodeId, VariableDeclaration};
use yulir_core::{Arity, CodegenSettings};

/// Start of memory that is free for general use once the scratch space and the zero slot are
/// accounted for. Immutables are staged right above it during construction.
pub const GENERAL_PURPOSE_MEMORY_START: usize = 0x80;

/// State shared by every step of lowering one compilation unit.
///
/// One context lowers the creation object and then the runtime object of a contract. Consuming
/// the internal dispatch map between the two resets the dispatch state while names, locals and
/// collected helper functions survive.
#[derive(Debug)]
pub struct IRGenerationContext {
    settings: CodegenSettings,
    most_derived_contract: Option<ContractDefinition>,
    local_variables: BTreeMap<NodeId, IRVariable>,
    /// Offsets of immutables relative to the start of the reserved area.
    immutable_variables: BTreeMap<NodeId, usize>,
    /// `None` once the reserved area was finalized.
    reserved_memory: Option<usize>,
    /// Storage slot and byte offset of each state variable.
    state_variables: BTreeMap<NodeId, (BigUint, u32)>,
    functions: MultiUseFunctionCollector,
    var_counter: usize,
    function_generation_queue: BTreeSet<FunctionRef>,
    dispatch: DispatchTableBuilder,
    sub_objects: BTreeMap<NodeId, ContractDefinition>,
}

impl IRGenerationContext {
    pub fn new(settings: CodegenSettings) -> Self {
        Self {
            settings,
            most_derived_contract: None,
            local_variables: BTreeMap::new(),
            immutable_variables: BTreeMap::new(),
            reserved_memory: Some(0),
            state_variables: BTreeMap::new(),
            functions: MultiUseFunctionCollector::new(),
            var_counter: 0,
            function_generation_queue: BTreeSet::new(),
            dispatch: DispatchTableBuilder::new(),
            sub_objects: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> CodegenSettings {
        self.settings
    }

    /// Returns the generated name of `function` and queues it unless its code already exists.
    pub fn enqueue_function(&mut self, function: &FunctionRef) -> String {
        let name = names::function_name(function);
        if !self.functions.contains(&name) && self.function_generation_queue.insert(function.clone()) {
            trace!(function = %name, "queued function for generation");
            self.dispatch.touch();
        }
        name
    }

    /// Removes the queued function with the lowest identity.
    pub fn dequeue_function(&mut self) -> Result<FunctionRef> {
        let function = self.function_generation_queue.pop_first().ok_or_else(|| {
            CodegenError::PreconditionViolation(
                "Function generation queue is empty.".to_string(),
            )
        })?;
        trace!(function = ?function, "dequeued function");
        Ok(function)
    }

    pub fn function_generation_queue_empty(&self) -> bool {
        self.function_generation_queue.is_empty()
    }

    pub fn queued_function_count(&self) -> usize {
        self.function_generation_queue.len()
    }

    pub fn set_most_derived_contract(&mut self, contract: ContractDefinition) {
        self.most_derived_contract = Some(contract);
    }

    pub fn most_derived_contract(&self) -> Result<&ContractDefinition> {
        self.most_derived_contract.as_ref().ok_or_else(|| {
            CodegenError::PreconditionViolation("Most derived contract requested but not set.".to_string())
        })
    }

    pub fn bind_local_variable(&mut self, declaration: &VariableDeclaration) -> Result<&IRVariable> {
        precondition(!self.local_variables.contains_key(&declaration.id), || {
            format!("Local variable {} added twice.", declaration.name)
        })?;
        let variable = IRVariable::from_declaration(declaration);
        Ok(self.local_variables.entry(declaration.id).or_insert(variable))
    }

    pub fn is_local_variable(&self, declaration: &VariableDeclaration) -> bool {
        self.local_variables.contains_key(&declaration.id)
    }

    pub fn local_variable(&self, declaration: &VariableDeclaration) -> Result<&IRVariable> {
        self.local_variables.get(&declaration.id).ok_or_else(|| {
            CodegenError::PreconditionViolation(format!("Unknown variable: {}", declaration.name))
        })
    }

    /// Forgets all locals. Lowering calls this before each function body.
    pub fn clear_local_variables(&mut self) {
        self.local_variables.clear();
    }

    /// Reserves a word of memory for `declaration` during construction.
    pub fn register_immutable_variable(&mut self, declaration: &VariableDeclaration) -> Result<()> {
        precondition(declaration.is_immutable(), || {
            format!("Attempted to register a non-immutable variable {} as immutable.", declaration.name)
        })?;
        if !declaration.ty.is_value_type() || declaration.ty.size_on_stack() != 1 {
            return Err(CodegenError::Unimplemented(format!(
                "Immutable variables of type {} are not supported.",
                declaration.ty
            )));
        }
        let reserved = self.reserved_memory.as_mut().ok_or_else(|| {
            CodegenError::PreconditionViolation(
                "Reserved memory has already been finalized.".to_string(),
            )
        })?;
        let width = declaration.ty.memory_head_size();
        precondition(width == 32, || {
            format!("Immutable {} does not occupy exactly one word.", declaration.name)
        })?;

        let offset = *reserved;
        *reserved += width;
        self.immutable_variables.insert(declaration.id, offset);
        debug!(variable = %declaration.name, offset, "registered immutable");
        Ok(())
    }

    /// Absolute memory offset of a registered immutable.
    pub fn immutable_memory_offset(&self, declaration: &VariableDeclaration) -> Result<usize> {
        self.immutable_variables
            .get(&declaration.id)
            .map(|offset| GENERAL_PURPOSE_MEMORY_START + offset)
            .ok_or_else(|| {
                CodegenError::PreconditionViolation(format!(
                    "Unknown immutable variable: {}",
                    declaration.name
                ))
            })
    }

    /// Total bytes reserved for immutables. Closes the reservation.
    pub fn finalize_reserved_memory(&mut self) -> Result<usize> {
        self.reserved_memory.take().ok_or_else(|| {
            CodegenError::PreconditionViolation("Reserved memory was already finalized.".to_string())
        })
    }

    pub fn register_state_variable(
        &mut self,
        declaration: &VariableDeclaration,
        storage_offset: BigUint,
        byte_offset: u32,
    ) {
        self.state_variables
            .insert(declaration.id, (storage_offset, byte_offset));
    }

    pub fn is_state_variable(&self, declaration: &VariableDeclaration) -> bool {
        self.state_variables.contains_key(&declaration.id)
    }

    pub fn storage_location_of_variable(
        &self,
        declaration: &VariableDeclaration,
    ) -> Result<&(BigUint, u32)> {
        self.state_variables.get(&declaration.id).ok_or_else(|| {
            CodegenError::PreconditionViolation(format!(
                "Unknown state variable: {}",
                declaration.name
            ))
        })
    }

    pub fn function_name(&self, function: &FunctionRef) -> String {
        names::function_name(function)
    }

    pub fn getter_function_name(&self, declaration: &VariableDeclaration) -> String {
        names::getter_function_name(declaration)
    }

    pub fn creation_object_name(&self, contract: &ContractDefinition) -> String {
        names::creation_object_name(contract)
    }

    pub fn runtime_object_name(&self, contract: &ContractDefinition) -> String {
        names::runtime_object_name(contract)
    }

    /// A fresh temporary: `_1`, `_2`, ...
    pub fn new_yul_variable(&mut self) -> String {
        self.var_counter += 1;
        format!("_{}", self.var_counter)
    }

    pub fn try_success_condition_variable(&self, expression: &CallExpression) -> Result<String> {
        precondition(expression.try_call, || {
            format!("Expression {} is not part of a try statement.", expression.id)
        })?;
        Ok(format!("trySuccessCondition_{}", expression.id))
    }

    pub fn add_sub_object(&mut self, contract: ContractDefinition) {
        self.sub_objects.insert(contract.id, contract);
    }

    /// Contracts whose code is embedded in the current object, ordered by identity.
    pub fn sub_objects_created(&self) -> impl Iterator<Item = &ContractDefinition> {
        self.sub_objects.values()
    }

    pub fn dispatch_phase(&self) -> DispatchPhase {
        self.dispatch.phase()
    }

    pub fn set_internal_dispatch_candidates(&mut self, candidates: InternalDispatchMap) -> Result<()> {
        self.dispatch.set_candidates(candidates)
    }

    pub fn internal_dispatch_clean(&self) -> bool {
        self.dispatch.is_clean()
    }

    pub fn collect_dispatchable_reference(
        &mut self,
        expression: NodeId,
        function: &FunctionRef,
    ) -> Result<String> {
        self.dispatch.collect_reference(expression, function)
    }

    pub fn forget_dispatchable_reference(&mut self, expression: NodeId) -> Result<()> {
        self.dispatch.forget_reference(expression)
    }

    /// Notes a call through an internal function pointer of `arity`.
    pub fn register_internal_dispatch(&mut self, arity: Arity) -> String {
        self.dispatch.register_dispatch(arity)
    }

    /// Runs one promotion step and queues every function that became dispatchable.
    ///
    /// When the generation queue is still empty afterwards, the dispatch state is complete and
    /// the returned token allows consuming it.
    pub fn promote_references(&mut self) -> Result<Option<DispatchFixedPoint>> {
        for function in self.dispatch.promote()? {
            self.enqueue_function(&function);
        }
        if self.function_generation_queue.is_empty() {
            return Ok(Some(self.dispatch.mark_ready_to_consume()));
        }
        Ok(None)
    }

    /// Hands out the dispatch map and the leftover candidates, leaving both empty.
    pub fn consume_internal_dispatch_map(
        &mut self,
        fixed_point: DispatchFixedPoint,
    ) -> Result<(InternalDispatchMap, InternalDispatchMap)> {
        precondition(self.function_generation_queue.is_empty(), || {
            "Internal dispatch map consumed while functions are still queued.".to_string()
        })?;
        let (dispatch, candidates) = self.dispatch.consume(fixed_point)?;
        debug!(
            arities = dispatch.len(),
            leftover = candidates.len(),
            "consumed internal dispatch map"
        );
        Ok((dispatch, candidates))
    }

    /// Name of the dispatcher for `arity` over `functions`, generating it on first request.
    pub fn internal_dispatch(&mut self, arity: Arity, functions: &FunctionSet) -> Result<String> {
        let definition = dispatch_function_definition(arity, functions)?;
        let name = names::internal_dispatch_function_name(arity);
        self.functions.create_function(&name, |_| {
            debug!(%arity, cases = functions.len(), "synthesized internal dispatch");
            Ok(render_function(definition))
        })
    }

    pub fn utils(&mut self) -> YulUtilFunctions<'_> {
        YulUtilFunctions::new(self.settings, &mut self.functions)
    }

    pub fn abi_functions(&mut self) -> ABIFunctions<'_> {
        ABIFunctions::new(self.settings, &mut self.functions)
    }

    pub fn revert_reason_if_debug(&self, message: &str) -> String {
        YulUtilFunctions::revert_reason_if_debug(self.settings.revert_strings, message)
    }

    pub fn function_collector(&self) -> &MultiUseFunctionCollector {
        &self.functions
    }

    pub fn function_collector_mut(&mut self) -> &mut MultiUseFunctionCollector {
        &mut self.functions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yulir_core::frontend::FunctionDefinition;
    use yulir_core::SolType;

    fn function(id: u64, name: &str) -> FunctionRef {
        FunctionRef::new(FunctionDefinition::new(id, name))
    }

    #[test]
    fn test_enqueue_is_idempotent_and_dequeue_picks_lowest_id() {
        let mut context = IRGenerationContext::new(CodegenSettings::default());
        let g = function(9, "g");
        let f = function(4, "f");

        assert_eq!(context.enqueue_function(&g), "fun_g_9");
        assert_eq!(context.enqueue_function(&f), "fun_f_4");
        assert_eq!(context.enqueue_function(&g), "fun_g_9");
        assert_eq!(context.queued_function_count(), 2);

        assert_eq!(context.dequeue_function().unwrap().id(), NodeId(4));
        assert_eq!(context.dequeue_function().unwrap().id(), NodeId(9));
        assert!(matches!(
            context.dequeue_function(),
            Err(CodegenError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_temporaries_are_numbered_from_one() {
        let mut context = IRGenerationContext::new(CodegenSettings::default());
        assert_eq!(context.new_yul_variable(), "_1");
        assert_eq!(context.new_yul_variable(), "_2");
    }

    #[test]
    fn test_immutable_storage_is_word_aligned() {
        let mut context = IRGenerationContext::new(CodegenSettings::default());
        let a = VariableDeclaration::new(1, "a", SolType::Uint(256)).immutable();
        let b = VariableDeclaration::new(2, "b", SolType::Address).immutable();
        context.register_immutable_variable(&a).unwrap();
        context.register_immutable_variable(&b).unwrap();
        assert_eq!(context.immutable_memory_offset(&a).unwrap(), 128);
        assert_eq!(context.immutable_memory_offset(&b).unwrap(), 160);
        assert_eq!(context.finalize_reserved_memory().unwrap(), 64);
        assert!(context.finalize_reserved_memory().is_err());
    }

    #[test]
    fn test_local_variables_bind_once() {
        let mut context = IRGenerationContext::new(CodegenSettings::default());
        let x = VariableDeclaration::new(3, "x", SolType::Uint(256));

        let err = context.local_variable(&x).unwrap_err();
        assert!(matches!(err, CodegenError::PreconditionViolation(ref message) if message == "Unknown variable: x"));

        assert_eq!(context.bind_local_variable(&x).unwrap().name(), "vloc_x_3");
        assert!(context.is_local_variable(&x));
        assert!(matches!(
            context.bind_local_variable(&x),
            Err(CodegenError::PreconditionViolation(_))
        ));
        assert_eq!(context.local_variable(&x).unwrap().name(), "vloc_x_3");

        context.clear_local_variables();
        assert!(!context.is_local_variable(&x));
        assert!(context.bind_local_variable(&x).is_ok());
    }

    #[test]
    fn test_immutable_registration_rejects_misuse() {
        let mut context = IRGenerationContext::new(CodegenSettings::default());

        let mutable = VariableDeclaration::new(1, "m", SolType::Uint(256));
        assert!(matches!(
            context.register_immutable_variable(&mutable),
            Err(CodegenError::PreconditionViolation(_))
        ));

        let callback =
            VariableDeclaration::new(2, "callback", SolType::external_function(vec![], vec![]))
                .immutable();
        assert!(matches!(
            context.register_immutable_variable(&callback),
            Err(CodegenError::Unimplemented(_))
        ));

        let late = VariableDeclaration::new(3, "late", SolType::Uint(8)).immutable();
        assert_eq!(context.finalize_reserved_memory().unwrap(), 0);
        assert!(matches!(
            context.register_immutable_variable(&late),
            Err(CodegenError::PreconditionViolation(_))
        ));
        assert!(context.immutable_memory_offset(&late).is_err());
    }

    #[test]
    fn test_state_variable_registration_overwrites() {
        let mut context = IRGenerationContext::new(CodegenSettings::default());
        let owner = VariableDeclaration::new(5, "owner", SolType::Address);
        assert!(!context.is_state_variable(&owner));
        assert!(context.storage_location_of_variable(&owner).is_err());

        context.register_state_variable(&owner, BigUint::from(0u32), 0);
        context.register_state_variable(&owner, BigUint::from(2u32), 12);

        assert!(context.is_state_variable(&owner));
        assert_eq!(
            context.storage_location_of_variable(&owner).unwrap(),
            &(BigUint::from(2u32), 12)
        );
    }

    #[test]
    fn test_try_success_condition_requires_try_call() {
        let context = IRGenerationContext::new(CodegenSettings::default());
        let plain = CallExpression {
            id: NodeId(17),
            try_call: false,
        };
        let guarded = CallExpression {
            id: NodeId(18),
            try_call: true,
        };

        assert!(matches!(
            context.try_success_condition_variable(&plain),
            Err(CodegenError::PreconditionViolation(_))
        ));
        assert_eq!(
            context.try_success_condition_variable(&guarded).unwrap(),
            "trySuccessCondition_18"
        );
    }

    #[test]
    fn test_most_derived_contract_must_be_set() {
        let mut context = IRGenerationContext::new(CodegenSettings::default());
        assert!(matches!(
            context.most_derived_contract(),
            Err(CodegenError::PreconditionViolation(_))
        ));

        context.set_most_derived_contract(ContractDefinition::new(40, "Token"));
        assert_eq!(context.most_derived_contract().unwrap().name, "Token");
    }
}
