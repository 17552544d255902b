//! Names of generated artifacts. Other tooling matches on these, so the formats are fixed.

use yulir_core::frontend::{ContractDefinition, FunctionDefinition, VariableDeclaration};
use yulir_core::Arity;

pub fn function_name(function: &FunctionDefinition) -> String {
    format!("fun_{}_{}", function.name, function.id)
}

pub fn getter_function_name(variable: &VariableDeclaration) -> String {
    format!("getter_fun_{}_{}", variable.name, variable.id)
}

pub fn local_variable_name(variable: &VariableDeclaration) -> String {
    format!("vloc_{}_{}", variable.name, variable.id)
}

pub fn creation_object_name(contract: &ContractDefinition) -> String {
    format!("{}_{}", contract.name, contract.id)
}

pub fn runtime_object_name(contract: &ContractDefinition) -> String {
    format!("{}_{}_deployed", contract.name, contract.id)
}

pub fn internal_dispatch_function_name(arity: Arity) -> String {
    format!("dispatch_internal_in_{}_out_{}", arity.inputs, arity.outputs)
}

/// `prefix0, prefix1, ...` for indices in `start..end`.
pub fn suffixed_variable_names(prefix: &str, start: usize, end: usize) -> Vec<String> {
    (start..end).map(|i| format!("{}{}", prefix, i)).collect()
}
