//! Declarations handed over by the frontend once parsing and type checking are done.
//!
//! Every node carries the stable [`NodeId`] the frontend assigned. Later stages key their tables
//! by that id and never by address.

use crate::types::{tuple_size_on_stack, SolType};
use crate::Arity;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Marks an uninitialised internal function pointer. No dispatchable function may use it.
    pub const UNINITIALIZED_FUNCTION: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FunctionKind {
    #[default]
    Function,
    Constructor,
    Fallback,
    Receive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub name: String,
    pub kind: FunctionKind,
    pub parameters: Vec<SolType>,
    pub returns: Vec<SolType>,
}

impl FunctionDefinition {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: NodeId(id),
            name: name.into(),
            kind: FunctionKind::Function,
            parameters: Vec::new(),
            returns: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<SolType>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_returns(mut self, returns: Vec<SolType>) -> Self {
        self.returns = returns;
        self
    }

    pub fn with_kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == FunctionKind::Constructor
    }

    /// Stack slots in and out under the internal calling convention.
    pub fn arity(&self) -> Arity {
        Arity::new(
            tuple_size_on_stack(&self.parameters),
            tuple_size_on_stack(&self.returns),
        )
    }

    pub fn function_type(&self) -> SolType {
        SolType::internal_function(self.parameters.clone(), self.returns.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VariableMutability {
    #[default]
    Mutable,
    Immutable,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub name: String,
    pub ty: SolType,
    pub mutability: VariableMutability,
}

impl VariableDeclaration {
    pub fn new(id: u64, name: impl Into<String>, ty: SolType) -> Self {
        Self {
            id: NodeId(id),
            name: name.into(),
            ty,
            mutability: VariableMutability::Mutable,
        }
    }

    pub fn immutable(mut self) -> Self {
        self.mutability = VariableMutability::Immutable;
        self
    }

    pub fn is_immutable(&self) -> bool {
        self.mutability == VariableMutability::Immutable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub id: NodeId,
    pub name: String,
}

impl ContractDefinition {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: NodeId(id),
            name: name.into(),
        }
    }
}

/// A call expression as seen by lowering: its identity and whether it belongs to a `try` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallExpression {
    pub id: NodeId,
    pub try_call: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataLocation;

    #[test]
    fn test_function_arity_counts_stack_slots() {
        let f = FunctionDefinition::new(7, "f")
            .with_parameters(vec![SolType::Uint(256), SolType::Bytes(DataLocation::Calldata)])
            .with_returns(vec![SolType::external_function(vec![], vec![])]);
        assert_eq!(f.arity(), Arity::new(3, 2));
        assert!(!f.is_constructor());
    }
}
