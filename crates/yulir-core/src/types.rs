use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataLocation {
    Storage,
    Memory,
    Calldata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionTypeKind {
    Internal,
    External,
}

/// Type information the frontend attaches to declarations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolType {
    Bool,
    Uint(u16),
    Int(u16),
    Address,
    FixedBytes(u8),
    Enum(String),
    Contract(String),
    Function {
        kind: FunctionTypeKind,
        parameters: Vec<SolType>,
        returns: Vec<SolType>,
    },
    Bytes(DataLocation),
    String(DataLocation),
    Array {
        element: Box<SolType>,
        length: Option<usize>,
        location: DataLocation,
    },
    Struct {
        name: String,
        location: DataLocation,
    },
    Mapping {
        key: Box<SolType>,
        value: Box<SolType>,
    },
}

impl SolType {
    pub fn internal_function(parameters: Vec<SolType>, returns: Vec<SolType>) -> Self {
        SolType::Function {
            kind: FunctionTypeKind::Internal,
            parameters,
            returns,
        }
    }

    pub fn external_function(parameters: Vec<SolType>, returns: Vec<SolType>) -> Self {
        SolType::Function {
            kind: FunctionTypeKind::External,
            parameters,
            returns,
        }
    }

    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            SolType::Bool
                | SolType::Uint(_)
                | SolType::Int(_)
                | SolType::Address
                | SolType::FixedBytes(_)
                | SolType::Enum(_)
                | SolType::Contract(_)
                | SolType::Function { .. }
        )
    }

    fn is_dynamic_calldata(&self) -> bool {
        match self {
            SolType::Bytes(DataLocation::Calldata) | SolType::String(DataLocation::Calldata) => {
                true
            }
            SolType::Array {
                length: None,
                location: DataLocation::Calldata,
                ..
            } => true,
            _ => false,
        }
    }

    /// Names of the stack slots a value of this type occupies, as suffixes of the variable name.
    /// Single-slot types return one empty suffix.
    pub fn stack_slot_suffixes(&self) -> Vec<&'static str> {
        match self {
            SolType::Function {
                kind: FunctionTypeKind::External,
                ..
            } => vec!["address", "functionSelector"],
            ty if ty.is_dynamic_calldata() => vec!["offset", "length"],
            _ => vec![""],
        }
    }

    pub fn size_on_stack(&self) -> usize {
        self.stack_slot_suffixes().len()
    }

    /// Bytes the value occupies in the head of a memory tuple.
    pub fn memory_head_size(&self) -> usize {
        32
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, SolType::Int(_))
    }

    /// Significant bits for value types that occupy less than a full word.
    pub fn value_bits(&self) -> Option<u16> {
        match self {
            SolType::Bool => Some(1),
            SolType::Uint(bits) | SolType::Int(bits) => Some(*bits),
            SolType::Address | SolType::Contract(_) => Some(160),
            SolType::FixedBytes(bytes) => Some(u16::from(*bytes) * 8),
            SolType::Enum(_) => Some(8),
            _ => None,
        }
    }

    /// Identifier used to derive helper function names, e.g. `t_uint256`.
    pub fn identifier(&self) -> String {
        match self {
            SolType::Bool => "t_bool".to_string(),
            SolType::Uint(bits) => format!("t_uint{}", bits),
            SolType::Int(bits) => format!("t_int{}", bits),
            SolType::Address => "t_address".to_string(),
            SolType::FixedBytes(bytes) => format!("t_bytes{}", bytes),
            SolType::Enum(name) => format!("t_enum_{}", name),
            SolType::Contract(name) => format!("t_contract_{}", name),
            SolType::Function { kind, .. } => match kind {
                FunctionTypeKind::Internal => "t_function_internal".to_string(),
                FunctionTypeKind::External => "t_function_external".to_string(),
            },
            SolType::Bytes(location) => format!("t_bytes_{}", location_suffix(*location)),
            SolType::String(location) => format!("t_string_{}", location_suffix(*location)),
            SolType::Array {
                element,
                length,
                location,
            } => format!(
                "t_array_{}_{}_{}",
                element.identifier(),
                length.map_or_else(|| "dyn".to_string(), |n| n.to_string()),
                location_suffix(*location)
            ),
            SolType::Struct { name, location } => {
                format!("t_struct_{}_{}", name, location_suffix(*location))
            }
            SolType::Mapping { key, value } => {
                format!("t_mapping_{}_{}", key.identifier(), value.identifier())
            }
        }
    }
}

fn location_suffix(location: DataLocation) -> &'static str {
    match location {
        DataLocation::Storage => "storage",
        DataLocation::Memory => "memory",
        DataLocation::Calldata => "calldata",
    }
}

impl fmt::Display for SolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier().trim_start_matches("t_"))
    }
}

/// Total stack slots of a parameter or return list.
pub fn tuple_size_on_stack(types: &[SolType]) -> usize {
    types.iter().map(SolType::size_on_stack).sum()
}
