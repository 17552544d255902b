/*! Builtin functions available to IR code.
 *
 * The optimiser only reasons about calls whose name resolves to a builtin backed by an opcode.
 * Everything else, including the object-access builtins and user functions, is opaque to it.
 */

use crate::settings::EvmVersion;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

macro_rules! instructions {
    ($($variant:ident => $name:literal, $args:literal, $rets:literal, $since:ident;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Instruction {
            $($variant,)*
        }

        impl Instruction {
            pub const ALL: &'static [Instruction] = &[$(Instruction::$variant,)*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Instruction::$variant => $name,)*
                }
            }

            pub fn args(&self) -> usize {
                match self {
                    $(Instruction::$variant => $args,)*
                }
            }

            pub fn returns(&self) -> usize {
                match self {
                    $(Instruction::$variant => $rets,)*
                }
            }

            /// First EVM version that has the opcode.
            pub fn introduced_in(&self) -> EvmVersion {
                match self {
                    $(Instruction::$variant => EvmVersion::$since,)*
                }
            }
        }
    };
}

instructions! {
    Stop => "stop", 0, 0, Homestead;
    Add => "add", 2, 1, Homestead;
    Mul => "mul", 2, 1, Homestead;
    Sub => "sub", 2, 1, Homestead;
    Div => "div", 2, 1, Homestead;
    Sdiv => "sdiv", 2, 1, Homestead;
    Mod => "mod", 2, 1, Homestead;
    Smod => "smod", 2, 1, Homestead;
    Exp => "exp", 2, 1, Homestead;
    Not => "not", 1, 1, Homestead;
    Lt => "lt", 2, 1, Homestead;
    Gt => "gt", 2, 1, Homestead;
    Slt => "slt", 2, 1, Homestead;
    Sgt => "sgt", 2, 1, Homestead;
    Eq => "eq", 2, 1, Homestead;
    IsZero => "iszero", 1, 1, Homestead;
    And => "and", 2, 1, Homestead;
    Or => "or", 2, 1, Homestead;
    Xor => "xor", 2, 1, Homestead;
    Byte => "byte", 2, 1, Homestead;
    Shl => "shl", 2, 1, Constantinople;
    Shr => "shr", 2, 1, Constantinople;
    Sar => "sar", 2, 1, Constantinople;
    AddMod => "addmod", 3, 1, Homestead;
    MulMod => "mulmod", 3, 1, Homestead;
    SignExtend => "signextend", 2, 1, Homestead;
    Keccak256 => "keccak256", 2, 1, Homestead;
    Address => "address", 0, 1, Homestead;
    Balance => "balance", 1, 1, Homestead;
    Origin => "origin", 0, 1, Homestead;
    Caller => "caller", 0, 1, Homestead;
    CallValue => "callvalue", 0, 1, Homestead;
    CallDataLoad => "calldataload", 1, 1, Homestead;
    CallDataSize => "calldatasize", 0, 1, Homestead;
    CallDataCopy => "calldatacopy", 3, 0, Homestead;
    CodeSize => "codesize", 0, 1, Homestead;
    CodeCopy => "codecopy", 3, 0, Homestead;
    GasPrice => "gasprice", 0, 1, Homestead;
    ExtCodeSize => "extcodesize", 1, 1, Homestead;
    ExtCodeCopy => "extcodecopy", 4, 0, Homestead;
    ReturnDataSize => "returndatasize", 0, 1, Byzantium;
    ReturnDataCopy => "returndatacopy", 3, 0, Byzantium;
    ExtCodeHash => "extcodehash", 1, 1, Constantinople;
    BlockHash => "blockhash", 1, 1, Homestead;
    Coinbase => "coinbase", 0, 1, Homestead;
    Timestamp => "timestamp", 0, 1, Homestead;
    Number => "number", 0, 1, Homestead;
    Difficulty => "difficulty", 0, 1, Homestead;
    GasLimit => "gaslimit", 0, 1, Homestead;
    ChainId => "chainid", 0, 1, Istanbul;
    SelfBalance => "selfbalance", 0, 1, Istanbul;
    BaseFee => "basefee", 0, 1, London;
    Pop => "pop", 1, 0, Homestead;
    MLoad => "mload", 1, 1, Homestead;
    MStore => "mstore", 2, 0, Homestead;
    MStore8 => "mstore8", 2, 0, Homestead;
    SLoad => "sload", 1, 1, Homestead;
    SStore => "sstore", 2, 0, Homestead;
    MSize => "msize", 0, 1, Homestead;
    Gas => "gas", 0, 1, Homestead;
    Log0 => "log0", 2, 0, Homestead;
    Log1 => "log1", 3, 0, Homestead;
    Log2 => "log2", 4, 0, Homestead;
    Log3 => "log3", 5, 0, Homestead;
    Log4 => "log4", 6, 0, Homestead;
    Create => "create", 3, 1, Homestead;
    Call => "call", 7, 1, Homestead;
    CallCode => "callcode", 7, 1, Homestead;
    Return => "return", 2, 0, Homestead;
    DelegateCall => "delegatecall", 6, 1, Homestead;
    Create2 => "create2", 4, 1, Constantinople;
    StaticCall => "staticcall", 6, 1, Byzantium;
    Revert => "revert", 2, 0, Byzantium;
    Invalid => "invalid", 0, 0, Homestead;
    SelfDestruct => "selfdestruct", 1, 0, Homestead;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinFunction {
    pub name: String,
    pub parameters: usize,
    pub returns: usize,
    /// Set when the builtin maps directly onto one opcode.
    pub instruction: Option<Instruction>,
}

/// The set of builtins a block of IR may call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dialect {
    pub evm_version: Option<EvmVersion>,
    builtins: IndexMap<String, BuiltinFunction>,
}

impl Dialect {
    /// A dialect without builtins. Every call is a user function call.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Opcode builtins available at `version`, plus the object-access builtins.
    pub fn evm(version: EvmVersion) -> Self {
        let mut builtins = IndexMap::new();
        for instruction in Instruction::ALL {
            if instruction.introduced_in() > version {
                continue;
            }
            builtins.insert(
                instruction.name().to_string(),
                BuiltinFunction {
                    name: instruction.name().to_string(),
                    parameters: instruction.args(),
                    returns: instruction.returns(),
                    instruction: Some(*instruction),
                },
            );
        }

        for (name, parameters, returns) in [
            ("datasize", 1, 1),
            ("dataoffset", 1, 1),
            ("datacopy", 3, 0),
            ("setimmutable", 3, 0),
            ("loadimmutable", 1, 1),
            ("memoryguard", 1, 1),
        ] {
            builtins.insert(
                name.to_string(),
                BuiltinFunction {
                    name: name.to_string(),
                    parameters,
                    returns,
                    instruction: None,
                },
            );
        }

        Self {
            evm_version: Some(version),
            builtins,
        }
    }

    pub fn builtin(&self, name: &str) -> Option<&BuiltinFunction> {
        self.builtins.get(name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    pub fn builtins(&self) -> impl Iterator<Item = &BuiltinFunction> {
        self.builtins.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_dialect_respects_version() {
        let byzantium = Dialect::evm(EvmVersion::Byzantium);
        assert!(byzantium.is_builtin("revert"));
        assert!(!byzantium.is_builtin("shl"));
        assert!(!byzantium.is_builtin("chainid"));

        let london = Dialect::evm(EvmVersion::London);
        assert_eq!(
            london.builtin("shl").and_then(|b| b.instruction),
            Some(Instruction::Shl)
        );
        assert!(london.is_builtin("basefee"));
    }

    #[test]
    fn test_object_builtins_have_no_instruction() {
        let dialect = Dialect::evm(EvmVersion::London);
        let datasize = dialect.builtin("datasize").unwrap();
        assert_eq!(datasize.instruction, None);
        assert_eq!(datasize.parameters, 1);
    }

    #[test]
    fn test_plain_dialect_is_empty() {
        let dialect = Dialect::plain();
        assert!(dialect.builtin("add").is_none());
        assert_eq!(dialect.builtins().count(), 0);
    }
}
