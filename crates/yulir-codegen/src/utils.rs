/*! Helper functions shared by generated code.
 *
 * Every helper is registered in the [`MultiUseFunctionCollector`] under a name derived from its
 * parameters, so asking twice yields one definition. Generators only ever see the name.
 */

use crate::ast_builder::{
    assign, call, declare, expr_stmt, function, hex, ident, num, render_function,
};
use crate::collector::MultiUseFunctionCollector;
use crate::{precondition, CodegenError, Result};
use num_bigint::BigUint;
use num_traits::One;
use tiny_keccak::{Hasher, Keccak};
use yulir_core::ast::{Expression, Statement};
use yulir_core::settings::RevertStrings;
use yulir_core::types::FunctionTypeKind;
use yulir_core::{CodegenSettings, SolType};
use yulir_emit::YulPrinter;

/// Reasons carried by `Panic(uint256)` reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanicCode {
    Generic,
    Assert,
    UnderOverflow,
    DivisionByZero,
    EnumConversionError,
    StorageEncodingError,
    EmptyArrayPop,
    ArrayOutOfBounds,
    ResourceError,
    InvalidInternalFunction,
}

impl PanicCode {
    pub fn code(&self) -> u64 {
        match self {
            PanicCode::Generic => 0x00,
            PanicCode::Assert => 0x01,
            PanicCode::UnderOverflow => 0x11,
            PanicCode::DivisionByZero => 0x12,
            PanicCode::EnumConversionError => 0x21,
            PanicCode::StorageEncodingError => 0x22,
            PanicCode::EmptyArrayPop => 0x31,
            PanicCode::ArrayOutOfBounds => 0x32,
            PanicCode::ResourceError => 0x41,
            PanicCode::InvalidInternalFunction => 0x51,
        }
    }
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut digest = [0u8; 32];
    hasher.finalize(&mut digest);
    digest
}

/// First four bytes of the keccak hash of `signature`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// The selector of `signature` left-aligned in a 32 byte word, as a hex literal.
pub fn selector_word(signature: &str) -> String {
    let bytes = selector(signature);
    format!(
        "0x{:02x}{:02x}{:02x}{:02x}{}",
        bytes[0],
        bytes[1],
        bytes[2],
        bytes[3],
        "0".repeat(56)
    )
}

pub struct YulUtilFunctions<'a> {
    settings: CodegenSettings,
    functions: &'a mut MultiUseFunctionCollector,
}

impl<'a> YulUtilFunctions<'a> {
    pub fn new(settings: CodegenSettings, functions: &'a mut MultiUseFunctionCollector) -> Self {
        Self {
            settings,
            functions,
        }
    }

    /// Clears the bits of a stack value that lie outside its type.
    pub fn cleanup_function(&mut self, ty: &SolType) -> Result<String> {
        let cleaned = cleanup_expression(ty, ident("value"))?;
        let name = format!("cleanup_{}", ty.identifier());
        self.functions.create_function(&name, |_| {
            Ok(render_function(function(
                &name,
                &["value"],
                &["cleaned"],
                vec![assign(&["cleaned"], cleaned)],
            )))
        })
    }

    /// Logical right shift by a constant. Targets without shift opcodes divide instead.
    pub fn shift_right_function(&mut self, bits: u32) -> Result<String> {
        precondition(bits < 256, || format!("Shift by {} bits exceeds a word.", bits))?;
        let shifting = self.settings.evm_version.has_bitwise_shifting();
        let name = format!("shift_right_{}_unsigned", bits);
        self.functions.create_function(&name, |_| {
            let shifted = if shifting {
                call("shr", vec![num(bits), ident("value")])
            } else {
                let divisor = BigUint::one() << bits;
                call("div", vec![ident("value"), num(format!("{:#x}", divisor))])
            };
            Ok(render_function(function(
                &name,
                &["value"],
                &["newValue"],
                vec![assign(&["newValue"], shifted)],
            )))
        })
    }

    pub fn round_up_function(&mut self) -> Result<String> {
        let name = "round_up_to_mul_of_32";
        self.functions.create_function(name, |_| {
            let rounded = call(
                "and",
                vec![
                    call("add", vec![ident("value"), num(31)]),
                    call("not", vec![num(31)]),
                ],
            );
            Ok(render_function(function(
                name,
                &["value"],
                &["result"],
                vec![assign(&["result"], rounded)],
            )))
        })
    }

    /// Reverts with `Panic(uint256)` carrying `code`.
    pub fn panic_function(&mut self, code: PanicCode) -> Result<String> {
        let name = format!("panic_error_{:#04x}", code.code());
        self.functions.create_function(&name, |_| {
            Ok(render_function(function::<&str, &str>(
                &name,
                &[],
                &[],
                vec![
                    expr_stmt(call(
                        "mstore",
                        vec![num(0), num(selector_word("Panic(uint256)"))],
                    )),
                    expr_stmt(call("mstore", vec![num(4), hex(code.code())])),
                    expr_stmt(call("revert", vec![num(0), hex(0x24)])),
                ],
            )))
        })
    }

    /// A function reverting with `message` when debug revert strings are on, or with empty data.
    pub fn revert_reason_if_debug_function(&mut self, message: &str) -> Result<String> {
        let revert_strings = self.settings.revert_strings;
        let digest: String = keccak256(message.as_bytes())
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect();
        let name = format!("revert_error_{}", digest);
        self.functions.create_function(&name, |_| {
            Ok(render_function(function::<&str, &str>(
                &name,
                &[],
                &[],
                revert_reason_statements(revert_strings, message),
            )))
        })
    }

    /// Inline code reverting with `message` when debug revert strings are on.
    pub fn revert_reason_if_debug(revert_strings: RevertStrings, message: &str) -> String {
        let printer = YulPrinter::new();
        revert_reason_statements(revert_strings, message)
            .iter()
            .map(|statement| printer.print_statement(statement))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn revert_reason_statements(revert_strings: RevertStrings, message: &str) -> Vec<Statement> {
    if !revert_strings.includes_debug_reasons() || message.is_empty() {
        return vec![expr_stmt(call("revert", vec![num(0), num(0)]))];
    }

    let mstore = |offset: Expression, value: Expression| expr_stmt(call("mstore", vec![offset, value]));
    let reason_pos = || ident("reasonPos");

    let mut statements = vec![
        mstore(num(0), num(selector_word("Error(string)"))),
        mstore(num(4), hex(0x20)),
        mstore(call("add", vec![num(4), hex(0x20)]), num(message.len())),
        declare("reasonPos", call("add", vec![num(4), hex(0x40)])),
    ];
    for (index, chunk) in message.as_bytes().chunks(32).enumerate() {
        let mut word = chunk.iter().map(|b| format!("{:02x}", b)).collect::<String>();
        word.push_str(&"00".repeat(32 - chunk.len()));
        statements.push(mstore(
            call("add", vec![reason_pos(), hex(index as u64 * 32)]),
            num(format!("0x{}", word)),
        ));
    }
    let padded = message.len().div_ceil(32) * 32;
    statements.push(expr_stmt(call(
        "revert",
        vec![num(0), call("add", vec![reason_pos(), hex(padded as u64)])],
    )));
    statements
}

fn cleanup_expression(ty: &SolType, value: Expression) -> Result<Expression> {
    match ty {
        SolType::Bool => Ok(call("iszero", vec![call("iszero", vec![value])])),
        SolType::Function {
            kind: FunctionTypeKind::Internal,
            ..
        } => Ok(value),
        SolType::Function { .. } => Err(CodegenError::Unimplemented(format!(
            "Cleanup of multi-slot type {}.",
            ty
        ))),
        SolType::Int(bits) if *bits < 256 => Ok(call(
            "signextend",
            vec![num(bits / 8 - 1), value],
        )),
        SolType::FixedBytes(bytes) if *bytes < 32 => {
            let mask = format!(
                "0x{}{}",
                "ff".repeat(usize::from(*bytes)),
                "00".repeat(32 - usize::from(*bytes))
            );
            Ok(call("and", vec![value, num(mask)]))
        }
        ty if ty.is_value_type() => match ty.value_bits() {
            Some(bits) if bits < 256 => {
                let mask = (BigUint::one() << bits) - BigUint::one();
                Ok(call("and", vec![value, num(format!("{:#x}", mask))]))
            }
            _ => Ok(value),
        },
        _ => Err(CodegenError::Unimplemented(format!(
            "Cleanup of non-value type {}.",
            ty
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use yulir_core::settings::EvmVersion;
    use yulir_core::types::DataLocation;

    #[test]
    fn test_well_known_selectors() {
        assert_eq!(selector("Panic(uint256)"), [0x4e, 0x48, 0x7b, 0x71]);
        assert_eq!(selector("Error(string)"), [0x08, 0xc3, 0x79, 0xa0]);
    }

    #[test]
    fn test_cleanup_is_created_once() {
        let mut collector = MultiUseFunctionCollector::new();
        let mut utils = YulUtilFunctions::new(CodegenSettings::default(), &mut collector);
        assert_eq!(utils.cleanup_function(&SolType::Bool).unwrap(), "cleanup_t_bool");
        assert_eq!(utils.cleanup_function(&SolType::Bool).unwrap(), "cleanup_t_bool");
        assert_eq!(collector.len(), 1);
        assert_eq!(
            collector.function_code("cleanup_t_bool").unwrap(),
            "function cleanup_t_bool(value) -> cleaned {\n    cleaned := iszero(iszero(value))\n}"
        );
    }

    #[test]
    fn test_cleanup_masks_narrow_types() {
        let mut collector = MultiUseFunctionCollector::new();
        let mut utils = YulUtilFunctions::new(CodegenSettings::default(), &mut collector);
        utils.cleanup_function(&SolType::Uint(8)).unwrap();
        utils.cleanup_function(&SolType::Int(16)).unwrap();
        utils.cleanup_function(&SolType::Uint(256)).unwrap();
        assert!(collector
            .function_code("cleanup_t_uint8")
            .unwrap()
            .contains("cleaned := and(value, 0xff)"));
        assert!(collector
            .function_code("cleanup_t_int16")
            .unwrap()
            .contains("cleaned := signextend(1, value)"));
        assert!(collector
            .function_code("cleanup_t_uint256")
            .unwrap()
            .contains("cleaned := value"));
    }

    #[test]
    fn test_cleanup_rejects_reference_types() {
        let mut collector = MultiUseFunctionCollector::new();
        let mut utils = YulUtilFunctions::new(CodegenSettings::default(), &mut collector);
        let result = utils.cleanup_function(&SolType::Bytes(DataLocation::Memory));
        assert!(matches!(result, Err(CodegenError::Unimplemented(_))));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_shift_right_depends_on_evm_version() {
        let mut collector = MultiUseFunctionCollector::new();
        let settings = CodegenSettings::new(EvmVersion::Byzantium, RevertStrings::Default);
        YulUtilFunctions::new(settings, &mut collector)
            .shift_right_function(8)
            .unwrap();
        assert!(collector
            .function_code("shift_right_8_unsigned")
            .unwrap()
            .contains("newValue := div(value, 0x100)"));

        let mut collector = MultiUseFunctionCollector::new();
        YulUtilFunctions::new(CodegenSettings::default(), &mut collector)
            .shift_right_function(8)
            .unwrap();
        assert!(collector
            .function_code("shift_right_8_unsigned")
            .unwrap()
            .contains("newValue := shr(8, value)"));
    }

    #[test]
    fn test_panic_function_layout() {
        let mut collector = MultiUseFunctionCollector::new();
        let name = YulUtilFunctions::new(CodegenSettings::default(), &mut collector)
            .panic_function(PanicCode::InvalidInternalFunction)
            .unwrap();
        assert_eq!(name, "panic_error_0x51");
        let code = collector.function_code(&name).unwrap();
        assert!(code.contains(
            "mstore(0, 0x4e487b7100000000000000000000000000000000000000000000000000000000)"
        ));
        assert!(code.contains("mstore(4, 0x51)"));
        assert!(code.contains("revert(0, 0x24)"));
    }

    #[test]
    fn test_revert_helpers_are_named_by_full_digest() {
        let mut collector = MultiUseFunctionCollector::new();
        let settings = CodegenSettings::new(EvmVersion::London, RevertStrings::Debug);
        let mut utils = YulUtilFunctions::new(settings, &mut collector);

        let short = utils.revert_reason_if_debug_function("too short").unwrap();
        let long = utils.revert_reason_if_debug_function("too long").unwrap();
        assert_eq!(short.len(), "revert_error_".len() + 64);
        assert_ne!(short, long);
        assert_eq!(utils.revert_reason_if_debug_function("too short").unwrap(), short);
        assert!(collector.function_code(&short).unwrap().contains("0x746f6f2073686f7274"));
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_revert_reason_respects_revert_strings() {
        assert_eq!(
            YulUtilFunctions::revert_reason_if_debug(RevertStrings::Default, "oops"),
            "revert(0, 0)"
        );
        assert_eq!(
            YulUtilFunctions::revert_reason_if_debug(RevertStrings::Debug, ""),
            "revert(0, 0)"
        );

        let code = YulUtilFunctions::revert_reason_if_debug(RevertStrings::Debug, "oops");
        let lines: Vec<&str> = code.lines().collect();
        assert_eq!(
            lines[0],
            "mstore(0, 0x08c379a000000000000000000000000000000000000000000000000000000000)"
        );
        assert_eq!(lines[2], "mstore(add(4, 0x20), 4)");
        assert_eq!(
            lines[4],
            "mstore(add(reasonPos, 0x0), 0x6f6f707300000000000000000000000000000000000000000000000000000000)"
        );
        assert_eq!(lines[5], "revert(0, add(reasonPos, 0x20))");
    }
}
