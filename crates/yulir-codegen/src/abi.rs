//! ABI encoding and decoding helpers for tuples of value types.

use crate::ast_builder::{assign, call, expr_stmt, function, ident, num, render_function};
use crate::collector::MultiUseFunctionCollector;
use crate::names::suffixed_variable_names;
use crate::utils::YulUtilFunctions;
use crate::{CodegenError, Result};
use yulir_core::ast::{Block, If, Span, Statement};
use yulir_core::{CodegenSettings, SolType};

pub struct ABIFunctions<'a> {
    settings: CodegenSettings,
    functions: &'a mut MultiUseFunctionCollector,
}

impl<'a> ABIFunctions<'a> {
    pub fn new(settings: CodegenSettings, functions: &'a mut MultiUseFunctionCollector) -> Self {
        Self {
            settings,
            functions,
        }
    }

    /// `(headStart, value0, ...) -> tail`, writing one head word per value.
    pub fn tuple_encoder(&mut self, types: &[SolType]) -> Result<String> {
        check_value_types(types)?;
        let settings = self.settings;
        let name = format!("abi_encode_tuple_{}", tuple_identifier(types));
        self.functions.create_function(&name, |functions| {
            let values = suffixed_variable_names("value", 0, types.len());
            let mut utils = YulUtilFunctions::new(settings, functions);

            let mut body = vec![assign(
                &["tail"],
                call("add", vec![ident("headStart"), num(head_size(types))]),
            )];
            let mut offset = 0;
            for (ty, value) in types.iter().zip(&values) {
                let cleanup = utils.cleanup_function(ty)?;
                body.push(expr_stmt(call(
                    "mstore",
                    vec![
                        call("add", vec![ident("headStart"), num(offset)]),
                        call(&cleanup, vec![ident(value)]),
                    ],
                )));
                offset += ty.memory_head_size();
            }

            let mut parameters = vec!["headStart".to_string()];
            parameters.extend(values);
            Ok(render_function(function(&name, &parameters, &["tail"], body)))
        })
    }

    /// `(headStart, dataEnd) -> value0, ...`, reverting if the data is shorter than the head.
    pub fn tuple_decoder(&mut self, types: &[SolType]) -> Result<String> {
        check_value_types(types)?;
        let settings = self.settings;
        let name = format!("abi_decode_tuple_{}", tuple_identifier(types));
        self.functions.create_function(&name, |functions| {
            let values = suffixed_variable_names("value", 0, types.len());
            let mut utils = YulUtilFunctions::new(settings, functions);
            let revert = utils.revert_reason_if_debug_function("ABI decoding: tuple data too short")?;

            let mut body = vec![Statement::If(If {
                span: Span::default(),
                condition: call(
                    "slt",
                    vec![
                        call("sub", vec![ident("dataEnd"), ident("headStart")]),
                        num(head_size(types)),
                    ],
                ),
                body: Block::new(vec![expr_stmt(call(&revert, vec![]))]),
            })];
            let mut offset = 0;
            for (ty, value) in types.iter().zip(&values) {
                let cleanup = utils.cleanup_function(ty)?;
                let load = call(
                    "calldataload",
                    vec![call("add", vec![ident("headStart"), num(offset)])],
                );
                body.push(assign(&[value], call(&cleanup, vec![load])));
                offset += ty.memory_head_size();
            }

            Ok(render_function(function(
                &name,
                &["headStart", "dataEnd"],
                &values,
                body,
            )))
        })
    }
}

fn check_value_types(types: &[SolType]) -> Result<()> {
    match types
        .iter()
        .find(|ty| !ty.is_value_type() || ty.size_on_stack() != 1)
    {
        Some(ty) => Err(CodegenError::Unimplemented(format!(
            "ABI coding of type {}.",
            ty
        ))),
        None => Ok(()),
    }
}

fn tuple_identifier(types: &[SolType]) -> String {
    types
        .iter()
        .map(SolType::identifier)
        .collect::<Vec<_>>()
        .join("_")
}

fn head_size(types: &[SolType]) -> usize {
    types.iter().map(SolType::memory_head_size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encoder_layout() {
        let mut collector = MultiUseFunctionCollector::new();
        let name = ABIFunctions::new(CodegenSettings::default(), &mut collector)
            .tuple_encoder(&[SolType::Uint(256), SolType::Bool])
            .unwrap();
        assert_eq!(name, "abi_encode_tuple_t_uint256_t_bool");
        assert_eq!(
            collector.function_code(&name).unwrap(),
            "function abi_encode_tuple_t_uint256_t_bool(headStart, value0, value1) -> tail {\n    \
             tail := add(headStart, 64)\n    \
             mstore(add(headStart, 0), cleanup_t_uint256(value0))\n    \
             mstore(add(headStart, 32), cleanup_t_bool(value1))\n}"
        );
        assert!(collector.contains("cleanup_t_bool"));
        assert!(collector.contains("cleanup_t_uint256"));
    }

    #[test]
    fn test_decoder_checks_length_and_shares_helpers() {
        let mut collector = MultiUseFunctionCollector::new();
        let mut abi = ABIFunctions::new(CodegenSettings::default(), &mut collector);
        let decoder = abi.tuple_decoder(&[SolType::Address]).unwrap();
        abi.tuple_encoder(&[SolType::Address]).unwrap();

        let code = collector.function_code(&decoder).unwrap().to_string();
        assert!(code.starts_with("function abi_decode_tuple_t_address(headStart, dataEnd) -> value0 {"));
        assert!(code.contains("if slt(sub(dataEnd, headStart), 32) {"));
        assert!(code.contains("value0 := cleanup_t_address(calldataload(add(headStart, 0)))"));
        // decoder, encoder, one cleanup and one revert helper
        assert_eq!(collector.len(), 4);
    }

    #[test]
    fn test_reference_types_are_unimplemented() {
        let mut collector = MultiUseFunctionCollector::new();
        let result = ABIFunctions::new(CodegenSettings::default(), &mut collector)
            .tuple_encoder(&[SolType::String(yulir_core::DataLocation::Memory)]);
        assert!(matches!(result, Err(CodegenError::Unimplemented(_))));
    }
}
