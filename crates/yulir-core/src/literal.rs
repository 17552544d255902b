use crate::ast::{Literal, LiteralKind};
use crate::{IrError, Result};
use num_bigint::BigUint;
use num_traits::{One, Zero};

pub const WORD_BITS: u64 = 256;

/// Integer value of a literal as a 256-bit word.
///
/// Numbers are decimal or `0x`-prefixed hex, booleans are 0/1 and strings are left-aligned bytes.
pub fn value_of_literal(literal: &Literal) -> Result<BigUint> {
    match literal.kind {
        LiteralKind::Number => {
            let value = parse_number(&literal.value)
                .ok_or_else(|| IrError::InvalidLiteral(literal.value.clone()))?;
            if value.bits() > WORD_BITS {
                return Err(IrError::InvalidLiteral(format!(
                    "{} does not fit into 256 bits",
                    literal.value
                )));
            }
            Ok(value)
        }
        LiteralKind::Boolean => match literal.value.as_str() {
            "true" => Ok(BigUint::one()),
            "false" => Ok(BigUint::zero()),
            other => Err(IrError::InvalidLiteral(other.to_string())),
        },
        LiteralKind::String => {
            let bytes = literal.value.as_bytes();
            if bytes.len() > 32 {
                return Err(IrError::InvalidLiteral(format!(
                    "string literal longer than 32 bytes: {:?}",
                    literal.value
                )));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(bytes);
            Ok(BigUint::from_bytes_be(&word))
        }
    }
}

fn parse_number(text: &str) -> Option<BigUint> {
    if let Some(hex) = text.strip_prefix("0x") {
        if hex.is_empty() {
            return None;
        }
        BigUint::parse_bytes(hex.as_bytes(), 16)
    } else {
        BigUint::parse_bytes(text.as_bytes(), 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers() {
        assert_eq!(
            value_of_literal(&Literal::number("42")).unwrap(),
            BigUint::from(42u32)
        );
        assert_eq!(
            value_of_literal(&Literal::number("0xff")).unwrap(),
            BigUint::from(255u32)
        );
        assert!(value_of_literal(&Literal::number("0x")).is_err());
        assert!(value_of_literal(&Literal::number("12a")).is_err());
    }

    #[test]
    fn test_number_must_fit_a_word() {
        let max = format!("0x{}", "f".repeat(64));
        assert!(value_of_literal(&Literal::number(max)).is_ok());
        let too_big = format!("0x1{}", "0".repeat(64));
        assert!(value_of_literal(&Literal::number(too_big)).is_err());
    }

    #[test]
    fn test_booleans_and_strings() {
        assert_eq!(
            value_of_literal(&Literal::boolean(true)).unwrap(),
            BigUint::one()
        );
        assert!(value_of_literal(&Literal::boolean(false)).unwrap().is_zero());

        let value = value_of_literal(&Literal::string("a")).unwrap();
        assert_eq!(value, BigUint::from(0x61u32) << 248u32);
        assert!(value_of_literal(&Literal::string("x".repeat(33))).is_err());
    }
}
