use crate::names::local_variable_name;
use crate::{CodegenError, Result};
use yulir_core::frontend::VariableDeclaration;
use yulir_core::SolType;

/// A frontend variable as it lives on the IR stack: one IR variable per stack slot of its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IRVariable {
    name: String,
    ty: SolType,
}

impl IRVariable {
    pub fn new(name: impl Into<String>, ty: SolType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn from_declaration(declaration: &VariableDeclaration) -> Self {
        Self::new(local_variable_name(declaration), declaration.ty.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &SolType {
        &self.ty
    }

    /// Names of the IR variables making up this variable, in stack order.
    pub fn stack_slots(&self) -> Vec<String> {
        self.ty
            .stack_slot_suffixes()
            .into_iter()
            .map(|suffix| self.slot_name(suffix))
            .collect()
    }

    /// The single IR variable holding the `suffix` component.
    pub fn part(&self, suffix: &str) -> Result<String> {
        if self.ty.stack_slot_suffixes().iter().any(|known| *known == suffix) {
            Ok(self.slot_name(suffix))
        } else {
            Err(CodegenError::PreconditionViolation(format!(
                "Type {} has no stack component '{}'.",
                self.ty, suffix
            )))
        }
    }

    /// Comma separated slot names, ready to splice into a declaration or call.
    pub fn comma_separated_list(&self) -> String {
        self.stack_slots().join(", ")
    }

    fn slot_name(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.name, suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yulir_core::types::DataLocation;

    #[test]
    fn test_value_type_occupies_one_slot() {
        let declaration = VariableDeclaration::new(5, "x", SolType::Uint(256));
        let variable = IRVariable::from_declaration(&declaration);
        assert_eq!(variable.name(), "vloc_x_5");
        assert_eq!(variable.stack_slots(), vec!["vloc_x_5"]);
        assert_eq!(variable.part("").unwrap(), "vloc_x_5");
    }

    #[test]
    fn test_multi_slot_types_get_suffixed_parts() {
        let declaration =
            VariableDeclaration::new(9, "data", SolType::Bytes(DataLocation::Calldata));
        let variable = IRVariable::from_declaration(&declaration);
        assert_eq!(
            variable.stack_slots(),
            vec!["vloc_data_9_offset", "vloc_data_9_length"]
        );
        assert_eq!(variable.part("length").unwrap(), "vloc_data_9_length");
        assert_eq!(
            variable.comma_separated_list(),
            "vloc_data_9_offset, vloc_data_9_length"
        );
        assert!(matches!(
            variable.part("address"),
            Err(CodegenError::PreconditionViolation(_))
        ));
    }
}
