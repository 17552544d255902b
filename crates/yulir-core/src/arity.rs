use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of stack slots consumed and produced by a function's calling convention.
///
/// The derived order (inputs first, then outputs) only exists so arities can key ordered maps.
/// It says nothing about which arity is "larger": `Arity::new(2, 2)` sorts after
/// `Arity::new(1, 10)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Arity {
    pub inputs: usize,
    pub outputs: usize,
}

impl Arity {
    pub const fn new(inputs: usize, outputs: usize) -> Self {
        Self { inputs, outputs }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in_{}_out_{}", self.inputs, self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_arity_orders_by_inputs_then_outputs() {
        let arities: BTreeSet<Arity> = [
            Arity::new(2, 2),
            Arity::new(1, 10),
            Arity::new(1, 0),
            Arity::new(0, 3),
        ]
        .into_iter()
        .collect();

        let ordered: Vec<Arity> = arities.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                Arity::new(0, 3),
                Arity::new(1, 0),
                Arity::new(1, 10),
                Arity::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_arity_equality_needs_both_fields() {
        assert_eq!(Arity::new(1, 2), Arity::new(1, 2));
        assert_ne!(Arity::new(1, 2), Arity::new(2, 1));
        assert_eq!(Arity::new(3, 1).to_string(), "in_3_out_1");
    }
}
