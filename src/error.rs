//! Error types of the engine.
//!
//! Two layers: [`EvalError`] is what a leaf evaluator reports for a single
//! value computation; [`DdError`] is what a public engine operation returns.
//! An `EvalError` raised anywhere inside a recursive operation is wrapped
//! once, together with the operator and operand types, and surfaces at the
//! boundary of the call that started the recursion.

use std::fmt;

use thiserror::Error;

use crate::operator::Operator;
use crate::value::ValueType;

/// Failure of a single leaf-level computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("expected {expected} operand, found {found}")]
    TypeMismatch { expected: &'static str, found: ValueType },
    #[error("cannot convert {from} to {to}")]
    Conversion { from: ValueType, to: ValueType },
    #[error("{0}")]
    Domain(String),
}

/// Storage that can run out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resource {
    Nodes,
    Leaves,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Nodes => write!(f, "node storage"),
            Resource::Leaves => write!(f, "leaf code space"),
        }
    }
}

/// Operand types as they appear in messages: `(integer, real)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeList(pub Vec<ValueType>);

impl fmt::Display for TypeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DdError {
    /// Fatal for the context: the caller should abandon the run.
    #[error("{resource} exhausted (limit {limit})")]
    ResourceExhausted { resource: Resource, limit: usize },

    #[error("operator `{operator}` failed on {types}: {source}")]
    Evaluation {
        operator: Operator,
        types: TypeList,
        #[source]
        source: EvalError,
    },

    #[error("no evaluator for operator `{operator}` on {types}")]
    NoEvaluator { operator: Operator, types: TypeList },

    #[error("permutation has {actual} entries, but the context has {expected} variables")]
    PermutationSize { expected: usize, actual: usize },

    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    #[error("misuse: {0}")]
    Misuse(String),

    #[error("inconsistent decision diagram state: {0}")]
    Inconsistent(String),
}

impl DdError {
    pub fn evaluation(operator: Operator, types: Vec<ValueType>, source: EvalError) -> Self {
        DdError::Evaluation {
            operator,
            types: TypeList(types),
            source,
        }
    }

    pub fn no_evaluator(operator: Operator, types: Vec<ValueType>) -> Self {
        DdError::NoEvaluator {
            operator,
            types: TypeList(types),
        }
    }

    /// Resource exhaustion is fatal; every other error leaves the context usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DdError::ResourceExhausted { .. })
    }
}

pub type Result<T, E = DdError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_message_names_operator_and_types() {
        let err = DdError::evaluation(
            Operator::Divide,
            vec![ValueType::Integer, ValueType::Integer],
            EvalError::DivisionByZero,
        );
        assert_eq!(
            err.to_string(),
            "operator `divide` failed on (integer, integer): division by zero"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_resource_exhausted_is_fatal() {
        let err = DdError::ResourceExhausted {
            resource: Resource::Nodes,
            limit: 16,
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "node storage exhausted (limit 16)");
    }
}
