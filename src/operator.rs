use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Operator identifiers understood by [`apply`](crate::context::Context::apply).
///
/// Names are stable lowercase strings; [`FromStr`] parses them back.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Operator {
    Id,
    Not,
    Add,
    Subtract,
    Multiply,
    Divide,
    /// `a / b`, or `a` when `b` is zero.
    DivideIgnoreZero,
    Max,
    Min,
    And,
    Or,
    Iff,
    Implies,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Ite,
}

impl Operator {
    pub const ALL: [Operator; 20] = [
        Operator::Id,
        Operator::Not,
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::DivideIgnoreZero,
        Operator::Max,
        Operator::Min,
        Operator::And,
        Operator::Or,
        Operator::Iff,
        Operator::Implies,
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Ite,
    ];

    pub fn arity(self) -> usize {
        match self {
            Operator::Id | Operator::Not => 1,
            Operator::Ite => 3,
            _ => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Id => "id",
            Operator::Not => "not",
            Operator::Add => "add",
            Operator::Subtract => "subtract",
            Operator::Multiply => "multiply",
            Operator::Divide => "divide",
            Operator::DivideIgnoreZero => "divide-ignore-zero",
            Operator::Max => "max",
            Operator::Min => "min",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Iff => "iff",
            Operator::Implies => "implies",
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Ite => "ite",
        }
    }

    /// Operators whose result is boolean regardless of the operand types.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            Operator::Not
                | Operator::And
                | Operator::Or
                | Operator::Iff
                | Operator::Implies
                | Operator::Eq
                | Operator::Ne
                | Operator::Lt
                | Operator::Le
                | Operator::Gt
                | Operator::Ge
        )
    }

    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            Operator::Add
                | Operator::Multiply
                | Operator::Max
                | Operator::Min
                | Operator::And
                | Operator::Or
                | Operator::Iff
                | Operator::Eq
                | Operator::Ne
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operator `{0}`")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}
