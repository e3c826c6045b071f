//! Operator evaluators keyed by operand types.
//!
//! The diagram algorithms only ever see leaf *codes*; whenever an operation
//! bottoms out at leaves it asks the registry for an [`Evaluator`] matching
//! the operator and the operand [`ValueType`]s. Entries are matched in
//! registration order against their [`TypePattern`] signature, so callers
//! that add a value kind can shadow nothing and extend everything.
//!
//! Resolution walks the entry list; [`Resolver`] memoises it per context.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use num_rational::BigRational;
use num_traits::Zero;

use crate::error::EvalError;
use crate::operator::Operator;
use crate::value::{promote, Value, ValueType};

pub type Evaluator = Arc<dyn Fn(&[&Value]) -> Result<Value, EvalError> + Send + Sync>;

/// "Given an expression, return its semantic type, or `None` if unknown."
pub trait ExpressionToType<E: ?Sized> {
    fn type_of(&self, expr: &E) -> Option<ValueType>;
}

/// One position of an evaluator signature.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TypePattern {
    Exact(ValueType),
    Numeric,
    Any,
}

impl TypePattern {
    pub fn matches(self, ty: ValueType) -> bool {
        match self {
            TypePattern::Exact(t) => t == ty,
            TypePattern::Numeric => ty.is_numeric(),
            TypePattern::Any => true,
        }
    }
}

struct Entry {
    operator: Operator,
    signature: Vec<TypePattern>,
    result: Option<ValueType>,
    evaluator: Evaluator,
}

impl Entry {
    fn matches(&self, operator: Operator, types: &[ValueType]) -> bool {
        self.operator == operator
            && self.signature.len() == types.len()
            && self.signature.iter().zip(types).all(|(p, &t)| p.matches(t))
    }
}

/// Ordered collection of evaluator entries.
#[derive(Default)]
pub struct OperatorRegistry {
    entries: Vec<Entry>,
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl OperatorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in evaluators over booleans, the numeric
    /// tower and intervals.
    pub fn standard() -> Self {
        use TypePattern::*;
        let boolean = Exact(ValueType::Boolean);

        let mut registry = Self::empty();
        registry.register(Operator::Id, [Any], |args| Ok(args[0].clone()));
        registry.register(Operator::Not, [boolean], |args| Ok(Value::Boolean(!bool_arg(args[0])?)));

        for op in [Operator::And, Operator::Or, Operator::Iff, Operator::Implies] {
            registry.register(op, [boolean, boolean], move |args| {
                let (a, b) = (bool_arg(args[0])?, bool_arg(args[1])?);
                Ok(Value::Boolean(logic(op, a, b)))
            });
        }
        // Boolean max/min are disjunction/conjunction, so abstract_max works on BDDs.
        registry.register(Operator::Max, [boolean, boolean], |args| {
            Ok(Value::Boolean(bool_arg(args[0])? || bool_arg(args[1])?))
        });
        registry.register(Operator::Min, [boolean, boolean], |args| {
            Ok(Value::Boolean(bool_arg(args[0])? && bool_arg(args[1])?))
        });
        registry.register(Operator::Eq, [boolean, boolean], |args| Ok(Value::Boolean(args[0] == args[1])));
        registry.register(Operator::Ne, [boolean, boolean], |args| Ok(Value::Boolean(args[0] != args[1])));

        for op in [
            Operator::Add,
            Operator::Subtract,
            Operator::Multiply,
            Operator::Divide,
            Operator::DivideIgnoreZero,
            Operator::Max,
            Operator::Min,
        ] {
            registry.register(op, [Numeric, Numeric], move |args| arith(op, args[0], args[1]));
        }
        for op in [Operator::Eq, Operator::Ne] {
            registry.register(op, [Numeric, Numeric], move |args| {
                let (a, b) = promote(args[0], args[1])?;
                Ok(Value::Boolean((a == b) == (op == Operator::Eq)))
            });
        }
        for op in [Operator::Lt, Operator::Le, Operator::Gt, Operator::Ge] {
            registry.register(op, [Numeric, Numeric], move |args| {
                let ord = args[0].compare(args[1])?;
                Ok(Value::Boolean(compare(op, ord)))
            });
        }

        registry.register(Operator::Ite, [boolean, Any, Any], |args| {
            Ok(if bool_arg(args[0])? { args[1].clone() } else { args[2].clone() })
        });
        registry
    }

    /// Appends an entry. Earlier entries take precedence.
    pub fn register<F>(&mut self, operator: Operator, signature: impl Into<Vec<TypePattern>>, evaluator: F) -> &mut Self
    where
        F: Fn(&[&Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.push(operator, signature.into(), None, Arc::new(evaluator))
    }

    /// Like [`register`](Self::register), but also declares the result type
    /// reported by [`result_type`](Self::result_type).
    pub fn register_typed<F>(
        &mut self,
        operator: Operator,
        signature: impl Into<Vec<TypePattern>>,
        result: ValueType,
        evaluator: F,
    ) -> &mut Self
    where
        F: Fn(&[&Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.push(operator, signature.into(), Some(result), Arc::new(evaluator))
    }

    fn push(
        &mut self,
        operator: Operator,
        signature: Vec<TypePattern>,
        result: Option<ValueType>,
        evaluator: Evaluator,
    ) -> &mut Self {
        assert_eq!(
            signature.len(),
            operator.arity(),
            "Signature length does not match arity of `{}`",
            operator
        );
        self.entries.push(Entry {
            operator,
            signature,
            result,
            evaluator,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First registered evaluator whose signature matches `types`.
    pub fn resolve(&self, operator: Operator, types: &[ValueType]) -> Option<Evaluator> {
        self.entries
            .iter()
            .find(|e| e.matches(operator, types))
            .map(|e| Arc::clone(&e.evaluator))
    }

    /// Natural result type of `operator` applied to operands of `types`.
    ///
    /// Comparisons and logical operators give booleans, arithmetic gives the
    /// promoted operand type (integer division gives rationals), and `ite`
    /// gives the join of its branches.
    pub fn result_type(&self, operator: Operator, types: &[ValueType]) -> Option<ValueType> {
        if types.len() != operator.arity() {
            return None;
        }
        if let Some(entry) = self.entries.iter().find(|e| e.matches(operator, types)) {
            if entry.result.is_some() {
                return entry.result;
            }
        }
        match operator {
            Operator::Id => Some(types[0]),
            Operator::Ite => types[1].join(types[2]),
            op if op.is_predicate() => Some(ValueType::Boolean),
            Operator::Divide | Operator::DivideIgnoreZero => match types[0].join(types[1])? {
                ValueType::Integer => Some(ValueType::Rational),
                ValueType::Boolean => None,
                ty => Some(ty),
            },
            _ => types[0].join(types[1]),
        }
    }
}

/// Per-context memo of registry lookups.
pub struct Resolver {
    registry: Arc<OperatorRegistry>,
    memo: HashMap<(Operator, Vec<ValueType>), Option<Evaluator>>,
}

impl Resolver {
    pub fn new(registry: Arc<OperatorRegistry>) -> Self {
        Self {
            registry,
            memo: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<OperatorRegistry> {
        &self.registry
    }

    pub fn resolve(&mut self, operator: Operator, types: &[ValueType]) -> Option<Evaluator> {
        if let Some(found) = self.memo.get(&(operator, types.to_vec())) {
            return found.clone();
        }
        let found = self.registry.resolve(operator, types);
        self.memo.insert((operator, types.to_vec()), found.clone());
        found
    }

    /// Number of distinct `(operator, types)` keys resolved so far.
    pub fn resolved(&self) -> usize {
        self.memo.len()
    }
}

fn bool_arg(v: &Value) -> Result<bool, EvalError> {
    v.as_bool().ok_or(EvalError::TypeMismatch {
        expected: "boolean",
        found: v.value_type(),
    })
}

fn logic(op: Operator, a: bool, b: bool) -> bool {
    match op {
        Operator::And => a && b,
        Operator::Or => a || b,
        Operator::Iff => a == b,
        Operator::Implies => !a || b,
        _ => unreachable!("not a logical operator: {}", op),
    }
}

fn compare(op: Operator, ord: Ordering) -> bool {
    match op {
        Operator::Lt => ord == Ordering::Less,
        Operator::Le => ord != Ordering::Greater,
        Operator::Gt => ord == Ordering::Greater,
        Operator::Ge => ord != Ordering::Less,
        _ => unreachable!("not a comparison: {}", op),
    }
}

fn arith(op: Operator, a: &Value, b: &Value) -> Result<Value, EvalError> {
    if op == Operator::DivideIgnoreZero && b.is_zero() {
        return Ok(a.clone());
    }
    let (a, b) = promote(a, b)?;
    let result = match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => match op {
            Operator::Add => Value::Integer(x + y),
            Operator::Subtract => Value::Integer(x - y),
            Operator::Multiply => Value::Integer(x * y),
            Operator::Max => Value::Integer(x.max(y)),
            Operator::Min => Value::Integer(x.min(y)),
            _ => {
                if y.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                Value::Rational(BigRational::new(x, y))
            }
        },
        (Value::Rational(x), Value::Rational(y)) => match op {
            Operator::Add => Value::Rational(x + y),
            Operator::Subtract => Value::Rational(x - y),
            Operator::Multiply => Value::Rational(x * y),
            Operator::Max => Value::Rational(x.max(y)),
            Operator::Min => Value::Rational(x.min(y)),
            _ => {
                if y.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                Value::Rational(x / y)
            }
        },
        (Value::Real(x), Value::Real(y)) => {
            let (x, y) = (x.0, y.0);
            Value::real(match op {
                Operator::Add => x + y,
                Operator::Subtract => x - y,
                Operator::Multiply => x * y,
                Operator::Max => x.max(y),
                Operator::Min => x.min(y),
                _ => {
                    if y == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    x / y
                }
            })
        }
        (Value::Interval(x), Value::Interval(y)) => Value::Interval(match op {
            Operator::Add => x.add(&y),
            Operator::Subtract => x.sub(&y),
            Operator::Multiply => x.mul(&y),
            Operator::Max => x.max(&y),
            Operator::Min => x.min(&y),
            _ => x.div(&y)?,
        }),
        (a, _) => {
            return Err(EvalError::TypeMismatch {
                expected: "numeric",
                found: a.value_type(),
            })
        }
    };
    Ok(result)
}
