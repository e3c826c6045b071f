//! The apply family.
//!
//! ```text
//! apply(op, r, f1..fn):
//!   all fi leaves      => coerce(eval(op, values), r)
//!   cache hit          => cached
//!   v = min top(fi)    => mk(v, apply(op, r, fi|v=0), apply(op, r, fi|v=1))
//! ```
//!
//! The if-then-else recursion is structural and never looks at values
//! except for the condition leaves.

use log::debug;

use crate::cache::OpKey;
use crate::context::Context;
use crate::error::{DdError, EvalError, Result};
use crate::operator::Operator;
use crate::reference::NodeId;
use crate::types::Var;
use crate::value::{Value, ValueType};

impl Context {
    /// Applies `op` pointwise to `operands`, producing leaves of `result_type`.
    ///
    /// Leaf results are computed by the registry evaluator for the operand
    /// types and then coerced to `result_type`. For [`Operator::Ite`] with a
    /// non-boolean `result_type`, both branches are first normalised through
    /// `apply(Id, result_type, ·)`.
    ///
    /// # Errors
    ///
    /// - [`DdError::Misuse`] if the operand count does not match the arity,
    ///   or an operand is not a held node of this context.
    /// - [`DdError::Evaluation`] / [`DdError::NoEvaluator`] when a leaf
    ///   computation fails. Nodes built before the failure are left
    ///   unreferenced for the next collection.
    pub fn apply(&self, op: Operator, result_type: ValueType, operands: &[NodeId]) -> Result<NodeId> {
        debug!("apply({}, {}, {:?})", op, result_type, operands);
        if operands.len() != op.arity() {
            return Err(DdError::Misuse(format!(
                "operator `{}` takes {} operands, got {}",
                op,
                op.arity(),
                operands.len()
            )));
        }
        self.maybe_collect();
        for &f in operands {
            self.check_operand(f)?;
        }

        let res = if op == Operator::Ite {
            self.apply_ternary(result_type, operands[0], operands[1], operands[2])?
        } else {
            self.apply_rec(op, result_type, operands)?
        };
        Ok(self.handout(res))
    }

    /// Applies `op` with its natural result type (see
    /// [`OperatorRegistry::result_type`](crate::registry::OperatorRegistry::result_type)).
    pub fn apply_inferred(&self, op: Operator, operands: &[NodeId]) -> Result<NodeId> {
        use crate::registry::ExpressionToType;

        let mut types = Vec::with_capacity(operands.len());
        for &f in operands {
            self.check_operand(f)?;
            let ty = self
                .type_of(&f)
                .ok_or_else(|| DdError::Misuse(format!("operand {} mixes incompatible leaf types", f)))?;
            types.push(ty);
        }
        let result_type = self
            .registry()
            .result_type(op, &types)
            .ok_or_else(|| DdError::no_evaluator(op, types.clone()))?;
        self.apply(op, result_type, operands)
    }

    pub fn apply_not(&self, f: NodeId) -> Result<NodeId> {
        self.apply(Operator::Not, ValueType::Boolean, &[f])
    }

    pub fn apply_and(&self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.apply(Operator::And, ValueType::Boolean, &[f, g])
    }

    pub fn apply_or(&self, f: NodeId, g: NodeId) -> Result<NodeId> {
        self.apply(Operator::Or, ValueType::Boolean, &[f, g])
    }

    /// Boolean if-then-else.
    pub fn apply_ite(&self, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId> {
        self.apply(Operator::Ite, ValueType::Boolean, &[f, g, h])
    }

    /// Maps a boolean diagram to one with `for_true` and `for_false` leaves.
    ///
    /// The leaves take the join of the two value types.
    pub fn to_mt(&self, f: NodeId, for_true: impl Into<Value>, for_false: impl Into<Value>) -> Result<NodeId> {
        use crate::registry::ExpressionToType;

        let (for_true, for_false) = (for_true.into(), for_false.into());
        let (tt, ft) = (for_true.value_type(), for_false.value_type());
        let result_type = tt
            .join(ft)
            .ok_or_else(|| DdError::Misuse(format!("{} and {} leaves have no common type", tt, ft)))?;
        self.maybe_collect();
        self.check_operand(f)?;
        if self.type_of(&f) != Some(ValueType::Boolean) {
            return Err(DdError::Misuse(format!("{} is not a boolean diagram", f)));
        }

        let t = self.new_constant(for_true)?;
        let e = match self.new_constant(for_false) {
            Ok(e) => e,
            Err(err) => {
                self.release(t)?;
                return Err(err);
            }
        };
        let res = self.apply(Operator::Ite, result_type, &[f, t, e]);
        self.release(t)?;
        self.release(e)?;
        res
    }

    /// Indicator diagram of `f`: 1 where it holds, 0 elsewhere.
    pub fn to_int(&self, f: NodeId) -> Result<NodeId> {
        self.to_mt(f, 1, 0)
    }

    fn apply_ternary(&self, result_type: ValueType, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId> {
        if result_type == ValueType::Boolean {
            return self.ite_rec(f, g, h);
        }
        // Numeric branches are normalised to the result type first.
        let g = self.apply_rec(Operator::Id, result_type, &[g])?;
        self.table.borrow_mut().retain(g);
        let h = match self.apply_rec(Operator::Id, result_type, &[h]) {
            Ok(h) => h,
            Err(e) => {
                self.table.borrow_mut().release(g);
                return Err(e);
            }
        };
        self.table.borrow_mut().retain(h);
        let res = self.ite_rec(f, g, h);
        self.table.borrow_mut().release(g);
        self.table.borrow_mut().release(h);
        res
    }

    /// Evaluates `op` on leaf operands and interns the coerced result.
    pub(crate) fn eval_leaves(&self, op: Operator, result_type: ValueType, operands: &[NodeId]) -> Result<NodeId> {
        let values: Vec<Value> = operands.iter().filter_map(|&f| self.leaf_value(f)).collect();
        debug_assert_eq!(values.len(), operands.len(), "eval_leaves on inner node");
        let types: Vec<ValueType> = values.iter().map(Value::value_type).collect();
        let evaluator = self
            .resolver
            .borrow_mut()
            .resolve(op, &types)
            .ok_or_else(|| DdError::no_evaluator(op, types.clone()))?;
        let args: Vec<&Value> = values.iter().collect();
        let value = evaluator(&args)
            .and_then(|v| v.coerce(result_type))
            .map_err(|e| DdError::evaluation(op, types, e))?;
        self.make_leaf(&value)
    }

    pub(crate) fn apply_rec(&self, op: Operator, result_type: ValueType, operands: &[NodeId]) -> Result<NodeId> {
        let mut ids = [NodeId::INVALID; 3];
        let n = operands.len();
        ids[..n].copy_from_slice(operands);
        if n == 2 && op.is_commutative() && ids[0] > ids[1] {
            ids.swap(0, 1);
        }
        let ids = &ids[..n];

        let top = ids.iter().map(|&f| self.top_var(f)).min().unwrap_or(Var::LEAF);
        if top.is_leaf() {
            return self.eval_leaves(op, result_type, ids);
        }

        let key = OpKey::apply(op, result_type, ids);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }

        let mut lows = [NodeId::INVALID; 3];
        let mut highs = [NodeId::INVALID; 3];
        for (i, &f) in ids.iter().enumerate() {
            let (l, h) = self.cofactors(f, top);
            lows[i] = l;
            highs[i] = h;
        }
        let low = self.apply_rec(op, result_type, &lows[..n])?;
        let high = self.apply_rec(op, result_type, &highs[..n])?;
        let res = self.make_node(top, low, high)?;

        self.cache_put(key, res);
        Ok(res)
    }

    pub(crate) fn ite_rec(&self, f: NodeId, g: NodeId, h: NodeId) -> Result<NodeId> {
        if self.is_leaf(f) {
            return match self.bool_value(f) {
                Some(true) => Ok(g),
                Some(false) => Ok(h),
                None => {
                    let found = self.leaf_value(f).map_or(ValueType::Boolean, |v| v.value_type());
                    let types = vec![found, self.type_hint(g), self.type_hint(h)];
                    Err(DdError::evaluation(
                        Operator::Ite,
                        types,
                        EvalError::TypeMismatch {
                            expected: "boolean",
                            found,
                        },
                    ))
                }
            };
        }
        if g == h {
            return Ok(g);
        }
        match (self.bool_value(g), self.bool_value(h)) {
            (Some(true), Some(false)) => return Ok(f),
            (Some(false), Some(true)) => return self.apply_rec(Operator::Not, ValueType::Boolean, &[f]),
            _ => {}
        }

        let key = OpKey::Ite { f, g, h };
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }

        let top = self.top_var(f).min(self.top_var(g)).min(self.top_var(h));
        let (f0, f1) = self.cofactors(f, top);
        let (g0, g1) = self.cofactors(g, top);
        let (h0, h1) = self.cofactors(h, top);
        let low = self.ite_rec(f0, g0, h0)?;
        let high = self.ite_rec(f1, g1, h1)?;
        let res = self.make_node(top, low, high)?;

        self.cache_put(key, res);
        Ok(res)
    }

    /// Leaf type of a leaf, or `Boolean` for inner nodes; used in error reports only.
    fn type_hint(&self, f: NodeId) -> ValueType {
        self.leaf_value(f).map_or(ValueType::Boolean, |v| v.value_type())
    }
}
