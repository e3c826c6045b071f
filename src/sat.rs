//! Queries over the satisfying assignments of boolean diagrams.

use std::collections::{BTreeSet, HashMap};

use log::debug;
use num_bigint::BigUint;

use crate::context::Context;
use crate::error::{DdError, Result};
use crate::operator::Operator;
use crate::reference::NodeId;
use crate::registry::ExpressionToType;
use crate::types::Var;
use crate::value::{Value, ValueType};

impl Context {
    /// Number of assignments of the `cube` variables under which `f` is true.
    ///
    /// # Errors
    ///
    /// [`DdError::Misuse`] if `f` is not boolean, `cube` is not a cube, or
    /// `f` depends on a variable outside `cube`.
    pub fn count_sat(&self, f: NodeId, cube: NodeId) -> Result<BigUint> {
        debug!("count_sat({}, {})", f, cube);
        self.maybe_collect();
        self.check_boolean(f)?;
        self.check_operand(cube)?;
        let vars = self.cube_vars(cube)?;
        self.check_covered(f, &vars)?;
        let mut memo = HashMap::new();
        Ok(self.count_sat_rec(f, &vars, &mut memo))
    }

    // Within one count, an inner node always meets the cube at its own
    // variable, so the node id alone is a sound memo key.
    fn count_sat_rec(&self, f: NodeId, vars: &[Var], memo: &mut HashMap<NodeId, BigUint>) -> BigUint {
        let Some((&var, rest)) = vars.split_first() else {
            return if self.bool_value(f) == Some(true) {
                BigUint::from(1u32)
            } else {
                BigUint::ZERO
            };
        };
        if self.top_var(f) != var {
            return self.count_sat_rec(f, rest, memo) << 1;
        }
        if let Some(count) = memo.get(&f) {
            return count.clone();
        }
        let (f0, f1) = self.cofactors(f, var);
        let count = self.count_sat_rec(f0, rest, memo) + self.count_sat_rec(f1, rest, memo);
        memo.insert(f, count.clone());
        count
    }

    /// One satisfying assignment of `f` over the `cube` variables, as a
    /// conjunction of literals; constant false when `f` is unsatisfiable.
    ///
    /// The low branch is preferred, and cube variables `f` does not test
    /// are set to false.
    pub fn find_sat(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        debug!("find_sat({}, {})", f, cube);
        self.maybe_collect();
        self.check_boolean(f)?;
        self.check_operand(cube)?;
        let vars = self.cube_vars(cube)?;
        self.check_covered(f, &vars)?;

        let fls = self.bool_leaf(false)?;
        if self.bool_value(f) == Some(false) {
            return Ok(self.handout(fls));
        }

        let mut chosen = HashMap::new();
        let mut current = f;
        while let Some((low, high)) = self.try_node(current).and_then(|node| node.children()) {
            let var = self.top_var(current);
            // Reduced boolean diagrams have no unsatisfiable inner nodes.
            let take_high = self.bool_value(low) == Some(false);
            chosen.insert(var, take_high);
            current = if take_high { high } else { low };
        }

        let mut res = self.bool_leaf(true)?;
        for &var in vars.iter().rev() {
            res = if chosen.get(&var).copied().unwrap_or(false) {
                self.make_node(var, fls, res)?
            } else {
                self.make_node(var, res, fls)?
            };
        }
        Ok(self.handout(res))
    }

    /// Folds `f` with the binary operator `op` over every assignment that
    /// satisfies `sat`.
    ///
    /// Assignments range over the joint support of `f` and `sat`. Returns
    /// `None` when `sat` is unsatisfiable. The fold uses the registry's
    /// natural result type for `op` on the leaf type of `f`.
    pub fn apply_over_sat(&self, op: Operator, f: NodeId, sat: NodeId) -> Result<Option<Value>> {
        debug!("apply_over_sat({}, {}, {})", op, f, sat);
        if op.arity() != 2 {
            return Err(DdError::Misuse(format!("cannot fold with {}-ary operator `{}`", op.arity(), op)));
        }
        self.maybe_collect();
        self.check_operand(f)?;
        self.check_boolean(sat)?;
        let ty = self
            .type_of(&f)
            .ok_or_else(|| DdError::Misuse(format!("{} mixes incompatible leaf types", f)))?;
        let result_type = self
            .registry()
            .result_type(op, &[ty, ty])
            .ok_or_else(|| DdError::no_evaluator(op, vec![ty, ty]))?;

        let support: BTreeSet<Var> = self.support(f).into_iter().chain(self.support(sat)).collect();
        let support: Vec<Var> = support.into_iter().collect();
        let mut memo = HashMap::new();
        self.over_sat_rec(op, result_type, f, sat, &support, &mut memo)
    }

    pub fn max_over_sat(&self, f: NodeId, sat: NodeId) -> Result<Option<Value>> {
        self.apply_over_sat(Operator::Max, f, sat)
    }

    pub fn min_over_sat(&self, f: NodeId, sat: NodeId) -> Result<Option<Value>> {
        self.apply_over_sat(Operator::Min, f, sat)
    }

    pub fn and_over_sat(&self, f: NodeId, sat: NodeId) -> Result<Option<Value>> {
        self.apply_over_sat(Operator::And, f, sat)
    }

    pub fn or_over_sat(&self, f: NodeId, sat: NodeId) -> Result<Option<Value>> {
        self.apply_over_sat(Operator::Or, f, sat)
    }

    fn over_sat_rec(
        &self,
        op: Operator,
        result_type: ValueType,
        f: NodeId,
        sat: NodeId,
        support: &[Var],
        memo: &mut HashMap<(NodeId, NodeId, usize), Option<Value>>,
    ) -> Result<Option<Value>> {
        if self.bool_value(sat) == Some(false) {
            return Ok(None);
        }
        let key = (f, sat, support.len());
        if let Some(known) = memo.get(&key) {
            return Ok(known.clone());
        }

        let res = match support.split_first() {
            None => {
                let value = self
                    .leaf_value(f)
                    .ok_or_else(|| DdError::Inconsistent(format!("{} is below the joint support", f)))?;
                let ty = value.value_type();
                let value = value
                    .coerce(result_type)
                    .map_err(|e| DdError::evaluation(Operator::Id, vec![ty], e))?;
                Some(value)
            }
            Some((&var, rest)) => {
                let (f0, f1) = self.cofactors(f, var);
                let (s0, s1) = self.cofactors(sat, var);
                let low = self.over_sat_rec(op, result_type, f0, s0, rest, memo)?;
                let high = self.over_sat_rec(op, result_type, f1, s1, rest, memo)?;
                match (low, high) {
                    (None, x) | (x, None) => x,
                    (Some(a), Some(b)) => Some(self.eval_values(op, result_type, &a, &b)?),
                }
            }
        };

        memo.insert(key, res.clone());
        Ok(res)
    }

    fn eval_values(&self, op: Operator, result_type: ValueType, a: &Value, b: &Value) -> Result<Value> {
        let types = vec![a.value_type(), b.value_type()];
        let evaluator = self
            .resolver
            .borrow_mut()
            .resolve(op, &types)
            .ok_or_else(|| DdError::no_evaluator(op, types.clone()))?;
        let args = [a, b];
        evaluator(&args[..])
            .and_then(|v| v.coerce(result_type))
            .map_err(|e| DdError::evaluation(op, types, e))
    }

    fn check_boolean(&self, f: NodeId) -> Result<()> {
        self.check_operand(f)?;
        if self.type_of(&f) == Some(ValueType::Boolean) {
            Ok(())
        } else {
            Err(DdError::Misuse(format!("{} is not a boolean diagram", f)))
        }
    }

    fn check_covered(&self, f: NodeId, vars: &[Var]) -> Result<()> {
        match self.support(f).into_iter().find(|v| !vars.contains(v)) {
            Some(v) => Err(DdError::Misuse(format!("{} depends on {}, which is not in the cube", f, v))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn setup(ctx: &Context, n: usize) -> (Vec<Var>, Vec<NodeId>) {
        let vars: Vec<Var> = (0..n).map(|_| ctx.new_variable().unwrap()).collect();
        let nodes = vars.iter().map(|&x| ctx.var_node(x).unwrap()).collect();
        (vars, nodes)
    }

    fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
        (0..1u32 << n).map(move |bits| (0..n).map(|i| (bits >> i) & 1 == 1).collect())
    }

    #[test]
    fn test_count_sat_constants() {
        let ctx = Context::default();
        let (vars, _) = setup(&ctx, 3);
        let cube = ctx.cube(&vars).unwrap();
        let t = ctx.new_constant(true).unwrap();
        let f = ctx.new_constant(false).unwrap();
        assert_eq!(ctx.count_sat(t, cube).unwrap(), BigUint::from(8u32));
        assert_eq!(ctx.count_sat(f, cube).unwrap(), BigUint::ZERO);
        let empty = ctx.cube(&[]).unwrap();
        assert_eq!(ctx.count_sat(t, empty).unwrap(), BigUint::from(1u32));
    }

    #[test]
    fn test_count_sat_matches_truth_table() {
        let ctx = Context::default();
        let (vars, v) = setup(&ctx, 4);
        // (x0 | x2) & !x3, x1 free
        let or = ctx.apply_or(v[0], v[2]).unwrap();
        let n3 = ctx.apply_not(v[3]).unwrap();
        let f = ctx.apply_and(or, n3).unwrap();
        let cube = ctx.cube(&vars).unwrap();

        let expected = assignments(4).filter(|a| (a[0] || a[2]) && !a[3]).count();
        assert_eq!(ctx.count_sat(f, cube).unwrap(), BigUint::from(expected));

        let small = ctx.cube(&[vars[1]]).unwrap();
        assert!(matches!(ctx.count_sat(f, small), Err(DdError::Misuse(_))));
    }

    #[test]
    fn test_count_sat_rejects_numeric_diagrams() {
        let ctx = Context::default();
        let (vars, _) = setup(&ctx, 1);
        let cube = ctx.cube(&vars).unwrap();
        let c = ctx.new_constant(3).unwrap();
        assert!(matches!(ctx.count_sat(c, cube), Err(DdError::Misuse(_))));
    }

    #[test]
    fn test_find_sat_is_a_model() {
        let ctx = Context::default();
        let (vars, v) = setup(&ctx, 3);
        // x0 != x2
        let f = ctx.apply(Operator::Ne, ValueType::Boolean, &[v[0], v[2]]).unwrap();
        let cube = ctx.cube(&vars).unwrap();
        let model = ctx.find_sat(f, cube).unwrap();

        assert_eq!(ctx.count_sat(model, cube).unwrap(), BigUint::from(1u32));
        let both = ctx.apply_and(model, f).unwrap();
        assert_eq!(both, model);
        // Low first: x0 = 0, then x2 = 1; x1 unconstrained and set to 0.
        assert_eq!(ctx.evaluate(model, &[false, false, true]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_find_sat_of_false() {
        let ctx = Context::default();
        let (vars, v) = setup(&ctx, 2);
        let nv = ctx.apply_not(v[0]).unwrap();
        let f = ctx.apply_and(v[0], nv).unwrap();
        let cube = ctx.cube(&vars).unwrap();
        let model = ctx.find_sat(f, cube).unwrap();
        assert_eq!(ctx.leaf_value(model), Some(Value::Boolean(false)));

        let t = ctx.new_constant(true).unwrap();
        let all_false = ctx.find_sat(t, cube).unwrap();
        assert_eq!(ctx.evaluate(all_false, &[false, false]).unwrap(), Value::Boolean(true));
        assert_eq!(ctx.count_sat(all_false, cube).unwrap(), BigUint::from(1u32));
    }

    // f = x0 ? 3 : (x1 ? 5 : 7)
    fn example(ctx: &Context, v: &[NodeId]) -> NodeId {
        let c3 = ctx.new_constant(3).unwrap();
        let c5 = ctx.new_constant(5).unwrap();
        let c7 = ctx.new_constant(7).unwrap();
        let g = ctx.apply(Operator::Ite, ValueType::Integer, &[v[1], c5, c7]).unwrap();
        ctx.apply(Operator::Ite, ValueType::Integer, &[v[0], c3, g]).unwrap()
    }

    #[test]
    fn test_max_min_over_sat() {
        let ctx = Context::default();
        let (_, v) = setup(&ctx, 3);
        let f = example(&ctx, &v);
        let t = ctx.new_constant(true).unwrap();
        let nx0 = ctx.apply_not(v[0]).unwrap();

        assert_eq!(ctx.max_over_sat(f, t).unwrap(), Some(Value::integer(7)));
        assert_eq!(ctx.min_over_sat(f, t).unwrap(), Some(Value::integer(3)));
        assert_eq!(ctx.min_over_sat(f, nx0).unwrap(), Some(Value::integer(5)));
        assert_eq!(ctx.max_over_sat(f, v[1]).unwrap(), Some(Value::integer(5)));
        // sat mentions x2, f does not.
        assert_eq!(ctx.max_over_sat(f, v[2]).unwrap(), Some(Value::integer(7)));

        let fls = ctx.new_constant(false).unwrap();
        assert_eq!(ctx.max_over_sat(f, fls).unwrap(), None);
    }

    #[test]
    fn test_apply_over_sat_matches_truth_table() {
        let ctx = Context::default();
        let (_, v) = setup(&ctx, 2);
        let f = example(&ctx, &v);
        let sat = ctx.apply_or(v[0], v[1]).unwrap();
        // Assignments with x0 | x1: (1,0) -> 3, (0,1) -> 5, (1,1) -> 3
        let expected: i64 = assignments(2)
            .filter(|a| a[0] || a[1])
            .map(|a| if a[0] { 3 } else if a[1] { 5 } else { 7 })
            .sum();
        assert_eq!(ctx.apply_over_sat(Operator::Add, f, sat).unwrap(), Some(Value::integer(expected)));
        assert!(matches!(
            ctx.apply_over_sat(Operator::Not, f, sat),
            Err(DdError::Misuse(_))
        ));
        assert!(matches!(ctx.apply_over_sat(Operator::Add, f, f), Err(DdError::Misuse(_))));
    }

    #[test]
    fn test_and_or_over_sat() {
        let ctx = Context::default();
        let (_, v) = setup(&ctx, 2);
        let and = ctx.apply_and(v[0], v[1]).unwrap();
        assert_eq!(ctx.and_over_sat(and, v[0]).unwrap(), Some(Value::Boolean(false)));
        assert_eq!(ctx.or_over_sat(and, v[0]).unwrap(), Some(Value::Boolean(true)));
        assert_eq!(ctx.and_over_sat(and, and).unwrap(), Some(Value::Boolean(true)));
    }
}
