//! Abstraction of variables by folding cofactors.
//!
//! `abstract(op, f, cube)` eliminates every variable of `cube` from `f`:
//!
//! ```text
//! abstract(op, f, x ∧ rest) = op(abstract(op, f|x=0, rest), abstract(op, f|x=1, rest))
//! ```
//!
//! A cube variable that `f` does not depend on still contributes a fold
//! of the sub-result with itself, so summing over an absent variable
//! doubles, and taking the product squares.

use log::debug;

use crate::cache::OpKey;
use crate::context::Context;
use crate::error::{DdError, Result};
use crate::node::Node;
use crate::operator::Operator;
use crate::reference::NodeId;
use crate::registry::ExpressionToType;
use crate::types::Var;
use crate::value::ValueType;

impl Context {
    /// Conjunction of the positive literals of `vars`.
    pub fn cube(&self, vars: &[Var]) -> Result<NodeId> {
        debug!("cube({:?})", vars);
        self.maybe_collect();
        let mut vars = vars.to_vec();
        vars.sort();
        vars.dedup();
        let zero = self.bool_leaf(false)?;
        let mut current = self.bool_leaf(true)?;
        for &v in vars.iter().rev() {
            self.projection(v)?;
            current = self.make_node(v, zero, current)?;
        }
        Ok(self.handout(current))
    }

    /// Variables of a cube diagram, top to bottom.
    ///
    /// # Errors
    ///
    /// [`DdError::Misuse`] if `cube` is not a conjunction of positive literals.
    pub fn cube_vars(&self, cube: NodeId) -> Result<Vec<Var>> {
        self.check_handle(cube)?;
        let mut vars = Vec::new();
        let mut current = cube;
        loop {
            match self.node(current) {
                Node::Leaf(_) => {
                    return match self.bool_value(current) {
                        Some(true) => Ok(vars),
                        _ => Err(DdError::Misuse(format!("{} is not a cube", cube))),
                    };
                }
                Node::Inner { var, low, high } => {
                    if self.bool_value(low) != Some(false) {
                        return Err(DdError::Misuse(format!("{} is not a cube", cube)));
                    }
                    vars.push(var);
                    current = high;
                }
            }
        }
    }

    /// Sum of `f` over all assignments of the cube variables.
    pub fn abstract_sum(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        self.abstract_natural(Operator::Add, f, cube)
    }

    pub fn abstract_product(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        self.abstract_natural(Operator::Multiply, f, cube)
    }

    pub fn abstract_max(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        self.abstract_natural(Operator::Max, f, cube)
    }

    pub fn abstract_min(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        self.abstract_natural(Operator::Min, f, cube)
    }

    /// Existential quantification of a boolean diagram.
    pub fn abstract_exist(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        self.abstract_with(Operator::Or, ValueType::Boolean, f, cube)
    }

    /// Universal quantification of a boolean diagram.
    pub fn abstract_forall(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        self.abstract_with(Operator::And, ValueType::Boolean, f, cube)
    }

    fn abstract_natural(&self, op: Operator, f: NodeId, cube: NodeId) -> Result<NodeId> {
        self.check_operand(f)?;
        let ty = self
            .type_of(&f)
            .ok_or_else(|| DdError::Misuse(format!("{} mixes incompatible leaf types", f)))?;
        self.abstract_with(op, ty, f, cube)
    }

    /// Folds the cofactors of `f` over `cube` with the binary operator `op`.
    pub fn abstract_with(&self, op: Operator, result_type: ValueType, f: NodeId, cube: NodeId) -> Result<NodeId> {
        debug!("abstract({}, {}, {}, {})", op, result_type, f, cube);
        if op.arity() != 2 {
            return Err(DdError::Misuse(format!("cannot fold with {}-ary operator `{}`", op.arity(), op)));
        }
        self.maybe_collect();
        self.check_operand(f)?;
        self.check_operand(cube)?;
        self.cube_vars(cube)?;
        let res = self.abstract_rec(op, result_type, f, cube)?;
        Ok(self.handout(res))
    }

    fn abstract_rec(&self, op: Operator, result_type: ValueType, f: NodeId, cube: NodeId) -> Result<NodeId> {
        let cube_var = self.top_var(cube);
        if cube_var.is_leaf() {
            return Ok(f);
        }
        let (_, rest) = self.cofactors(cube, cube_var);

        let top = self.top_var(f);
        if cube_var < top {
            // f does not depend on cube_var
            let r = self.abstract_rec(op, result_type, f, rest)?;
            return self.apply_rec(op, result_type, &[r, r]);
        }

        let key = OpKey::Abstract {
            op,
            result: result_type,
            f,
            cube,
        };
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f, top);
        let res = if cube_var == top {
            let low = self.abstract_rec(op, result_type, f0, rest)?;
            let high = self.abstract_rec(op, result_type, f1, rest)?;
            self.apply_rec(op, result_type, &[low, high])?
        } else {
            let low = self.abstract_rec(op, result_type, f0, cube)?;
            let high = self.abstract_rec(op, result_type, f1, cube)?;
            self.make_node(top, low, high)?
        };

        self.cache_put(key, res);
        Ok(res)
    }

    /// Relational product: `∃ cube. f ∧ g` without building `f ∧ g`.
    pub fn abstract_and_exist(&self, f: NodeId, g: NodeId, cube: NodeId) -> Result<NodeId> {
        debug!("abstract_and_exist({}, {}, {})", f, g, cube);
        self.maybe_collect();
        self.check_operand(f)?;
        self.check_operand(g)?;
        self.check_operand(cube)?;
        self.cube_vars(cube)?;
        let res = self.and_exist_rec(f, g, cube)?;
        Ok(self.handout(res))
    }

    fn and_exist_rec(&self, f: NodeId, g: NodeId, cube: NodeId) -> Result<NodeId> {
        let (bf, bg) = (self.bool_value(f), self.bool_value(g));
        if bf == Some(false) || bg == Some(false) {
            return Ok(if bf == Some(false) { f } else { g });
        }
        if bf == Some(true) && bg == Some(true) {
            return Ok(f);
        }

        let top = self.top_var(f).min(self.top_var(g));
        let mut cube = cube;
        // Quantifying a variable neither operand depends on changes nothing.
        while self.top_var(cube) < top {
            cube = self.cofactors(cube, self.top_var(cube)).1;
        }
        if self.top_var(cube).is_leaf() {
            return self.apply_rec(Operator::And, ValueType::Boolean, &[f, g]);
        }
        if bf == Some(true) || f == g {
            return self.abstract_rec(Operator::Or, ValueType::Boolean, g, cube);
        }
        if bg == Some(true) {
            return self.abstract_rec(Operator::Or, ValueType::Boolean, f, cube);
        }

        let (f, g) = if f <= g { (f, g) } else { (g, f) };
        let key = OpKey::AndExist { f, g, cube };
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }

        let (f0, f1) = self.cofactors(f, top);
        let (g0, g1) = self.cofactors(g, top);
        let cube_var = self.top_var(cube);
        let res = if cube_var == top {
            let rest = self.cofactors(cube, cube_var).1;
            let low = self.and_exist_rec(f0, g0, rest)?;
            if self.bool_value(low) == Some(true) {
                low
            } else {
                let high = self.and_exist_rec(f1, g1, rest)?;
                self.apply_rec(Operator::Or, ValueType::Boolean, &[low, high])?
            }
        } else {
            let low = self.and_exist_rec(f0, g0, cube)?;
            let high = self.and_exist_rec(f1, g1, cube)?;
            self.make_node(top, low, high)?
        };

        self.cache_put(key, res);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use test_log::test;

    // f = ite(x0, 3, ite(x1, 5, 7))
    fn example(ctx: &Context) -> (NodeId, Var, Var) {
        let x0 = ctx.new_variable().unwrap();
        let x1 = ctx.new_variable().unwrap();
        let v0 = ctx.var_node(x0).unwrap();
        let v1 = ctx.var_node(x1).unwrap();
        let c3 = ctx.new_constant(3).unwrap();
        let c5 = ctx.new_constant(5).unwrap();
        let c7 = ctx.new_constant(7).unwrap();
        let inner = ctx.apply(Operator::Ite, ValueType::Integer, &[v1, c5, c7]).unwrap();
        let f = ctx.apply(Operator::Ite, ValueType::Integer, &[v0, c3, inner]).unwrap();
        (f, x0, x1)
    }

    #[test]
    fn test_cube_round_trip() {
        let ctx = Context::default();
        let vars: Vec<Var> = (0..4).map(|_| ctx.new_variable().unwrap()).collect();
        let cube = ctx.cube(&[vars[3], vars[1], vars[1]]).unwrap();
        assert_eq!(ctx.cube_vars(cube).unwrap(), vec![vars[1], vars[3]]);
        let empty = ctx.cube(&[]).unwrap();
        assert_eq!(ctx.cube_vars(empty).unwrap(), vec![]);
        let not_a_cube = ctx.new_constant(1).unwrap();
        assert!(ctx.cube_vars(not_a_cube).is_err());
    }

    #[test]
    fn test_sum_over_full_cube() {
        let ctx = Context::default();
        let (f, x0, x1) = example(&ctx);
        let cube = ctx.cube(&[x0, x1]).unwrap();
        let s = ctx.abstract_sum(f, cube).unwrap();
        assert_eq!(ctx.leaf_value(s), Some(Value::integer(18)));
    }

    #[test]
    fn test_released_operands_are_misuse() {
        let ctx = Context::default();
        let (f, x0, x1) = example(&ctx);
        let cube = ctx.cube(&[x0, x1]).unwrap();
        ctx.release(f).unwrap();
        assert!(matches!(ctx.abstract_sum(f, cube), Err(DdError::Misuse(_))));

        let (g, _, _) = example(&ctx);
        ctx.release(cube).unwrap();
        assert!(matches!(ctx.abstract_max(g, cube), Err(DdError::Misuse(_))));
        assert!(matches!(ctx.abstract_and_exist(g, g, cube), Err(DdError::Misuse(_))));
    }

    #[test]
    fn test_max_min_product() {
        let ctx = Context::default();
        let (f, x0, x1) = example(&ctx);
        let cube = ctx.cube(&[x0, x1]).unwrap();
        let max = ctx.abstract_max(f, cube).unwrap();
        let min = ctx.abstract_min(f, cube).unwrap();
        let prod = ctx.abstract_product(f, cube).unwrap();
        assert_eq!(ctx.leaf_value(max), Some(Value::integer(7)));
        assert_eq!(ctx.leaf_value(min), Some(Value::integer(3)));
        assert_eq!(ctx.leaf_value(prod), Some(Value::integer(3 * 3 * 5 * 7)));
    }

    #[test]
    fn test_partial_sum() {
        let ctx = Context::default();
        let (f, x0, x1) = example(&ctx);
        let cube = ctx.cube(&[x1]).unwrap();
        let s = ctx.abstract_sum(f, cube).unwrap();
        // x0 ? 3+3 : 5+7
        assert_eq!(ctx.variable_of(s), Some(x0));
        assert_eq!(ctx.leaf_value(ctx.high(s).unwrap()), Some(Value::integer(6)));
        assert_eq!(ctx.leaf_value(ctx.low(s).unwrap()), Some(Value::integer(12)));
    }

    #[test]
    fn test_exist_forall() {
        let ctx = Context::default();
        let x0 = ctx.new_variable().unwrap();
        let x1 = ctx.new_variable().unwrap();
        let v0 = ctx.var_node(x0).unwrap();
        let v1 = ctx.var_node(x1).unwrap();
        let and = ctx.apply_and(v0, v1).unwrap();
        let cube = ctx.cube(&[x0]).unwrap();
        assert_eq!(ctx.abstract_exist(and, cube).unwrap(), v1);
        let f = ctx.new_constant(false).unwrap();
        assert_eq!(ctx.abstract_forall(and, cube).unwrap(), f);
    }

    #[test]
    fn test_and_exist_matches_composition() {
        let ctx = Context::default();
        let x: Vec<Var> = (0..3).map(|_| ctx.new_variable().unwrap()).collect();
        let v: Vec<NodeId> = x.iter().map(|&x| ctx.var_node(x).unwrap()).collect();
        let f = ctx.apply_or(v[0], v[1]).unwrap();
        let nx1 = ctx.apply_not(v[1]).unwrap();
        let g = ctx.apply_and(nx1, v[2]).unwrap();
        let cube = ctx.cube(&[x[1]]).unwrap();

        let fused = ctx.abstract_and_exist(f, g, cube).unwrap();
        let conj = ctx.apply_and(f, g).unwrap();
        let composed = ctx.abstract_exist(conj, cube).unwrap();
        assert_eq!(fused, composed);
    }

    #[test]
    fn test_abstract_requires_binary_operator() {
        let ctx = Context::default();
        let (f, x0, _) = example(&ctx);
        let cube = ctx.cube(&[x0]).unwrap();
        let err = ctx.abstract_with(Operator::Not, ValueType::Boolean, f, cube).unwrap_err();
        assert!(matches!(err, DdError::Misuse(_)));
    }
}
