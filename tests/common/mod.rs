#![allow(dead_code)]

use mtdd::context::Context;
use mtdd::operator::Operator;
use mtdd::reference::NodeId;
use mtdd::registry::OperatorRegistry;
use mtdd::types::Var;
use mtdd::value::{Value, ValueType};

/// Creates `n` variables and returns their projection diagrams.
pub fn variables(ctx: &Context, n: usize) -> Vec<NodeId> {
    (0..n)
        .map(|_| {
            let v = ctx.new_variable().unwrap();
            ctx.var_node(v).unwrap()
        })
        .collect()
}

/// Builds the diagram whose value on assignment `a` is `table[index(a)]`,
/// where bit `i` of the index is variable `i`.
pub fn from_table(ctx: &Context, ty: ValueType, table: &[Value]) -> NodeId {
    build(ctx, ty, 0, table)
}

fn build(ctx: &Context, ty: ValueType, var: u32, table: &[Value]) -> NodeId {
    if table.len() == 1 {
        return ctx.new_constant(table[0].clone()).unwrap();
    }
    let low: Vec<Value> = table.iter().step_by(2).cloned().collect();
    let high: Vec<Value> = table.iter().skip(1).step_by(2).cloned().collect();
    let l = build(ctx, ty, var + 1, &low);
    let h = build(ctx, ty, var + 1, &high);
    let v = ctx.var_node(Var::new(var)).unwrap();
    let res = ctx.apply(Operator::Ite, ty, &[v, h, l]).unwrap();
    for x in [l, h, v] {
        ctx.release(x).unwrap();
    }
    res
}

pub fn assignment(bits: usize, n: usize) -> Vec<bool> {
    (0..n).map(|i| (bits >> i) & 1 == 1).collect()
}

/// Values of `f` on all assignments of `n` variables, in index order.
pub fn table_of(ctx: &Context, f: NodeId, n: usize) -> Vec<Value> {
    (0..1usize << n).map(|bits| ctx.evaluate(f, &assignment(bits, n)).unwrap()).collect()
}

/// Pointwise reference result, using the standard evaluators directly.
pub fn pointwise(op: Operator, ty: ValueType, columns: &[&[Value]]) -> Vec<Option<Value>> {
    let registry = OperatorRegistry::standard();
    (0..columns[0].len())
        .map(|i| {
            let args: Vec<&Value> = columns.iter().map(|c| &c[i]).collect();
            let types: Vec<ValueType> = args.iter().map(|v| v.value_type()).collect();
            let eval = registry.resolve(op, &types)?;
            eval(&args).ok()?.coerce(ty).ok()
        })
        .collect()
}

pub fn ints(xs: &[i64]) -> Vec<Value> {
    xs.iter().map(|&x| Value::integer(x)).collect()
}

pub fn bools(xs: &[bool]) -> Vec<Value> {
    xs.iter().map(|&x| Value::Boolean(x)).collect()
}
