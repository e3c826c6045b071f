use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use log::trace;

use crate::error::{DdError, Resource};
use crate::value::Value;

/// Interned code of a leaf value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LeafCode(u32);

impl LeafCode {
    pub const fn new(raw: u32) -> Self {
        LeafCode(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for LeafCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bidirectional map between leaf codes and canonical values.
///
/// Codes are dense and never reused: a value stays interned for the lifetime
/// of the table, even after every leaf node carrying it has been collected.
#[derive(Debug)]
pub struct LeafTable {
    values: Vec<Value>,
    codes: HashMap<Value, LeafCode>,
    limit: usize,
}

impl LeafTable {
    pub fn new() -> Self {
        Self::with_limit(u32::MAX as usize)
    }

    /// Table that refuses to hold more than `limit` distinct values.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            values: Vec::new(),
            codes: HashMap::new(),
            limit: limit.min(u32::MAX as usize),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the code of `value`, storing an owned clone if it is new.
    pub fn intern(&mut self, value: &Value) -> Result<LeafCode, DdError> {
        if let Some(&code) = self.codes.get(value) {
            return Ok(code);
        }
        if self.values.len() >= self.limit {
            return Err(DdError::ResourceExhausted {
                resource: Resource::Leaves,
                limit: self.limit,
            });
        }
        let code = LeafCode::new(self.values.len() as u32);
        trace!("intern {} as {}", value, code);
        self.values.push(value.clone());
        self.codes.insert(value.clone(), code);
        Ok(code)
    }

    pub fn lookup(&self, value: &Value) -> Option<LeafCode> {
        self.codes.get(value).copied()
    }

    /// # Panics
    ///
    /// Panics if `code` was not produced by this table.
    pub fn value_of(&self, code: LeafCode) -> &Value {
        &self.values[code.index()]
    }
}

impl Default for LeafTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_intern_is_idempotent() {
        let mut table = LeafTable::new();
        let a = table.intern(&Value::integer(5)).unwrap();
        let b = table.intern(&Value::integer(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(table.value_of(a), &Value::integer(5));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_intern_keys_on_type() {
        let mut table = LeafTable::new();
        let zero = table.intern(&Value::integer(0)).unwrap();
        let f = table.intern(&Value::Boolean(false)).unwrap();
        let q = table.intern(&Value::rational(0, 1)).unwrap();
        assert_ne!(zero, f);
        assert_ne!(zero, q);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_intern_stores_owned_copy() {
        let mut table = LeafTable::new();
        let mut v = Value::integer(7);
        let code = table.intern(&v).unwrap();
        v = Value::integer(8);
        assert_eq!(table.value_of(code), &Value::integer(7));
        assert_ne!(table.lookup(&v), Some(code));
    }

    #[test]
    fn test_overflow_fails_fast() {
        let mut table = LeafTable::with_limit(2);
        table.intern(&Value::integer(1)).unwrap();
        table.intern(&Value::integer(2)).unwrap();
        table.intern(&Value::integer(1)).unwrap();
        let err = table.intern(&Value::integer(3)).unwrap_err();
        assert_eq!(
            err,
            DdError::ResourceExhausted {
                resource: Resource::Leaves,
                limit: 2
            }
        );
    }
}
