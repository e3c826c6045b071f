use std::cell::RefCell;
use std::fmt::Debug;
use std::sync::Arc;

use log::{debug, trace};

use crate::cache::{OpCache, OpKey};
use crate::config::ContextConfig;
use crate::error::{DdError, Result};
use crate::gc::GcState;
use crate::leaf::LeafTable;
use crate::node::Node;
use crate::reference::NodeId;
use crate::registry::{OperatorRegistry, Resolver};
use crate::table::UniqueTable;
use crate::types::Var;
use crate::value::Value;

/// Counters describing a context.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Stats {
    pub variables: usize,
    /// Occupied node slots, live and dead.
    pub nodes: usize,
    pub live_nodes: usize,
    pub peak_nodes: usize,
    /// Distinct interned leaf values.
    pub leaves: usize,
    pub cache_entries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_flushes: usize,
    pub collections: usize,
    pub reclaimed: usize,
}

/// A decision-diagram manager.
///
/// Owns the unique table, the leaf table, the operation cache and the
/// evaluator memo of one model-checking run. All operations take `&self`;
/// the context is not `Sync` and must be confined to one thread.
///
/// Every public operation that returns a [`NodeId`] hands the caller one
/// reference on it, to be given back with [`release`](Self::release).
/// Walkers ([`low`](Self::low), [`high`](Self::high)) return borrowed
/// children that stay valid while their parent is held.
pub struct Context {
    pub(crate) config: ContextConfig,
    pub(crate) table: RefCell<UniqueTable>,
    pub(crate) leaves: RefCell<LeafTable>,
    pub(crate) cache: RefCell<OpCache>,
    pub(crate) resolver: RefCell<Resolver>,
    /// Projection node of each variable, pinned for the context lifetime.
    pub(crate) vars: RefCell<Vec<NodeId>>,
    pub(crate) gc: RefCell<GcState>,
}

impl Context {
    pub fn new(config: ContextConfig, registry: Arc<OperatorRegistry>) -> Self {
        debug!("Creating context with {:?}", config);
        let table = UniqueTable::new(config.unique_slots, UniqueTable::nodes_for_memory(config.max_memory));
        let cache = OpCache::new(
            config.cache_size(),
            config.cache_hard_limit(),
            config.min_hit,
            config.cache_enabled,
        );
        Self {
            table: RefCell::new(table),
            leaves: RefCell::new(LeafTable::new()),
            cache: RefCell::new(cache),
            resolver: RefCell::new(Resolver::new(registry)),
            vars: RefCell::new(Vec::new()),
            gc: RefCell::new(GcState::new(config.loose_threshold())),
            config,
        }
    }

    /// Context with the standard evaluators.
    pub fn with_config(config: ContextConfig) -> Self {
        Self::new(config, Arc::new(OperatorRegistry::standard()))
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<OperatorRegistry> {
        Arc::clone(self.resolver.borrow().registry())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::with_config(ContextConfig::default())
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.borrow();
        f.debug_struct("Context")
            .field("variables", &self.vars.borrow().len())
            .field("nodes", &table.population())
            .field("live", &table.live())
            .field("leaves", &self.leaves.borrow().len())
            .finish()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        debug!("Dropping context: {:?}", self.stats());
    }
}

// Variables, constants and references.
impl Context {
    pub fn num_vars(&self) -> usize {
        self.vars.borrow().len()
    }

    /// Appends a new variable below all existing ones in the order.
    pub fn new_variable(&self) -> Result<Var> {
        self.maybe_collect();
        let index = self.vars.borrow().len();
        if index >= Var::LEAF.index() {
            return Err(DdError::Misuse("variable index space exhausted".to_string()));
        }
        let var = Var::new(index as u32);
        let f = self.make_leaf(&Value::Boolean(false))?;
        let t = self.make_leaf(&Value::Boolean(true))?;
        let node = self.make_node(var, f, t)?;
        self.table.borrow_mut().retain(node);
        self.vars.borrow_mut().push(node);
        debug!("new_variable() -> {} as {}", var, node);
        Ok(var)
    }

    /// Boolean projection diagram of `var`.
    pub fn var_node(&self, var: Var) -> Result<NodeId> {
        let node = self.projection(var)?;
        self.table.borrow_mut().retain(node);
        Ok(node)
    }

    pub(crate) fn projection(&self, var: Var) -> Result<NodeId> {
        self.vars
            .borrow()
            .get(var.index())
            .copied()
            .ok_or_else(|| DdError::Misuse(format!("unknown variable {}", var)))
    }

    /// Constant diagram with the single leaf `value`.
    pub fn new_constant(&self, value: impl Into<Value>) -> Result<NodeId> {
        self.maybe_collect();
        let node = self.make_leaf(&value.into())?;
        self.table.borrow_mut().retain(node);
        Ok(node)
    }

    pub fn retain(&self, f: NodeId) -> Result<()> {
        self.check_handle(f)?;
        self.table.borrow_mut().retain(f);
        Ok(())
    }

    /// Gives back one reference obtained from an operation or [`retain`](Self::retain).
    pub fn release(&self, f: NodeId) -> Result<()> {
        self.check_handle(f)?;
        if self.table.borrow_mut().release(f) {
            trace!("release({}) -> rc = {}", f, self.table.borrow().rc(f));
            Ok(())
        } else {
            Err(DdError::Misuse(format!("release of {} without a matching retain", f)))
        }
    }

    /// Current reference count of `f` (external and parent references).
    pub fn ref_count(&self, f: NodeId) -> u32 {
        self.table.borrow().rc(f)
    }

    pub(crate) fn check_handle(&self, f: NodeId) -> Result<()> {
        if self.table.borrow().contains(f) {
            Ok(())
        } else {
            Err(DdError::Misuse(format!("{} is not a node of this context", f)))
        }
    }

    /// Operands of public operations must be held. Called after the
    /// collection on entry, so a released operand is either gone or dead.
    pub(crate) fn check_operand(&self, f: NodeId) -> Result<()> {
        self.check_handle(f)?;
        if self.table.borrow().rc(f) == 0 {
            return Err(DdError::Misuse(format!("{} has no references left", f)));
        }
        Ok(())
    }

    pub fn stats(&self) -> Stats {
        let table = self.table.borrow();
        let cache = self.cache.borrow();
        let gc = self.gc.borrow();
        Stats {
            variables: self.vars.borrow().len(),
            nodes: table.population(),
            live_nodes: table.live(),
            peak_nodes: table.peak(),
            leaves: self.leaves.borrow().len(),
            cache_entries: cache.len(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            cache_flushes: cache.flushes(),
            collections: gc.collections,
            reclaimed: gc.reclaimed,
        }
    }
}

// Walkers. Ids that are not nodes of this context read as absent.
impl Context {
    pub fn is_leaf(&self, f: NodeId) -> bool {
        self.try_node(f).is_some_and(|node| node.is_leaf())
    }

    /// Value of a leaf, `None` for inner nodes.
    pub fn leaf_value(&self, f: NodeId) -> Option<Value> {
        match self.try_node(f)? {
            Node::Leaf(code) => Some(self.leaves.borrow().value_of(code).clone()),
            Node::Inner { .. } => None,
        }
    }

    /// Decision variable of an inner node, `None` for leaves.
    pub fn variable_of(&self, f: NodeId) -> Option<Var> {
        match self.try_node(f)? {
            Node::Leaf(_) => None,
            Node::Inner { var, .. } => Some(var),
        }
    }

    pub fn low(&self, f: NodeId) -> Option<NodeId> {
        self.try_node(f)?.children().map(|(low, _)| low)
    }

    pub fn high(&self, f: NodeId) -> Option<NodeId> {
        self.try_node(f)?.children().map(|(_, high)| high)
    }

    pub(crate) fn try_node(&self, f: NodeId) -> Option<Node> {
        self.table.borrow().get(f)
    }
}

// Building blocks of the recursive operations.
impl Context {
    pub(crate) fn node(&self, f: NodeId) -> Node {
        self.table.borrow().node(f)
    }

    /// Variable of `f`, or [`Var::LEAF`] (below every variable) for leaves.
    pub(crate) fn top_var(&self, f: NodeId) -> Var {
        self.node(f).var()
    }

    /// `(low, high)` cofactors of `f` with respect to `var`.
    ///
    /// `var` must not be below the top variable of `f`.
    pub(crate) fn cofactors(&self, f: NodeId, var: Var) -> (NodeId, NodeId) {
        match self.node(f) {
            Node::Inner { var: v, low, high } if v == var => (low, high),
            node => {
                debug_assert!(var < node.var(), "cofactor on {} below top {}", var, node.var());
                (f, f)
            }
        }
    }

    pub(crate) fn bool_value(&self, f: NodeId) -> Option<bool> {
        match self.node(f) {
            Node::Leaf(code) => self.leaves.borrow().value_of(code).as_bool(),
            Node::Inner { .. } => None,
        }
    }

    pub(crate) fn make_leaf(&self, value: &Value) -> Result<NodeId> {
        let code = self.leaves.borrow_mut().intern(value)?;
        let node = self.table.borrow_mut().put(Node::Leaf(code))?;
        trace!("leaf({}) -> {}", value, node);
        Ok(node)
    }

    pub(crate) fn bool_leaf(&self, b: bool) -> Result<NodeId> {
        self.make_leaf(&Value::Boolean(b))
    }

    pub(crate) fn make_node(&self, var: Var, low: NodeId, high: NodeId) -> Result<NodeId> {
        if low == high {
            return Ok(low);
        }
        debug_assert!(var < self.top_var(low) && var < self.top_var(high), "ordering violated at {}", var);
        let node = self.table.borrow_mut().put(Node::Inner { var, low, high })?;
        trace!("mk({}, {}, {}) -> {}", var, low, high, node);
        Ok(node)
    }

    pub(crate) fn cache_get(&self, key: &OpKey) -> Option<NodeId> {
        self.cache.borrow_mut().get(key)
    }

    pub(crate) fn cache_put(&self, key: OpKey, value: NodeId) {
        self.cache.borrow_mut().insert(key, value);
    }

    /// Hands one reference on a freshly computed result to the caller.
    pub(crate) fn handout(&self, f: NodeId) -> NodeId {
        self.table.borrow_mut().retain(f);
        f
    }
}
