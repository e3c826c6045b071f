//! Diagram to DOT (Graphviz) conversion.
//!
//! Conventions of the generated graph:
//! - **Leaves** are boxes at the bottom (sink rank), labelled with their value
//! - **Inner nodes** are circles, one rank per variable
//! - **Edges**: solid for high (then), dashed for low (else)
//! - **Roots** are rectangles at the top (source rank)
//!
//! # Examples
//!
//! ```
//! use mtdd::context::Context;
//!
//! let ctx = Context::default();
//! let x = ctx.new_variable().unwrap();
//! let f = ctx.var_node(x).unwrap();
//!
//! let dot = ctx.to_dot(&[f]).unwrap();
//! // Render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("graph {"));
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use crate::context::Context;
use crate::reference::NodeId;
use crate::types::Var;

/// Visual options for DOT output.
///
/// ```
/// use mtdd::dot::DotConfig;
///
/// let config = DotConfig {
///     node_shape: "ellipse",
///     ..DotConfig::default()
/// };
/// assert_eq!(config.leaf_shape, "box");
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for inner nodes (default: "circle")
    pub node_shape: &'static str,
    /// Shape for leaves (default: "box")
    pub leaf_shape: &'static str,
    /// Shape for root nodes (default: "rect")
    pub root_shape: &'static str,
    /// Style for high (then) edges (default: "solid")
    pub high_edge_style: &'static str,
    /// Style for low (else) edges (default: "dashed")
    pub low_edge_style: &'static str,
    /// Whether to use HTML labels for subscripts (default: true)
    pub use_html_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            leaf_shape: "box",
            root_shape: "rect",
            high_edge_style: "solid",
            low_edge_style: "dashed",
            use_html_labels: true,
        }
    }
}

impl Context {
    /// Converts the diagrams rooted at `roots` to DOT format.
    ///
    /// Shared nodes are displayed once.
    pub fn to_dot(&self, roots: &[NodeId]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(roots, &DotConfig::default())
    }

    pub fn to_dot_with_config(&self, roots: &[NodeId], config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        // Collect reachable nodes, grouped by variable; leaves sort last.
        let mut ranks = BTreeMap::<Var, Vec<NodeId>>::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<NodeId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.try_node(id) else {
                continue;
            };
            ranks.entry(node.var()).or_default().push(id);
            if let Some((low, high)) = node.children() {
                stack.push(low);
                stack.push(high);
            }
        }

        for (var, ids) in ranks.iter_mut() {
            ids.sort();
            if var.is_leaf() {
                writeln!(dot, "{{ rank=sink")?;
                for &id in ids.iter() {
                    let label = self.leaf_value(id).map(|v| v.to_string()).unwrap_or_default();
                    writeln!(dot, "{} [shape={}, label=\"{}\"];", id.raw(), config.leaf_shape, label)?;
                }
            } else {
                writeln!(dot, "{{ rank=same")?;
                for &id in ids.iter() {
                    let label = if config.use_html_labels {
                        format!("<x<SUB>{}</SUB>>", var.id())
                    } else {
                        format!("\"{}\"", var)
                    };
                    writeln!(dot, "{} [label={}];", id.raw(), label)?;
                }
            }
            writeln!(dot, "}}")?;
        }

        for ids in ranks.values() {
            for &id in ids {
                if let Some((low, high)) = self.try_node(id).and_then(|node| node.children()) {
                    writeln!(dot, "{} -- {} [style={}];", id.raw(), high.raw(), config.high_edge_style)?;
                    writeln!(dot, "{} -- {} [style={}];", id.raw(), low.raw(), config.low_edge_style)?;
                }
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape={}, label=\"{}\"];", i, config.root_shape, root)?;
        }
        writeln!(dot, "}}")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} -- {};", i, root.raw())?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
