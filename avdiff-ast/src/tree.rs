#![forbid(unsafe_code)]

use std::fmt;

use crate::vocab::{Literal, Macro, Operator};
use crate::Span;

/// Index of a node inside its [`ExprTree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeValue {
    Operator(Operator),
    Literal(Literal),
    Macro(Macro),
    /// A name that resolved in some space when it was parsed.
    Symbol(String),
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Operator(op) => write!(f, "{op}"),
            NodeValue::Literal(lit) => write!(f, "{lit}"),
            NodeValue::Macro(m) => write!(f, "{m}"),
            NodeValue::Symbol(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub value: NodeValue,
    pub span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_operator(&self) -> bool {
        !self.is_leaf()
    }
}

/// Arena-backed n-ary expression tree.
///
/// Nodes own their children by index; the parent index is a plain
/// back-reference used for detaching. The arena never shrinks, so a
/// `NodeId` stays valid for the life of the tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExprTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl ExprTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached node.
    pub fn push(&mut self, value: NodeValue, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            value,
            span,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn set_root(&mut self, id: NodeId) {
        assert!(self.node(id).parent.is_none(), "root must not have a parent");
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends `child` to `parent`'s argument list.
    ///
    /// Panics if `child` is already attached, is the root, or is an ancestor
    /// of `parent`; any of those would break the single-owner acyclic shape.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.node(child).parent.is_none(),
            "node {child:?} already has a parent"
        );
        assert!(self.root != Some(child), "the root cannot become a child");
        assert!(
            !self.ancestors(parent).any(|a| a == child) && parent != child,
            "attaching {child:?} under {parent:?} would create a cycle"
        );
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Removes `id` from its parent's children. The subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
    }

    /// Visits every node under `root` after all of its children.
    pub fn walk_post_order<E>(
        &self,
        root: NodeId,
        mut visit: impl FnMut(NodeId, &Node) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        while let Some((id, next)) = stack.pop() {
            let node = self.node(id);
            if let Some(&child) = node.children.get(next) {
                stack.push((id, next + 1));
                stack.push((child, 0));
            } else {
                visit(id, node)?;
            }
        }
        Ok(())
    }

    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let _ = self.walk_post_order::<()>(root, |id, _| {
            out.push(id);
            Ok(())
        });
        out
    }

    /// Same shape and values, ignoring spans and arena layout.
    pub fn equivalent(&self, other: &ExprTree) -> bool {
        match (self.root, other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => self.subtree_eq(a, other, b),
            _ => false,
        }
    }

    fn subtree_eq(&self, a: NodeId, other: &ExprTree, b: NodeId) -> bool {
        let (na, nb) = (self.node(a), other.node(b));
        na.value == nb.value
            && na.children.len() == nb.children.len()
            && na
                .children
                .iter()
                .zip(&nb.children)
                .all(|(ca, cb)| self.subtree_eq(*ca, other, *cb))
    }

    fn write_subtree(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        let node = self.node(id);
        write!(f, "{}", node.value)?;
        if node.is_operator() {
            f.write_str("(")?;
            for (i, child) in node.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                self.write_subtree(f, *child)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Re-serializes the tree in DSL syntax: `op(child,child,...)`.
impl fmt::Display for ExprTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.write_subtree(f, root),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span;

    fn sym(tree: &mut ExprTree, name: &str) -> NodeId {
        tree.push(NodeValue::Symbol(name.into()), span(0, 0))
    }

    fn sample() -> (ExprTree, NodeId) {
        // and(>=(x,10),y)
        let mut t = ExprTree::new();
        let and = t.push(NodeValue::Operator(Operator::And), span(0, 3));
        t.set_root(and);
        let ge = t.push(NodeValue::Operator(Operator::Ge), span(4, 2));
        t.add_child(and, ge);
        let x = sym(&mut t, "x");
        t.add_child(ge, x);
        let ten = t.push(NodeValue::Literal(Literal::Int("10".to_string())), span(0, 0));
        t.add_child(ge, ten);
        let y = sym(&mut t, "y");
        t.add_child(and, y);
        (t, and)
    }

    #[test]
    fn post_order_visits_children_first() {
        let (t, root) = sample();
        let order: Vec<String> = t
            .post_order(root)
            .into_iter()
            .map(|id| t.node(id).value.to_string())
            .collect();
        assert_eq!(order, vec!["x", "10", ">=", "y", "and"]);
    }

    #[test]
    fn leaf_and_operator_follow_child_count() {
        let (t, root) = sample();
        assert!(t.node(root).is_operator());
        assert!(t.node(root).is_root());
        let y = t.node(root).children()[1];
        assert!(t.node(y).is_leaf());
        assert_eq!(t.node(y).parent(), Some(root));
    }

    #[test]
    fn display_prints_dsl_form() {
        let (t, _) = sample();
        assert_eq!(t.to_string(), "and(>=(x,10),y)");
    }

    #[test]
    fn detach_removes_subtree_from_parent() {
        let (mut t, root) = sample();
        let ge = t.node(root).children()[0];
        t.detach(ge);
        assert_eq!(t.to_string(), "and(y)");
        assert!(t.node(ge).parent().is_none());
    }

    #[test]
    fn walk_stops_on_first_error() {
        let (t, root) = sample();
        let mut seen = 0;
        let res = t.walk_post_order(root, |_, node| {
            seen += 1;
            if matches!(node.value, NodeValue::Literal(_)) {
                Err("literal")
            } else {
                Ok(())
            }
        });
        assert_eq!(res, Err("literal"));
        assert_eq!(seen, 2);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn cycles_are_rejected() {
        let mut t = ExprTree::new();
        let a = t.push(NodeValue::Operator(Operator::Not), span(0, 0));
        let b = t.push(NodeValue::Operator(Operator::Not), span(0, 0));
        t.add_child(a, b);
        t.detach(a);
        t.add_child(b, a);
    }
}
