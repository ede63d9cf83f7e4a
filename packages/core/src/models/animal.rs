//! Animal Data Model
//!
//! Two shapes of the same entity:
//!
//! - [`AnimalRecord`]: one flat row of the `animals` table, including the
//!   nullable parent reference.
//! - [`AnimalNode`]: a materialized tree node owning its children. It carries
//!   no back-reference to its parent, so rendering it can never loop.
//!
//! # Rendered form
//!
//! An `AnimalNode` renders as a single-entry map keyed by its identity:
//!
//! ```json
//! { "1": { "label": "root", "children": [ { "2": { "label": "dog", "children": [] } } ] } }
//! ```
//!
//! Rendering and dropping walk the tree with an explicit stack, so a chain of
//! any depth is handled in constant call-stack space.

use serde::{Deserialize, Serialize};
use std::io::Write;

/// Identity type for animals (SQLite `INTEGER PRIMARY KEY`)
pub type AnimalId = i64;

/// Flat storage row for a single animal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalRecord {
    /// Storage-assigned identity, immutable after creation
    pub id: AnimalId,

    /// Free-form label, passed through opaquely
    pub label: String,

    /// Parent identity; `None` only for the root
    pub parent_id: Option<AnimalId>,
}

impl AnimalRecord {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Materialized tree node
///
/// Children are ordered by ascending identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalNode {
    pub id: AnimalId,
    pub label: String,
    pub children: Vec<AnimalNode>,
}

impl AnimalNode {
    /// Create a childless node
    pub fn leaf(id: AnimalId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Find a node anywhere in this subtree by identity
    pub fn find(&self, id: AnimalId) -> Option<&AnimalNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }
}

impl Drop for AnimalNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

enum RenderStep<'a> {
    Node(&'a AnimalNode),
    Token(&'static [u8]),
}

/// Render a list of trees as a JSON array of identity-keyed nodes
///
/// Labels are escaped by `serde_json`; the structure is written token by token.
pub fn render_forest(nodes: &[AnimalNode]) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let mut stack = vec![RenderStep::Token(b"]")];
    push_siblings(&mut stack, nodes);
    out.push(b'[');

    while let Some(step) = stack.pop() {
        match step {
            RenderStep::Token(token) => out.extend_from_slice(token),
            RenderStep::Node(node) => {
                write!(out, "{{\"{}\":{{\"label\":", node.id).map_err(serde_json::Error::io)?;
                serde_json::to_writer(&mut out, &node.label)?;
                out.extend_from_slice(b",\"children\":[");
                stack.push(RenderStep::Token(b"]}}"));
                push_siblings(&mut stack, &node.children);
            }
        }
    }

    Ok(out)
}

/// Push siblings so they pop in order, separated by commas
fn push_siblings<'a>(stack: &mut Vec<RenderStep<'a>>, nodes: &'a [AnimalNode]) {
    for (index, node) in nodes.iter().enumerate().rev() {
        stack.push(RenderStep::Node(node));
        if index > 0 {
            stack.push(RenderStep::Token(b","));
        }
    }
}

/// Snapshot of the structural invariants as seen by storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Total number of rows
    pub total: u64,
    /// Rows with a null parent (must be exactly 1)
    pub roots: u64,
    /// Rows whose parent does not resolve to an existing row (must be 0)
    pub dangling: u64,
    /// Rows reachable from the root (must equal `total`)
    pub reachable: u64,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.roots == 1 && self.dangling == 0 && self.reachable == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_keyed_by_identity() {
        let mut root = AnimalNode::leaf(1, "root");
        let mut dog = AnimalNode::leaf(2, "dog");
        dog.children.push(AnimalNode::leaf(4, "puppy"));
        root.children.push(dog);
        root.children.push(AnimalNode::leaf(3, "cat"));

        let rendered: serde_json::Value =
            serde_json::from_slice(&render_forest(&[root]).unwrap()).unwrap();
        assert_eq!(
            rendered,
            json!([{
                "1": {
                    "label": "root",
                    "children": [
                        { "2": { "label": "dog", "children": [ { "4": { "label": "puppy", "children": [] } } ] } },
                        { "3": { "label": "cat", "children": [] } }
                    ]
                }
            }])
        );
    }

    #[test]
    fn test_render_is_stable() {
        let mut root = AnimalNode::leaf(1, "root");
        root.children.push(AnimalNode::leaf(2, "dog"));

        let first = render_forest(&[root.clone()]).unwrap();
        let second = render_forest(&[root]).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            r#"[{"1":{"label":"root","children":[{"2":{"label":"dog","children":[]}}]}}]"#
        );
    }

    #[test]
    fn test_render_escapes_labels() {
        let root = AnimalNode::leaf(1, "say \"hi\"\n\\ <b>");
        let rendered: serde_json::Value =
            serde_json::from_slice(&render_forest(&[root]).unwrap()).unwrap();
        assert_eq!(rendered[0]["1"]["label"], "say \"hi\"\n\\ <b>");
    }

    #[test]
    fn test_render_empty_forest() {
        assert_eq!(render_forest(&[]).unwrap(), b"[]");
    }

    #[test]
    fn test_render_and_drop_deep_chain() {
        let depth = 100_000;
        let mut node = AnimalNode::leaf(depth, "link");
        for id in (1..depth).rev() {
            let mut parent = AnimalNode::leaf(id, "link");
            parent.children.push(node);
            node = parent;
        }

        let rendered = String::from_utf8(render_forest(&[node]).unwrap()).unwrap();
        assert!(rendered.starts_with(r#"[{"1":{"label":"link","children":[{"2":"#));
        assert!(rendered.ends_with(&format!("{}]", "]}}".repeat(depth as usize))));
        assert_eq!(rendered.matches(r#""label":"link""#).count(), depth as usize);
    }

    #[test]
    fn test_size_and_find() {
        let mut root = AnimalNode::leaf(1, "root");
        let mut dog = AnimalNode::leaf(2, "dog");
        dog.children.push(AnimalNode::leaf(3, "puppy"));
        root.children.push(dog);

        assert_eq!(root.size(), 3);
        assert_eq!(root.find(3).map(|n| n.label.as_str()), Some("puppy"));
        assert!(root.find(42).is_none());
        assert!(!root.is_leaf());
    }

    #[test]
    fn test_integrity_report() {
        let ok = IntegrityReport {
            total: 3,
            roots: 1,
            dangling: 0,
            reachable: 3,
        };
        assert!(ok.is_consistent());

        let two_roots = IntegrityReport { roots: 2, ..ok };
        assert!(!two_roots.is_consistent());
    }
}
