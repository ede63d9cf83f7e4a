//! Tree Materializer
//!
//! Rebuilds the nested [`AnimalNode`] tree from the flat closure returned by
//! [`AnimalStore::fetch_closure`](crate::db::AnimalStore::fetch_closure).
//!
//! Identity order is not relied on for parent-before-child: after a
//! reparent, a child can carry a lower identity than its new parent. The
//! assembly therefore indexes children per parent, walks breadth-first from
//! the root and builds nodes bottom-up. No step recurses over tree depth.

use crate::models::{AnimalId, AnimalNode, AnimalRecord};
use crate::services::TreeServiceError;
use std::collections::{HashMap, VecDeque};

/// Assemble the tree rooted at the unique parentless record
///
/// Children keep ascending identity order. Records not reachable from the
/// root are ignored.
///
/// # Errors
///
/// [`TreeServiceError::RootMissing`] when no record is parentless.
pub fn assemble(mut records: Vec<AnimalRecord>) -> Result<AnimalNode, TreeServiceError> {
    records.sort_by_key(|record| record.id);

    let mut roots = records.iter().filter(|record| record.is_root());
    let root_id = roots.next().map(|record| record.id).ok_or(TreeServiceError::RootMissing)?;
    let extra_roots = roots.count();
    if extra_roots > 0 {
        tracing::warn!(
            root_id,
            extra_roots,
            "Multiple parentless animals found; materializing lowest identity only"
        );
    }

    let mut children_of: HashMap<AnimalId, Vec<AnimalId>> = HashMap::new();
    let mut labels: HashMap<AnimalId, String> = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(parent_id) = record.parent_id {
            children_of.entry(parent_id).or_default().push(record.id);
        }
        labels.insert(record.id, record.label);
    }

    // Breadth-first order from the root; every parent precedes its children
    let mut order = Vec::with_capacity(labels.len());
    let mut queue = VecDeque::from([root_id]);
    while let Some(id) = queue.pop_front() {
        order.push(id);
        if let Some(children) = children_of.get(&id) {
            queue.extend(children.iter().copied());
        }
    }

    let mut built: HashMap<AnimalId, AnimalNode> = HashMap::with_capacity(order.len());
    for id in order.into_iter().rev() {
        let children = children_of
            .remove(&id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|child| built.remove(&child))
            .collect();
        let label = labels.remove(&id).unwrap_or_default();
        built.insert(
            id,
            AnimalNode {
                id,
                label,
                children,
            },
        );
    }

    built.remove(&root_id).ok_or(TreeServiceError::RootMissing)
}
