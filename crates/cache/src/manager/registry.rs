//! Registry of managed objects keyed by id

use crate::traits::{accounted_size, ManagedObject};
use crate::GraphicId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registered objects in id (creation) order
#[derive(Default)]
pub(crate) struct Registry {
    entries: BTreeMap<GraphicId, Arc<dyn ManagedObject>>,
}

impl Registry {
    pub(crate) fn insert(&mut self, id: GraphicId, object: Arc<dyn ManagedObject>) -> bool {
        self.entries.insert(id, object).is_none()
    }

    pub(crate) fn remove(&mut self, id: GraphicId) -> Option<Arc<dyn ManagedObject>> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: GraphicId) -> Option<&Arc<dyn ManagedObject>> {
        self.entries.get(&id)
    }

    pub(crate) fn contains(&self, id: GraphicId) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy of the current membership, safe to walk while the registry changes
    pub(crate) fn snapshot(&self) -> Vec<(GraphicId, Arc<dyn ManagedObject>)> {
        self.entries
            .iter()
            .map(|(id, object)| (*id, Arc::clone(object)))
            .collect()
    }

    /// Literal sum of sizes over swapped-in members
    pub(crate) fn calculated_size(&self) -> i64 {
        self.entries
            .values()
            .map(|object| accounted_size(object.as_ref()))
            .sum()
    }

    pub(crate) fn swapped_out_count(&self) -> usize {
        self.entries
            .values()
            .filter(|object| object.is_swapped_out())
            .count()
    }
}
