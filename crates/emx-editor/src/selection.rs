//! The selection set.
//!
//! Holds point ids only; clusters are expanded before anything reaches
//! here. A revision counter bumps on every actual change so listeners and
//! the render loop can skip no-op mutations.

use emx_core::PointId;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    ids: HashSet<PointId>,
    revision: u64,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.ids.contains(&id)
    }

    pub fn as_set(&self) -> &HashSet<PointId> {
        &self.ids
    }

    /// Monotonic change counter. Unchanged by no-op mutations.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ids in lexical order, for notifications and host output.
    pub fn sorted_ids(&self) -> Vec<PointId> {
        let mut ids: Vec<PointId> = self.ids.iter().copied().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Flip membership of each id. Applying the same ids twice restores the
    /// previous set.
    pub fn toggle_all(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let mut changed = false;
        for id in ids {
            if !self.ids.remove(&id) {
                self.ids.insert(id);
            }
            changed = true;
        }
        self.bump_if(changed)
    }

    /// Make the set exactly `ids`.
    pub fn replace_with(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let next: HashSet<PointId> = ids.into_iter().collect();
        let changed = next != self.ids;
        self.ids = next;
        self.bump_if(changed)
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let before = self.ids.len();
        self.ids.extend(ids);
        let changed = self.ids.len() != before;
        self.bump_if(changed)
    }

    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let mut changed = false;
        for id in ids {
            changed |= self.ids.remove(&id);
        }
        self.bump_if(changed)
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        self.bump_if(changed)
    }

    /// Keep only ids for which `keep` is true. Returns the dropped ids.
    pub fn retain(&mut self, mut keep: impl FnMut(PointId) -> bool) -> Vec<PointId> {
        let mut dropped = Vec::new();
        self.ids.retain(|&id| {
            let k = keep(id);
            if !k {
                dropped.push(id);
            }
            k
        });
        self.bump_if(!dropped.is_empty());
        dropped
    }

    fn bump_if(&mut self, changed: bool) -> bool {
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }
        changed
    }
}
