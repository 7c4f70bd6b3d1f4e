use std::collections::BTreeMap;

use stratus_core::types::LayerId;

use crate::fragment::{CloudFragment, FragmentId, FragmentState};

/// All fragments owned by the manager, keyed by id in creation order.
#[derive(Debug, Default)]
pub struct FragmentMap {
    fragments: BTreeMap<FragmentId, CloudFragment>,
    next_id: u64,
}

impl FragmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new fragment in Spawning state.
    pub fn insert_spawning(&mut self, layer: LayerId) -> FragmentId {
        let id = FragmentId(self.next_id);
        self.next_id += 1;
        self.fragments.insert(id, CloudFragment::new_spawning(id, layer));
        id
    }

    pub fn get(&self, id: FragmentId) -> Option<&CloudFragment> {
        self.fragments.get(&id)
    }

    pub fn get_mut(&mut self, id: FragmentId) -> Option<&mut CloudFragment> {
        self.fragments.get_mut(&id)
    }

    /// Destroy and drop a fragment.
    pub fn remove(&mut self, id: FragmentId) -> Option<CloudFragment> {
        let mut fragment = self.fragments.remove(&id)?;
        fragment.destroy();
        Some(fragment)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CloudFragment> {
        self.fragments.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CloudFragment> {
        self.fragments.values_mut()
    }

    pub fn ids(&self) -> Vec<FragmentId> {
        self.fragments.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Spawning or on-screen fragments in `layer`; these count toward the
    /// layer's target population.
    pub fn population(&self, layer: LayerId) -> usize {
        self.fragments
            .values()
            .filter(|f| {
                f.layer == layer
                    && matches!(f.state, FragmentState::Spawning | FragmentState::Active)
            })
            .count()
    }

    /// Counts: (spawning, active, drifting_off)
    pub fn state_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for f in self.fragments.values() {
            match f.state {
                FragmentState::Spawning => counts.0 += 1,
                FragmentState::Active => counts.1 += 1,
                FragmentState::DriftingOff => counts.2 += 1,
                FragmentState::Recycled => {}
            }
        }
        counts
    }

    /// Destroy every fragment.
    pub fn clear(&mut self) {
        for fragment in self.fragments.values_mut() {
            fragment.destroy();
        }
        self.fragments.clear();
    }
}
