// SPDX-License-Identifier: GPL-3.0-only

use indexmap::IndexMap;

use crate::{backend::DestroySubscription, shell::ElementId};

/// Elements that count as "inside" for every grab of one coordinator.
///
/// Each member carries the destroy subscription that evicts it again.
#[derive(Debug, Default)]
pub struct PermittedSet {
    members: IndexMap<ElementId, DestroySubscription>,
}

impl PermittedSet {
    /// Returns `false` if `element` already was a member, the existing subscription is kept.
    pub fn insert(&mut self, element: ElementId, subscription: DestroySubscription) -> bool {
        if self.members.contains_key(&element) {
            return false;
        }
        self.members.insert(element, subscription);
        true
    }

    pub fn remove(&mut self, element: ElementId) -> Option<DestroySubscription> {
        self.members.shift_remove(&element)
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.members.contains_key(&element)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.members.keys().copied()
    }
}
