// SPDX-License-Identifier: GPL-3.0-only

//! Containment queries over the element tree.
//!
//! These are pure functions over a `parent_of` lookup, so the grab logic can be
//! exercised without any live scene graph.

use std::iter;

use super::{grabs::PermittedSet, ElementId};

/// `element` followed by each of its ancestors, up to the root.
pub fn ancestors<F>(element: ElementId, parent_of: F) -> impl Iterator<Item = ElementId>
where
    F: Fn(ElementId) -> Option<ElementId>,
{
    iter::successors(Some(element), move |current| parent_of(*current))
}

/// Whether `element` is one of `roots`, a descendant of one of them, or sits at or below
/// a member of `permitted`.
pub fn is_descendant_or_member<F>(
    element: ElementId,
    roots: &[ElementId],
    permitted: &PermittedSet,
    parent_of: F,
) -> bool
where
    F: Fn(ElementId) -> Option<ElementId>,
{
    ancestors(element, parent_of).any(|node| roots.contains(&node) || permitted.contains(node))
}

pub fn is_descendant<F>(element: ElementId, root: ElementId, parent_of: F) -> bool
where
    F: Fn(ElementId) -> Option<ElementId>,
{
    ancestors(element, parent_of).any(|node| node == root)
}
