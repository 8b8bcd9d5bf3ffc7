// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use crate::shell::ElementId;

/// Runs once when its grab is popped, with whether the user dismissed it.
pub type ReleaseCallback = Box<dyn FnOnce(bool)>;

pub struct GrabRecord {
    /// Root of the region that counts as inside for this grab.
    pub target: ElementId,
    /// Element that receives key focus directly, instead of navigating into `target`.
    pub focus_target: Option<ElementId>,
    pub on_release: Option<ReleaseCallback>,
    /// Key focus at the time of the grab, if it was inside the grabbed region.
    pub saved_focus: Option<ElementId>,
}

impl fmt::Debug for GrabRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrabRecord")
            .field("target", &self.target)
            .field("focus_target", &self.focus_target)
            .field("on_release", &self.on_release.as_ref().map(|_| "..."))
            .field("saved_focus", &self.saved_focus)
            .finish()
    }
}

/// LIFO stack of grabs, the last record is the current grab.
///
/// Targets are unique within a stack and records only ever leave as a contiguous
/// suffix.
#[derive(Debug, Default)]
pub struct GrabStack {
    records: Vec<GrabRecord>,
}

impl GrabStack {
    /// Returns the record back if its target is already on the stack.
    pub fn push(&mut self, record: GrabRecord) -> Result<(), GrabRecord> {
        if self.contains(record.target) {
            return Err(record);
        }
        self.records.push(record);
        Ok(())
    }

    pub fn current(&self) -> Option<&GrabRecord> {
        self.records.last()
    }

    pub fn get(&self, index: usize) -> Option<&GrabRecord> {
        self.records.get(index)
    }

    pub fn depth(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, target: ElementId) -> Option<usize> {
        self.records.iter().position(|record| record.target == target)
    }

    pub fn contains(&self, target: ElementId) -> bool {
        self.position(target).is_some()
    }

    pub fn targets(&self) -> impl DoubleEndedIterator<Item = ElementId> + '_ {
        self.records.iter().map(|record| record.target)
    }

    /// Removes the record at `index` and everything above it, bottom first.
    pub fn split_off(&mut self, index: usize) -> Vec<GrabRecord> {
        if index >= self.records.len() {
            return Vec::new();
        }
        self.records.split_off(index)
    }

    /// Index of the first record targeting one of `ancestors`.
    ///
    /// Given an element followed by its ancestry, this is the innermost grab whose
    /// region contains the element.
    pub fn nearest_frame(&self, ancestors: impl IntoIterator<Item = ElementId>) -> Option<usize> {
        ancestors
            .into_iter()
            .find_map(|element| self.position(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(target: u64) -> GrabRecord {
        GrabRecord {
            target: ElementId(target),
            focus_target: None,
            on_release: None,
            saved_focus: None,
        }
    }

    #[test]
    fn duplicate_target_is_rejected() {
        let mut stack = GrabStack::default();
        assert!(stack.push(record(1)).is_ok());
        let rejected = stack.push(record(1)).unwrap_err();
        assert_eq!(rejected.target, ElementId(1));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn split_off_takes_suffix_in_push_order() {
        let mut stack = GrabStack::default();
        for target in 1..=4 {
            stack.push(record(target)).unwrap();
        }
        let popped = stack.split_off(1);
        assert_eq!(
            popped.iter().map(|r| r.target).collect::<Vec<_>>(),
            vec![ElementId(2), ElementId(3), ElementId(4)]
        );
        assert_eq!(stack.current().map(|r| r.target), Some(ElementId(1)));
        assert!(stack.split_off(5).is_empty());
    }

    #[test]
    fn nearest_frame_prefers_innermost_ancestor() {
        let mut stack = GrabStack::default();
        stack.push(record(10)).unwrap();
        stack.push(record(20)).unwrap();
        // element 21 sits inside 20, which sits inside 10
        let chain = [ElementId(21), ElementId(20), ElementId(10)];
        assert_eq!(stack.nearest_frame(chain), Some(1));
        assert_eq!(stack.nearest_frame([ElementId(11), ElementId(10)]), Some(0));
        assert_eq!(stack.nearest_frame([ElementId(99)]), None);
    }
}
