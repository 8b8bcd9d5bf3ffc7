// SPDX-License-Identifier: GPL-3.0-only

//! In-memory stage implementing every collaborator of the grab machinery.
//!
//! Used by the replay tool and the tests. All state lives behind `RefCell`s and no
//! borrow is held while user callbacks (capture hooks, destroy observers) run.

use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    rc::Rc,
};

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::{
    CaptureHook, DestroyObserver, DestroySubscription, EventPipeline, FocusDirection, HookId,
    KeyboardClaim, ModalOptions, ModalSession, SceneGraph,
};
use crate::{
    input::{EventVerdict, InputEvent},
    shell::ElementId,
};

#[derive(Debug, Default)]
struct Node {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    focusable: bool,
}

#[derive(Debug, Default)]
struct ModalStats {
    holders: Vec<ElementId>,
    acquired: usize,
    released: usize,
    deny: bool,
    last_options: Option<ModalOptions>,
}

#[derive(Default)]
pub struct HeadlessStage {
    nodes: RefCell<IndexMap<ElementId, Node>>,
    key_focus: Cell<Option<ElementId>>,
    observers: RefCell<IndexMap<u64, (ElementId, Rc<dyn Fn(ElementId)>)>>,
    hooks: RefCell<IndexMap<u64, Rc<dyn Fn(&InputEvent) -> EventVerdict>>>,
    next_token: Cell<u64>,
    modal: RefCell<ModalStats>,
    claimed: RefCell<HashSet<ElementId>>,
}

impl HeadlessStage {
    pub fn new() -> Rc<HeadlessStage> {
        Rc::new(HeadlessStage::default())
    }

    fn next_token(&self) -> u64 {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        token
    }

    /// Adds `element` below `parent` (or as a root). Re-adding an existing element is
    /// ignored.
    pub fn add_element(&self, element: ElementId, parent: Option<ElementId>) {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.contains_key(&element) {
            warn!(?element, "Element added twice");
            return;
        }
        if let Some(parent) = parent {
            match nodes.get_mut(&parent) {
                Some(node) => node.children.push(element),
                None => warn!(?element, ?parent, "Parent does not exist, adding as root"),
            }
        }
        let parent = parent.filter(|parent| nodes.contains_key(parent));
        nodes.insert(
            element,
            Node {
                parent,
                ..Node::default()
            },
        );
    }

    pub fn add_focusable(&self, element: ElementId, parent: Option<ElementId>) {
        self.add_element(element, parent);
        self.set_focusable(element, true);
    }

    pub fn set_focusable(&self, element: ElementId, focusable: bool) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(&element) {
            node.focusable = focusable;
        }
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.nodes.borrow().contains_key(&element)
    }

    /// `root` and its descendants, depth first, children in insertion order.
    fn subtree(&self, root: ElementId) -> Vec<ElementId> {
        let nodes = self.nodes.borrow();
        let mut result = Vec::new();
        let mut pending = vec![root];
        while let Some(element) = pending.pop() {
            let Some(node) = nodes.get(&element) else {
                continue;
            };
            result.push(element);
            pending.extend(node.children.iter().rev().copied());
        }
        result
    }

    /// Destroys `element` and its subtree, then notifies destroy observers.
    pub fn destroy(&self, element: ElementId) {
        let destroyed = self.subtree(element);
        if destroyed.is_empty() {
            return;
        }

        {
            let mut nodes = self.nodes.borrow_mut();
            let parent = nodes.get(&element).and_then(|node| node.parent);
            if let Some(parent) = parent.and_then(|parent| nodes.get_mut(&parent)) {
                parent.children.retain(|child| *child != element);
            }
            for element in &destroyed {
                nodes.shift_remove(element);
            }
        }
        if self
            .key_focus
            .get()
            .is_some_and(|focus| destroyed.contains(&focus))
        {
            self.key_focus.set(None);
        }
        debug!(?element, count = destroyed.len(), "Elements destroyed");

        let notify = {
            let mut observers = self.observers.borrow_mut();
            let fired = observers
                .iter()
                .filter(|(_, (watched, _))| destroyed.contains(watched))
                .map(|(token, _)| *token)
                .collect::<Vec<_>>();
            fired
                .into_iter()
                .filter_map(|token| observers.shift_remove(&token))
                .collect::<Vec<_>>()
        };
        for (element, observer) in notify {
            observer(element);
        }
    }

    /// Sets key focus without any navigation, as the user clicking an entry would.
    pub fn set_key_focus(&self, element: Option<ElementId>) {
        self.key_focus.set(element.filter(|element| self.contains(*element)));
    }

    /// Runs `event` through the installed capture hook, if any.
    pub fn deliver(&self, event: &InputEvent) -> EventVerdict {
        let hook = self.hooks.borrow().values().last().cloned();
        match hook {
            Some(hook) => hook(event),
            None => EventVerdict::Propagate,
        }
    }

    pub fn capture_hook_count(&self) -> usize {
        self.hooks.borrow().len()
    }

    pub fn destroy_observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Makes the next `acquire` calls fail (or succeed again).
    pub fn set_deny_modal(&self, deny: bool) {
        self.modal.borrow_mut().deny = deny;
    }

    pub fn modal_holders(&self) -> Vec<ElementId> {
        self.modal.borrow().holders.clone()
    }

    pub fn acquire_count(&self) -> usize {
        self.modal.borrow().acquired
    }

    pub fn release_count(&self) -> usize {
        self.modal.borrow().released
    }

    pub fn last_modal_options(&self) -> Option<ModalOptions> {
        self.modal.borrow().last_options
    }

    /// Lets the on-screen keyboard claim events picked on `element`.
    pub fn claim_for_keyboard(&self, element: ElementId) {
        self.claimed.borrow_mut().insert(element);
    }
}

impl ModalSession for HeadlessStage {
    fn acquire(&self, owner: ElementId, options: &ModalOptions) -> bool {
        let mut modal = self.modal.borrow_mut();
        modal.last_options = Some(*options);
        if modal.deny {
            return false;
        }
        modal.acquired += 1;
        modal.holders.push(owner);
        true
    }

    fn release(&self, owner: ElementId) {
        let mut modal = self.modal.borrow_mut();
        match modal.holders.iter().rposition(|holder| *holder == owner) {
            Some(index) => {
                modal.holders.remove(index);
                modal.released += 1;
            }
            None => warn!(?owner, "Released a modal that was never acquired"),
        }
    }
}

impl EventPipeline for HeadlessStage {
    fn install_capture_hook(&self, hook: CaptureHook) -> HookId {
        let token = self.next_token();
        self.hooks.borrow_mut().insert(token, Rc::from(hook));
        HookId(token)
    }

    fn remove_capture_hook(&self, id: HookId) {
        self.hooks.borrow_mut().shift_remove(&id.0);
    }
}

impl SceneGraph for HeadlessStage {
    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.borrow().get(&element).and_then(|node| node.parent)
    }

    fn key_focus(&self) -> Option<ElementId> {
        self.key_focus.get()
    }

    fn grab_key_focus(&self, element: ElementId) {
        if self.contains(element) {
            self.key_focus.set(Some(element));
        }
    }

    fn navigate_focus(&self, root: ElementId, direction: FocusDirection) -> bool {
        let candidates = self.subtree(root);
        let next = {
            let nodes = self.nodes.borrow();
            let mut focusable = candidates
                .into_iter()
                .filter(|element| nodes.get(element).is_some_and(|node| node.focusable));
            match direction {
                FocusDirection::TabForward => focusable.next(),
                FocusDirection::TabBackward => focusable.last(),
            }
        };
        match next {
            Some(element) => {
                self.key_focus.set(Some(element));
                true
            }
            None => false,
        }
    }

    fn connect_destroy(
        &self,
        element: ElementId,
        observer: DestroyObserver,
    ) -> DestroySubscription {
        let token = self.next_token();
        self.observers
            .borrow_mut()
            .insert(token, (element, Rc::from(observer)));
        DestroySubscription(token)
    }

    fn disconnect_destroy(&self, subscription: DestroySubscription) {
        self.observers.borrow_mut().shift_remove(&subscription.0);
    }
}

impl KeyboardClaim for HeadlessStage {
    fn should_claim(&self, event: &InputEvent) -> bool {
        event
            .source
            .is_some_and(|source| self.claimed.borrow().contains(&source))
    }
}
