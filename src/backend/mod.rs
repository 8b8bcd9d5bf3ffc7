// SPDX-License-Identifier: GPL-3.0-only

//! Boundary to the compositor and scene graph.
//!
//! The grab machinery never talks to a toolkit directly. Everything it needs from the
//! outside world goes through the traits in this module, which a shell implements on
//! top of its real stage and a test (or the replay tool) implements with
//! [`headless::HeadlessStage`].

use cosmic_grab_config::ActionMode;

use crate::{
    input::{EventVerdict, InputEvent},
    shell::ElementId,
};

pub mod headless;

/// Options forwarded to [`ModalSession::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModalOptions {
    pub action_mode: ActionMode,
}

/// The session-wide exclusive input primitive.
///
/// Callers guarantee `acquire` is never called for an owner that already holds the
/// modal, and `release` is called at most once per successful `acquire`.
pub trait ModalSession {
    /// Returns `false` if exclusive input could not be taken (e.g. another client holds
    /// a grab on the compositor).
    fn acquire(&self, owner: ElementId, options: &ModalOptions) -> bool;
    fn release(&self, owner: ElementId);
}

/// Token for an installed capture hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub u64);

pub type CaptureHook = Box<dyn Fn(&InputEvent) -> EventVerdict>;

/// Pre-dispatch interception point of the event pipeline.
pub trait EventPipeline {
    fn install_capture_hook(&self, hook: CaptureHook) -> HookId;
    fn remove_capture_hook(&self, id: HookId);
}

/// Token for a destroy subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestroySubscription(pub u64);

pub type DestroyObserver = Box<dyn Fn(ElementId)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    TabForward,
    TabBackward,
}

/// Queries and focus operations on the live element tree.
pub trait SceneGraph {
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn key_focus(&self) -> Option<ElementId>;
    fn grab_key_focus(&self, element: ElementId);
    /// Moves key focus to the next focusable element inside `root`'s subtree.
    /// Returns `false` if nothing could take focus.
    fn navigate_focus(&self, root: ElementId, direction: FocusDirection) -> bool;

    /// `observer` runs once when `element` gets destroyed, unless disconnected before.
    fn connect_destroy(&self, element: ElementId, observer: DestroyObserver)
        -> DestroySubscription;
    fn disconnect_destroy(&self, subscription: DestroySubscription);
}

/// On-screen keyboard hook: events it claims are never treated as outside clicks.
pub trait KeyboardClaim {
    fn should_claim(&self, event: &InputEvent) -> bool;
}
