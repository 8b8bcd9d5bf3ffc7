// SPDX-License-Identifier: GPL-3.0-only

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use tracing::{debug, trace, warn};

use super::{
    registry::CaptureClient, CoordinatorOptions, GrabContext, GrabError, GrabParams, GrabRecord,
    GrabStack, PermittedSet, UngrabParams,
};
use crate::{
    backend::FocusDirection,
    input::{EventKind, EventVerdict, InputEvent},
    shell::{focus, ElementId},
};

crate::utils::id_gen!(next_coordinator_id, COORDINATOR_ID, COORDINATOR_IDS);

#[repr(transparent)]
struct CoordinatorId(usize);

impl Default for CoordinatorId {
    fn default() -> CoordinatorId {
        CoordinatorId(next_coordinator_id())
    }
}

impl Drop for CoordinatorId {
    fn drop(&mut self) {
        COORDINATOR_IDS
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&self.0);
    }
}

#[derive(Debug, Default)]
struct GrabState {
    stack: GrabStack,
    permitted: PermittedSet,
    /// Records holding a share of the session modal, acquired on 0 -> 1.
    modal_count: usize,
    /// Swallow motion until the next release.
    ignore_until_release: bool,
}

/// Nested input grabs of one modal-capable part of the shell (a menu, a dialog, the
/// overview, ...).
///
/// Grabs form a stack. The innermost grab decides what counts as "inside"; pressing a
/// cancel key releases it, clicking outside releases every grab that doesn't contain
/// the click. While at least one grab is held the coordinator owns the session modal
/// and sits in the [`CaptureRegistry`](super::CaptureRegistry), which keeps it (and
/// its collaborators) alive until the last grab is released.
///
/// All methods take `&self` and never keep internal state borrowed while calling out,
/// so release callbacks and collaborators may call back into the coordinator.
pub struct GrabCoordinator {
    id: CoordinatorId,
    owner: ElementId,
    options: CoordinatorOptions,
    ctx: GrabContext,
    this: Weak<GrabCoordinator>,
    state: RefCell<GrabState>,
}

impl fmt::Debug for GrabCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("GrabCoordinator");
        debug.field("id", &self.id.0).field("owner", &self.owner);
        match self.state.try_borrow() {
            Ok(state) => debug
                .field("stack", &state.stack.targets().collect::<Vec<_>>())
                .field("modal_count", &state.modal_count)
                .finish(),
            Err(_) => debug.finish_non_exhaustive(),
        }
    }
}

impl GrabCoordinator {
    pub fn new(owner: ElementId, ctx: GrabContext) -> Rc<GrabCoordinator> {
        GrabCoordinator::with_options(owner, ctx, CoordinatorOptions::default())
    }

    pub fn with_options(
        owner: ElementId,
        ctx: GrabContext,
        options: CoordinatorOptions,
    ) -> Rc<GrabCoordinator> {
        Rc::new_cyclic(|this| GrabCoordinator {
            id: CoordinatorId::default(),
            owner,
            options,
            ctx,
            this: this.clone(),
            state: RefCell::new(GrabState::default()),
        })
    }

    pub fn owner(&self) -> ElementId {
        self.owner
    }

    /// Lets `element` and its subtree receive events while any grab is held, regardless
    /// of which grab is current. The element is dropped again when it gets destroyed.
    pub fn add_actor(&self, element: ElementId) {
        if self.state.borrow().permitted.contains(element) {
            return;
        }

        let this = self.this.clone();
        let subscription = self.ctx.scene.connect_destroy(
            element,
            Box::new(move |element| {
                if let Some(coordinator) = this.upgrade() {
                    coordinator.actor_destroyed(element);
                }
            }),
        );
        self.state
            .borrow_mut()
            .permitted
            .insert(element, subscription);
    }

    pub fn remove_actor(&self, element: ElementId) {
        let subscription = self.state.borrow_mut().permitted.remove(element);
        if let Some(subscription) = subscription {
            self.ctx.scene.disconnect_destroy(subscription);
        }
    }

    fn actor_destroyed(&self, element: ElementId) {
        // the subscription is spent once it fired
        if self.state.borrow_mut().permitted.remove(element).is_some() {
            debug!(coordinator = self.id.0, ?element, "Permitted element destroyed");
        }
    }

    pub fn is_actor_permitted(&self, element: ElementId) -> bool {
        self.state.borrow().permitted.contains(element)
    }

    pub fn is_grabbed(&self) -> bool {
        !self.state.borrow().stack.is_empty()
    }

    pub fn current_grab_target(&self) -> Option<ElementId> {
        self.state.borrow().stack.current().map(|record| record.target)
    }

    pub fn grab_stack_depth(&self) -> usize {
        self.state.borrow().stack.depth()
    }

    /// Whether `element` is the target of a grab on this coordinator's stack.
    pub fn is_element_grabbed(&self, element: ElementId) -> bool {
        self.state.borrow().stack.contains(element)
    }

    /// Whether `element` is inside the current grab or the permitted set.
    fn is_within_grab(&self, element: ElementId) -> bool {
        let state = self.state.borrow();
        let current = state.stack.current().map(|record| record.target);
        focus::is_descendant_or_member(
            element,
            current.as_slice(),
            &state.permitted,
            |node| self.ctx.scene.parent(node),
        )
    }

    /// Pushes a grab rooted at `params.target`.
    ///
    /// Grabbing an already grabbed target succeeds without changing anything. The first
    /// grab acquires the session modal; if that is denied nothing is pushed.
    pub fn grab(&self, params: GrabParams) -> Result<(), GrabError> {
        let GrabParams {
            target,
            focus: focus_target,
            on_release,
        } = params;

        if self.is_element_grabbed(target) {
            trace!(coordinator = self.id.0, ?target, "Already grabbed");
            return Ok(());
        }

        let scene = &self.ctx.scene;
        let old_focus = scene.key_focus();
        let had_focus = old_focus.is_some_and(|old_focus| {
            self.is_within_grab(old_focus)
                || focus::is_descendant(old_focus, target, |node| scene.parent(node))
        });

        self.take_modal()?;

        let record = GrabRecord {
            target,
            focus_target,
            on_release,
            saved_focus: old_focus.filter(|_| had_focus),
        };
        let pushed = self.state.borrow_mut().stack.push(record);
        if pushed.is_err() {
            // a collaborator grabbed the same target while we were acquiring
            self.release_modal();
            return Ok(());
        }
        debug!(
            coordinator = self.id.0,
            ?target,
            depth = self.grab_stack_depth(),
            "Grab pushed"
        );

        if let Some(focus_target) = focus_target {
            scene.grab_key_focus(focus_target);
        } else if had_focus && !scene.navigate_focus(target, FocusDirection::TabForward) {
            scene.grab_key_focus(target);
        }

        Ok(())
    }

    /// Pops the grab on `params.target` (default: the current grab) and everything above
    /// it. Ungrabbing something that isn't grabbed does nothing.
    pub fn ungrab(&self, params: UngrabParams) {
        let Some(target) = params.target.or_else(|| self.current_grab_target()) else {
            return;
        };

        let scene = &self.ctx.scene;
        let old_focus = scene.key_focus();
        let (popped, had_focus) = {
            let mut state = self.state.borrow_mut();
            let Some(index) = state.stack.position(target) else {
                return;
            };
            let popped = state.stack.split_off(index);
            let roots = popped.iter().map(|record| record.target).collect::<Vec<_>>();
            let had_focus = old_focus.is_some_and(|old_focus| {
                focus::is_descendant_or_member(old_focus, &roots, &state.permitted, |node| {
                    scene.parent(node)
                })
            });
            (popped, had_focus)
        };

        // the oldest focus we saved is the one from before the whole popped region
        let restore_focus = popped.first().and_then(|record| record.saved_focus);

        for record in popped.into_iter().rev() {
            debug!(
                coordinator = self.id.0,
                target = ?record.target,
                user_initiated = params.user_initiated,
                "Grab released"
            );
            if let Some(on_release) = record.on_release {
                on_release(params.user_initiated);
            }
            self.release_modal();
        }

        if had_focus {
            if let Some(restore_focus) = restore_focus {
                scene.grab_key_focus(restore_focus);
            }
        }
    }

    /// Swallows the next pointer or touch release (and any motion before it).
    pub fn ignore_next_release(&self) {
        self.state.borrow_mut().ignore_until_release = true;
    }

    fn take_modal(&self) -> Result<(), GrabError> {
        if self.state.borrow().modal_count == 0 {
            let Some(this) = self.this.upgrade() else {
                return Err(GrabError::ModalDenied { owner: self.owner });
            };
            if !self.ctx.modal.acquire(self.owner, &self.options.modal) {
                warn!(
                    coordinator = self.id.0,
                    owner = ?self.owner,
                    "Session modal denied, not grabbing"
                );
                return Err(GrabError::ModalDenied { owner: self.owner });
            }
            self.ctx.registry.push(this);
        }

        self.state.borrow_mut().modal_count += 1;
        Ok(())
    }

    fn release_modal(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.modal_count = state.modal_count.saturating_sub(1);
            if state.modal_count > 0 {
                return;
            }
            state.ignore_until_release = false;
        }

        self.ctx.registry.pop(self);
        self.ctx.modal.release(self.owner);
    }

    /// Classifies an event captured while this coordinator is the innermost grab.
    pub fn on_captured_event(&self, event: &InputEvent) -> EventVerdict {
        if let EventKind::KeyPress(keysym) = event.kind {
            if self.options.cancel_keys.contains(&keysym) {
                self.ungrab(UngrabParams::current().user());
                return EventVerdict::Stop;
            }
        }

        let release = event.is_release();
        {
            let mut state = self.state.borrow_mut();
            if state.ignore_until_release && (event.is_motion() || release) {
                if release {
                    state.ignore_until_release = false;
                }
                return EventVerdict::Stop;
            }
        }

        if event
            .source
            .is_some_and(|source| self.is_within_grab(source))
        {
            return EventVerdict::Propagate;
        }

        if self
            .ctx
            .keyboard
            .as_ref()
            .is_some_and(|keyboard| keyboard.should_claim(event))
        {
            return EventVerdict::Propagate;
        }

        if event.is_press() {
            let dismiss = {
                let mut state = self.state.borrow_mut();
                // the matching release must not dismiss again
                state.ignore_until_release = true;
                let containing = event.source.and_then(|source| {
                    state
                        .stack
                        .nearest_frame(focus::ancestors(source, |node| self.ctx.scene.parent(node)))
                });
                let first_outside = containing.map_or(0, |index| index + 1);
                state.stack.get(first_outside).map(|record| record.target)
            };
            if let Some(target) = dismiss {
                debug!(coordinator = self.id.0, ?target, source = ?event.source, "Outside press");
                self.ungrab(UngrabParams::target(target).user());
            }
        }

        EventVerdict::Stop
    }
}

impl CaptureClient for GrabCoordinator {
    fn client_id(&self) -> usize {
        self.id.0
    }

    fn on_captured_event(&self, event: &InputEvent) -> EventVerdict {
        GrabCoordinator::on_captured_event(self, event)
    }
}
