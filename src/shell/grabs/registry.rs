// SPDX-License-Identifier: GPL-3.0-only

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use tracing::{debug, error, trace};

use crate::{
    backend::{EventPipeline, HookId},
    input::{EventVerdict, InputEvent},
};

/// Something that wants every captured event while it is on top of the registry.
pub trait CaptureClient: fmt::Debug {
    /// Stable identity, used to check stack discipline on [`CaptureRegistry::pop`].
    fn client_id(&self) -> usize;
    fn on_captured_event(&self, event: &InputEvent) -> EventVerdict;
}

#[derive(Default)]
struct RegistryState {
    clients: Vec<Rc<dyn CaptureClient>>,
    hook: Option<HookId>,
}

/// Routes captured events to the innermost active grab.
///
/// There is one registry per event pipeline, shared by every coordinator of a shell.
/// Exactly one capture hook is installed while at least one client is registered, and
/// every event it sees goes to the client on top.
pub struct CaptureRegistry {
    pipeline: Rc<dyn EventPipeline>,
    this: Weak<CaptureRegistry>,
    state: RefCell<RegistryState>,
}

impl fmt::Debug for CaptureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("CaptureRegistry")
            .field("clients", &state.clients)
            .field("hook", &state.hook)
            .finish()
    }
}

impl CaptureRegistry {
    pub fn new(pipeline: Rc<dyn EventPipeline>) -> Rc<CaptureRegistry> {
        Rc::new_cyclic(|this| CaptureRegistry {
            pipeline,
            this: this.clone(),
            state: RefCell::new(RegistryState::default()),
        })
    }

    pub fn push(&self, client: Rc<dyn CaptureClient>) {
        let needs_hook = {
            let mut state = self.state.borrow_mut();
            debug!(?client, depth = state.clients.len() + 1, "Capture client pushed");
            state.clients.push(client);
            state.hook.is_none()
        };

        if needs_hook {
            let registry = self.this.clone();
            let id = self.pipeline.install_capture_hook(Box::new(move |event: &InputEvent| {
                match registry.upgrade() {
                    Some(registry) => registry.dispatch(event),
                    None => EventVerdict::Propagate,
                }
            }));
            debug!(?id, "Capture hook installed");
            self.state.borrow_mut().hook = Some(id);
        }
    }

    /// Removes `client`, which has to be the top of the registry.
    ///
    /// # Panics
    ///
    /// If `client` is not the current top. Popping out of order means some caller broke
    /// the grab nesting, and routing events any further would hand them to the wrong grab.
    pub fn pop(&self, client: &dyn CaptureClient) {
        let hook = {
            let mut state = self.state.borrow_mut();
            let is_top = state
                .clients
                .last()
                .is_some_and(|top| top.client_id() == client.client_id());
            if !is_top {
                let top = state.clients.last().map(|top| format!("{top:?}"));
                drop(state);
                error!(?client, ?top, "Capture client popped out of order");
                panic!("capture client popped out of order: {client:?}, top is {top:?}");
            }

            state.clients.pop();
            debug!(?client, depth = state.clients.len(), "Capture client popped");
            if state.clients.is_empty() {
                state.hook.take()
            } else {
                None
            }
        };

        if let Some(id) = hook {
            self.pipeline.remove_capture_hook(id);
            debug!(?id, "Capture hook removed");
        }
    }

    /// Hands `event` to the top client. Called from the installed hook.
    pub fn dispatch(&self, event: &InputEvent) -> EventVerdict {
        // the client may push or pop while handling the event
        let Some(top) = self.top() else {
            return EventVerdict::Propagate;
        };
        let verdict = top.on_captured_event(event);
        trace!(?event, ?verdict, client = ?top, "Captured event");
        verdict
    }

    pub fn top(&self) -> Option<Rc<dyn CaptureClient>> {
        self.state.borrow().clients.last().cloned()
    }

    pub fn depth(&self) -> usize {
        self.state.borrow().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    pub fn is_hooked(&self) -> bool {
        self.state.borrow().hook.is_some()
    }
}
