// SPDX-License-Identifier: GPL-3.0-only

//! Modal input grabs.
//!
//! A [`GrabCoordinator`] is owned by every part of the shell that can go modal. When it
//! takes its first grab it acquires the session modal and registers with the shared
//! [`CaptureRegistry`], which then feeds it every captured input event until its last
//! grab is released.

use std::{fmt, rc::Rc};

use cosmic_grab_config::GrabConfig;

use crate::{
    backend::{KeyboardClaim, ModalOptions, ModalSession, SceneGraph},
    input::Keysym,
    shell::ElementId,
};

mod coordinator;
mod permitted;
mod registry;
mod stack;

pub use self::coordinator::GrabCoordinator;
pub use self::permitted::PermittedSet;
pub use self::registry::{CaptureClient, CaptureRegistry};
pub use self::stack::{GrabRecord, GrabStack, ReleaseCallback};

#[derive(Debug, thiserror::Error)]
pub enum GrabError {
    #[error("session modal was denied for {owner:?}")]
    ModalDenied { owner: ElementId },
}

/// Collaborators shared by the coordinators of one shell.
#[derive(Clone)]
pub struct GrabContext {
    pub modal: Rc<dyn ModalSession>,
    pub scene: Rc<dyn SceneGraph>,
    /// On-screen keyboard, if there is one.
    pub keyboard: Option<Rc<dyn KeyboardClaim>>,
    pub registry: Rc<CaptureRegistry>,
}

impl fmt::Debug for GrabContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrabContext")
            .field("keyboard", &self.keyboard.is_some())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl GrabContext {
    pub fn new(
        modal: Rc<dyn ModalSession>,
        scene: Rc<dyn SceneGraph>,
        registry: Rc<CaptureRegistry>,
    ) -> GrabContext {
        GrabContext {
            modal,
            scene,
            keyboard: None,
            registry,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Rc<dyn KeyboardClaim>) -> GrabContext {
        self.keyboard = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorOptions {
    pub modal: ModalOptions,
    /// Keys that release the current grab.
    pub cancel_keys: Vec<Keysym>,
}

impl Default for CoordinatorOptions {
    fn default() -> CoordinatorOptions {
        CoordinatorOptions::from(&GrabConfig::default())
    }
}

impl From<&GrabConfig> for CoordinatorOptions {
    fn from(config: &GrabConfig) -> CoordinatorOptions {
        CoordinatorOptions {
            modal: ModalOptions {
                action_mode: config.action_mode,
            },
            cancel_keys: config.cancel_keys.iter().copied().map(Keysym).collect(),
        }
    }
}

pub struct GrabParams {
    pub target: ElementId,
    pub focus: Option<ElementId>,
    pub on_release: Option<ReleaseCallback>,
}

impl fmt::Debug for GrabParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrabParams")
            .field("target", &self.target)
            .field("focus", &self.focus)
            .field("on_release", &self.on_release.as_ref().map(|_| "..."))
            .finish()
    }
}

impl GrabParams {
    pub fn new(target: ElementId) -> GrabParams {
        GrabParams {
            target,
            focus: None,
            on_release: None,
        }
    }

    pub fn focus(mut self, focus: ElementId) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn on_release(mut self, on_release: impl FnOnce(bool) + 'static) -> Self {
        self.on_release = Some(Box::new(on_release));
        self
    }
}

impl From<ElementId> for GrabParams {
    fn from(target: ElementId) -> Self {
        GrabParams::new(target)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UngrabParams {
    /// `None` releases the current grab.
    pub target: Option<ElementId>,
    pub user_initiated: bool,
}

impl UngrabParams {
    pub fn current() -> UngrabParams {
        UngrabParams::default()
    }

    pub fn target(target: ElementId) -> UngrabParams {
        UngrabParams {
            target: Some(target),
            user_initiated: false,
        }
    }

    pub fn user(mut self) -> Self {
        self.user_initiated = true;
        self
    }
}
