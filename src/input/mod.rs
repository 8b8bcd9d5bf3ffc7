// SPDX-License-Identifier: GPL-3.0-only

//! Input events as seen by the capture hook, before normal dispatch.

use serde::{Deserialize, Serialize};

use crate::shell::ElementId;

/// Raw X keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keysym(pub u32);

impl Keysym {
    pub const ESCAPE: Keysym = Keysym(cosmic_grab_config::KEY_ESCAPE);

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for Keysym {
    fn from(raw: u32) -> Self {
        Keysym(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    KeyPress(Keysym),
    KeyRelease(Keysym),
    Motion,
    ButtonPress,
    ButtonRelease,
    TouchBegin,
    TouchUpdate,
    TouchEnd,
    TouchCancel,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: EventKind,
    /// Element the event was picked on, `None` for the bare stage.
    #[serde(default)]
    pub source: Option<ElementId>,
}

impl InputEvent {
    pub fn new(kind: EventKind, source: impl Into<Option<ElementId>>) -> InputEvent {
        InputEvent {
            kind,
            source: source.into(),
        }
    }

    pub fn key_press(keysym: Keysym, source: impl Into<Option<ElementId>>) -> InputEvent {
        InputEvent::new(EventKind::KeyPress(keysym), source)
    }

    pub fn button_press(source: impl Into<Option<ElementId>>) -> InputEvent {
        InputEvent::new(EventKind::ButtonPress, source)
    }

    pub fn button_release(source: impl Into<Option<ElementId>>) -> InputEvent {
        InputEvent::new(EventKind::ButtonRelease, source)
    }

    pub fn motion(source: impl Into<Option<ElementId>>) -> InputEvent {
        InputEvent::new(EventKind::Motion, source)
    }

    pub fn keysym(&self) -> Option<Keysym> {
        match self.kind {
            EventKind::KeyPress(sym) | EventKind::KeyRelease(sym) => Some(sym),
            _ => None,
        }
    }

    /// Button press or touch begin.
    pub fn is_press(&self) -> bool {
        matches!(self.kind, EventKind::ButtonPress | EventKind::TouchBegin)
    }

    /// Button release or touch end.
    pub fn is_release(&self) -> bool {
        matches!(self.kind, EventKind::ButtonRelease | EventKind::TouchEnd)
    }

    pub fn is_motion(&self) -> bool {
        matches!(self.kind, EventKind::Motion | EventKind::TouchUpdate)
    }
}

/// Result of running an event through the capture hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventVerdict {
    /// The event is consumed and never reaches normal dispatch.
    Stop,
    /// Normal dispatch continues.
    Propagate,
}

impl EventVerdict {
    pub fn is_stop(self) -> bool {
        self == EventVerdict::Stop
    }
}
