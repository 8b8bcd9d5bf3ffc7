// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// X keysym of the Escape key.
pub const KEY_ESCAPE: u32 = 0xff1b;

bitflags::bitflags! {
    /// Which groups of global keybindings stay active while a grab holds the session modal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ActionMode: u32 {
        const NORMAL        = 1 << 0;
        const OVERVIEW      = 1 << 1;
        const LOCK_SCREEN   = 1 << 2;
        const UNLOCK_SCREEN = 1 << 3;
        const LOGIN_SCREEN  = 1 << 4;
        const SYSTEM_MODAL  = 1 << 5;
        const LOOKING_GLASS = 1 << 6;
        const POPUP         = 1 << 7;

        const ALL = Self::NORMAL.bits()
            | Self::OVERVIEW.bits()
            | Self::LOCK_SCREEN.bits()
            | Self::UNLOCK_SCREEN.bits()
            | Self::LOGIN_SCREEN.bits()
            | Self::SYSTEM_MODAL.bits()
            | Self::LOOKING_GLASS.bits()
            | Self::POPUP.bits();
    }
}

impl Default for ActionMode {
    fn default() -> ActionMode {
        ActionMode::POPUP
    }
}

fn default_cancel_keys() -> Vec<u32> {
    vec![KEY_ESCAPE]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GrabConfig {
    /// Keysyms that dismiss the current grab when pressed.
    #[serde(default = "default_cancel_keys")]
    pub cancel_keys: Vec<u32>,
    #[serde(default)]
    pub action_mode: ActionMode,
}

impl Default for GrabConfig {
    fn default() -> GrabConfig {
        GrabConfig {
            cancel_keys: default_cancel_keys(),
            action_mode: ActionMode::default(),
        }
    }
}
