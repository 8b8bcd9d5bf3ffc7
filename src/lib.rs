// SPDX-License-Identifier: GPL-3.0-only

//! Nested modal input grabs for a desktop shell.
//!
//! See [`shell::grabs`] for the grab machinery itself and [`backend`] for the
//! collaborators it expects from the compositor.

pub mod backend;
pub mod config;
pub mod input;
pub mod logger;
pub mod replay;
pub mod shell;
pub(crate) mod utils;
