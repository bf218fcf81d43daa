//! Menu tree and its native rendering.
//!
//! This module defines the menu nodes supplied by the application core
//! (submenus, radio groups, actions, toggles, radio options and separators)
//! and the transient native mirror built from them each time a menu is shown.

pub mod item;
pub mod native;

pub use item::{Activation, MenuModel, MenuNode};
pub use native::{CommandTable, NativeEntry, NativeMenu, RenderedMenu, mnemonic_text, render};
