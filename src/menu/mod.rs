//! Menu descriptors.
//!
//! This module defines the backend-independent description of a tray menu: the items, their
//! display flags and actions, and the filtering applied before a menu is rendered.

pub mod descriptor;
pub mod item;

pub use descriptor::{Menu, MenuFn};
pub use item::{ActivateFn, MenuItem};
