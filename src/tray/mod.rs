//! Tray core functionality.
//!
//! This module contains the icon handle shared by applications and backends, its state, and
//! the update events backends use to forward changes into their native loops.

pub mod event;
pub mod icon;
pub mod state;

pub use event::TrayEvent;
pub use icon::{Icon, IconBuilder, SetupFn, WeakIcon};
pub use state::IconState;
