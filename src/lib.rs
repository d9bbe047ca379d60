//! # tray-bridge
//!
//! A system tray icon with a popup menu and desktop notifications, driven by whichever
//! native tray facility the platform offers.
//!
//! ## Overview
//!
//! An [`Icon`] owns an image, a title used as tooltip, an optional [`Menu`] and a visibility
//! flag. Changes to any of them are pushed to a [`Backend`]:
//!
//! - `sni`: StatusNotifierItem over D-Bus via [ksni](https://crates.io/crates/ksni), used on
//!   Linux and the BSDs.
//! - `native`: `Shell_NotifyIcon` on Windows and `NSStatusItem` on macOS via
//!   [tray-icon](https://crates.io/crates/tray-icon), with a `winit` event loop.
//! - `dummy`: displays nothing and records every call. Handy for tests and headless
//!   machines.
//!
//! The backend is picked automatically from the platform. Set `TRAY_BRIDGE_BACKEND` to one
//! of the names above to force a particular one, or pass a
//! [`BackendKind`] to [`IconBuilder::backend`].
//!
//! Menus are immutable descriptors. Every property of a [`MenuItem`] may be a callable, and a
//! whole menu may come from a generator, so a menu reflects application state each time it
//! is rebuilt. Activating an item always rebuilds the menu afterwards.
//!
//! Not every backend supports every feature; [`Icon::capabilities`] tells which ones are
//! available. Only the default menu item is guaranteed to be invokable everywhere.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use tray_bridge::{Icon, Image, Menu, MenuItem};
//!
//! let enabled = Arc::new(AtomicBool::new(true));
//! let toggle = enabled.clone();
//!
//! let icon = Icon::builder("my_app")
//!     .image(Image::from_png_file("icon.png")?)
//!     .title("My Application")
//!     .menu(Menu::new([
//!         MenuItem::new("Enabled")
//!             .checked(move |_| enabled.load(Ordering::SeqCst))
//!             .on_activate(move |_, _| {
//!                 toggle.fetch_xor(true, Ordering::SeqCst);
//!             }),
//!         MenuItem::separator(),
//!         MenuItem::new("Quit").on_activate(|icon, _| icon.stop()),
//!     ]))
//!     .build()?;
//!
//! icon.run_with(|icon| {
//!     if let Err(e) = icon.set_visible(true) {
//!         eprintln!("cannot show the icon: {e}");
//!     }
//! })?;
//! # Ok::<(), tray_bridge::Error>(())
//! ```

// Module declarations
pub mod backend;
pub mod config;
pub mod error;
pub mod image;
pub mod menu;
pub mod notification;
pub mod tray;

// Public re-exports
pub use backend::{Backend, Capabilities, DummyBackend, DummyCall};
pub use config::{BACKEND_ENV, BackendKind};
pub use error::{Error, Result};
pub use image::Image;
pub use menu::{Menu, MenuItem};
pub use tray::{Icon, IconBuilder, WeakIcon};
