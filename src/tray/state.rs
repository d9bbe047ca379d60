//! Tray state management.
//!
//! This module contains the mutable state behind an [`Icon`](crate::Icon) handle. Backends
//! never hold on to it; they read what they need through the handle whenever they rebuild
//! native objects.

use crate::image::Image;
use crate::menu::Menu;

/// Internal state of the tray icon.
#[derive(Debug, Default)]
pub struct IconState {
    /// The current image, if any.
    pub image: Option<Image>,
    /// Whether the backend holds the current image.
    pub image_valid: bool,
    /// A short title, also used as tooltip.
    pub title: String,
    /// The popup menu.
    pub menu: Option<Menu>,
    /// Whether the icon is currently shown.
    pub visible: bool,
    /// Set once the backend has marked the icon ready, cleared by stop.
    pub running: bool,
}

impl IconState {
    pub fn new(image: Option<Image>, title: String, menu: Option<Menu>) -> Self {
        Self {
            image,
            title,
            menu,
            ..Default::default()
        }
    }
}
