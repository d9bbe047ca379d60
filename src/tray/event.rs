//! Update requests sent to a backend's event loop.
//!
//! Backends whose native loop runs on a thread of its own receive icon changes as
//! `TrayEvent`s instead of touching native objects from the caller's thread.

/// A change the backend loop has to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// The icon became visible.
    Show,
    /// The icon was hidden.
    Hide,
    /// The image changed.
    ImageChanged,
    /// The title changed.
    TitleChanged,
    /// The menu must be rebuilt from its descriptors.
    MenuChanged,
    /// The loop must exit.
    Stop,
}
