//! Platform backends.
//!
//! A backend maps the icon model onto one native tray facility. The icon calls into its
//! backend from whatever thread the application happens to use, while [`Backend::run`]
//! blocks another one, so implementations synchronise internally.

pub mod dummy;
#[cfg(all(unix, not(target_os = "macos")))]
pub mod ksni_impl;
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub mod native;

pub use dummy::{DummyBackend, DummyCall};
#[cfg(all(unix, not(target_os = "macos")))]
pub use ksni_impl::{KsniTray, SniBackend};
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub use native::NativeBackend;

use crate::config::BackendKind;
use crate::error::{Error, Result};
use crate::tray::Icon;
use log::{debug, warn};
use std::sync::Arc;

/// Features a backend supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// The default menu item can be invoked in a special way, such as clicking the icon.
    pub has_default_action: bool,
    /// Menus are displayed.
    pub has_menu: bool,
    /// Radio items are drawn differently from check items.
    pub has_menu_radio: bool,
    /// Notifications can be displayed.
    pub has_notification: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            has_default_action: true,
            has_menu: true,
            has_menu_radio: true,
            has_notification: true,
        }
    }
}

/// A native tray implementation.
///
/// The icon never calls a backend while holding its state lock, so backends may read the
/// icon from within any of these methods.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Shows the icon. The image has already been pushed with [`Backend::update_image`].
    fn show(&self, icon: &Icon) -> Result<()>;

    fn hide(&self) -> Result<()>;

    /// Pushes the current image.
    fn update_image(&self, icon: &Icon) -> Result<()>;

    /// Pushes the current title. Only called while the icon is visible.
    fn update_title(&self, icon: &Icon) -> Result<()>;

    /// Rebuilds the native menu from the icon's menu descriptors.
    fn update_menu(&self, icon: &Icon) -> Result<()>;

    /// Runs the event loop until [`Backend::stop`]. Must call [`Icon::mark_ready`] once the
    /// loop is ready.
    fn run(&self, icon: &Icon) -> Result<()>;

    /// Like [`Backend::run`] but returns as soon as the icon is ready.
    fn run_detached(&self, _icon: &Icon) -> Result<()> {
        Err(Error::NotSupported {
            feature: "detached mode",
            backend: self.name(),
        })
    }

    fn stop(&self) -> Result<()>;

    fn notify(&self, icon: &Icon, message: &str, title: &str) -> Result<()>;

    fn remove_notification(&self) -> Result<()>;
}

/// Loads a specific backend.
pub fn load(kind: BackendKind) -> Result<Arc<dyn Backend>> {
    match kind {
        BackendKind::Dummy => Ok(Arc::new(DummyBackend::new())),
        BackendKind::Sni => load_sni(),
        BackendKind::Native => load_native(),
    }
}

/// Picks the backend named by `TRAY_BRIDGE_BACKEND`, or the first platform default that
/// loads.
pub fn select() -> Result<Arc<dyn Backend>> {
    select_from(&BackendKind::candidates_from_env()?, load)
}

/// Returns the first candidate `loader` accepts; fails with every rejection otherwise.
fn select_from<F>(candidates: &[BackendKind], loader: F) -> Result<Arc<dyn Backend>>
where
    F: Fn(BackendKind) -> Result<Arc<dyn Backend>>,
{
    let mut errors = Vec::new();
    for &kind in candidates {
        match loader(kind) {
            Ok(backend) => {
                debug!("Selected the {} backend", kind);
                return Ok(backend);
            }
            Err(e) => {
                warn!("The {} backend is unavailable: {}", kind, e);
                errors.push(e.to_string());
            }
        }
    }

    Err(Error::Unsupported(errors.join("; ")))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn load_sni() -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(SniBackend::probe()?))
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn load_sni() -> Result<Arc<dyn Backend>> {
    Err(Error::BackendUnavailable {
        backend: "sni",
        reason: "StatusNotifierItem requires a freedesktop session".to_string(),
    })
}

#[cfg(any(target_os = "windows", target_os = "macos"))]
fn load_native() -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(NativeBackend::new()))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn load_native() -> Result<Arc<dyn Backend>> {
    Err(Error::BackendUnavailable {
        backend: "native",
        reason: "only available on Windows and macOS".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_always_loads() {
        assert_eq!(load(BackendKind::Dummy).unwrap().name(), "dummy");
    }

    fn refuse(kind: BackendKind) -> Result<Arc<dyn Backend>> {
        Err(Error::BackendUnavailable {
            backend: kind.as_str(),
            reason: format!("{kind} refused"),
        })
    }

    #[test]
    fn first_loadable_candidate_wins() {
        let backend = select_from(&[BackendKind::Sni, BackendKind::Dummy], |kind| match kind {
            BackendKind::Dummy => load(kind),
            _ => refuse(kind),
        })
        .unwrap();
        assert_eq!(backend.name(), "dummy");
    }

    #[test]
    fn every_failure_is_reported() {
        let err = select_from(&[BackendKind::Sni, BackendKind::Native], refuse)
            .err()
            .unwrap();
        match err {
            Error::Unsupported(message) => {
                assert!(message.contains("sni refused"), "{message}");
                assert!(message.contains("native refused"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_candidates_is_unsupported() {
        assert!(matches!(
            select_from(&[], load).err(),
            Some(Error::Unsupported(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn native_is_unavailable_on_linux() {
        let err = load(BackendKind::Native).err().unwrap();
        assert!(matches!(
            err,
            Error::BackendUnavailable {
                backend: "native",
                ..
            }
        ));
    }
}
