//! Desktop notifications.
//!
//! A [`Notifier`] remembers the notification it displayed last, so that a new notification
//! replaces it and [`Notifier::hide`] can close it again.

use crate::error::{Error, Result};
#[cfg(feature = "notifications")]
use log::debug;
#[cfg(all(feature = "notifications", unix, not(target_os = "macos")))]
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
pub struct Notifier {
    #[cfg(all(feature = "notifications", unix, not(target_os = "macos")))]
    current: Mutex<Option<notify_rust::NotificationHandle>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether notifications were compiled in.
    pub fn is_supported() -> bool {
        cfg!(feature = "notifications")
    }

    /// Displays a notification, replacing the previous one where the platform allows.
    #[cfg(feature = "notifications")]
    pub fn notify(&self, app_name: &str, title: &str, message: &str) -> Result<()> {
        let mut notification = notify_rust::Notification::new();
        notification
            .appname(app_name)
            .summary(title)
            .body(message);

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = current.as_ref() {
                notification.id(previous.id());
            }
            let handle = notification.show().map_err(notification_error)?;
            debug!("Displayed notification {}", handle.id());
            *current = Some(handle);
        }

        #[cfg(not(all(unix, not(target_os = "macos"))))]
        {
            notification.show().map(|_| ()).map_err(notification_error)?;
            debug!("Displayed notification for {}", app_name);
        }

        Ok(())
    }

    #[cfg(not(feature = "notifications"))]
    pub fn notify(&self, _app_name: &str, _title: &str, _message: &str) -> Result<()> {
        Err(Error::NotSupported {
            feature: "notifications",
            backend: "this build",
        })
    }

    /// Closes the notification displayed last, if any.
    ///
    /// Only freedesktop notification servers can close a notification; elsewhere this does
    /// nothing.
    pub fn hide(&self) -> Result<()> {
        #[cfg(all(feature = "notifications", unix, not(target_os = "macos")))]
        {
            let current = self
                .current
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(handle) = current {
                debug!("Closing notification {}", handle.id());
                handle.close();
            }
        }
        Ok(())
    }
}

#[cfg(feature = "notifications")]
fn notification_error(e: notify_rust::error::Error) -> Error {
    Error::Notification(e.to_string())
}
