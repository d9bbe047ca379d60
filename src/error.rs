//! Error type shared by the icon, its backends and the image helpers.

use thiserror::Error;

/// Errors returned by tray operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The icon was asked to become visible before an image was set.
    #[error("cannot show icon without icon data")]
    NoImage,

    /// `TRAY_BRIDGE_BACKEND` named a backend that does not exist.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// None of the candidate backends for this platform could be loaded.
    #[error("this platform is not supported: {0}")]
    Unsupported(String),

    /// A specific backend failed to load.
    #[error("backend {backend} is unavailable: {reason}")]
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("image decode error: {0}")]
    Decode(#[from] png::DecodingError),

    /// The native tray toolkit reported a failure.
    #[error("tray error: {0}")]
    Tray(String),

    #[error("notification error: {0}")]
    Notification(String),

    /// The operation needs the event loop, which is not running.
    #[error("the icon is not running")]
    NotRunning,

    #[error("{feature} is not supported by the {backend} backend")]
    NotSupported {
        feature: &'static str,
        backend: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
