//! Backend selection.
//!
//! The backend is normally picked from the platform, but it can be forced with the
//! `TRAY_BRIDGE_BACKEND` environment variable, e.g. `TRAY_BRIDGE_BACKEND=dummy` to run an
//! application headless.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Environment variable overriding the backend choice.
pub const BACKEND_ENV: &str = "TRAY_BRIDGE_BACKEND";

/// The available backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// StatusNotifierItem over D-Bus.
    Sni,
    /// `Shell_NotifyIcon` on Windows, `NSStatusItem` on macOS.
    Native,
    /// Headless in-process backend.
    Dummy,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Sni => "sni",
            BackendKind::Native => "native",
            BackendKind::Dummy => "dummy",
        }
    }

    /// The backends tried, in order, when none is forced.
    pub fn platform_candidates() -> &'static [BackendKind] {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            &[BackendKind::Native]
        } else if cfg!(unix) {
            &[BackendKind::Sni]
        } else {
            &[]
        }
    }

    /// The candidate list: the forced backend if the environment names one, the platform
    /// defaults otherwise.
    pub fn candidates_from_env() -> Result<Vec<BackendKind>, Error> {
        Self::candidates(std::env::var(BACKEND_ENV).ok().as_deref())
    }

    pub(crate) fn candidates(forced: Option<&str>) -> Result<Vec<BackendKind>, Error> {
        match forced.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => Ok(vec![name.parse()?]),
            None => Ok(Self::platform_candidates().to_vec()),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sni" | "appindicator" | "ksni" => Ok(BackendKind::Sni),
            "native" | "win32" | "darwin" => Ok(BackendKind::Native),
            "dummy" => Ok(BackendKind::Dummy),
            _ => Err(Error::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("sni".parse::<BackendKind>().unwrap(), BackendKind::Sni);
        assert_eq!("AppIndicator".parse::<BackendKind>().unwrap(), BackendKind::Sni);
        assert_eq!("win32".parse::<BackendKind>().unwrap(), BackendKind::Native);
        assert_eq!("dummy".parse::<BackendKind>().unwrap(), BackendKind::Dummy);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = "xorg".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownBackend(ref name) if name == "xorg"));
    }

    #[test]
    fn forced_backend_replaces_candidates() {
        assert_eq!(
            BackendKind::candidates(Some("dummy")).unwrap(),
            vec![BackendKind::Dummy]
        );
        assert_eq!(
            BackendKind::candidates(Some("  ")).unwrap(),
            BackendKind::platform_candidates()
        );
        assert_eq!(
            BackendKind::candidates(None).unwrap(),
            BackendKind::platform_candidates()
        );
    }

    #[test]
    fn display_round_trips() {
        for kind in [BackendKind::Sni, BackendKind::Native, BackendKind::Dummy] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }
}
