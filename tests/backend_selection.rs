use std::sync::{Mutex, MutexGuard, PoisonError};
use tray_bridge::{BACKEND_ENV, BackendKind, Error, Icon};

// every test here rewrites the process environment
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn forced(value: Option<&str>) -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    // SAFETY: the lock serialises every environment access in this test binary.
    unsafe {
        match value {
            Some(value) => std::env::set_var(BACKEND_ENV, value),
            None => std::env::remove_var(BACKEND_ENV),
        }
    }
    guard
}

#[test]
fn environment_forces_the_backend() {
    let _env = forced(Some("dummy"));
    let icon = Icon::builder("forced").build().unwrap();
    assert_eq!(icon.backend_name(), "dummy");
}

#[test]
fn aliases_are_accepted() {
    let _env = forced(Some("  DUMMY "));
    assert_eq!(
        BackendKind::candidates_from_env().unwrap(),
        [BackendKind::Dummy]
    );
}

#[test]
fn unknown_backend_does_not_fall_back() {
    let _env = forced(Some("bogus"));
    match Icon::builder("forced").build() {
        Err(Error::UnknownBackend(name)) => assert_eq!(name, "bogus"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(icon) => panic!("fell back to {}", icon.backend_name()),
    }
}

#[test]
fn unset_variable_uses_platform_defaults() {
    let _env = forced(None);
    assert_eq!(
        BackendKind::candidates_from_env().unwrap(),
        BackendKind::platform_candidates()
    );
}

#[test]
fn explicit_backend_ignores_the_environment() {
    let _env = forced(Some("bogus"));
    let icon = Icon::builder("explicit")
        .backend(BackendKind::Dummy)
        .build()
        .unwrap();
    assert_eq!(icon.backend_name(), "dummy");
}
