//! A headless backend.
//!
//! Nothing is displayed; every call is appended to a journal instead. Useful for tests and
//! for running an application on a machine without a tray.

use crate::backend::{Backend, Capabilities};
use crate::error::Result;
use crate::tray::Icon;
use log::debug;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A call recorded by [`DummyBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DummyCall {
    Show,
    Hide,
    UpdateImage { width: u32, height: u32 },
    UpdateTitle(String),
    /// The menu as it would have been rendered.
    UpdateMenu(String),
    Run,
    RunDetached,
    Stop,
    Notify { title: String, message: String },
    RemoveNotification,
}

#[derive(Default)]
pub struct DummyBackend {
    capabilities: Capabilities,
    journal: Mutex<Vec<DummyCall>>,
    stopped: Mutex<bool>,
    wakeup: Condvar,
}

impl DummyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `capabilities` instead of supporting everything.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Everything recorded so far.
    pub fn calls(&self) -> Vec<DummyCall> {
        self.journal().clone()
    }

    pub fn clear(&self) {
        self.journal().clear();
    }

    fn journal(&self) -> MutexGuard<'_, Vec<DummyCall>> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: DummyCall) {
        debug!("dummy backend: {:?}", call);
        self.journal().push(call);
    }
}

impl Backend for DummyBackend {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn show(&self, _icon: &Icon) -> Result<()> {
        self.record(DummyCall::Show);
        Ok(())
    }

    fn hide(&self) -> Result<()> {
        self.record(DummyCall::Hide);
        Ok(())
    }

    fn update_image(&self, icon: &Icon) -> Result<()> {
        let (width, height) = icon
            .image()
            .map_or((0, 0), |image| (image.width(), image.height()));
        self.record(DummyCall::UpdateImage { width, height });
        Ok(())
    }

    fn update_title(&self, icon: &Icon) -> Result<()> {
        self.record(DummyCall::UpdateTitle(icon.title()));
        Ok(())
    }

    fn update_menu(&self, icon: &Icon) -> Result<()> {
        let rendered = icon.menu().map(|menu| menu.to_string()).unwrap_or_default();
        self.record(DummyCall::UpdateMenu(rendered));
        Ok(())
    }

    fn run(&self, icon: &Icon) -> Result<()> {
        self.record(DummyCall::Run);
        icon.mark_ready();

        // a stop issued before this point still counts; the flag is consumed on the way out
        let mut stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        while !*stopped {
            stopped = self
                .wakeup
                .wait(stopped)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *stopped = false;
        Ok(())
    }

    fn run_detached(&self, icon: &Icon) -> Result<()> {
        self.record(DummyCall::RunDetached);
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = false;
        icon.mark_ready();
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.record(DummyCall::Stop);
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wakeup.notify_all();
        Ok(())
    }

    fn notify(&self, _icon: &Icon, message: &str, title: &str) -> Result<()> {
        self.record(DummyCall::Notify {
            title: title.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn remove_notification(&self) -> Result<()> {
        self.record(DummyCall::RemoveNotification);
        Ok(())
    }
}
